//! Well-known role names and the typed [`Role`] enum.
//!
//! These must match the seed data in `20260301000001_create_roles_and_users.sql`.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_SPONSOR: &str = "sponsor";
pub const ROLE_RECRUITMENT: &str = "recruitment";
pub const ROLE_AGENT: &str = "agent";

/// Roles that may sign up through the public registration endpoint.
pub const SELF_REGISTER_ROLES: &[&str] = &[ROLE_SPONSOR, ROLE_RECRUITMENT, ROLE_AGENT];

/// Account role. Seed ids are 1-based in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Sponsor,
    Recruitment,
    Agent,
}

impl Role {
    /// The role name as stored in the `roles` table.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => ROLE_ADMIN,
            Role::Sponsor => ROLE_SPONSOR,
            Role::Recruitment => ROLE_RECRUITMENT,
            Role::Agent => ROLE_AGENT,
        }
    }

    /// Parse a role name. Unknown names are rejected.
    pub fn parse(name: &str) -> Result<Self, CoreError> {
        match name {
            ROLE_ADMIN => Ok(Role::Admin),
            ROLE_SPONSOR => Ok(Role::Sponsor),
            ROLE_RECRUITMENT => Ok(Role::Recruitment),
            ROLE_AGENT => Ok(Role::Agent),
            other => Err(CoreError::Validation(format!("Unknown role '{other}'"))),
        }
    }

    /// Employers browse CVs, post jobs and make offers.
    pub fn is_employer(self) -> bool {
        matches!(self, Role::Sponsor | Role::Recruitment)
    }

    /// Accounts that manage worker profiles and can receive transfers.
    pub fn manages_workers(self) -> bool {
        matches!(self, Role::Agent | Role::Recruitment)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validate that a role name may be chosen during self-registration.
pub fn validate_self_register_role(name: &str) -> Result<Role, CoreError> {
    if !SELF_REGISTER_ROLES.contains(&name) {
        return Err(CoreError::Validation(format!(
            "Role must be one of: {}",
            SELF_REGISTER_ROLES.join(", ")
        )));
    }
    Role::parse(name)
}
