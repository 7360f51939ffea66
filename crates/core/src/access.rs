//! Role-based, ownership-aware access control.
//!
//! Every row-level decision in the platform goes through [`authorize`]. The
//! caller works out how the acting user relates to the row ([`Relation`]) and
//! the capability matrix in [`is_allowed`] decides whether the action may
//! proceed. Admins bypass the matrix entirely.
//!
//! Relation meaning per resource:
//!
//! | resource | `Owner`                 | `Counterparty`                     |
//! |----------|-------------------------|------------------------------------|
//! | cv       | managing account        | employer holding an offer/process  |
//! | job      | posting employer        | --                                 |
//! | offer    | employer who made it    | owner of the CV                    |
//! | transfer | requesting account      | receiving account                  |
//! | process  | owner of the CV         | employer running the placement     |
//! | payment  | paying employer         | owner of the CV                    |
//! | user     | the user themself       | --                                 |

use serde::Serialize;

use crate::error::CoreError;
use crate::roles::Role;
use crate::types::DbId;

/// The authenticated principal performing a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Actor {
    pub user_id: DbId,
    pub role: Role,
}

impl Actor {
    pub fn new(user_id: DbId, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Relation derived from a single owner column.
    pub fn relation_to(&self, owner_id: DbId) -> Relation {
        if owner_id == self.user_id {
            Relation::Owner
        } else {
            Relation::Stranger
        }
    }
}

/// Protected resource kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Cv,
    Job,
    Offer,
    Transfer,
    Process,
    Payment,
    User,
}

impl Resource {
    /// Display name used in error messages.
    pub fn entity_name(self) -> &'static str {
        match self {
            Resource::Cv => "CV",
            Resource::Job => "Job",
            Resource::Offer => "Offer",
            Resource::Transfer => "Transfer",
            Resource::Process => "Process",
            Resource::Payment => "Payment",
            Resource::User => "User",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Create,
    Update,
    Delete,
    /// Accept / reject style decisions taken by the receiving side.
    Respond,
}

impl Action {
    fn verb(self) -> &'static str {
        match self {
            Action::Read => "view",
            Action::Create => "create",
            Action::Update => "modify",
            Action::Delete => "delete",
            Action::Respond => "respond to",
        }
    }
}

/// How the actor relates to the row being accessed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Owner,
    Counterparty,
    /// Row is visible to any eligible role (available CVs, job board).
    Public,
    Stranger,
}

/// Row scope applied to list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListScope {
    All,
    Owned(DbId),
}

/// Admins list everything; everyone else only their own rows.
pub fn list_scope(actor: &Actor) -> ListScope {
    if actor.is_admin() {
        ListScope::All
    } else {
        ListScope::Owned(actor.user_id)
    }
}

/// The capability matrix for non-admin roles.
pub fn is_allowed(role: Role, resource: Resource, action: Action, relation: Relation) -> bool {
    use Action::*;
    use Relation::*;

    if role == Role::Admin {
        return true;
    }

    let party = matches!(relation, Owner | Counterparty);

    match (resource, action) {
        (Resource::Cv, Create) => role.manages_workers(),
        (Resource::Cv, Read) => party || (relation == Public && role.is_employer()),
        (Resource::Cv, Update | Delete) => relation == Owner && role.manages_workers(),
        (Resource::Cv, Respond) => false,

        (Resource::Job, Create) => role.is_employer(),
        (Resource::Job, Read) => true,
        (Resource::Job, Update | Delete) => relation == Owner,
        (Resource::Job, Respond) => false,

        (Resource::Offer, Create) => role.is_employer(),
        (Resource::Offer, Read) => party,
        (Resource::Offer, Respond) => relation == Counterparty,
        (Resource::Offer, Delete) => relation == Owner,
        (Resource::Offer, Update) => false,

        (Resource::Transfer, Create) => role.manages_workers(),
        (Resource::Transfer, Read) => party,
        (Resource::Transfer, Respond) => relation == Counterparty,
        (Resource::Transfer, Delete) => relation == Owner,
        (Resource::Transfer, Update) => false,

        (Resource::Process, Read) => party,
        (Resource::Process, Update) => relation == Owner,
        (Resource::Process, Create | Delete | Respond) => false,

        (Resource::Payment, Create) => role.is_employer(),
        (Resource::Payment, Read) => party,
        (Resource::Payment, Update | Delete | Respond) => false,

        (Resource::User, Read) => relation == Owner,
        (Resource::User, _) => false,
    }
}

/// Reject the action with `Forbidden` unless the matrix allows it.
pub fn authorize(
    actor: &Actor,
    resource: Resource,
    action: Action,
    relation: Relation,
) -> Result<(), CoreError> {
    if is_allowed(actor.role, resource, action, relation) {
        Ok(())
    } else {
        Err(CoreError::Forbidden(format!(
            "Not allowed to {} this {}",
            action.verb(),
            resource.entity_name()
        )))
    }
}

/// Role-only check for actions that do not target an existing row.
pub fn authorize_create(actor: &Actor, resource: Resource) -> Result<(), CoreError> {
    authorize(actor, resource, Action::Create, Relation::Owner)
}
