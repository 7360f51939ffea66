//! Access and refresh tokens.
//!
//! Access tokens are short-lived HS256 JWTs naming the user and their role.
//! Refresh tokens are opaque; the database only ever sees their SHA-256.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use placement_core::roles::Role;
use placement_core::types::DbId;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::config::JwtConfig;

/// `iss` of every token this server signs. Tokens from elsewhere are refused.
pub const TOKEN_ISSUER: &str = "placement-api";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// User id.
    pub sub: DbId,
    pub role: Role,
    pub iss: String,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
}

/// A freshly minted refresh token.
pub struct RefreshToken {
    /// Handed to the client once and never stored.
    pub plaintext: String,
    /// What `user_sessions.refresh_token_hash` holds.
    pub hash: String,
}

pub fn generate_access_token(
    user_id: DbId,
    role: Role,
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: user_id,
        role,
        iss: TOKEN_ISSUER.to_string(),
        exp: now + config.access_token_expiry_mins * 60,
        iat: now,
        jti: Uuid::new_v4().to_string(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}

/// Check signature, expiry and issuer. An unknown role fails decoding.
pub fn validate_token(
    token: &str,
    config: &JwtConfig,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::default();
    validation.set_issuer(&[TOKEN_ISSUER]);
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
}

pub fn generate_refresh_token() -> RefreshToken {
    // Two v4 UUIDs give 244 random bits.
    let plaintext = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());
    let hash = hash_refresh_token(&plaintext);
    RefreshToken { plaintext, hash }
}

/// Lowercase hex SHA-256.
pub fn hash_refresh_token(token: &str) -> String {
    format!("{:x}", Sha256::digest(token.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(secret: &str) -> JwtConfig {
        JwtConfig {
            secret: secret.to_string(),
            access_token_expiry_mins: 15,
            refresh_token_expiry_days: 7,
        }
    }

    fn sign(claims: &Claims, secret: &str) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    const SECRET: &str = "unit-test-signing-secret";

    #[test]
    fn access_token_carries_user_and_role() {
        let token = generate_access_token(42, Role::Recruitment, &config(SECRET)).unwrap();
        let claims = validate_token(&token, &config(SECRET)).unwrap();
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.role, Role::Recruitment);
        assert_eq!(claims.iss, TOKEN_ISSUER);
        assert_eq!(claims.exp - claims.iat, 15 * 60);
    }

    #[test]
    fn expired_or_foreign_tokens_are_refused() {
        let now = chrono::Utc::now().timestamp();
        let expired = Claims {
            sub: 1,
            role: Role::Agent,
            iss: TOKEN_ISSUER.to_string(),
            // Well past the default 60-second leeway.
            exp: now - 300,
            iat: now - 600,
            jti: "expired".into(),
        };
        assert!(validate_token(&sign(&expired, SECRET), &config(SECRET)).is_err());

        let foreign = Claims {
            iss: "someone-else".into(),
            exp: now + 300,
            ..expired
        };
        assert!(validate_token(&sign(&foreign, SECRET), &config(SECRET)).is_err());
    }

    #[test]
    fn other_secret_is_refused() {
        let token = generate_access_token(1, Role::Sponsor, &config(SECRET)).unwrap();
        assert!(validate_token(&token, &config("a-different-secret")).is_err());
    }

    #[test]
    fn refresh_tokens_are_unique_and_hashed() {
        let a = generate_refresh_token();
        let b = generate_refresh_token();
        assert_ne!(a.plaintext, b.plaintext);
        assert_eq!(a.plaintext.len(), 64);
        assert_eq!(a.hash, hash_refresh_token(&a.plaintext));
        assert_eq!(a.hash.len(), 64);
    }
}
