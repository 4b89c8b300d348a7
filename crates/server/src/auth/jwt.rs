//! Verification of externally-issued identity tokens.
//!
//! The server does not register or log in users; clients arrive with a JWT
//! minted by the identity provider and the `sub` claim becomes the stable
//! user identity behind a connection.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject — the user id assigned by the identity provider.
    pub sub: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub exp: i64,
}

pub fn verify_token(token: &str, secret: &str) -> Option<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .ok()
    .map(|data| data.claims)
}

/// Mint a token the way the identity provider would. Used by local tooling
/// and tests.
pub fn create_token(
    sub: &str,
    secret: &str,
    expire_hours: i64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let expiration = Utc::now() + Duration::hours(expire_hours);
    let claims = Claims {
        sub: sub.to_string(),
        email: None,
        role: None,
        exp: expiration.timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_token() {
        let token = create_token("user-123", "secret", 1).unwrap();
        let claims = verify_token(&token, "secret").unwrap();
        assert_eq!(claims.sub, "user-123");
    }

    #[test]
    fn wrong_secret_rejected() {
        let token = create_token("user-123", "secret", 1).unwrap();
        assert!(verify_token(&token, "other").is_none());
    }

    #[test]
    fn expired_token_rejected() {
        let token = create_token("user-123", "secret", -1).unwrap();
        assert!(verify_token(&token, "secret").is_none());
    }
}
