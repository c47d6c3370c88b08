use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::models::AuthPayload;

/// Validate a provider-issued bearer token and return its claims.
/// HS256 with a shared secret; `sub` carries the user id.
pub fn validate_token(secret: &[u8], token: &str) -> Result<AuthPayload, jsonwebtoken::errors::Error> {
    let token_data = decode::<AuthPayload>(
        token,
        &DecodingKey::from_secret(secret),
        &Validation::new(Algorithm::HS256),
    )?;
    Ok(token_data.claims)
}

/// Mint a token for a user id. Used by the CLI and tests; in deployment the
/// identity provider issues these against the same shared secret.
pub fn issue_token(secret: &[u8], user_id: &str) -> Result<String, jsonwebtoken::errors::Error> {
    let expiration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as usize
        + 3600; // 1 hour

    let claims = AuthPayload {
        sub: user_id.to_owned(),
        exp: expiration,
    };

    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trip() {
        let token = issue_token(b"test_secret", "user_42").unwrap();
        let claims = validate_token(b"test_secret", &token).unwrap();
        assert_eq!(claims.sub, "user_42");
    }

    #[test]
    fn wrong_secret_rejected() {
        let token = issue_token(b"test_secret", "user_42").unwrap();
        assert!(validate_token(b"other_secret", &token).is_err());
    }
}
