use argon2::{
    Argon2,
    PasswordHash,
    PasswordVerifier,
    PasswordHasher,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use argon2::password_hash::{SaltString, rand_core::OsRng};

/// Verify password using Argon2 hash stored in DB.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let parsed = match PasswordHash::new(stored_hash) {
        Ok(p) => p,
        Err(_) => return false,
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Hash a new password using Argon2id with a random salt.
/// Store the returned string in app_user.password_hash.
pub fn hash_password(password: &str) -> Result<String, String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|phc| phc.to_string())
        .map_err(|e| format!("argon2 hash error: {e}"))
}

/// Bearer token claims. `userId`, `email` and `role` identify the actor;
/// verification rejects a token missing any of them.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "userId")]
    pub user_id: Uuid,
    pub email: String,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, PartialEq, Eq)]
pub enum TokenError {
    Expired,
    Invalid,
}

/// Issue a signed HS256 access token for a logged-in user.
pub fn sign_token(
    secret: &str,
    user_id: Uuid,
    email: &str,
    role: &str,
    ttl_days: i64,
) -> Result<String, String> {
    let now = Utc::now();
    let claims = Claims {
        user_id,
        email: email.to_string(),
        role: role.to_string(),
        iat: now.timestamp(),
        exp: (now + Duration::days(ttl_days)).timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| format!("token sign error: {e}"))
}

/// Decode and validate a bearer token. Expiry is re-checked on top of the
/// library's own validation so an elapsed `exp` is always classified as
/// `Expired`, never as a generic decode failure.
pub fn verify_token(secret: &str, token: &str) -> Result<Claims, TokenError> {
    let mut validation = Validation::default();
    validation.leeway = 0;

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Invalid,
    })?;

    if data.claims.exp <= Utc::now().timestamp() {
        return Err(TokenError::Expired);
    }

    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_roundtrip() {
        let hash = hash_password("password123").unwrap();
        assert_ne!(hash, "password123");
        assert!(verify_password("password123", &hash));
        assert!(!verify_password("wrong-password", &hash));
    }

    #[test]
    fn verify_password_rejects_garbage_hash() {
        assert!(!verify_password("password123", "not-a-phc-string"));
    }

    #[test]
    fn token_roundtrip() {
        let id = Uuid::new_v4();
        let token = sign_token("secret", id, "a@x.com", "PATIENT", 7).unwrap();
        let claims = verify_token("secret", &token).unwrap();
        assert_eq!(claims.user_id, id);
        assert_eq!(claims.email, "a@x.com");
        assert_eq!(claims.role, "PATIENT");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn token_wrong_secret_is_invalid() {
        let token = sign_token("secret", Uuid::new_v4(), "a@x.com", "DOCTOR", 7).unwrap();
        assert_eq!(verify_token("other", &token), Err(TokenError::Invalid));
    }

    #[test]
    fn token_elapsed_exp_is_expired() {
        let token = sign_token("secret", Uuid::new_v4(), "a@x.com", "DOCTOR", -1).unwrap();
        assert_eq!(verify_token("secret", &token), Err(TokenError::Expired));
    }

    #[test]
    fn token_garbage_is_invalid() {
        assert_eq!(
            verify_token("secret", "not.a.token"),
            Err(TokenError::Invalid)
        );
    }
}
