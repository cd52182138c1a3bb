/// Session token generation and validation
///
/// Session tokens are JWTs signed with HS256 (HMAC-SHA256). Each token
/// encodes the owning user's id and expires one hour after issuance.
///
/// Issuing a token also appends it to the user's session list (the
/// `sessions` table), so a user may hold one live token per login.
/// Revocation removes list entries; a structurally valid, unexpired token
/// whose list entry is gone no longer authenticates.
///
/// # Example
///
/// ```
/// use taskdeck_shared::auth::token::{create_token, validate_token, Claims};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let user_id = Uuid::new_v4();
/// let secret = "your-secret-key-at-least-32-bytes-long";
///
/// let token = create_token(&Claims::new(user_id), secret)?;
/// let claims = validate_token(&token, secret)?;
/// assert_eq!(claims.sub, user_id);
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::session::Session;

/// Session token lifetime (one hour from issuance)
pub const TOKEN_TTL_SECONDS: i64 = 3600;

/// Error type for session token operations
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// Failed to sign token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Signature check or structural validation failed
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,

    /// Persisting or removing the session list entry failed
    #[error("Session store error: {0}")]
    StoreError(#[from] sqlx::Error),
}

/// Claims embedded in a session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - owning user's id
    pub sub: Uuid,

    /// Issuer - always "taskdeck"
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Creates claims for a user with the standard one-hour expiry
    pub fn new(user_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id,
            iss: "taskdeck".to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(TOKEN_TTL_SECONDS)).timestamp(),
        }
    }

    /// Creates claims with a custom expiry, used by tests to build
    /// already-expired tokens
    pub fn with_expiry(user_id: Uuid, expires_in: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id,
            iss: "taskdeck".to_string(),
            iat: now.timestamp(),
            exp: (now + expires_in).timestamp(),
        }
    }

    /// Checks if the token has expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// Signs a session token from claims
///
/// # Errors
///
/// Returns `TokenError::CreateError` if encoding fails
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, TokenError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| TokenError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Validates a session token's signature and expiry and extracts claims
///
/// This is the structural half of validation. Callers that authenticate
/// requests must additionally check the token is still in the owning
/// user's session list (see [`is_member`]).
///
/// # Errors
///
/// - `TokenError::Expired` if the expiry has passed
/// - `TokenError::InvalidToken` for a bad signature, issuer, or format
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, TokenError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&["taskdeck"]);
    validation.validate_exp = true;

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::InvalidToken(format!("Token validation failed: {}", e)),
    })?;

    Ok(token_data.claims)
}

/// Issues a new session token for a user
///
/// Signs a one-hour token and appends it to the user's session list so it
/// can later be revoked server-side. Returns the token string.
pub async fn issue(pool: &PgPool, user_id: Uuid, secret: &str) -> Result<String, TokenError> {
    let token = create_token(&Claims::new(user_id), secret)?;
    Session::insert(pool, user_id, &token).await?;
    tracing::debug!(%user_id, "Session token issued");
    Ok(token)
}

/// Revokes exactly one session token (logout)
///
/// Removes the matching session list entry. Other tokens issued to the
/// same user remain valid.
pub async fn revoke(pool: &PgPool, user_id: Uuid, token: &str) -> Result<(), TokenError> {
    Session::delete_one(pool, user_id, token).await?;
    tracing::debug!(%user_id, "Session token revoked");
    Ok(())
}

/// Revokes every session token issued to a user (logout-all)
pub async fn revoke_all(pool: &PgPool, user_id: Uuid) -> Result<(), TokenError> {
    let removed = Session::delete_all(pool, user_id).await?;
    tracing::debug!(%user_id, removed, "All session tokens revoked");
    Ok(())
}

/// Checks that a token is still present in the user's session list
///
/// A signed, unexpired token that fails this check has been revoked.
pub async fn is_member(pool: &PgPool, user_id: Uuid, token: &str) -> Result<bool, TokenError> {
    Ok(Session::exists(pool, user_id, token).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    #[test]
    fn test_claims_have_one_hour_expiry() {
        let claims = Claims::new(Uuid::new_v4());

        let lifetime = claims.exp - claims.iat;
        assert_eq!(lifetime, TOKEN_TTL_SECONDS);
        assert!(!claims.is_expired());
    }

    #[test]
    fn test_create_and_validate_token() {
        let user_id = Uuid::new_v4();

        let token = create_token(&Claims::new(user_id), SECRET).expect("Should create token");
        let validated = validate_token(&token, SECRET).expect("Should validate token");

        assert_eq!(validated.sub, user_id);
        assert_eq!(validated.iss, "taskdeck");
    }

    #[test]
    fn test_validate_with_wrong_secret() {
        let token = create_token(&Claims::new(Uuid::new_v4()), SECRET).unwrap();

        let result = validate_token(&token, "wrong-secret-key-also-32-bytes-long!");
        assert!(matches!(result, Err(TokenError::InvalidToken(_))));
    }

    #[test]
    fn test_validate_expired_token() {
        let claims = Claims::with_expiry(Uuid::new_v4(), Duration::seconds(-7200));
        assert!(claims.is_expired());

        let token = create_token(&claims, SECRET).unwrap();
        let result = validate_token(&token, SECRET);

        assert!(matches!(result, Err(TokenError::Expired)));
    }

    #[test]
    fn test_validate_garbage_token() {
        let result = validate_token("not-a-token", SECRET);
        assert!(matches!(result, Err(TokenError::InvalidToken(_))));
    }

    #[test]
    fn test_tokens_are_distinct_per_issuance() {
        let user_id = Uuid::new_v4();

        let a = create_token(&Claims::with_expiry(user_id, Duration::seconds(3600)), SECRET).unwrap();
        let b = create_token(&Claims::with_expiry(user_id, Duration::seconds(3601)), SECRET).unwrap();

        // Different expiries produce different token strings, so each login
        // session can be revoked independently.
        assert_ne!(a, b);
    }
}
