/// Session model: the per-user token list
///
/// Each row records one issued session token. Presence of a row is the
/// server-side half of token validity; deleting rows revokes tokens
/// independently of their embedded expiry.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE sessions (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     token TEXT NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// One issued session token
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Session {
    /// Unique row id
    pub id: Uuid,

    /// Owning user
    pub user_id: Uuid,

    /// The exact signed token string
    pub token: String,

    /// When the token was issued
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Appends a token to a user's session list
    pub async fn insert(pool: &PgPool, user_id: Uuid, token: &str) -> Result<Self, sqlx::Error> {
        let session = sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO sessions (user_id, token)
            VALUES ($1, $2)
            RETURNING id, user_id, token, created_at
            "#,
        )
        .bind(user_id)
        .bind(token)
        .fetch_one(pool)
        .await?;

        Ok(session)
    }

    /// Removes exactly one matching token from a user's session list
    ///
    /// Returns true if an entry was removed. Other tokens issued to the
    /// same user are untouched.
    pub async fn delete_one(pool: &PgPool, user_id: Uuid, token: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM sessions
            WHERE id = (
                SELECT id FROM sessions
                WHERE user_id = $1 AND token = $2
                LIMIT 1
            )
            "#,
        )
        .bind(user_id)
        .bind(token)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Clears a user's entire session list
    ///
    /// Returns the number of tokens revoked.
    pub async fn delete_all(pool: &PgPool, user_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE user_id = $1")
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Checks whether a token is still in a user's session list
    pub async fn exists(pool: &PgPool, user_id: Uuid, token: &str) -> Result<bool, sqlx::Error> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM sessions WHERE user_id = $1 AND token = $2)",
        )
        .bind(user_id)
        .bind(token)
        .fetch_one(pool)
        .await?;

        Ok(exists)
    }
}
