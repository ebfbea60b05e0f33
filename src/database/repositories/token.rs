use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::{StoreError, TokenRepository};
use crate::models::VerificationToken;

pub struct PgTokenRepository {
    pool: PgPool,
}

impl PgTokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenRepository for PgTokenRepository {
    async fn insert(
        &self,
        user_id: Uuid,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<VerificationToken, StoreError> {
        let row = sqlx::query_as::<_, VerificationToken>(
            "INSERT INTO verification_tokens (id, user_id, token, expires_at)
             VALUES ($1, $2, $3, $4)
             RETURNING id, user_id, token, created_at, expires_at",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(token)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn rotate(
        &self,
        user_id: Uuid,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<VerificationToken, StoreError> {
        let rotated = sqlx::query_as::<_, VerificationToken>(
            "UPDATE verification_tokens
             SET token = $2, expires_at = $3, created_at = NOW()
             WHERE id = (
                 SELECT id FROM verification_tokens
                 WHERE user_id = $1
                 ORDER BY created_at
                 LIMIT 1
             )
             RETURNING id, user_id, token, created_at, expires_at",
        )
        .bind(user_id)
        .bind(token)
        .bind(expires_at)
        .fetch_optional(&self.pool)
        .await?;

        match rotated {
            Some(row) => Ok(row),
            None => self.insert(user_id, token, expires_at).await,
        }
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<VerificationToken>, StoreError> {
        let rows = sqlx::query_as::<_, VerificationToken>(
            "SELECT id, user_id, token, created_at, expires_at
             FROM verification_tokens
             WHERE user_id = $1
             ORDER BY created_at",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM verification_tokens WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM verification_tokens WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
