use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use uuid::Uuid;

use crate::database::TokenRepository;
use crate::error::{AppError, AppResult};
use crate::models::VerificationToken;
use crate::utils::generate_verification_token;

/// 一次性令牌：签发、轮换、校验、消费
pub struct TokenStore {
    tokens: Arc<dyn TokenRepository>,
    ttl: Duration,
}

impl TokenStore {
    pub fn new(tokens: Arc<dyn TokenRepository>, ttl: Duration) -> Self {
        Self { tokens, ttl }
    }

    fn expires_at(&self) -> chrono::DateTime<Utc> {
        Utc::now() + chrono::Duration::seconds(self.ttl.as_secs() as i64)
    }

    pub async fn issue(&self, user_id: Uuid) -> AppResult<VerificationToken> {
        let raw = generate_verification_token();
        Ok(self.tokens.insert(user_id, &raw, self.expires_at()).await?)
    }

    /// 已有令牌则覆盖其值并刷新过期时间
    pub async fn reissue_or_rotate(&self, user_id: Uuid) -> AppResult<VerificationToken> {
        let raw = generate_verification_token();
        Ok(self.tokens.rotate(user_id, &raw, self.expires_at()).await?)
    }

    /// 不消费，过期令牌视为不存在
    pub async fn find(&self, user_id: Uuid, raw: &str) -> AppResult<Option<VerificationToken>> {
        let now = Utc::now();
        let found = self
            .tokens
            .list_for_user(user_id)
            .await?
            .into_iter()
            .find(|t| !t.is_expired(now) && t.matches(user_id, raw.trim()));

        Ok(found)
    }

    pub async fn consume(&self, user_id: Uuid, raw: &str) -> AppResult<()> {
        let token = self.find(user_id, raw).await?.ok_or(AppError::TokenInvalid)?;

        // 并发消费时只有一个请求能删除成功
        if !self.tokens.delete(token.id).await? {
            return Err(AppError::TokenInvalid);
        }
        Ok(())
    }

    pub async fn purge_expired(&self) -> AppResult<u64> {
        Ok(self.tokens.purge_expired(Utc::now()).await?)
    }
}
