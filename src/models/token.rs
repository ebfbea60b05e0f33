use chrono::{DateTime, Utc};
use sqlx::FromRow;
use subtle::ConstantTimeEq;
use uuid::Uuid;

/// 邮箱验证 / 重置密码共用的一次性令牌
#[derive(Debug, Clone, FromRow)]
pub struct VerificationToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl VerificationToken {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    pub fn matches(&self, user_id: Uuid, raw: &str) -> bool {
        let same_token: bool = self.token.as_bytes().ct_eq(raw.as_bytes()).into();
        self.user_id == user_id && same_token
    }
}
