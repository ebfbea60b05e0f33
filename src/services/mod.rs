// 业务服务层
// 处理函数只负责解析请求，鉴权、校验之外的业务规则都在这里

pub mod auth;
pub mod categories;
pub mod comments;
pub mod credentials;
pub mod password;
pub mod posts;
pub mod tokens;
pub mod users;
mod views;

use std::sync::Arc;

use futures_util::future::join_all;

pub use credentials::{CredentialStore, normalize_email};
pub use tokens::TokenStore;
pub use views::{CategoryView, CommentView, PostDetail, PostView, ProfileView, Timestamps};

use crate::infrastructure::MediaHost;

/// 尽力删除图床图片，失败只记录日志
pub(crate) async fn discard_images(media: &Arc<dyn MediaHost>, public_ids: Vec<String>) -> usize {
    let results = join_all(public_ids.iter().map(|id| media.delete_image(id))).await;

    let mut deleted = 0;
    for (id, result) in public_ids.iter().zip(results) {
        match result {
            Ok(()) => deleted += 1,
            Err(e) => tracing::warn!("Failed to delete hosted image {}: {}", id, e),
        }
    }
    deleted
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use uuid::Uuid;

    use crate::AppState;
    use crate::config::Config;
    use crate::database::{MemoryStore, Repositories, StoreError, TokenRepository};
    use crate::models::VerificationToken;
    use crate::infrastructure::testing::{FakeMediaHost, RecordingMailer};
    use crate::middleware::Caller;
    use crate::models::User;

    pub struct Harness {
        pub state: AppState,
        pub mailer: Arc<RecordingMailer>,
        pub media: Arc<FakeMediaHost>,
    }

    pub fn harness() -> Harness {
        let mailer = Arc::new(RecordingMailer::new());
        let media = Arc::new(FakeMediaHost::new());
        let state = AppState::new(
            Config::for_tests(),
            Repositories::in_memory(),
            mailer.clone(),
            media.clone(),
        );
        Harness {
            state,
            mailer,
            media,
        }
    }

    /// 令牌一被列出就被删除，模拟另一个请求抢先消费
    pub struct RacingTokens(pub MemoryStore);

    #[async_trait]
    impl TokenRepository for RacingTokens {
        async fn insert(
            &self,
            user_id: Uuid,
            token: &str,
            expires_at: DateTime<Utc>,
        ) -> Result<VerificationToken, StoreError> {
            self.0.insert(user_id, token, expires_at).await
        }

        async fn rotate(
            &self,
            user_id: Uuid,
            token: &str,
            expires_at: DateTime<Utc>,
        ) -> Result<VerificationToken, StoreError> {
            self.0.rotate(user_id, token, expires_at).await
        }

        async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<VerificationToken>, StoreError> {
            let tokens = self.0.list_for_user(user_id).await?;
            for token in &tokens {
                self.0.delete(token.id).await?;
            }
            Ok(tokens)
        }

        async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
            self.0.delete(id).await
        }

        async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
            self.0.purge_expired(now).await
        }
    }

    pub fn racing_harness() -> Harness {
        let mut h = harness();
        h.state.repos.tokens = Arc::new(RacingTokens(MemoryStore::new()));
        h
    }

    /// 已验证的普通用户
    pub async fn verified_user(state: &AppState, email: &str) -> User {
        let user = state
            .credentials()
            .create("member", email, "secret1!")
            .await
            .unwrap();
        state.repos.users.set_verified(user.id).await.unwrap();
        state.repos.users.find_by_id(user.id).await.unwrap().unwrap()
    }

    pub fn caller(user: &User) -> Caller {
        Caller::from_user(user)
    }

    pub fn admin(user: &User) -> Caller {
        Caller {
            is_admin: true,
            ..Caller::from_user(user)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::testing::FakeMediaHost;

    #[tokio::test]
    async fn discard_swallows_failures() {
        let fake = Arc::new(FakeMediaHost::new());
        fake.fail_deletes(true);
        let media: Arc<dyn MediaHost> = fake.clone();

        let deleted = discard_images(&media, vec!["a".into(), "b".into()]).await;
        assert_eq!(deleted, 0);
        assert_eq!(fake.deleted(), vec!["a".to_string(), "b".to_string()]);
    }
}
