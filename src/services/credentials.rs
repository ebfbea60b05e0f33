use std::sync::Arc;

use uuid::Uuid;

use crate::database::UserRepository;
use crate::error::AppResult;
use crate::models::{NewUser, User, UserUpdate};
use crate::utils::{hash_password, verify_password};

/// 邮箱统一去空白并转小写后再存储和查询
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// 用户凭证：创建账号、校验密码、更换密码
pub struct CredentialStore {
    users: Arc<dyn UserRepository>,
    cost: u32,
}

impl CredentialStore {
    pub fn new(users: Arc<dyn UserRepository>, cost: u32) -> Self {
        Self { users, cost }
    }

    /// 邮箱已注册时返回 Duplicate
    pub async fn create(&self, username: &str, email: &str, password: &str) -> AppResult<User> {
        let email = normalize_email(email);
        let password_hash = hash_password(password, self.cost)?;

        let user = self
            .users
            .create(NewUser {
                username: username.trim().to_string(),
                email,
                password_hash,
            })
            .await?;

        Ok(user)
    }

    /// 邮箱不存在与密码错误同样返回 None
    pub async fn verify_credentials(&self, email: &str, password: &str) -> AppResult<Option<User>> {
        let Some(user) = self.users.find_by_email(&normalize_email(email)).await? else {
            return Ok(None);
        };

        if verify_password(password, &user.password_hash)? {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }

    pub async fn set_password(&self, user_id: Uuid, password: &str) -> AppResult<Option<User>> {
        let password_hash = hash_password(password, self.cost)?;
        let user = self
            .users
            .update(
                user_id,
                UserUpdate {
                    password_hash: Some(password_hash),
                    ..Default::default()
                },
            )
            .await?;

        Ok(user)
    }

    pub fn hash(&self, password: &str) -> AppResult<String> {
        Ok(hash_password(password, self.cost)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use crate::error::AppError;

    fn store() -> CredentialStore {
        CredentialStore::new(Arc::new(MemoryStore::new()), 4)
    }

    #[tokio::test]
    async fn duplicate_email_variants_are_rejected() {
        let credentials = store();
        credentials
            .create("writer", "writer@blog.io", "secret1!")
            .await
            .unwrap();

        for email in ["writer@blog.io", "  Writer@Blog.IO "] {
            let err = credentials
                .create("other", email, "secret1!")
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::Duplicate(_)), "{email}");
        }
    }

    #[tokio::test]
    async fn password_is_hashed_and_checked() {
        let credentials = store();
        let user = credentials
            .create("writer", "writer@blog.io", "secret1!")
            .await
            .unwrap();
        assert_ne!(user.password_hash, "secret1!");

        let found = credentials
            .verify_credentials("WRITER@blog.io", "secret1!")
            .await
            .unwrap();
        assert_eq!(found.map(|u| u.id), Some(user.id));

        assert!(
            credentials
                .verify_credentials("writer@blog.io", "wrong1!")
                .await
                .unwrap()
                .is_none()
        );
        assert!(
            credentials
                .verify_credentials("nobody@blog.io", "secret1!")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn set_password_replaces_hash() {
        let credentials = store();
        let user = credentials
            .create("writer", "writer@blog.io", "secret1!")
            .await
            .unwrap();

        credentials.set_password(user.id, "changed2@").await.unwrap();
        assert!(
            credentials
                .verify_credentials("writer@blog.io", "changed2@")
                .await
                .unwrap()
                .is_some()
        );
    }
}
