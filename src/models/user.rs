use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use super::Image;

pub const DEFAULT_PROFILE_IMAGE_URL: &str = "https://media.istockphoto.com/id/1433039224/photo/blue-user-3d-icon-person-profile-concept-isolated-on-white-background-with-social-member.jpg?s=612x612&w=0&k=20&c=nrJ6RZ8Ft4vHECnRjBGBK_9XJ7f_lsi3dJjj_uAlkT8=";

/// 用户记录，密码只以 bcrypt 哈希形式存在
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub is_admin: bool,
    pub is_blocked: bool,
    pub is_account_verified: bool,
    pub profile_image_url: String,
    pub profile_image_id: Option<String>,
    pub bio: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn profile_image(&self) -> Image {
        Image {
            url: self.profile_image_url.clone(),
            public_id: self.profile_image_id.clone(),
        }
    }

    /// 去掉密码哈希等内部字段
    pub fn sanitized(&self) -> PublicUser {
        PublicUser {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            is_admin: self.is_admin,
            is_blocked: self.is_blocked,
            is_account_verified: self.is_account_verified,
            profile_image: self.profile_image(),
            bio: self.bio.clone(),
        }
    }

    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            profile_image: self.profile_image(),
        }
    }
}

/// 对外展示的用户信息
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub is_admin: bool,
    pub is_blocked: bool,
    pub is_account_verified: bool,
    pub profile_image: Image,
    pub bio: String,
}

/// 嵌入在文章、评论中的作者信息
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub profile_image: Image,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// 部分更新，None 表示保持原值
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub username: Option<String>,
    pub bio: Option<String>,
    pub password_hash: Option<String>,
}
