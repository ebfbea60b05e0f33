use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors};

use crate::models::{Image, PublicUser};
use crate::routes::{Paging, Sanitize, field_error, trim_option};
use crate::services::ProfileView;
use crate::services::users::ProfileChanges;
use crate::utils::is_strong_password;

#[derive(Debug, Deserialize)]
pub struct UserListQuery {
    pub page: Option<String>,
}

/// 其余字段（邮箱、角色、状态）在反序列化时直接忽略
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    #[validate(length(min = 2, max = 200, message = "Username must be between 2 and 200 characters"))]
    pub username: Option<String>,
    #[serde(default)]
    #[validate(length(max = 300, message = "Bio cannot exceed 300 characters"))]
    pub bio: Option<String>,
    #[serde(default)]
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: Option<String>,
}

impl Sanitize for UpdateProfileRequest {
    fn sanitize(&mut self) {
        trim_option(&mut self.username);
        trim_option(&mut self.bio);
        trim_option(&mut self.password);
    }

    fn check(&self, errors: &mut ValidationErrors) {
        if self.username.is_none() && self.bio.is_none() && self.password.is_none() {
            field_error(
                errors,
                "body",
                "required",
                "At least one of username, bio or password is required",
            );
        }
        if let Some(password) = self.password.as_deref() {
            if password.len() >= 6 && !is_strong_password(password) {
                field_error(
                    errors,
                    "password",
                    "pattern",
                    "Password must include at least one number and one special character",
                );
            }
        }
    }
}

impl From<UpdateProfileRequest> for ProfileChanges {
    fn from(req: UpdateProfileRequest) -> Self {
        Self {
            username: req.username,
            bio: req.bio,
            password: req.password,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserListResponse {
    #[serde(flatten)]
    pub paging: Paging,
    pub users: Vec<PublicUser>,
}

#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: u64,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub user: ProfileView,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: PublicUser,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileImageResponse {
    pub profile_image: Image,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockResponse {
    pub is_blocked: bool,
}
