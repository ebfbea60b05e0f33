use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::routes::{Paging, Sanitize, field_error, trim_in_place};
use crate::services::CommentView;

#[derive(Debug, Deserialize)]
pub struct CommentListQuery {
    pub post: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommentRequest {
    #[serde(default, alias = "postId")]
    pub post: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 500, message = "Text must be between 1 and 500 characters"))]
    pub text: String,
}

impl CreateCommentRequest {
    /// 校验通过后必定可解析
    pub fn post_id(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.post).ok()
    }
}

impl Sanitize for CreateCommentRequest {
    fn sanitize(&mut self) {
        trim_in_place(&mut self.post);
        trim_in_place(&mut self.text);
    }

    fn check(&self, errors: &mut ValidationErrors) {
        if self.post.is_empty() {
            field_error(errors, "post", "required", "Post ID is required");
        } else if self.post_id().is_none() {
            field_error(errors, "post", "invalid", "Invalid ID");
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCommentRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 500, message = "Text must be between 1 and 500 characters"))]
    pub text: String,
}

impl Sanitize for UpdateCommentRequest {
    fn sanitize(&mut self) {
        trim_in_place(&mut self.text);
    }
}

#[derive(Debug, Serialize)]
pub struct CommentResponse {
    pub comment: CommentView,
}

#[derive(Debug, Serialize)]
pub struct CommentListResponse {
    #[serde(flatten)]
    pub paging: Paging,
    pub comments: Vec<CommentView>,
}
