use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::Post;
use crate::routes::{Paging, Sanitize, UploadForm, trim_in_place, trim_option};
use crate::services::posts::{PostChanges, PostDraft};
use crate::services::{PostDetail, PostView};

#[derive(Debug, Deserialize)]
pub struct PostListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Validate)]
pub struct CreatePostForm {
    #[validate(length(min = 3, max = 100, message = "Title must be between 3 and 100 characters"))]
    pub title: String,
    #[validate(length(
        min = 10,
        max = 500,
        message = "Description must be between 10 and 500 characters"
    ))]
    pub description: String,
    #[validate(length(min = 1, max = 100, message = "Category is required and cannot exceed 100 characters"))]
    pub category: String,
}

impl CreatePostForm {
    pub fn from_upload(form: &UploadForm) -> Self {
        Self {
            title: form.text("title").unwrap_or_default(),
            description: form.text("description").unwrap_or_default(),
            category: form.text("category").unwrap_or_default(),
        }
    }
}

impl Sanitize for CreatePostForm {
    fn sanitize(&mut self) {
        trim_in_place(&mut self.title);
        trim_in_place(&mut self.description);
        trim_in_place(&mut self.category);
    }
}

impl From<CreatePostForm> for PostDraft {
    fn from(form: CreatePostForm) -> Self {
        Self {
            title: form.title,
            description: form.description,
            category: form.category,
        }
    }
}

#[derive(Debug, Validate)]
pub struct UpdatePostForm {
    #[validate(length(min = 3, max = 100, message = "Title must be between 3 and 100 characters"))]
    pub title: Option<String>,
    #[validate(length(
        min = 10,
        max = 500,
        message = "Description must be between 10 and 500 characters"
    ))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 100, message = "Category cannot be empty or exceed 100 characters"))]
    pub category: Option<String>,
}

impl UpdatePostForm {
    pub fn from_upload(form: &UploadForm) -> Self {
        Self {
            title: form.text("title"),
            description: form.text("description"),
            category: form.text("category"),
        }
    }
}

impl Sanitize for UpdatePostForm {
    fn sanitize(&mut self) {
        trim_option(&mut self.title);
        trim_option(&mut self.description);
        trim_option(&mut self.category);
    }
}

impl From<UpdatePostForm> for PostChanges {
    fn from(form: UpdatePostForm) -> Self {
        Self {
            title: form.title,
            description: form.description,
            category: form.category,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PostResponse {
    pub post: PostView,
}

#[derive(Debug, Serialize)]
pub struct PostDetailResponse {
    pub post: PostDetail,
}

#[derive(Debug, Serialize)]
pub struct DeletedPostResponse {
    pub post: Post,
}

#[derive(Debug, Serialize)]
pub struct PostListResponse {
    #[serde(flatten)]
    pub paging: Paging,
    pub posts: Vec<PostView>,
}

#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::routes::validated;

    fn upload(pairs: &[(&str, &str)]) -> UploadForm {
        UploadForm {
            fields: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            image: None,
        }
    }

    #[test]
    fn create_form_requires_all_fields() {
        let form = CreatePostForm::from_upload(&upload(&[("title", "Hi")]));
        match validated(form) {
            Err(AppError::Validation { errors, .. }) => {
                assert!(errors.contains_key("title"));
                assert!(errors.contains_key("description"));
                assert!(errors.contains_key("category"));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn update_form_only_checks_present_fields() {
        let form = UpdatePostForm::from_upload(&upload(&[("category", " Rust ")]));
        let form = validated(form).unwrap();
        assert_eq!(form.category.as_deref(), Some("Rust"));
        assert!(form.title.is_none());

        let form = UpdatePostForm::from_upload(&upload(&[("category", "   ")]));
        assert!(validated(form).is_err());
    }
}
