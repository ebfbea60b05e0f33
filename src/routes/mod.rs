// HTTP 路由：按资源分组，处理函数只做解析和响应组装

pub mod auth;
pub mod categories;
pub mod comments;
pub mod password;
pub mod posts;
pub mod users;

use std::borrow::Cow;

use axum::{
    Json, Router,
    extract::{FromRequest, Multipart, Request},
};
use serde::{Serialize, de::DeserializeOwned};
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    AppState,
    error::{AppError, AppResult},
    models::Page,
};

/// 上传图片大小上限 5MB
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// 校验前的清洗与 derive 无法表达的额外检查
pub trait Sanitize {
    fn sanitize(&mut self) {}
    fn check(&self, _errors: &mut ValidationErrors) {}
}

pub(crate) fn field_error(
    errors: &mut ValidationErrors,
    field: &'static str,
    code: &'static str,
    message: &'static str,
) {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    errors.add(field, error);
}

pub(crate) fn trim_in_place(value: &mut String) {
    let trimmed = value.trim();
    if trimmed.len() != value.len() {
        *value = trimmed.to_string();
    }
}

pub(crate) fn trim_option(value: &mut Option<String>) {
    if let Some(v) = value.as_mut() {
        trim_in_place(v);
    }
}

pub(crate) fn validated<T: Validate + Sanitize>(mut value: T) -> AppResult<T> {
    value.sanitize();
    let mut errors = match value.validate() {
        Ok(()) => ValidationErrors::new(),
        Err(errors) => errors,
    };
    value.check(&mut errors);

    if errors.errors().is_empty() {
        Ok(value)
    } else {
        Err(errors.into())
    }
}

/// 反序列化后立即清洗并校验的 JSON 请求体
pub struct ValidJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned + Validate + Sanitize,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(ValidJson(validated(value)?))
    }
}

/// 路径中的ID必须是合法 UUID
pub(crate) fn parse_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::invalid_field("id", "Invalid ID"))
}

/// 宽松解析分页参数，非法值按默认处理
pub(crate) fn page_from(page: Option<&str>, limit: Option<&str>) -> Page {
    Page::new(
        page.and_then(|p| p.trim().parse().ok()),
        limit.and_then(|l| l.trim().parse().ok()),
    )
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Paging {
    pub page: u32,
    pub total_pages: u64,
    pub total_count: u64,
}

impl Paging {
    pub fn new(page: Page, total: u64) -> Self {
        Self {
            page: page.page,
            total_pages: page.total_pages(total),
            total_count: total,
        }
    }
}

/// 表单中的文本字段和一张可选图片
#[derive(Debug, Default)]
pub(crate) struct UploadForm {
    pub fields: std::collections::HashMap<String, String>,
    pub image: Option<Vec<u8>>,
}

impl UploadForm {
    pub fn text(&self, name: &str) -> Option<String> {
        self.fields.get(name).cloned()
    }
}

fn multipart_error(e: axum::extract::multipart::MultipartError) -> AppError {
    tracing::debug!("Rejected multipart body: {}", e);
    AppError::BadRequest("Invalid form data".into())
}

/// 读取 multipart 表单，图片字段名为 image，只接受 image/* 且不超过 5MB
pub(crate) async fn read_upload(mut multipart: Multipart) -> AppResult<UploadForm> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();

        if name == "image" {
            let is_image = field
                .content_type()
                .is_some_and(|ct| ct.starts_with("image/"));
            if !is_image {
                return Err(AppError::BadRequest("Only Images format allowed!".into()));
            }

            let bytes = field.bytes().await.map_err(multipart_error)?;
            if bytes.len() > MAX_IMAGE_BYTES {
                return Err(AppError::BadRequest("Image cannot exceed 5MB".into()));
            }
            form.image = Some(bytes.to_vec());
        } else {
            let value = field.text().await.map_err(multipart_error)?;
            form.fields.insert(name, value);
        }
    }

    Ok(form)
}

/// 组装全部路由，挂在 api_base_uri 之下
pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .nest("/auth", auth::routes())
        .nest("/password", password::routes())
        .nest("/users", users::routes())
        .nest("/posts", posts::routes())
        .nest("/comments", comments::routes())
        .nest("/categories", categories::routes());

    Router::new()
        .nest(&state.config.api_base_uri.clone(), api)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_id_reports_field_error() {
        assert!(parse_id(&Uuid::nil().to_string()).is_ok());
        match parse_id("65f0c0ffee") {
            Err(AppError::Validation { errors, .. }) => assert_eq!(errors["id"], "Invalid ID"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn page_parsing_is_lenient() {
        assert_eq!(page_from(Some("2"), Some("5")), Page { page: 2, limit: 5 });
        assert_eq!(page_from(Some("abc"), None), Page { page: 1, limit: 10 });
    }

    #[test]
    fn paging_counts_pages() {
        let paging = Paging::new(Page::new(Some(2), Some(10)), 21);
        let value = serde_json::to_value(paging).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"page": 2, "totalPages": 3, "totalCount": 21})
        );
    }
}
