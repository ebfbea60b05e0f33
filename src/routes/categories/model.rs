use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::routes::{Sanitize, trim_in_place};
use crate::services::CategoryView;

#[derive(Debug, Deserialize, Validate)]
pub struct CategoryRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 100, message = "Title must be between 1 and 100 characters"))]
    pub title: String,
}

impl Sanitize for CategoryRequest {
    fn sanitize(&mut self) {
        trim_in_place(&mut self.title);
    }
}

#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    pub category: CategoryView,
}

#[derive(Debug, Serialize)]
pub struct CategoryListResponse {
    pub categories: Vec<CategoryView>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::validated;

    #[test]
    fn blank_title_is_rejected() {
        let req: CategoryRequest = serde_json::from_str(r#"{"title": "   "}"#).unwrap();
        assert!(validated(req).is_err());

        let req: CategoryRequest = serde_json::from_str(r#"{"title": " Tech "}"#).unwrap();
        assert_eq!(validated(req).unwrap().title, "Tech");
    }
}
