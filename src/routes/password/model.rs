use serde::Deserialize;
use validator::{Validate, ValidationErrors};

use crate::routes::{Sanitize, field_error, trim_in_place};
use crate::utils::{has_dotted_domain, is_strong_password};

#[derive(Debug, Deserialize, Validate)]
pub struct ResetLinkRequest {
    #[serde(default)]
    #[validate(length(min = 3, max = 100, message = "Email must be between 3 and 100 characters"))]
    #[validate(email(message = "Email must be a valid format (e.g., user@example.com)"))]
    pub email: String,
}

impl Sanitize for ResetLinkRequest {
    fn sanitize(&mut self) {
        trim_in_place(&mut self.email);
    }

    fn check(&self, errors: &mut ValidationErrors) {
        let flagged = errors.field_errors().contains_key("email");
        if !flagged && !self.email.is_empty() && !has_dotted_domain(&self.email) {
            field_error(
                errors,
                "email",
                "pattern",
                "Email must be a valid format (e.g., user@example.com)",
            );
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct NewPasswordRequest {
    #[serde(default)]
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

impl Sanitize for NewPasswordRequest {
    fn sanitize(&mut self) {
        trim_in_place(&mut self.password);
    }

    fn check(&self, errors: &mut ValidationErrors) {
        if self.password.len() >= 6 && !is_strong_password(&self.password) {
            field_error(
                errors,
                "password",
                "pattern",
                "Password must include at least one number and one special character",
            );
        }
    }
}
