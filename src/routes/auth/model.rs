use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors};

use crate::models::PublicUser;
use crate::routes::{Sanitize, field_error, trim_in_place};
use crate::services::auth::Session;
use crate::utils::{has_dotted_domain, is_strong_password};

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[serde(default)]
    #[validate(length(min = 2, max = 200, message = "Username must be between 2 and 200 characters"))]
    pub username: String,
    #[serde(default)]
    #[validate(length(min = 3, max = 100, message = "Email must be between 3 and 100 characters"))]
    #[validate(email(message = "Email must be a valid format (e.g., user@example.com)"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

impl Sanitize for RegisterRequest {
    fn sanitize(&mut self) {
        trim_in_place(&mut self.username);
        trim_in_place(&mut self.email);
        trim_in_place(&mut self.password);
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

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(length(min = 3, max = 100, message = "Email must be between 3 and 100 characters"))]
    #[validate(email(message = "Email must be a valid format (e.g., user@example.com)"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

impl Sanitize for LoginRequest {
    fn sanitize(&mut self) {
        trim_in_place(&mut self.email);
        trim_in_place(&mut self.password);
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

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: PublicUser,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: Session,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::routes::validated;

    #[test]
    fn register_collects_field_errors() {
        let req = RegisterRequest {
            username: " a ".into(),
            email: "not-an-email".into(),
            password: "simplepass".into(),
        };

        match validated(req) {
            Err(AppError::Validation { errors, .. }) => {
                assert!(errors.contains_key("username"));
                assert_eq!(
                    errors["email"],
                    "Email must be a valid format (e.g., user@example.com)"
                );
                assert_eq!(
                    errors["password"],
                    "Password must include at least one number and one special character"
                );
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn register_trims_before_validating() {
        let req = RegisterRequest {
            username: "  writer ".into(),
            email: " writer@blog.io ".into(),
            password: "secret1!".into(),
        };
        let req = validated(req).unwrap();
        assert_eq!(req.username, "writer");
        assert_eq!(req.email, "writer@blog.io");
    }

    #[test]
    fn login_email_needs_dotted_domain() {
        for email in ["writer@localhost", "a@b@x.com", "wri ter@blog.io"] {
            let req = LoginRequest {
                email: email.into(),
                password: "secret1!".into(),
            };
            match validated(req) {
                Err(AppError::Validation { errors, .. }) => assert_eq!(
                    errors["email"],
                    "Email must be a valid format (e.g., user@example.com)"
                ),
                other => panic!("{email}: unexpected {:?}", other),
            }
        }
    }
}
