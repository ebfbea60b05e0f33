mod handler;
mod model;

use axum::{
    Router,
    routing::{get, post},
};

use crate::AppState;

pub use handler::{check_token, request_reset, reset_password};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/link", post(request_reset))
        .route("/check/{user_id}/{token}", get(check_token))
        .route("/reset/{user_id}/{token}", post(reset_password))
}
