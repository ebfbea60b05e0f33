mod handler;
mod model;

use axum::{
    Router,
    routing::{get, post},
};

use crate::AppState;

pub use handler::{login, register, verify_email};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/{user_id}/verify/{token}", get(verify_email))
}
