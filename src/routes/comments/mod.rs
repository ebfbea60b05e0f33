mod handler;
mod model;

use axum::{
    Router,
    routing::{get, put},
};

use crate::AppState;

pub use handler::{create_comment, delete_comment, get_comment, list_comments, toggle_like, update_comment};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_comments).post(create_comment))
        .route(
            "/{id}",
            get(get_comment).put(update_comment).delete(delete_comment),
        )
        .route("/like/{id}", put(toggle_like))
}
