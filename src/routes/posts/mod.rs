mod handler;
mod model;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, put},
};

use crate::{AppState, routes::MAX_IMAGE_BYTES};

pub use handler::{count_posts, create_post, delete_post, get_post, list_posts, toggle_like, update_post};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_posts).post(create_post))
        .route("/count", get(count_posts))
        .route("/{id}", get(get_post).put(update_post).delete(delete_post))
        .route("/like/{id}", put(toggle_like))
        // 为表单中的文本字段留出余量
        .layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES + 64 * 1024))
}
