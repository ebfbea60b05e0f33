mod handler;
mod model;

use axum::{Router, routing::get};

use crate::AppState;

pub use handler::{create_category, delete_category, get_category, list_categories, update_category};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route(
            "/{id}",
            get(get_category).put(update_category).delete(delete_category),
        )
}
