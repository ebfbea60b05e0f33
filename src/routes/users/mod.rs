mod handler;
mod model;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post, put},
};

use crate::{AppState, routes::MAX_IMAGE_BYTES};

pub use handler::{
    count_users, delete_user, get_profile, list_users, my_profile, toggle_block, update_profile,
    upload_profile_image, verify_user,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users))
        .route("/count", get(count_users))
        .route("/profile", get(my_profile))
        .route(
            "/profile/{id}",
            get(get_profile).put(update_profile).delete(delete_user),
        )
        .route("/profile/image", post(upload_profile_image))
        .route("/block/{id}", put(toggle_block))
        .route("/verify/{id}", put(verify_user))
        .layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES + 64 * 1024))
}
