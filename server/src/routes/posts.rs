use axum::{routing::get, Router};

use crate::handlers::post_handlers::{
    create_post, delete_post, get_post, list_posts, list_posts_by_author, list_posts_by_tag,
    update_post,
};
use crate::state::AppState;

pub fn post_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_posts).post(create_post))
        .route("/user/{userId}", get(list_posts_by_author))
        .route("/tag/{tag}", get(list_posts_by_tag))
        .route("/{id}", get(get_post).put(update_post).delete(delete_post))
        .with_state(state)
}
