use axum::{routing::get, Router};

use crate::handlers::external_handler::external_users;
use crate::handlers::user_handlers::{create_user, delete_user, get_user, list_users, update_user};
use crate::state::AppState;

pub fn user_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/external/users", get(external_users))
        .route("/{id}", get(get_user).put(update_user).delete(delete_user))
        .with_state(state)
}
