pub mod posts;
pub mod users;

use axum::{
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::get,
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::handlers::site_handlers::{api_directory, landing_page, route_not_found};
use crate::middleware::{error_handler::error_handler, request_logger::request_logger};
use crate::state::AppState;
use posts::post_routes;
use users::user_routes;

/// The whole application. Each resource is reachable under `/api/<name>`
/// and `/<name>`.
pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        .route("/", get(landing_page))
        .route("/api", get(api_directory))
        .nest("/api/users", user_routes(state.clone()))
        .nest("/users", user_routes(state.clone()))
        .nest("/api/posts", post_routes(state.clone()))
        .nest("/posts", post_routes(state.clone()))
        .fallback(route_not_found)
        .layer(from_fn_with_state(state, error_handler))
        .layer(from_fn(request_logger))
        .layer(cors)
}

fn cors_layer(config: &Config) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE]);

    match config.client_url.as_deref() {
        None => cors.allow_origin(Any),
        Some(origin) => match origin.parse::<HeaderValue>() {
            Ok(origin) => cors.allow_origin(origin),
            Err(_) => {
                tracing::warn!(%origin, "CLIENT_URL is not a valid origin, allowing any origin");
                cors.allow_origin(Any)
            }
        },
    }
}
