use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// Proxies the configured third-party users endpoint. Never fails: any
/// problem upstream is answered with a fixed list.
pub async fn external_users(State(state): State<AppState>) -> Json<Value> {
    let url = &state.config.external_users_url;
    match fetch_users(&state.http, url).await {
        Ok(users) => Json(users),
        Err(err) => {
            tracing::warn!(%url, error = %err, "external users unavailable, serving fallback list");
            Json(fallback_users())
        }
    }
}

async fn fetch_users(client: &reqwest::Client, url: &str) -> Result<Value, reqwest::Error> {
    client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .json::<Value>()
        .await
}

pub fn fallback_users() -> Value {
    json!([
        { "id": 1, "name": "Leanne Graham", "username": "Bret", "email": "Sincere@april.biz" },
        { "id": 2, "name": "Ervin Howell", "username": "Antonette", "email": "Shanna@melissa.tv" },
        { "id": 3, "name": "Clementine Bauch", "username": "Samantha", "email": "Nathan@yesenia.net" }
    ])
}
