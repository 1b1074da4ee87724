use axum::{http::StatusCode, response::Html, Json};
use serde_json::{json, Value};

const INDEX_TEMPLATE: &str = include_str!("../../templates/index.html");

pub const API_ENDPOINTS: [&str; 4] = ["/api/users", "/api/posts", "/users", "/posts"];

pub async fn api_directory() -> Json<Value> {
    Json(json!({
        "message": "Welcome to the API",
        "endpoints": API_ENDPOINTS,
    }))
}

pub async fn landing_page() -> Html<String> {
    Html(render_index(
        "Practice server",
        "Welcome to the dependency update practice server!",
    ))
}

pub async fn route_not_found() -> (StatusCode, Json<Value>) {
    (StatusCode::NOT_FOUND, Json(json!({ "message": "No route found" })))
}

fn render_index(title: &str, message: &str) -> String {
    INDEX_TEMPLATE
        .replace("{{title}}", &html_escape::encode_text(title))
        .replace("{{message}}", &html_escape::encode_text(message))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_substitutes_and_escapes() {
        let html = render_index("<b>t</b>", "a & b");
        assert!(html.contains("&lt;b&gt;t&lt;/b&gt;"));
        assert!(html.contains("a &amp; b"));
        assert!(!html.contains("{{"));
    }
}
