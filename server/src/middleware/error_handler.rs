//! Terminal error stage.
//!
//! `classify` decides status and body for a failed request; the
//! `error_handler` middleware logs the failure and, outside production,
//! re-renders the body with the failure's source chain.

use std::error::Error as StdError;

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};

use crate::error::AppError;
use crate::state::AppState;

pub const GENERIC_MESSAGE: &str = "internal server error";

#[derive(Clone, Debug)]
pub struct ErrorReport {
    pub status: StatusCode,
    pub body: Value,
    /// Source chain of an unclassified failure. `None` for the classified
    /// client errors, which never expose one.
    pub stack: Option<Vec<String>>,
}

impl ErrorReport {
    pub fn render(&self, production: bool) -> Response {
        let mut body = self.body.clone();
        if let (Some(stack), Value::Object(map)) = (&self.stack, &mut body) {
            let stack = if production { Value::Null } else { json!(stack) };
            map.insert("stack".to_string(), stack);
        }
        (self.status, Json(body)).into_response()
    }

    fn summary(&self) -> String {
        self.body
            .get("message")
            .or_else(|| self.body.get("error"))
            .and_then(Value::as_str)
            .unwrap_or(GENERIC_MESSAGE)
            .to_string()
    }
}

/// Maps a failure to its response. The first matching rule wins.
pub fn classify(err: &AppError) -> ErrorReport {
    match err {
        AppError::Validation(violations) => ErrorReport {
            status: StatusCode::BAD_REQUEST,
            body: json!({
                "error": "validation failed",
                "messages": violations.iter().map(|v| v.message.as_str()).collect::<Vec<_>>(),
            }),
            stack: None,
        },
        AppError::Duplicate { .. } => ErrorReport {
            status: StatusCode::BAD_REQUEST,
            body: json!({
                "error": "duplicate data",
                "message": "data already exists",
            }),
            stack: None,
        },
        AppError::Cast { field, value } => ErrorReport {
            status: StatusCode::BAD_REQUEST,
            body: json!({
                "error": "invalid data format",
                "message": format!("invalid {}: {}", field, value),
            }),
            stack: None,
        },
        other => {
            let message = other.to_string();
            let message = if message.is_empty() {
                GENERIC_MESSAGE.to_string()
            } else {
                message
            };
            ErrorReport {
                status: other
                    .declared_status()
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                body: json!({ "error": message }),
                stack: Some(source_chain(other)),
            }
        }
    }
}

fn source_chain(err: &(dyn StdError + 'static)) -> Vec<String> {
    std::iter::successors(Some(err), |&e| e.source())
        .map(|e| e.to_string())
        .collect()
}

pub async fn error_handler(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let response = next.run(req).await;

    let Some(report) = response.extensions().get::<ErrorReport>().cloned() else {
        return response;
    };

    tracing::error!(
        %method,
        %uri,
        status = report.status.as_u16(),
        error = %report.summary(),
        stack = ?report.stack,
        "request failed"
    );

    let production = state.config.environment.is_production();
    if production {
        response
    } else {
        report.render(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FieldViolation;
    use crate::store::StoreError;

    #[test]
    fn validation_lists_each_message() {
        let report = classify(&AppError::Validation(vec![
            FieldViolation::new("title", "title is required"),
            FieldViolation::new("content", "content must be at least 10 characters"),
        ]));
        assert_eq!(report.status, StatusCode::BAD_REQUEST);
        assert_eq!(report.body["error"], "validation failed");
        assert_eq!(
            report.body["messages"],
            json!(["title is required", "content must be at least 10 characters"])
        );
        assert!(report.stack.is_none());
    }

    #[test]
    fn duplicate_and_cast_are_client_errors() {
        let dup = classify(&AppError::Duplicate { field: "email" });
        assert_eq!(dup.status, StatusCode::BAD_REQUEST);
        assert_eq!(dup.body["error"], "duplicate data");

        let cast = classify(&AppError::Cast {
            field: "id".into(),
            value: "abc".into(),
        });
        assert_eq!(cast.status, StatusCode::BAD_REQUEST);
        assert_eq!(cast.body["message"], "invalid id: abc");
    }

    #[test]
    fn declared_status_is_honoured() {
        let report = classify(&AppError::Rejected {
            status: StatusCode::UNSUPPORTED_MEDIA_TYPE,
            message: "Expected request with `Content-Type: application/json`".into(),
        });
        assert_eq!(report.status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(
            report.body["error"],
            "Expected request with `Content-Type: application/json`"
        );
    }

    #[test]
    fn unclassified_failures_are_500_with_a_chain() {
        let report = classify(&AppError::Store(StoreError::Database(sqlx::Error::PoolTimedOut)));
        assert_eq!(report.status, StatusCode::INTERNAL_SERVER_ERROR);
        let stack = report.stack.as_ref().unwrap();
        assert!(stack.len() >= 2, "expected error and its source, got {:?}", stack);
        assert!(stack[0].starts_with("database error"));
    }

    #[tokio::test]
    async fn stack_is_hidden_in_production() {
        use http_body_util::BodyExt;

        let report = classify(&AppError::Rejected {
            status: StatusCode::BAD_REQUEST,
            message: "bad body".into(),
        });

        let body = report.render(true).into_body().collect().await.unwrap().to_bytes();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["stack"], Value::Null);

        let body = report.render(false).into_body().collect().await.unwrap().to_bytes();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["stack"], json!(["bad body"]));
    }
}
