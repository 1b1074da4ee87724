//! Failures a handler can hand to the error pipeline.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::de::DeserializeOwned;
use serde_json::Value;
use serde_path_to_error::Segment;
use thiserror::Error;

use crate::middleware::error_handler::classify;
use crate::models::FieldViolation;
use crate::store::StoreError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation failed")]
    Validation(Vec<FieldViolation>),

    #[error("duplicate value for {field}")]
    Duplicate { field: &'static str },

    #[error("invalid {field}: {value}")]
    Cast { field: String, value: String },

    /// An extractor refused the request; carries the status it declared.
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },

    #[error(transparent)]
    Store(StoreError),
}

impl AppError {
    /// Turns a non-empty violation list into a validation failure.
    pub fn check(violations: Vec<FieldViolation>) -> AppResult<()> {
        if violations.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(violations))
        }
    }

    /// The status the failure itself asks for, if any.
    pub fn declared_status(&self) -> Option<StatusCode> {
        match self {
            AppError::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate { field } => AppError::Duplicate { field },
            StoreError::Cast { field, value } => AppError::Cast {
                field: field.to_string(),
                value,
            },
            other => AppError::Store(other),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

/// Decodes a JSON body into `T`. A field of the wrong type is a cast
/// failure naming the field and the offending value; syntax and content
/// type problems keep the status the extractor declared.
pub fn decode_body<T: DeserializeOwned>(
    payload: Result<Json<Value>, JsonRejection>,
) -> AppResult<T> {
    let Json(body) = payload?;
    serde_path_to_error::deserialize(&body).map_err(|err| {
        let path = err.path();
        let field = if path.iter().next().is_none() {
            "body".to_string()
        } else {
            path.to_string()
        };
        let value = match value_at(&body, path) {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => body.to_string(),
        };
        AppError::Cast { field, value }
    })
}

fn value_at<'a>(root: &'a Value, path: &serde_path_to_error::Path) -> Option<&'a Value> {
    path.iter().try_fold(root, |value, segment| match segment {
        Segment::Map { key } => value.get(key.as_str()),
        Segment::Seq { index } => value.get(*index),
        _ => None,
    })
}

impl IntoResponse for AppError {
    /// Renders the production-safe body and leaves the full report in the
    /// response extensions for [`crate::middleware::error_handler`].
    fn into_response(self) -> Response {
        let report = classify(&self);
        let mut response = report.render(true);
        response.extensions_mut().insert(report);
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_failures_keep_their_class() {
        let dup: AppError = StoreError::Duplicate { field: "email" }.into();
        assert!(matches!(dup, AppError::Duplicate { field: "email" }));

        let cast: AppError = StoreError::Cast {
            field: "id",
            value: "x".into(),
        }
        .into();
        assert_eq!(cast.to_string(), "invalid id: x");

        let db: AppError = StoreError::Database(sqlx::Error::PoolTimedOut).into();
        assert!(matches!(db, AppError::Store(_)));
        assert_eq!(db.declared_status(), None);
    }

    #[derive(Debug, serde::Deserialize)]
    struct Sample {
        #[allow(dead_code)]
        name: Option<String>,
        #[allow(dead_code)]
        tags: Option<Vec<String>>,
    }

    #[test]
    fn mistyped_fields_are_cast_failures() {
        let err = decode_body::<Sample>(Ok(Json(serde_json::json!({ "name": 123 })))).unwrap_err();
        match err {
            AppError::Cast { field, value } => {
                assert_eq!(field, "name");
                assert_eq!(value, "123");
            }
            other => panic!("expected cast failure, got {:?}", other),
        }

        let err = decode_body::<Sample>(Ok(Json(serde_json::json!({ "tags": ["ok", false] }))))
            .unwrap_err();
        assert_eq!(err.to_string(), "invalid tags[1]: false");

        let err = decode_body::<Sample>(Ok(Json(serde_json::json!("just text")))).unwrap_err();
        assert_eq!(err.to_string(), "invalid body: just text");
    }

    #[test]
    fn well_typed_bodies_decode() {
        let sample: Sample = decode_body(Ok(Json(serde_json::json!({ "name": "x" })))).unwrap();
        assert_eq!(sample.name.as_deref(), Some("x"));
    }

    #[test]
    fn check_passes_only_without_violations() {
        assert!(AppError::check(Vec::new()).is_ok());
        let err = AppError::check(vec![FieldViolation::new("title", "title is required")]);
        assert!(matches!(err, Err(AppError::Validation(v)) if v.len() == 1));
    }
}
