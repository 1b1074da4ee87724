use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;

use super::{deleted, not_found};
use crate::error::{decode_body, AppError, AppResult};
use crate::models::user::{
    validate_new_user, validate_user_changes, CreateUserPayload, NewUser, UpdateUserPayload,
    UserChanges, UserView,
};
use crate::state::AppState;

pub async fn list_users(State(state): State<AppState>) -> AppResult<Json<Vec<UserView>>> {
    let users = state.store.list_users().await?;
    Ok(Json(users.iter().map(UserView::from).collect()))
}

pub async fn get_user(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> AppResult<Response> {
    let Path(id) = path?;
    match state.store.get_user(&id).await? {
        Some(user) => Ok(Json(UserView::from(&user)).into_response()),
        None => Ok(not_found("User not found")),
    }
}

pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> AppResult<(StatusCode, Json<UserView>)> {
    let payload: CreateUserPayload = decode_body(payload)?;
    let user = NewUser::from(payload);
    AppError::check(validate_new_user(&user))?;

    let created = state.store.create_user(user).await?;
    tracing::info!(id = %created.id, store = state.store.name(), "user created");

    Ok((StatusCode::CREATED, Json(UserView::from(&created))))
}

pub async fn update_user(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
    payload: Result<Json<Value>, JsonRejection>,
) -> AppResult<Response> {
    let Path(id) = path?;
    let payload: UpdateUserPayload = decode_body(payload)?;
    let changes = UserChanges::from(payload);
    AppError::check(validate_user_changes(&changes))?;

    match state.store.update_user(&id, changes).await? {
        Some(user) => Ok(Json(UserView::from(&user)).into_response()),
        None => Ok(not_found("User not found")),
    }
}

pub async fn delete_user(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> AppResult<Response> {
    let Path(id) = path?;
    if state.store.delete_user(&id).await? {
        tracing::info!(%id, store = state.store.name(), "user deleted");
        Ok(deleted("User deleted"))
    } else {
        Ok(not_found("User not found"))
    }
}
