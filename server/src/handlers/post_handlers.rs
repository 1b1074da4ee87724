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
use crate::models::post::{
    validate_new_post, validate_post_changes, CreatePostPayload, NewPost, PostChanges, PostView,
    UpdatePostPayload,
};
use crate::state::AppState;
use crate::store::PostFilter;

async fn list_filtered(state: &AppState, filter: PostFilter) -> AppResult<Json<Vec<PostView>>> {
    let posts = state.store.list_posts(filter).await?;
    Ok(Json(posts.iter().map(PostView::from).collect()))
}

pub async fn list_posts(State(state): State<AppState>) -> AppResult<Json<Vec<PostView>>> {
    list_filtered(&state, PostFilter::All).await
}

pub async fn list_posts_by_author(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> AppResult<Json<Vec<PostView>>> {
    let Path(user_id) = path?;
    list_filtered(&state, PostFilter::Author(user_id)).await
}

pub async fn list_posts_by_tag(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> AppResult<Json<Vec<PostView>>> {
    let Path(tag) = path?;
    list_filtered(&state, PostFilter::Tag(tag)).await
}

pub async fn get_post(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> AppResult<Response> {
    let Path(id) = path?;
    match state.store.get_post(&id).await? {
        Some(entry) => Ok(Json(PostView::from(&entry)).into_response()),
        None => Ok(not_found("Post not found")),
    }
}

pub async fn create_post(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> AppResult<(StatusCode, Json<PostView>)> {
    let payload: CreatePostPayload = decode_body(payload)?;
    let post = NewPost::from(payload);
    AppError::check(validate_new_post(&post))?;

    let created = state.store.create_post(post).await?;
    tracing::info!(id = %created.id, store = state.store.name(), "post created");

    Ok((StatusCode::CREATED, Json(PostView::from(&created))))
}

pub async fn update_post(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
    payload: Result<Json<Value>, JsonRejection>,
) -> AppResult<Response> {
    let Path(id) = path?;
    let payload: UpdatePostPayload = decode_body(payload)?;
    let changes = PostChanges::from(payload);
    AppError::check(validate_post_changes(&changes))?;

    match state.store.update_post(&id, changes).await? {
        Some(post) => Ok(Json(PostView::from(&post)).into_response()),
        None => Ok(not_found("Post not found")),
    }
}

pub async fn delete_post(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> AppResult<Response> {
    let Path(id) = path?;
    if state.store.delete_post(&id).await? {
        tracing::info!(%id, store = state.store.name(), "post deleted");
        Ok(deleted("Post deleted"))
    } else {
        Ok(not_found("Post not found"))
    }
}
