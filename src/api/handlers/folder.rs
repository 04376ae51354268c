use super::{Deleted, deleted};
use crate::{
    api::{AppState, auth::AuthUser},
    core::folder::{self, FolderUpdate, NewFolder},
    entities::folder::Model,
    errors::Result,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

/// `GET /api/folder`
pub async fn list_folders(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<Model>>> {
    folder::list_folders(&state.db, user.id).await.map(Json)
}

/// `POST /api/folder`
pub async fn create_folder(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(new_folder): Json<NewFolder>,
) -> Result<(StatusCode, Json<Model>)> {
    let created = folder::create_folder(&state.db, user.id, new_folder).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// `GET /api/folder/:id`
pub async fn get_folder(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Model>> {
    folder::get_folder(&state.db, user.id, id).await.map(Json)
}

/// `PATCH /api/folder/:id`
pub async fn update_folder(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    Json(update): Json<FolderUpdate>,
) -> Result<Json<Model>> {
    folder::update_folder(&state.db, user.id, id, update)
        .await
        .map(Json)
}

/// `DELETE /api/folder/:id` - removes the subtree and its pages
pub async fn delete_folder(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Deleted>> {
    folder::delete_folder(&state.db, user.id, id).await?;
    Ok(deleted())
}
