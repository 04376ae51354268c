use super::{Deleted, deleted};
use crate::{
    api::{AppState, auth::AuthUser},
    core::page::{self, FolderFilter, NewPage, PageUpdate},
    entities::page::Model,
    errors::Result,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;

/// Query string of `GET /api/page`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageListQuery {
    /// Folder id, or `null` for root pages
    pub folder_id: Option<String>,
}

/// `GET /api/page?folderId=<id|null>`
pub async fn list_pages(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<PageListQuery>,
) -> Result<Json<Vec<Model>>> {
    let filter = FolderFilter::from_query(query.folder_id.as_deref())?;
    page::list_pages(&state.db, user.id, filter).await.map(Json)
}

/// `POST /api/page`
pub async fn create_page(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(new_page): Json<NewPage>,
) -> Result<(StatusCode, Json<Model>)> {
    let created = page::create_page(&state.db, user.id, new_page).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// `GET /api/page/:id`
pub async fn get_page(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Model>> {
    page::get_page(&state.db, user.id, id).await.map(Json)
}

/// `PATCH /api/page/:id`
pub async fn update_page(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    Json(update): Json<PageUpdate>,
) -> Result<Json<Model>> {
    page::update_page(&state.db, user.id, id, update)
        .await
        .map(Json)
}

/// `DELETE /api/page/:id`
pub async fn delete_page(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Deleted>> {
    page::delete_page(&state.db, user.id, id).await?;
    Ok(deleted())
}
