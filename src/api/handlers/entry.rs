use crate::{
    api::{AppState, auth::AuthUser},
    core::entry::{self, EntryUpdate, NewEntry, parse_day_index},
    entities::page,
    errors::Result,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Serialize;

/// Body of a successful entry creation.
#[derive(Debug, Serialize)]
pub struct CreatedEntry {
    /// The new entry
    pub entry: page::Entry,
    /// The page after the insert
    pub page: page::Model,
}

/// `POST /api/page/:id/day/:day_index/entry`
pub async fn add_entry(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((page_id, day_index)): Path<(i64, i64)>,
    Json(new_entry): Json<NewEntry>,
) -> Result<(StatusCode, Json<CreatedEntry>)> {
    let day_index = parse_day_index(day_index)?;
    let (entry, page) = entry::add_entry(&state.db, user.id, page_id, day_index, new_entry).await?;
    Ok((StatusCode::CREATED, Json(CreatedEntry { entry, page })))
}

/// `PATCH /api/page/:id/day/:day_index/entry/:entry_id`
pub async fn update_entry(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((page_id, day_index, entry_id)): Path<(i64, i64, String)>,
    Json(update): Json<EntryUpdate>,
) -> Result<Json<page::Model>> {
    let day_index = parse_day_index(day_index)?;
    entry::update_entry(&state.db, user.id, page_id, day_index, &entry_id, update)
        .await
        .map(Json)
}

/// `DELETE /api/page/:id/day/:day_index/entry/:entry_id`
pub async fn delete_entry(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((page_id, day_index, entry_id)): Path<(i64, i64, String)>,
) -> Result<Json<page::Model>> {
    let day_index = parse_day_index(day_index)?;
    entry::delete_entry(&state.db, user.id, page_id, day_index, &entry_id)
        .await
        .map(Json)
}
