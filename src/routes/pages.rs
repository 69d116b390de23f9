//! Content page routes.

use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::response::Json;

use super::auth::AdminUser;
use super::error::ApiError;
use crate::services::pages::{ContentPage, PAGE_LIST_LIMIT, PageSummary};
use crate::state::AppState;

/// `GET /api/pages` — published pages for the menu editor's page picker.
pub async fn list_pages(State(state): State<AppState>, _admin: AdminUser) -> Result<Json<Vec<PageSummary>>, ApiError> {
    Ok(Json(state.pages.list_published(PAGE_LIST_LIMIT).await?))
}

/// `GET /api/pages/:id` — one published page; the renderer's fallback when a
/// menu item arrived without inlined content.
pub async fn get_page(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<ContentPage>, ApiError> {
    let Path(id) = id.map_err(|e| ApiError::Validation(e.body_text()))?;
    state
        .pages
        .published_page(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("page not found: {id}")))
}
