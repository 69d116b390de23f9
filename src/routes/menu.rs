//! Menu item routes.

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::response::Json;
use serde_json::Value;
use tracing::info;

use super::auth::AdminUser;
use super::error::ApiError;
use super::json_body;
use crate::services::menu::{self, MenuItem};
use crate::state::AppState;

/// `GET /api/menu-items` — stored list in stored order.
pub async fn list_menu_items(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Vec<MenuItem>>, ApiError> {
    Ok(Json(menu::load_menu_items(state.options.as_ref()).await?))
}

/// `POST|PUT /api/menu-items` — replace the list; malformed entries are dropped.
pub async fn save_menu_items(
    State(state): State<AppState>,
    admin: AdminUser,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Vec<MenuItem>>, ApiError> {
    let payload = json_body(payload)?;
    let items = menu::save_menu_items(state.options.as_ref(), &state.routes, &payload).await?;
    info!(user = %admin.user.name, count = items.len(), "menu items replaced");
    Ok(Json(items))
}
