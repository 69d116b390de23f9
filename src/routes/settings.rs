//! Settings routes.

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::response::Json;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use super::auth::AdminUser;
use super::error::ApiError;
use super::json_body;
use crate::services::settings::{self, Settings};
use crate::state::AppState;

/// Wire envelope shared by reads and writes.
#[derive(Serialize)]
pub struct SettingsEnvelope {
    pub general: Settings,
}

/// `GET /api/settings` — current settings, defaults if never saved.
pub async fn get_settings(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<SettingsEnvelope>, ApiError> {
    let general = settings::load_settings(state.options.as_ref()).await?;
    Ok(Json(SettingsEnvelope { general }))
}

/// `POST|PUT /api/settings` — replace the whole record.
pub async fn save_settings(
    State(state): State<AppState>,
    admin: AdminUser,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<SettingsEnvelope>, ApiError> {
    let payload = json_body(payload)?;
    let general = settings::save_settings(state.options.as_ref(), &state.routes, &payload).await?;
    info!(user = %admin.user.name, "settings replaced");
    Ok(Json(SettingsEnvelope { general }))
}
