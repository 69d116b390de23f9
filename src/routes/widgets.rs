//! Widget routes.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::auth::AdminUser;
use super::error::ApiError;
use super::json_body;
use crate::services::widget::{self, Widget};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct DeleteWidgetBody {
    pub id: Value,
}

#[derive(Serialize)]
pub struct DeleteWidgetResponse {
    pub ok: bool,
    pub removed: bool,
}

/// `GET /api/widgets` — list in array order.
pub async fn list_widgets(State(state): State<AppState>, _admin: AdminUser) -> Result<Json<Vec<Widget>>, ApiError> {
    Ok(Json(widget::load_widgets(state.options.as_ref()).await?))
}

/// `POST /api/widgets` — append one widget under a generated id, or with
/// an array body, replace the whole list as the editor's save does.
pub async fn add_widget(
    State(state): State<AppState>,
    _admin: AdminUser,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiError> {
    let payload = json_body(payload)?;
    if payload.is_array() {
        let widgets = widget::replace_widgets(state.options.as_ref(), &payload).await?;
        return Ok(Json(widgets).into_response());
    }
    let created = widget::add_widget(state.options.as_ref(), &payload).await?;
    Ok((StatusCode::CREATED, Json(created)).into_response())
}

/// `PUT /api/widgets` — replace the whole list.
pub async fn replace_widgets(
    State(state): State<AppState>,
    _admin: AdminUser,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Vec<Widget>>, ApiError> {
    let payload = json_body(payload)?;
    Ok(Json(widget::replace_widgets(state.options.as_ref(), &payload).await?))
}

/// `PATCH /api/widgets/:id` — update one widget in place.
pub async fn update_widget(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Widget>, ApiError> {
    let payload = json_body(payload)?;
    Ok(Json(widget::update_widget(state.options.as_ref(), &id, &payload).await?))
}

/// `DELETE /api/widgets` with `{"id": ...}` — remove by id; absent ids are a no-op.
pub async fn delete_widget(
    State(state): State<AppState>,
    _admin: AdminUser,
    payload: Result<Json<DeleteWidgetBody>, JsonRejection>,
) -> Result<Json<DeleteWidgetResponse>, ApiError> {
    let Json(body) = payload.map_err(|e| ApiError::Validation(e.body_text()))?;
    let id = match body.id {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => return Err(ApiError::Validation("`id` must be a string or number".into())),
    };
    remove(&state, &id).await
}

/// `DELETE /api/widgets/:id` — path form of [`delete_widget`].
pub async fn delete_widget_by_id(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Json<DeleteWidgetResponse>, ApiError> {
    remove(&state, &id).await
}

async fn remove(state: &AppState, id: &str) -> Result<Json<DeleteWidgetResponse>, ApiError> {
    let removed = widget::remove_widget(state.options.as_ref(), id).await?;
    Ok(Json(DeleteWidgetResponse { ok: true, removed }))
}
