//! Public portal routes — the aggregate read and path resolution.

use axum::extract::{Query, State};
use axum::response::Json;
use serde::Deserialize;
use tracing::warn;

use super::error::ApiError;
use crate::services::portal::{self, PortalData};
use crate::services::routing::RouteTarget;
use crate::state::AppState;

/// `GET /api/portal-data` — settings, sorted menu with page content, widgets.
pub async fn portal_data(State(state): State<AppState>) -> Json<PortalData> {
    Json(portal::build_portal_data(state.options.as_ref(), state.pages.as_ref()).await)
}

#[derive(Deserialize)]
pub struct ResolveQuery {
    pub path: String,
}

/// `GET /api/portal/resolve?path=...` — map a public path to its target.
/// Applies any pending route refresh first.
pub async fn resolve(
    State(state): State<AppState>,
    Query(query): Query<ResolveQuery>,
) -> Result<Json<RouteTarget>, ApiError> {
    if let Err(e) = state
        .routes
        .refresh_if_pending(state.options.as_ref(), state.pages.as_ref())
        .await
    {
        warn!(error = %e, "route refresh failed; resolving against previous table");
    }
    state
        .routes
        .resolve(&query.path)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("no portal route for {}", query.path)))
}
