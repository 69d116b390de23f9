//! Admin editor support routes — roles and dashboard stats.

use axum::extract::State;
use axum::response::Json;
use serde::Serialize;

use super::auth::{AdminUser, AuthUser};
use super::error::ApiError;
use crate::services::session::ROLES;
use crate::services::{menu, widget};
use crate::state::AppState;

#[derive(Serialize)]
pub struct RoleEntry {
    pub slug: &'static str,
    pub name: &'static str,
}

#[derive(Serialize)]
pub struct PortalStats {
    pub pages_count: i64,
    pub menu_items_count: usize,
    pub widgets_count: usize,
    pub users_count: i64,
}

/// `GET /api/roles` — editable roles.
pub async fn roles(_admin: AdminUser) -> Json<Vec<RoleEntry>> {
    Json(
        ROLES
            .iter()
            .map(|role| RoleEntry { slug: role.as_str(), name: role.display_name() })
            .collect(),
    )
}

/// `GET /api/stats` — counts for the editor dashboard.
pub async fn stats(State(state): State<AppState>, _auth: AuthUser) -> Result<Json<PortalStats>, ApiError> {
    let pages_count = state.pages.count_published().await?;
    let menu_items_count = menu::load_menu_items(state.options.as_ref()).await?.len();
    let widgets_count = widget::load_widgets(state.options.as_ref()).await?.len();
    let users_count = state.sessions.count_users().await?;
    Ok(Json(PortalStats { pages_count, menu_items_count, widgets_count, users_count }))
}
