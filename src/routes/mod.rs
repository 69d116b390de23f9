//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! This module binds the configuration API under `/api` plus a health probe.
//! Admin endpoints require the `manage_options` capability; the aggregate
//! portal read, path resolution, and single-page fetch are public. When an
//! assets directory is configured, the renderer bundle is served as the
//! fallback so the portal and dashboard paths load the single-page app.

pub mod admin;
pub mod auth;
pub mod error;
pub mod menu;
pub mod pages;
pub mod portal;
pub mod settings;
pub mod widgets;

use std::path::PathBuf;

use axum::Json;
use axum::Router;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::routing::{get, patch};
use serde_json::Value;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use self::error::ApiError;
use crate::state::AppState;

/// Unwrap a JSON body, mapping a rejection into the error envelope.
pub(crate) fn json_body(payload: Result<Json<Value>, JsonRejection>) -> Result<Value, ApiError> {
    payload
        .map(|Json(value)| value)
        .map_err(|e| ApiError::Validation(e.body_text()))
}

/// API routes only, without static assets.
pub fn api_routes(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/auth/me", get(auth::me))
        .route("/api/portal-data", get(portal::portal_data))
        .route("/api/portal/resolve", get(portal::resolve))
        .route(
            "/api/settings",
            get(settings::get_settings)
                .post(settings::save_settings)
                .put(settings::save_settings),
        )
        .route(
            "/api/menu-items",
            get(menu::list_menu_items)
                .post(menu::save_menu_items)
                .put(menu::save_menu_items),
        )
        .route(
            "/api/widgets",
            get(widgets::list_widgets)
                .post(widgets::add_widget)
                .put(widgets::replace_widgets)
                .delete(widgets::delete_widget),
        )
        .route(
            "/api/widgets/{id}",
            patch(widgets::update_widget).delete(widgets::delete_widget_by_id),
        )
        .route("/api/pages", get(pages::list_pages))
        .route("/api/pages/{id}", get(pages::get_page))
        .route("/api/roles", get(admin::roles))
        .route("/api/stats", get(admin::stats))
        .route("/healthz", get(healthz))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .with_state(state)
}

/// Full application: API routes plus the optional renderer bundle.
pub fn app(state: AppState, assets_dir: Option<PathBuf>) -> Router {
    let router = api_routes(state);
    match assets_dir {
        Some(dir) => {
            // Unknown paths (portal and dashboard routes) load the app shell.
            let shell = ServeFile::new(dir.join("index.html"));
            router.fallback_service(ServeDir::new(dir).append_index_html_on_directories(true).fallback(shell))
        }
        None => router,
    }
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
