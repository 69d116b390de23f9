//! Settings service — the singleton portal configuration record.
//!
//! DESIGN
//! ======
//! Saves replace the whole record: every field is read from the payload,
//! sanitized, and missing or unusable values fall back to defaults. There
//! are no partial patches. Reads run the stored value through the same
//! sanitizer, so records written by older versions come back normalized.
//!
//! Route-affecting changes (`portal_route`, `dashboard_route`,
//! `enable_custom_urls`) schedule a deferred route-table refresh rather than
//! rebuilding inline.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;

use crate::error::ErrorCode;
use crate::sanitize;
use crate::services::options::{OptionStore, SETTINGS_OPTION, StoreError};
use crate::services::routing::RouteRefresh;

pub const DEFAULT_PORTAL_TITLE: &str = "Portal Dashboard";
pub const DEFAULT_PRIMARY_COLOR: &str = "#2271b1";
pub const DEFAULT_SIDEBAR_BACKGROUND: &str = "#ffffff";
pub const DEFAULT_HEADER_BACKGROUND: &str = "#ffffff";
pub const DEFAULT_CONTENT_BACKGROUND: &str = "#f0f0f1";
pub const DEFAULT_PORTAL_ROUTE: &str = "portal";
pub const DEFAULT_DASHBOARD_ROUTE: &str = "dashboard";

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("invalid settings payload: {0}")]
    Validation(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ErrorCode for SettingsError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "E_VALIDATION",
            Self::Store(e) => e.error_code(),
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::Validation(_) => false,
            Self::Store(e) => e.retryable(),
        }
    }
}

/// Operator-uploaded icon, referenced by menu items as `custom-<key>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomSvg {
    pub url: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub portal_title: String,
    pub primary_color: String,
    pub sidebar_background: String,
    pub header_background: String,
    pub content_background: String,
    pub portal_route: String,
    pub dashboard_route: String,
    pub show_search: bool,
    pub show_notifications: bool,
    pub enable_dark_mode: bool,
    pub enable_custom_urls: bool,
    pub custom_svgs: BTreeMap<String, CustomSvg>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            portal_title: DEFAULT_PORTAL_TITLE.to_owned(),
            primary_color: DEFAULT_PRIMARY_COLOR.to_owned(),
            sidebar_background: DEFAULT_SIDEBAR_BACKGROUND.to_owned(),
            header_background: DEFAULT_HEADER_BACKGROUND.to_owned(),
            content_background: DEFAULT_CONTENT_BACKGROUND.to_owned(),
            portal_route: DEFAULT_PORTAL_ROUTE.to_owned(),
            dashboard_route: DEFAULT_DASHBOARD_ROUTE.to_owned(),
            show_search: true,
            show_notifications: true,
            enable_dark_mode: true,
            enable_custom_urls: false,
            custom_svgs: BTreeMap::new(),
        }
    }
}

impl Settings {
    /// True when any field feeding the route table differs.
    #[must_use]
    pub fn routes_differ(&self, other: &Self) -> bool {
        self.portal_route != other.portal_route
            || self.dashboard_route != other.dashboard_route
            || self.enable_custom_urls != other.enable_custom_urls
    }
}

// =============================================================================
// SANITIZATION
// =============================================================================

/// Build a sanitized record from a request payload.
///
/// Accepts `{"general": {...}}` or a bare field object.
///
/// # Errors
///
/// Returns [`SettingsError::Validation`] if the payload (or its `general`
/// member) is not a JSON object.
pub fn sanitize_payload(payload: &Value) -> Result<Settings, SettingsError> {
    let Some(obj) = payload.as_object() else {
        return Err(SettingsError::Validation("expected a JSON object".into()));
    };
    match obj.get("general") {
        Some(Value::Object(general)) => Ok(sanitize_fields(general)),
        Some(_) => Err(SettingsError::Validation("`general` must be an object".into())),
        None => Ok(sanitize_fields(obj)),
    }
}

/// Sanitize every field, falling back to the default for each unusable one.
#[must_use]
pub fn sanitize_fields(obj: &Map<String, Value>) -> Settings {
    let defaults = Settings::default();
    Settings {
        portal_title: text_or(obj, "portal_title", &defaults.portal_title),
        primary_color: color_or(obj, "primary_color", &defaults.primary_color),
        sidebar_background: color_or(obj, "sidebar_background", &defaults.sidebar_background),
        header_background: color_or(obj, "header_background", &defaults.header_background),
        content_background: color_or(obj, "content_background", &defaults.content_background),
        portal_route: slug_or(obj, "portal_route", &defaults.portal_route),
        dashboard_route: slug_or(obj, "dashboard_route", &defaults.dashboard_route),
        show_search: bool_or(obj, "show_search", defaults.show_search),
        show_notifications: bool_or(obj, "show_notifications", defaults.show_notifications),
        enable_dark_mode: bool_or(obj, "enable_dark_mode", defaults.enable_dark_mode),
        enable_custom_urls: bool_or(obj, "enable_custom_urls", defaults.enable_custom_urls),
        custom_svgs: obj.get("custom_svgs").map(sanitize_custom_svgs).unwrap_or_default(),
    }
}

fn text_or(obj: &Map<String, Value>, field: &str, default: &str) -> String {
    sanitize::string_field(obj, field)
        .map(|raw| sanitize::text(&raw))
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_owned())
}

fn color_or(obj: &Map<String, Value>, field: &str, default: &str) -> String {
    sanitize::string_field(obj, field)
        .and_then(|raw| sanitize::hex_color(&raw))
        .unwrap_or_else(|| default.to_owned())
}

fn slug_or(obj: &Map<String, Value>, field: &str, default: &str) -> String {
    sanitize::string_field(obj, field)
        .map(|raw| sanitize::slugify(&raw))
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_owned())
}

fn bool_or(obj: &Map<String, Value>, field: &str, default: bool) -> bool {
    obj.get(field).and_then(sanitize::truthy).unwrap_or(default)
}

fn sanitize_custom_svgs(raw: &Value) -> BTreeMap<String, CustomSvg> {
    let Some(entries) = raw.as_object() else {
        return BTreeMap::new();
    };
    entries
        .iter()
        .filter_map(|(raw_key, entry)| {
            let key = sanitize::key(raw_key);
            let entry = entry.as_object()?;
            let url = sanitize::string_field(entry, "url").and_then(|u| sanitize::url(&u))?;
            if key.is_empty() || !url.to_ascii_lowercase().ends_with(".svg") {
                return None;
            }
            let name = sanitize::string_field(entry, "name")
                .map(|n| sanitize::text(&n))
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| key.clone());
            Some((key, CustomSvg { url, name }))
        })
        .collect()
}

// =============================================================================
// LOAD / SAVE
// =============================================================================

/// Load the current record, or defaults if none was ever saved.
///
/// # Errors
///
/// Returns a store error if the read fails or the stored value is not an object.
pub async fn load_settings(store: &dyn OptionStore) -> Result<Settings, SettingsError> {
    match store.get_option(SETTINGS_OPTION).await? {
        None => Ok(Settings::default()),
        Some(Value::Object(obj)) => Ok(sanitize_fields(&obj)),
        Some(other) => Err(StoreError::Malformed {
            name: SETTINGS_OPTION.to_owned(),
            reason: format!("expected object, found {}", json_kind(&other)),
        }
        .into()),
    }
}

/// Sanitize and persist a full settings payload, replacing the stored record.
///
/// # Errors
///
/// Returns a validation error for a non-object payload, or a store error if
/// the write fails.
pub async fn save_settings(
    store: &dyn OptionStore,
    refresh: &RouteRefresh,
    payload: &Value,
) -> Result<Settings, SettingsError> {
    let settings = sanitize_payload(payload)?;
    let previous = load_settings(store).await.unwrap_or_default();

    let value = serde_json::to_value(&settings)
        .map_err(|e| StoreError::Malformed { name: SETTINGS_OPTION.to_owned(), reason: e.to_string() })?;
    store.update_option(SETTINGS_OPTION, &value).await?;

    let routes_changed = settings.routes_differ(&previous);
    if routes_changed {
        refresh.schedule();
    }
    info!(
        portal_route = %settings.portal_route,
        custom_svgs = settings.custom_svgs.len(),
        routes_changed,
        "settings saved"
    );
    Ok(settings)
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;
