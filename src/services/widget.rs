//! Widget service — the ordered list of sidebar widgets.
//!
//! DESIGN
//! ======
//! Widgets are identified by a generated opaque id; list order is array
//! order. Each kind keeps only its own payload fields: progress widgets
//! carry a percentage and an optional button, stats/custom widgets carry
//! HTML content, pattern widgets carry a pattern reference.
//!
//! Progress percentages are clamped to 0..=100 on every write.
//!
//! Removing an id that is not present performs no write, leaving the stored
//! value untouched.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::ErrorCode;
use crate::sanitize;
use crate::services::options::{OptionStore, StoreError, WIDGETS_OPTION};
use crate::services::settings::json_kind;

#[derive(Debug, thiserror::Error)]
pub enum WidgetError {
    #[error("invalid widget: {0}")]
    Validation(String),
    #[error("widget not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ErrorCode for WidgetError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "E_VALIDATION",
            Self::NotFound(_) => "E_NOT_FOUND",
            Self::Store(e) => e.error_code(),
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Store(e) if e.retryable())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetKind {
    Progress,
    Stats,
    Custom,
    Pattern,
}

impl WidgetKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Progress => "progress",
            Self::Stats => "stats",
            Self::Custom => "custom",
            Self::Pattern => "pattern",
        }
    }
}

impl FromStr for WidgetKind {
    type Err = WidgetError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "progress" => Ok(Self::Progress),
            "stats" => Ok(Self::Stats),
            "custom" => Ok(Self::Custom),
            "pattern" => Ok(Self::Pattern),
            _ => Err(WidgetError::Validation(format!("unknown widget type {raw:?}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Widget {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: WidgetKind,
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub subtitle: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentage: Option<u8>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub content: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub button_text: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub button_link: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub pattern: String,
}

#[must_use]
pub fn generate_widget_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// SANITIZATION
// =============================================================================

/// Build a widget from a payload object under the given id.
///
/// # Errors
///
/// Returns [`WidgetError::Validation`] if the payload is not an object or its
/// `type` is missing or unknown.
pub fn sanitize_widget(payload: &Value, id: String) -> Result<Widget, WidgetError> {
    let Some(obj) = payload.as_object() else {
        return Err(WidgetError::Validation(format!("expected an object, found {}", json_kind(payload))));
    };
    let kind: WidgetKind = sanitize::string_field(obj, "type").unwrap_or_default().parse()?;

    let text = |field: &str| sanitize::string_field(obj, field).map(|v| sanitize::text(&v)).unwrap_or_default();
    let html = |field: &str| {
        sanitize::string_field(obj, field)
            .map(|v| v.trim().to_owned())
            .unwrap_or_default()
    };

    let mut widget = Widget {
        id,
        kind,
        title: text("title"),
        subtitle: text("subtitle"),
        description: text("description"),
        percentage: None,
        content: String::new(),
        button_text: String::new(),
        button_link: String::new(),
        pattern: String::new(),
    };

    match kind {
        WidgetKind::Progress => {
            widget.percentage = clamp_percentage(obj);
            widget.button_text = text("button_text");
            widget.button_link = sanitize::string_field(obj, "button_link")
                .and_then(|l| sanitize::url(&l))
                .unwrap_or_default();
        }
        WidgetKind::Stats | WidgetKind::Custom => widget.content = html("content"),
        WidgetKind::Pattern => {
            widget.pattern = sanitize::string_field(obj, "pattern")
                .map(|p| pattern_ref(&p))
                .unwrap_or_default();
        }
    }
    Ok(widget)
}

fn clamp_percentage(obj: &Map<String, Value>) -> Option<u8> {
    let raw = sanitize::int_field(obj, "percentage")?;
    u8::try_from(raw.clamp(0, 100)).ok()
}

/// Pattern references look like `namespace/slug`; each part is slugified.
fn pattern_ref(raw: &str) -> String {
    raw.split('/')
        .map(sanitize::slugify)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

fn stored_id(obj: &Map<String, Value>) -> Option<String> {
    sanitize::string_field(obj, "id")
        .map(|id| id.trim().to_owned())
        .filter(|id| !id.is_empty())
}

// =============================================================================
// OPERATIONS
// =============================================================================

/// Load the stored list (empty if never saved). Unreadable entries are skipped.
///
/// # Errors
///
/// Returns a store error if the read fails or the stored value is not an array.
pub async fn load_widgets(store: &dyn OptionStore) -> Result<Vec<Widget>, WidgetError> {
    let entries = match store.get_option(WIDGETS_OPTION).await? {
        None => return Ok(Vec::new()),
        Some(Value::Array(entries)) => entries,
        Some(other) => {
            return Err(StoreError::Malformed {
                name: WIDGETS_OPTION.to_owned(),
                reason: format!("expected array, found {}", json_kind(&other)),
            }
            .into());
        }
    };

    Ok(entries
        .iter()
        .filter_map(|raw| {
            let id = raw.as_object().and_then(stored_id)?;
            match sanitize_widget(raw, id) {
                Ok(widget) => Some(widget),
                Err(e) => {
                    warn!(error = %e, "skipping unreadable stored widget");
                    None
                }
            }
        })
        .collect())
}

async fn write_widgets(store: &dyn OptionStore, widgets: &[Widget]) -> Result<(), WidgetError> {
    let value = serde_json::to_value(widgets)
        .map_err(|e| StoreError::Malformed { name: WIDGETS_OPTION.to_owned(), reason: e.to_string() })?;
    store.update_option(WIDGETS_OPTION, &value).await?;
    Ok(())
}

/// Append a widget under a fresh id. Any client-supplied id is ignored.
///
/// # Errors
///
/// Returns a validation error for a bad payload, or a store error.
pub async fn add_widget(store: &dyn OptionStore, payload: &Value) -> Result<Widget, WidgetError> {
    let widget = sanitize_widget(payload, generate_widget_id())?;
    let mut widgets = load_widgets(store).await?;
    widgets.push(widget.clone());
    write_widgets(store, &widgets).await?;
    info!(id = %widget.id, kind = widget.kind.as_str(), total = widgets.len(), "widget added");
    Ok(widget)
}

/// Merge the payload's fields over an existing widget, in place.
///
/// # Errors
///
/// Returns [`WidgetError::NotFound`] if no widget has this id, a validation
/// error if the merged widget is invalid, or a store error.
pub async fn update_widget(store: &dyn OptionStore, id: &str, payload: &Value) -> Result<Widget, WidgetError> {
    let Some(patch) = payload.as_object() else {
        return Err(WidgetError::Validation(format!("expected an object, found {}", json_kind(payload))));
    };
    let mut widgets = load_widgets(store).await?;
    let Some(slot) = widgets.iter_mut().find(|w| w.id == id) else {
        return Err(WidgetError::NotFound(id.to_owned()));
    };

    let mut merged = match serde_json::to_value(&*slot) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    };
    for (field, value) in patch {
        if field != "id" {
            merged.insert(field.clone(), value.clone());
        }
    }
    let updated = sanitize_widget(&Value::Object(merged), id.to_owned())?;
    *slot = updated.clone();

    write_widgets(store, &widgets).await?;
    info!(%id, "widget updated");
    Ok(updated)
}

/// Replace the whole list. Entries without an id (or repeating an earlier
/// id) get a fresh one; entries with an unknown type are dropped.
///
/// # Errors
///
/// Returns a validation error if the payload is not an array, or a store error.
pub async fn replace_widgets(store: &dyn OptionStore, payload: &Value) -> Result<Vec<Widget>, WidgetError> {
    let Some(entries) = payload.as_array() else {
        return Err(WidgetError::Validation(format!("expected an array, found {}", json_kind(payload))));
    };

    let mut widgets: Vec<Widget> = Vec::with_capacity(entries.len());
    let mut dropped = 0usize;
    for raw in entries {
        let id = raw
            .as_object()
            .and_then(stored_id)
            .filter(|id| !widgets.iter().any(|w| &w.id == id))
            .unwrap_or_else(generate_widget_id);
        match sanitize_widget(raw, id) {
            Ok(widget) => widgets.push(widget),
            Err(_) => dropped += 1,
        }
    }

    write_widgets(store, &widgets).await?;
    info!(kept = widgets.len(), dropped, "widgets replaced");
    Ok(widgets)
}

/// Remove a widget by id. Returns whether anything was removed; an absent
/// id performs no write.
///
/// # Errors
///
/// Returns a store error if the read or write fails.
pub async fn remove_widget(store: &dyn OptionStore, id: &str) -> Result<bool, WidgetError> {
    let widgets = load_widgets(store).await?;
    if !widgets.iter().any(|w| w.id == id) {
        return Ok(false);
    }
    let remaining: Vec<Widget> = widgets.into_iter().filter(|w| w.id != id).collect();
    write_widgets(store, &remaining).await?;
    info!(%id, remaining = remaining.len(), "widget removed");
    Ok(true)
}

#[cfg(test)]
#[path = "widget_test.rs"]
mod tests;
