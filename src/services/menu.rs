//! Menu item service — the ordered navigation list.
//!
//! DESIGN
//! ======
//! The list is saved wholesale. Each entry is sanitized on its own and
//! entries without a usable `page_id` or `title` are dropped rather than
//! failing the request. Submenus are one level deep; deeper nesting is
//! discarded.
//!
//! Stored order is the submitted array order. Rendering sorts by `order`
//! with a stable sort, so ties keep their array position.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::ErrorCode;
use crate::sanitize;
use crate::services::options::{MENU_ITEMS_OPTION, OptionStore, StoreError};
use crate::services::routing::RouteRefresh;
use crate::services::settings::json_kind;

/// Icon keys with this prefix reference `Settings::custom_svgs`.
pub const CUSTOM_ICON_PREFIX: &str = "custom-";

#[derive(Debug, thiserror::Error)]
pub enum MenuError {
    #[error("invalid menu payload: {0}")]
    Validation(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ErrorCode for MenuError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "E_VALIDATION",
            Self::Store(e) => e.error_code(),
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Store(e) if e.retryable())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    pub page_id: i64,
    pub title: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub order: i64,
    #[serde(default)]
    pub custom_route: String,
    #[serde(default)]
    pub children: Vec<MenuItem>,
}

impl MenuItem {
    /// Key into `custom_svgs` when the icon is a custom reference.
    #[must_use]
    pub fn custom_icon_key(&self) -> Option<&str> {
        self.icon.strip_prefix(CUSTOM_ICON_PREFIX).filter(|k| !k.is_empty())
    }
}

// =============================================================================
// SANITIZATION
// =============================================================================

/// Sanitize a submitted list. Returns the kept entries and the drop count.
///
/// # Errors
///
/// Returns [`MenuError::Validation`] if the payload is not a JSON array.
pub fn sanitize_menu_items(payload: &Value) -> Result<(Vec<MenuItem>, usize), MenuError> {
    let Some(entries) = payload.as_array() else {
        return Err(MenuError::Validation(format!("expected an array, found {}", json_kind(payload))));
    };
    Ok(sanitize_list(entries, 0))
}

fn sanitize_list(entries: &[Value], depth: usize) -> (Vec<MenuItem>, usize) {
    let mut kept = Vec::with_capacity(entries.len());
    let mut dropped = 0;
    for (position, raw) in entries.iter().enumerate() {
        match sanitize_entry(raw, position, depth) {
            Some(item) => kept.push(item),
            None => {
                dropped += 1;
                debug!(position, depth, "dropping menu entry without page_id or title");
            }
        }
    }
    (kept, dropped)
}

fn sanitize_entry(raw: &Value, position: usize, depth: usize) -> Option<MenuItem> {
    let obj = raw.as_object()?;
    let page_id = sanitize::int_field(obj, "page_id").filter(|id| *id > 0)?;
    let title = sanitize::string_field(obj, "title")
        .map(|t| sanitize::text(&t))
        .filter(|t| !t.is_empty())?;

    let children = match (depth, obj.get("children")) {
        (0, Some(Value::Array(children))) => sanitize_list(children, 1).0,
        _ => Vec::new(),
    };

    Some(MenuItem {
        page_id,
        title,
        icon: sanitize::string_field(obj, "icon")
            .map(|i| sanitize::key(&i))
            .unwrap_or_default(),
        order: sanitize::int_field(obj, "order").unwrap_or_else(|| i64::try_from(position).unwrap_or(i64::MAX)),
        custom_route: sanitize::string_field(obj, "custom_route")
            .map(|r| sanitize::slugify(&r))
            .unwrap_or_default(),
        children,
    })
}

// =============================================================================
// ORDERING
// =============================================================================

/// Stable sort by `order`, applied to children too.
#[must_use]
pub fn sorted_for_render(items: &[MenuItem]) -> Vec<MenuItem> {
    let mut sorted: Vec<MenuItem> = items
        .iter()
        .map(|item| MenuItem { children: sorted_for_render(&item.children), ..item.clone() })
        .collect();
    sorted.sort_by_key(|item| item.order);
    sorted
}

/// Top-level items followed by their children, depth-first.
pub fn flatten(items: &[MenuItem]) -> impl Iterator<Item = &MenuItem> {
    items
        .iter()
        .flat_map(|item| std::iter::once(item).chain(item.children.iter()))
}

fn custom_routes(items: &[MenuItem]) -> Vec<(&str, i64)> {
    flatten(items)
        .filter(|item| !item.custom_route.is_empty())
        .map(|item| (item.custom_route.as_str(), item.page_id))
        .collect()
}

// =============================================================================
// LOAD / SAVE
// =============================================================================

/// Load the stored list (empty if never saved).
///
/// # Errors
///
/// Returns a store error if the read fails or the stored value is not an array.
pub async fn load_menu_items(store: &dyn OptionStore) -> Result<Vec<MenuItem>, MenuError> {
    match store.get_option(MENU_ITEMS_OPTION).await? {
        None => Ok(Vec::new()),
        Some(Value::Array(entries)) => Ok(sanitize_list(&entries, 0).0),
        Some(other) => Err(StoreError::Malformed {
            name: MENU_ITEMS_OPTION.to_owned(),
            reason: format!("expected array, found {}", json_kind(&other)),
        }
        .into()),
    }
}

/// Sanitize and persist a full menu list, replacing the stored one.
///
/// # Errors
///
/// Returns a validation error for a non-array payload, or a store error if
/// the write fails.
pub async fn save_menu_items(
    store: &dyn OptionStore,
    refresh: &RouteRefresh,
    payload: &Value,
) -> Result<Vec<MenuItem>, MenuError> {
    let (items, dropped) = sanitize_menu_items(payload)?;
    let previous = load_menu_items(store).await.unwrap_or_default();

    let value = serde_json::to_value(&items)
        .map_err(|e| StoreError::Malformed { name: MENU_ITEMS_OPTION.to_owned(), reason: e.to_string() })?;
    store.update_option(MENU_ITEMS_OPTION, &value).await?;

    if custom_routes(&items) != custom_routes(&previous) {
        refresh.schedule();
    }
    info!(kept = items.len(), dropped, "menu items saved");
    Ok(items)
}

#[cfg(test)]
#[path = "menu_test.rs"]
mod tests;
