//! Portal aggregate — the single read consumed by the renderer.
//!
//! DESIGN
//! ======
//! Settings, menu items, and widgets are read independently. A source that
//! fails to load is logged and replaced by its default (defaults or an empty
//! list) so one bad record never blanks the whole portal.
//!
//! Menu items are sorted for rendering and annotated with the referenced
//! page's `content` and `excerpt`. When the page is missing or unpublished
//! both fields are omitted, but the item itself is kept. Custom icon
//! references (`custom-<key>`) are resolved to the uploaded SVG's URL.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use tracing::warn;

use crate::services::menu::{self, MenuItem};
use crate::services::options::OptionStore;
use crate::services::pages::{ContentPage, ContentProvider};
use crate::services::settings::{self, CustomSvg, Settings};
use crate::services::widget::{self, Widget};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortalMenuItem {
    pub page_id: i64,
    pub title: String,
    pub icon: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    pub order: i64,
    pub custom_route: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    pub children: Vec<PortalMenuItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortalData {
    pub settings: Settings,
    pub menu_items: Vec<PortalMenuItem>,
    pub widgets: Vec<Widget>,
}

/// Attach page content and custom icon URLs to already-sorted items.
#[must_use]
pub fn annotate(
    items: &[MenuItem],
    pages: &HashMap<i64, ContentPage>,
    svgs: &BTreeMap<String, CustomSvg>,
) -> Vec<PortalMenuItem> {
    items
        .iter()
        .map(|item| {
            let page = pages.get(&item.page_id);
            PortalMenuItem {
                page_id: item.page_id,
                title: item.title.clone(),
                icon: item.icon.clone(),
                icon_url: item
                    .custom_icon_key()
                    .and_then(|key| svgs.get(key))
                    .map(|svg| svg.url.clone()),
                order: item.order,
                custom_route: item.custom_route.clone(),
                content: page.map(|p| p.content.clone()),
                excerpt: page.map(|p| p.excerpt.clone()),
                children: annotate(&item.children, pages, svgs),
            }
        })
        .collect()
}

/// Assemble the aggregate, degrading each failed source to its default.
pub async fn build_portal_data(options: &dyn OptionStore, pages: &dyn ContentProvider) -> PortalData {
    let settings = settings::load_settings(options).await.unwrap_or_else(|e| {
        warn!(error = %e, "portal settings unavailable; using defaults");
        Settings::default()
    });
    let menu_items = menu::load_menu_items(options).await.unwrap_or_else(|e| {
        warn!(error = %e, "portal menu unavailable; rendering empty menu");
        Vec::new()
    });
    let widgets = widget::load_widgets(options).await.unwrap_or_else(|e| {
        warn!(error = %e, "portal widgets unavailable; rendering no widgets");
        Vec::new()
    });

    let sorted = menu::sorted_for_render(&menu_items);
    let mut page_ids: Vec<i64> = menu::flatten(&sorted).map(|item| item.page_id).collect();
    page_ids.sort_unstable();
    page_ids.dedup();

    let resolved = pages.published_pages_by_ids(&page_ids).await.unwrap_or_else(|e| {
        warn!(error = %e, "portal pages unavailable; menu content omitted");
        HashMap::new()
    });

    let menu_items = annotate(&sorted, &resolved, &settings.custom_svgs);
    PortalData { settings, menu_items, widgets }
}

#[cfg(test)]
#[path = "portal_test.rs"]
mod tests;
