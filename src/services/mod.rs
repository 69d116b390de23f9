//! Domain services used by the HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own sanitization and persistence so route handlers stay
//! focused on extraction, authorization, and status mapping. Storage sits
//! behind traits (`OptionStore`, `ContentProvider`, `SessionStore`) with
//! Postgres and in-memory implementations.

pub mod menu;
pub mod options;
pub mod pages;
pub mod portal;
pub mod routing;
pub mod session;
pub mod settings;
pub mod widget;
