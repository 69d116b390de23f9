//! HTTP error envelope.
//!
//! Every failed request renders `{"code", "message", "retryable"}` with a
//! status chosen from the error kind. Service errors convert through
//! [`ErrorCode`], so the wire code always matches the service's own code.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;
use tracing::error;

use crate::error::ErrorCode;
use crate::services::menu::MenuError;
use crate::services::pages::PageError;
use crate::services::routing::RoutingError;
use crate::services::session::SessionError;
use crate::services::settings::SettingsError;
use crate::services::widget::WidgetError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    Validation(String),
    Unauthorized,
    Forbidden,
    NotFound(String),
    Internal { code: &'static str, message: String, retryable: bool },
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    code: &'a str,
    message: &'a str,
    retryable: bool,
}

impl ApiError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "E_VALIDATION",
            Self::Unauthorized => "E_UNAUTHORIZED",
            Self::Forbidden => "E_FORBIDDEN",
            Self::NotFound(_) => "E_NOT_FOUND",
            Self::Internal { code, .. } => *code,
        }
    }

    fn message(&self) -> &str {
        match self {
            Self::Validation(m) | Self::NotFound(m) | Self::Internal { message: m, .. } => m,
            Self::Unauthorized => "authentication required",
            Self::Forbidden => "missing manage_options capability",
        }
    }

    fn internal<E: ErrorCode + std::fmt::Display>(err: &E) -> Self {
        error!(code = err.error_code(), error = %err, "request failed");
        Self::Internal { code: err.error_code(), message: err.to_string(), retryable: err.retryable() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let retryable = matches!(self, Self::Internal { retryable: true, .. });
        let body = ErrorBody { code: self.code(), message: self.message(), retryable };
        (self.status(), Json(body)).into_response()
    }
}

impl From<SettingsError> for ApiError {
    fn from(err: SettingsError) -> Self {
        match err {
            SettingsError::Validation(m) => Self::Validation(m),
            SettingsError::Store(_) => Self::internal(&err),
        }
    }
}

impl From<MenuError> for ApiError {
    fn from(err: MenuError) -> Self {
        match err {
            MenuError::Validation(m) => Self::Validation(m),
            MenuError::Store(_) => Self::internal(&err),
        }
    }
}

impl From<WidgetError> for ApiError {
    fn from(err: WidgetError) -> Self {
        match err {
            WidgetError::Validation(m) => Self::Validation(m),
            WidgetError::NotFound(id) => Self::NotFound(format!("widget not found: {id}")),
            WidgetError::Store(_) => Self::internal(&err),
        }
    }
}

impl From<PageError> for ApiError {
    fn from(err: PageError) -> Self {
        Self::internal(&err)
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        Self::internal(&err)
    }
}

impl From<RoutingError> for ApiError {
    fn from(err: RoutingError) -> Self {
        Self::internal(&err)
    }
}
