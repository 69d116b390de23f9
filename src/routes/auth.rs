//! Auth extractors — bearer token or session cookie to a portal user.

use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::response::Json;
use axum_extra::extract::cookie::{Cookie, CookieJar};

use super::error::ApiError;
use crate::services::session::SessionUser;
use crate::state::AppState;

pub const COOKIE_NAME: &str = "portal_session";

/// Token from `Authorization: Bearer ...`, falling back to the session cookie.
fn request_token(parts: &Parts) -> Option<String> {
    let bearer = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_owned());
    }

    let jar = CookieJar::from_headers(&parts.headers);
    jar.get(COOKIE_NAME)
        .map(Cookie::value)
        .filter(|t| !t.is_empty())
        .map(str::to_owned)
}

// =============================================================================
// EXTRACTORS
// =============================================================================

/// Any logged-in user. Use as a handler parameter to require authentication.
pub struct AuthUser {
    pub user: SessionUser,
}

impl<S> FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = request_token(parts).ok_or(ApiError::Unauthorized)?;
        let app_state = AppState::from_ref(state);
        let user = app_state
            .sessions
            .validate(&token)
            .await?
            .ok_or(ApiError::Unauthorized)?;
        Ok(Self { user })
    }
}

/// A user holding the `manage_options` capability.
pub struct AdminUser {
    pub user: SessionUser,
}

impl<S> FromRequestParts<S> for AdminUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthUser { user } = AuthUser::from_request_parts(parts, state).await?;
        if !user.role.can_manage_options() {
            return Err(ApiError::Forbidden);
        }
        Ok(Self { user })
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

/// `GET /api/auth/me` — the caller's identity.
pub async fn me(auth: AuthUser) -> Json<SessionUser> {
    Json(auth.user)
}
