//! Discord authentication middleware for protected endpoints.
//!
//! Clients send the Discord OAuth access token obtained from
//! `/api/discord/oauth/callback` in the `accesstoken` header. The middleware
//! resolves it to a guild member, caches the member by token, and injects a
//! [`Caller`] into request extensions for downstream handlers.
//!
//! # Extracting the caller
//!
//! ```rust,no_run
//! use axum::extract::Extension;
//! use table_booking::Caller;
//!
//! async fn protected_handler(Extension(caller): Extension<Caller>) -> String {
//!     format!("Authenticated as {}", caller.username)
//! }
//! # let _ = protected_handler;
//! ```

use axum::{
    extract::{Extension, Request, State},
    middleware::Next,
    response::Response,
};
use table_booking::Caller;

use super::{AppState, error::ApiError};
use crate::logging::log_security_event;

/// Header carrying the caller's Discord access token
pub const ACCESS_TOKEN_HEADER: &str = "accesstoken";

/// Authentication middleware that resolves the access token and injects the caller.
///
/// # Behavior
///
/// - **Success**: Token resolves to a guild member → Injects `Caller` → Calls next handler
/// - **Missing header**: Returns `401 {"error": "missing authentication"}`
/// - **Unknown/expired token**: Returns `401 {"error": "invalid authentication"}`
pub async fn discord_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request
        .headers()
        .get(ACCESS_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string);

    let Some(token) = token else {
        return Err(ApiError::Unauthorized("missing authentication"));
    };

    let member = match state.members.get(&token).await {
        Some(member) => member,
        None => {
            let member = state.session.current_member(&token).await.map_err(|e| {
                log_security_event("invalid_token", None, &format!("Guild member lookup failed: {e}"));
                ApiError::Unauthorized("invalid authentication")
            })?;
            state.members.insert(token, member.clone()).await;
            member
        }
    };

    request.extensions_mut().insert(state.caller(&member));
    Ok(next.run(request).await)
}

/// Rejects callers without the admin role. Must run after [`discord_auth`].
pub async fn admin_only(
    Extension(caller): Extension<Caller>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !caller.admin {
        log_security_event(
            "admin_required",
            Some(&caller.username),
            &format!("{} {} denied", request.method(), request.uri().path()),
        );
        return Err(ApiError::Forbidden("not allowed"));
    }

    Ok(next.run(request).await)
}
