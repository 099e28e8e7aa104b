//! Discord user API handlers.
//!
//! Backs the front-end's login flow and player picker:
//! - OAuth authorization code exchange
//! - Identity of the authenticated caller
//! - Username search within the guild

use axum::{
    Json, Router,
    extract::{Extension, Query, State},
    middleware::from_fn_with_state,
    routing::get,
};
use serde::Deserialize;
use table_booking::{Caller, discord::OAuthToken};

use super::{AppState, error::ApiError, middleware::discord_auth};

/// Upper bound on usernames returned by a search
pub const SEARCH_LIMIT: u32 = 20;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    pub code: String,
}

pub fn router(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/user/info", get(user_info))
        .route_layer(from_fn_with_state(state, discord_auth));

    Router::new()
        .route("/user/search", get(search_users))
        .route("/oauth/callback", get(oauth_callback))
        .merge(protected)
}

/// Authenticated caller, admin flag included.
///
/// ```json
/// {"id": "80351110224678912", "username": "user1", "admin": false}
/// ```
pub async fn user_info(Extension(caller): Extension<Caller>) -> Json<Caller> {
    Json(caller)
}

/// Usernames of guild members starting with `query`.
///
/// # Errors
///
/// - `400 Bad Request`: Empty query
/// - `500 Internal Server Error`: Discord search failed
pub async fn search_users(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<String>>, ApiError> {
    let query = params.query.trim();
    if query.is_empty() {
        return Err(ApiError::BadRequest("query cannot be empty".to_string()));
    }

    let members = state
        .chat
        .search_members(query, SEARCH_LIMIT)
        .await
        .map_err(|source| ApiError::Upstream {
            action: "search users",
            source,
        })?;

    Ok(Json(members.into_iter().map(|m| m.user.username).collect()))
}

/// Exchange an OAuth authorization code for an access token.
///
/// # Errors
///
/// - `400 Bad Request`: Missing code
/// - `500 Internal Server Error`: Discord rejected the exchange
pub async fn oauth_callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> Result<Json<OAuthToken>, ApiError> {
    if params.code.is_empty() {
        return Err(ApiError::BadRequest("missing code".to_string()));
    }

    let token = state
        .session
        .exchange_code(&params.code)
        .await
        .map_err(|source| ApiError::Upstream {
            action: "get oauth2 token",
            source,
        })?;

    Ok(Json(token))
}
