//! HTTP API for the table booking server.
//!
//! # Modules
//!
//! - [`bookings`]: Booking lifecycle and statistics endpoints
//! - [`discord`]: Discord user lookup and OAuth callback
//! - [`middleware`]: Discord token authentication and the admin gate
//! - [`request_id`]: Request correlation
//! - [`error`]: Error to JSON response mapping
//!
//! # Endpoints Overview
//!
//! ```text
//! GET  /health                                  - Health check (public)
//! GET  /api/discord/user/info                   - Authenticated caller
//! GET  /api/discord/user/search?query=          - Guild usernames (public)
//! GET  /api/discord/oauth/callback?code=        - OAuth code exchange (public)
//! GET  /api/v1/bookings                         - Upcoming bookings
//! POST /api/v1/bookings                         - Request a booking
//! GET  /api/v1/bookings/booking/{id}            - Booking by ID
//! GET  /api/v1/bookings/{username}              - Bookings of a user
//! PUT  /api/v1/bookings/{id}/accept             - Accept (admin)
//! PUT  /api/v1/bookings/{id}/refuse?reason=     - Refuse (admin)
//! PUT  /api/v1/bookings/{id}/cancel             - Cancel (owner or player)
//! PUT  /api/v1/bookings/{id}/modify             - Edit a pending booking (owner or player)
//! GET  /api/v1/bookings/stats/game              - Accepted bookings per game
//! GET  /api/v1/bookings/stats/game/period       - Same, between two dates
//! GET  /api/v1/bookings/stats/day               - Accepted bookings per weekday
//! ```
//!
//! Every `/api/v1/bookings` route requires the `accesstoken` header.
//!
//! # CORS
//!
//! CORS is configured permissively; the booking front-end is served from
//! another origin.

pub mod bookings;
pub mod discord;
pub mod error;
pub mod middleware;
pub mod request_id;

use axum::{Json, Router, response::IntoResponse, routing::get};
use serde_json::json;
use std::sync::Arc;
use table_booking::{
    BookingService, Caller,
    discord::{ChatClient, GuildSession, Member},
    notify::ExpiringCache,
};
use tower_http::cors::CorsLayer;

/// Application state shared across all HTTP handlers.
///
/// Cloned for each request; every field is cheap to clone.
#[derive(Clone)]
pub struct AppState {
    /// Booking lifecycle engine
    pub bookings: BookingService,
    /// Member search for the user picker
    pub chat: Arc<dyn ChatClient>,
    /// Token exchange and token → member resolution
    pub session: Arc<dyn GuildSession>,
    /// Guild members keyed by access token
    pub members: Arc<dyn ExpiringCache<Member>>,
    /// Role granting admin rights; empty means nobody is admin
    pub admin_role_id: String,
}

impl AppState {
    /// Caller identity for an authenticated guild member
    pub fn caller(&self, member: &Member) -> Caller {
        Caller {
            id: member.user.id.clone(),
            username: member.user.username.clone(),
            admin: !self.admin_role_id.is_empty() && member.has_role(&self.admin_role_id),
        }
    }
}

/// Create the complete API router with all endpoints and middleware.
///
/// # Example
///
/// ```rust,no_run
/// # use tb_server::api::{create_router, AppState};
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// # let state: AppState = unimplemented!();
/// let app = create_router(state);
/// let listener = tokio::net::TcpListener::bind("127.0.0.1:9090").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/discord", discord::router(state.clone()))
        .nest("/api/v1/bookings", bookings::router(state.clone()))
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Liveness probe for load balancers.
///
/// ```bash
/// curl http://localhost:9090/health
/// # {"status":"ok"}
/// ```
async fn health_check() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}
