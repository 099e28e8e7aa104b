//! Booking API handlers.
//!
//! Thin adapters over [`BookingService`](table_booking::BookingService): they
//! parse the request, pass the authenticated [`Caller`] where the engine
//! checks rights, and map [`BookingError`](table_booking::BookingError)s to
//! status codes through [`ApiError`].
//!
//! # Examples
//!
//! Request a booking:
//! ```bash
//! curl -X POST http://localhost:9090/api/v1/bookings \
//!   -H "accesstoken: TOKEN" \
//!   -H "Content-Type: application/json" \
//!   -d '{"game": "Warhammer 40k", "points": 2000, "dateTime": "2025-03-01T18:00:00Z", "players": ["player2"]}'
//! ```
//!
//! Refuse it:
//! ```bash
//! curl -X PUT "http://localhost:9090/api/v1/bookings/ID/refuse?reason=table%20taken" \
//!   -H "accesstoken: ADMIN_TOKEN"
//! ```

use axum::{
    Json, Router,
    extract::{
        Extension, Path, Query, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, put},
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use table_booking::{
    Booking, BookingChanges, BookingDraft, BookingId, Caller,
    booking::{GameBookingCount, WeekDayBookingCount},
};

use super::{
    AppState,
    error::ApiError,
    middleware::{admin_only, discord_auth},
};

/// Date format of the period statistics bounds
const PERIOD_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

impl MessageResponse {
    fn new(message: &'static str) -> Json<Self> {
        Json(Self { message })
    }
}

#[derive(Debug, Deserialize)]
pub struct RefuseParams {
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodParams {
    #[serde(default)]
    pub start_period: String,
    #[serde(default)]
    pub end_period: String,
}

pub fn router(state: AppState) -> Router<AppState> {
    let admin = Router::new()
        .route("/{id}/accept", put(accept))
        .route("/{id}/refuse", put(refuse))
        .route_layer(from_fn(admin_only));

    Router::new()
        .route("/", get(list_active).post(create))
        .route("/booking/{id}", get(get_booking))
        .route("/{id}/cancel", put(cancel))
        .route("/{id}/modify", put(modify))
        .route("/stats/game", get(game_stats))
        .route("/stats/game/period", get(game_stats_in_period))
        .route("/stats/day", get(week_day_stats))
        // Username lookup, named `id` to share the segment with the `/{id}/...` routes
        .route("/{id}", get(bookings_of_user))
        .merge(admin)
        .route_layer(from_fn_with_state(state, discord_auth))
}

/// Bookings scheduled from now on, earliest first
pub async fn list_active(State(state): State<AppState>) -> Result<Json<Vec<Booking>>, ApiError> {
    Ok(Json(state.bookings.active_bookings().await?))
}

/// # Errors
///
/// - `400 Bad Request`: ID is not a UUID
/// - `404 Not Found`: No booking with this ID
pub async fn get_booking(
    State(state): State<AppState>,
    id: Result<Path<BookingId>, PathRejection>,
) -> Result<Json<Booking>, ApiError> {
    let Path(id) = id.map_err(bad_id)?;
    Ok(Json(state.bookings.find_by_id(id).await?))
}

/// Bookings requested by `username` or listing it as a player
pub async fn bookings_of_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<Vec<Booking>>, ApiError> {
    Ok(Json(state.bookings.find_by_username(&username).await?))
}

/// Request a booking.
///
/// The stored booking is always `pending`. When the body names no requester,
/// the authenticated caller is used.
///
/// # Response
///
/// Returns `201 Created` with the stored booking.
///
/// # Errors
///
/// - `400 Bad Request`: Malformed JSON body
pub async fn create(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    payload: Result<Json<BookingDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<Booking>), ApiError> {
    let Json(mut draft) = payload.map_err(bad_body)?;
    if draft.user_id.is_empty() {
        draft.user_id = caller.id;
    }
    if draft.username.is_empty() {
        draft.username = caller.username;
    }

    let booking = state.bookings.create(draft).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

/// Edit a pending booking.
///
/// # Errors
///
/// - `400 Bad Request`: Malformed body or booking no longer pending
/// - `403 Forbidden`: Caller is neither the requester nor a player
/// - `404 Not Found`: No booking with this ID
pub async fn modify(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    id: Result<Path<BookingId>, PathRejection>,
    payload: Result<Json<BookingChanges>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Path(id) = id.map_err(bad_id)?;
    let Json(changes) = payload.map_err(bad_body)?;
    state.bookings.modify(id, changes, &caller).await?;
    Ok(MessageResponse::new("booking modified"))
}

pub async fn accept(
    State(state): State<AppState>,
    id: Result<Path<BookingId>, PathRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Path(id) = id.map_err(bad_id)?;
    state.bookings.accept(id).await?;
    Ok(MessageResponse::new("booking accepted"))
}

pub async fn refuse(
    State(state): State<AppState>,
    id: Result<Path<BookingId>, PathRejection>,
    Query(params): Query<RefuseParams>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Path(id) = id.map_err(bad_id)?;
    state.bookings.refuse(id, &params.reason).await?;
    Ok(MessageResponse::new("booking refused"))
}

pub async fn cancel(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    id: Result<Path<BookingId>, PathRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Path(id) = id.map_err(bad_id)?;
    state.bookings.cancel(id, &caller).await?;
    Ok(MessageResponse::new("booking canceled"))
}

pub async fn game_stats(
    State(state): State<AppState>,
) -> Result<Json<Vec<GameBookingCount>>, ApiError> {
    Ok(Json(state.bookings.count_per_game().await?))
}

/// Accepted bookings per game between `startPeriod` and `endPeriod`
/// (`YYYY-MM-DD`, both at midnight UTC, inclusive)
pub async fn game_stats_in_period(
    State(state): State<AppState>,
    Query(params): Query<PeriodParams>,
) -> Result<Json<Vec<GameBookingCount>>, ApiError> {
    let start = parse_period_bound("startPeriod", &params.start_period)?;
    let end = parse_period_bound("endPeriod", &params.end_period)?;

    Ok(Json(state.bookings.count_per_game_in_period(start, end).await?))
}

pub async fn week_day_stats(
    State(state): State<AppState>,
) -> Result<Json<Vec<WeekDayBookingCount>>, ApiError> {
    Ok(Json(state.bookings.count_per_week_day().await?))
}

fn bad_body(rejection: JsonRejection) -> ApiError {
    tracing::debug!(error = %rejection, "Rejected JSON body");
    ApiError::BadRequest("failed to parse JSON body".to_string())
}

fn bad_id(rejection: PathRejection) -> ApiError {
    tracing::debug!(error = %rejection, "Rejected booking ID");
    ApiError::BadRequest("invalid booking id".to_string())
}

fn parse_period_bound(name: &str, raw: &str) -> Result<DateTime<Utc>, ApiError> {
    NaiveDate::parse_from_str(raw, PERIOD_FORMAT)
        .map(|date| date.and_time(chrono::NaiveTime::MIN).and_utc())
        .map_err(|_| ApiError::BadRequest(format!("failed to parse {name}")))
}
