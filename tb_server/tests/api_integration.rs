//! Integration tests for the HTTP API.
//!
//! Drives the full router (auth middleware, admin gate, handlers, error
//! mapping) against the in-memory repository and a scripted Discord double.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use table_booking::booking::{Booking, BookingService, BookingStatus};
use table_booking::discord::Member;
use table_booking::notify::TtlCache;
use table_booking::test_support::{
    InMemoryBookingRepository, RecordingHook, ScriptedChatClient, sample_draft,
};
use tb_server::api::{AppState, create_router};
use tower::ServiceExt; // For `oneshot` method
use uuid::Uuid;

const ADMIN_ROLE: &str = "admin-role";

struct TestApp {
    app: Router,
    repo: Arc<InMemoryBookingRepository>,
    hook: Arc<RecordingHook>,
    discord: Arc<ScriptedChatClient>,
}

/// Helper to create the router with one booking per status already stored
fn create_test_app(seed: Vec<Booking>) -> TestApp {
    let repo = seed
        .into_iter()
        .fold(InMemoryBookingRepository::new(), |repo, booking| {
            repo.with_booking(booking)
        });
    let repo = Arc::new(repo);
    let hook = Arc::new(RecordingHook::new());
    let discord = Arc::new(
        ScriptedChatClient::new()
            .with_member("1", "user1")
            .with_member("2", "player2")
            .with_member("20", "player20")
            .with_session("user-token", "1", "user1", &[])
            .with_session("player-token", "2", "player2", &["member"])
            .with_session("stranger-token", "3", "someone", &[])
            .with_session("admin-token", "9", "admin", &[ADMIN_ROLE])
            .with_code("valid-code", "user-token"),
    );

    let members: Arc<TtlCache<Member>> = Arc::new(TtlCache::new(Duration::from_secs(60)));
    let state = AppState {
        bookings: BookingService::new(repo.clone(), hook.clone()),
        chat: discord.clone(),
        session: discord.clone(),
        members,
        admin_role_id: ADMIN_ROLE.to_string(),
    };

    TestApp {
        app: create_router(state),
        repo,
        hook,
        discord,
    }
}

fn booking_with_status(status: BookingStatus) -> Booking {
    let mut booking = Booking::from_draft(Uuid::new_v4(), sample_draft());
    booking.status = status;
    booking
}

/// Send a request and decode the JSON response body (`Null` when empty)
async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("accesstoken", token);
    }

    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    (status, json)
}

#[tokio::test]
async fn test_health_check_echoes_request_id() {
    let test = create_test_app(vec![]);

    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "req-42")
        .body(Body::empty())
        .unwrap();
    let response = test.app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-request-id"], "req-42");

    let (status, body) = send(&test.app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn test_bookings_require_access_token() {
    let test = create_test_app(vec![]);

    let (status, body) = send(&test.app, "GET", "/api/v1/bookings", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "missing authentication");

    let (status, body) = send(&test.app, "GET", "/api/v1/bookings", Some("forged"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid authentication");
}

#[tokio::test]
async fn test_member_lookup_is_cached_per_token() {
    let test = create_test_app(vec![]);

    for _ in 0..3 {
        let (status, _) =
            send(&test.app, "GET", "/api/v1/bookings", Some("user-token"), None).await;
        assert_eq!(status, StatusCode::OK);
    }

    assert_eq!(test.discord.session_lookups(), 1);
}

#[tokio::test]
async fn test_create_forces_pending_and_defaults_owner() {
    let test = create_test_app(vec![]);

    let (status, body) = send(
        &test.app,
        "POST",
        "/api/v1/bookings",
        Some("player-token"),
        Some(json!({
            "game": "Kill Team",
            "points": 500,
            "status": "accepted",
            "dateTime": "2030-06-01T18:00:00Z",
            "players": ["player2"]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "pending");
    assert_eq!(body["userId"], "2");
    assert_eq!(body["username"], "player2");

    let id: Uuid = body["id"].as_str().unwrap().parse().unwrap();
    assert_eq!(test.repo.get(id).unwrap().status, BookingStatus::Pending);
    assert_eq!(test.hook.events().len(), 1);
}

#[tokio::test]
async fn test_create_rejects_malformed_body() {
    let test = create_test_app(vec![]);

    let (status, body) = send(
        &test.app,
        "POST",
        "/api/v1/bookings",
        Some("user-token"),
        Some(json!({"points": "many"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "failed to parse JSON body");
    assert!(test.hook.events().is_empty());
}

#[tokio::test]
async fn test_accept_requires_admin() {
    let booking = booking_with_status(BookingStatus::Pending);
    let test = create_test_app(vec![booking.clone()]);
    let uri = format!("/api/v1/bookings/{}/accept", booking.id);

    let (status, body) = send(&test.app, "PUT", &uri, Some("user-token"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "not allowed");
    assert_eq!(test.repo.get(booking.id).unwrap().status, BookingStatus::Pending);

    let (status, body) = send(&test.app, "PUT", &uri, Some("admin-token"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "booking accepted");
    assert_eq!(test.repo.get(booking.id).unwrap().status, BookingStatus::Accepted);

    let (status, body) = send(&test.app, "PUT", &uri, Some("admin-token"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid booking state");
}

#[tokio::test]
async fn test_refuse_passes_reason_to_announcement() {
    let booking = booking_with_status(BookingStatus::Accepted);
    let test = create_test_app(vec![booking.clone()]);

    let uri = format!("/api/v1/bookings/{}/refuse?reason=table%20taken", booking.id);
    let (status, body) = send(&test.app, "PUT", &uri, Some("admin-token"), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "booking refused");

    let events = test.hook.events();
    assert_eq!(events.len(), 1);
    assert_eq!(
        serde_json::to_value(&events[0].kind).unwrap(),
        json!({"kind": "refused", "reason": "table taken"})
    );
}

#[tokio::test]
async fn test_cancel_by_player_and_stranger() {
    let booking = booking_with_status(BookingStatus::Pending);
    let test = create_test_app(vec![booking.clone()]);
    let uri = format!("/api/v1/bookings/{}/cancel", booking.id);

    let (status, _) = send(&test.app, "PUT", &uri, Some("stranger-token"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(test.repo.get(booking.id).unwrap().status, BookingStatus::Pending);

    let (status, body) = send(&test.app, "PUT", &uri, Some("player-token"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "booking canceled");
    assert_eq!(test.repo.get(booking.id).unwrap().status, BookingStatus::Canceled);
    assert_eq!(test.hook.events().len(), 1);
}

#[tokio::test]
async fn test_modify_accepted_booking_is_rejected() {
    let booking = booking_with_status(BookingStatus::Accepted);
    let test = create_test_app(vec![booking.clone()]);

    let (status, body) = send(
        &test.app,
        "PUT",
        &format!("/api/v1/bookings/{}/modify", booking.id),
        Some("user-token"),
        Some(json!({
            "game": "Blood Bowl",
            "points": 1100,
            "dateTime": "2030-06-01T18:00:00Z",
            "players": ["user1"]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid booking state");
    assert_eq!(test.repo.get(booking.id).unwrap().game, booking.game);
}

#[tokio::test]
async fn test_modify_pending_booking() {
    let booking = booking_with_status(BookingStatus::Pending);
    let test = create_test_app(vec![booking.clone()]);

    let (status, body) = send(
        &test.app,
        "PUT",
        &format!("/api/v1/bookings/{}/modify", booking.id),
        Some("player-token"),
        Some(json!({
            "game": "Blood Bowl",
            "points": 1100,
            "dateTime": "2030-06-01T18:00:00Z",
            "players": ["player2"]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "booking modified");

    let stored = test.repo.get(booking.id).unwrap();
    assert_eq!(stored.game, "Blood Bowl");
    assert_eq!(stored.username, "user1");
}

#[tokio::test]
async fn test_get_booking_by_id_and_username() {
    let booking = booking_with_status(BookingStatus::Pending);
    let test = create_test_app(vec![booking.clone()]);

    let uri = format!("/api/v1/bookings/booking/{}", booking.id);
    let (status, body) = send(&test.app, "GET", &uri, Some("user-token"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], booking.id.to_string());

    let uri = format!("/api/v1/bookings/booking/{}", Uuid::new_v4());
    let (status, body) = send(&test.app, "GET", &uri, Some("user-token"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "booking not found");

    let (status, body) =
        send(&test.app, "GET", "/api/v1/bookings/player2", Some("user-token"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_malformed_booking_id_is_json_400() {
    let test = create_test_app(vec![]);

    for (method, uri, token) in [
        ("GET", "/api/v1/bookings/booking/not-a-uuid", "user-token"),
        ("PUT", "/api/v1/bookings/not-a-uuid/cancel", "user-token"),
        ("PUT", "/api/v1/bookings/not-a-uuid/accept", "admin-token"),
        ("PUT", "/api/v1/bookings/not-a-uuid/refuse?reason=x", "admin-token"),
    ] {
        let (status, body) = send(&test.app, method, uri, Some(token), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{method} {uri}");
        assert_eq!(body, json!({"error": "invalid booking id"}), "{method} {uri}");
    }

    let (status, body) = send(
        &test.app,
        "PUT",
        "/api/v1/bookings/not-a-uuid/modify",
        Some("user-token"),
        Some(json!({
            "game": "Blood Bowl",
            "points": 1100,
            "dateTime": "2030-06-01T18:00:00Z",
            "players": ["user1"]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid booking id");
    assert!(test.hook.events().is_empty());
}

#[tokio::test]
async fn test_storage_failure_is_500() {
    let test = create_test_app(vec![]);
    test.repo.fail_reads();

    let (status, body) = send(&test.app, "GET", "/api/v1/bookings", Some("user-token"), None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "failed to fetch bookings");
}

#[tokio::test]
async fn test_stats_endpoints() {
    let test = create_test_app(vec![
        booking_with_status(BookingStatus::Accepted),
        booking_with_status(BookingStatus::Pending),
    ]);

    let (status, body) =
        send(&test.app, "GET", "/api/v1/bookings/stats/game", Some("user-token"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([{"game": "Warhammer 40k", "bookingCount": 1}]));

    let (status, body) =
        send(&test.app, "GET", "/api/v1/bookings/stats/day", Some("user-token"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["bookingCount"], 1);

    let (status, body) = send(
        &test.app,
        "GET",
        "/api/v1/bookings/stats/game/period?startPeriod=2020-01-01&endPeriod=2099-12-31",
        Some("user-token"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["bookingCount"], 1);

    let (status, body) = send(
        &test.app,
        "GET",
        "/api/v1/bookings/stats/game/period?startPeriod=yesterday&endPeriod=2099-12-31",
        Some("user-token"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "failed to parse startPeriod");
}

#[tokio::test]
async fn test_user_info_reports_admin_flag() {
    let test = create_test_app(vec![]);

    let (status, body) =
        send(&test.app, "GET", "/api/discord/user/info", Some("admin-token"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"id": "9", "username": "admin", "admin": true}));

    let (status, body) =
        send(&test.app, "GET", "/api/discord/user/info", Some("player-token"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["admin"], false);
}

#[tokio::test]
async fn test_user_search() {
    let test = create_test_app(vec![]);

    let (status, body) =
        send(&test.app, "GET", "/api/discord/user/search?query=player", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!(["player2", "player20"]));

    let (status, body) =
        send(&test.app, "GET", "/api/discord/user/search?query=%20", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "query cannot be empty");
}

#[tokio::test]
async fn test_oauth_callback() {
    let test = create_test_app(vec![]);

    let (status, body) = send(
        &test.app,
        "GET",
        "/api/discord/oauth/callback?code=valid-code",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["access_token"], "user-token");

    let (status, body) = send(
        &test.app,
        "GET",
        "/api/discord/oauth/callback?code=stale",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "failed to get oauth2 token");
}
