//! Test doubles shared by unit tests, integration tests and the server crate.
//!
//! Enabled for this crate's own tests and, for dependents, through the
//! `test-support` feature.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{
    Mutex, MutexGuard,
    atomic::{AtomicUsize, Ordering},
};
use tokio::sync::Notify;
use uuid::Uuid;

use crate::booking::{
    Booking, BookingDraft, BookingId, BookingStatus, GameBookingCount, LifecycleEvent,
    LifecycleHook, WeekDayBookingCount,
};
use crate::db::{BookingRepository, RepositoryError, RepositoryResult};
use crate::discord::{
    ChatClient, DiscordError, DiscordResult, DiscordUser, GuildSession, Member, Message, OAuthToken,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Pending booking for next week, requested by `user1` with `player2` invited
pub fn sample_draft() -> BookingDraft {
    BookingDraft {
        game: "Warhammer 40k".to_string(),
        user_id: "1".to_string(),
        username: "user1".to_string(),
        points: 2000,
        description: String::new(),
        reminder_enabled: false,
        date_time: Utc::now() + Duration::days(7),
        players: vec!["user1".to_string(), "player2".to_string()],
    }
}

#[derive(Default)]
struct RepositoryState {
    bookings: HashMap<BookingId, Booking>,
    fail_reads: bool,
    fail_writes: bool,
    /// Status forced onto a booking right before the next conditional write
    interleaved: Option<(BookingId, BookingStatus)>,
}

/// `BookingRepository` over a `HashMap`, with the same conditional-write
/// semantics as the PostgreSQL implementation
#[derive(Default)]
pub struct InMemoryBookingRepository {
    state: Mutex<RepositoryState>,
}

impl InMemoryBookingRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a booking as-is, status included
    pub fn with_booking(self, booking: Booking) -> Self {
        lock(&self.state).bookings.insert(booking.id, booking);
        self
    }

    /// Stored copy of a booking
    pub fn get(&self, id: BookingId) -> Option<Booking> {
        lock(&self.state).bookings.get(&id).cloned()
    }

    /// Make every read fail with a database error
    pub fn fail_reads(&self) {
        lock(&self.state).fail_reads = true;
    }

    /// Make every write fail with a database error; reads keep working
    pub fn fail_writes(&self) {
        lock(&self.state).fail_writes = true;
    }

    /// Simulate a concurrent writer moving `id` to `status` between the
    /// engine's read and its write
    pub fn interleave_status(&self, id: BookingId, status: BookingStatus) {
        lock(&self.state).interleaved = Some((id, status));
    }

    fn read(&self) -> RepositoryResult<MutexGuard<'_, RepositoryState>> {
        let state = lock(&self.state);
        if state.fail_reads {
            return Err(RepositoryError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(state)
    }

    /// Lock for a conditional write on `id` expecting `expected`
    fn write(
        &self,
        id: BookingId,
        expected: &BookingStatus,
    ) -> RepositoryResult<MutexGuard<'_, RepositoryState>> {
        let mut state = lock(&self.state);
        if state.fail_writes {
            return Err(RepositoryError::Database(sqlx::Error::PoolTimedOut));
        }

        if let Some((target, status)) = state.interleaved.take() {
            if let Some(booking) = state.bookings.get_mut(&target) {
                booking.status = status;
            }
        }

        let miss = match state.bookings.get(&id) {
            None => Some(RepositoryError::NotFound(id)),
            Some(current) if &current.status != expected => Some(RepositoryError::StatusConflict {
                id,
                expected: expected.clone(),
                actual: current.status.clone(),
            }),
            Some(_) => None,
        };

        match miss {
            Some(e) => Err(e),
            None => Ok(state),
        }
    }

    fn counted(state: &RepositoryState) -> impl Iterator<Item = &Booking> {
        state.bookings.values().filter(|b| {
            !matches!(
                b.status,
                BookingStatus::Pending | BookingStatus::Canceled | BookingStatus::Refused
            )
        })
    }

    fn tally(keys: impl Iterator<Item = String>) -> Vec<(String, i64)> {
        let mut counts: HashMap<String, i64> = HashMap::new();
        for key in keys {
            *counts.entry(key).or_default() += 1;
        }

        let mut counts: Vec<_> = counts.into_iter().collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        counts
    }

    fn game_counts<'a>(bookings: impl Iterator<Item = &'a Booking>) -> Vec<GameBookingCount> {
        Self::tally(bookings.map(|b| b.game.clone()))
            .into_iter()
            .map(|(game, count)| GameBookingCount { game, count })
            .collect()
    }
}

#[async_trait]
impl BookingRepository for InMemoryBookingRepository {
    async fn active_bookings(&self, now: DateTime<Utc>) -> RepositoryResult<Vec<Booking>> {
        let state = self.read()?;
        let mut bookings: Vec<_> = state
            .bookings
            .values()
            .filter(|b| b.date_time >= now)
            .cloned()
            .collect();
        bookings.sort_by_key(|b| b.date_time);
        Ok(bookings)
    }

    async fn find_by_id(&self, id: BookingId) -> RepositoryResult<Booking> {
        self.read()?
            .bookings
            .get(&id)
            .cloned()
            .ok_or(RepositoryError::NotFound(id))
    }

    async fn find_by_username(&self, username: &str) -> RepositoryResult<Vec<Booking>> {
        let state = self.read()?;
        let mut bookings: Vec<_> = state
            .bookings
            .values()
            .filter(|b| b.username == username || b.players.iter().any(|p| p == username))
            .cloned()
            .collect();
        bookings.sort_by_key(|b| b.date_time);
        Ok(bookings)
    }

    async fn insert(&self, draft: &BookingDraft) -> RepositoryResult<Booking> {
        let mut state = lock(&self.state);
        if state.fail_writes {
            return Err(RepositoryError::Database(sqlx::Error::PoolTimedOut));
        }

        let booking = Booking::from_draft(Uuid::new_v4(), draft.clone());
        state.bookings.insert(booking.id, booking.clone());
        Ok(booking)
    }

    async fn update(&self, booking: &Booking, expected: &BookingStatus) -> RepositoryResult<()> {
        let mut state = self.write(booking.id, expected)?;
        if let Some(stored) = state.bookings.get_mut(&booking.id) {
            stored.game = booking.game.clone();
            stored.points = booking.points;
            stored.description = booking.description.clone();
            stored.reminder_enabled = booking.reminder_enabled;
            stored.date_time = booking.date_time;
            stored.players = booking.players.clone();
        }
        Ok(())
    }

    async fn set_status(
        &self,
        id: BookingId,
        expected: &BookingStatus,
        status: &BookingStatus,
    ) -> RepositoryResult<()> {
        let mut state = self.write(id, expected)?;
        if let Some(stored) = state.bookings.get_mut(&id) {
            stored.status = status.clone();
        }
        Ok(())
    }

    async fn count_per_game(&self) -> RepositoryResult<Vec<GameBookingCount>> {
        let state = self.read()?;
        Ok(Self::game_counts(Self::counted(&state)))
    }

    async fn count_per_week_day(&self) -> RepositoryResult<Vec<WeekDayBookingCount>> {
        let state = self.read()?;
        let days = Self::counted(&state).map(|b| b.date_time.format("%A").to_string());
        Ok(Self::tally(days)
            .into_iter()
            .map(|(week_day, count)| WeekDayBookingCount { week_day, count })
            .collect())
    }

    async fn count_per_game_in_period(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> RepositoryResult<Vec<GameBookingCount>> {
        let state = self.read()?;
        Ok(Self::game_counts(
            Self::counted(&state).filter(|b| b.date_time >= start && b.date_time <= end),
        ))
    }
}

/// Hook remembering every event it receives
#[derive(Default)]
pub struct RecordingHook {
    events: Mutex<Vec<LifecycleEvent>>,
}

impl RecordingHook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<LifecycleEvent> {
        lock(&self.events).clone()
    }
}

impl LifecycleHook for RecordingHook {
    fn after_commit(&self, event: LifecycleEvent) {
        lock(&self.events).push(event);
    }
}

/// Scripted Discord double implementing both [`ChatClient`] and [`GuildSession`]
#[derive(Default)]
pub struct ScriptedChatClient {
    members: Vec<Member>,
    sessions: HashMap<String, Member>,
    codes: HashMap<String, String>,
    fail_searches: bool,
    fail_sends: bool,
    searches: AtomicUsize,
    session_lookups: AtomicUsize,
    send_attempts: AtomicUsize,
    send_signal: Notify,
    sent: Mutex<Vec<(String, Message)>>,
}

impl ScriptedChatClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Guild member returned by member search
    pub fn with_member(mut self, id: &str, username: &str) -> Self {
        self.members.push(member(id, username, &[]));
        self
    }

    /// Access token resolving to a guild member with the given roles
    pub fn with_session(mut self, token: &str, id: &str, username: &str, roles: &[&str]) -> Self {
        self.sessions
            .insert(token.to_string(), member(id, username, roles));
        self
    }

    /// OAuth authorization code exchanging to `access_token`
    pub fn with_code(mut self, code: &str, access_token: &str) -> Self {
        self.codes.insert(code.to_string(), access_token.to_string());
        self
    }

    pub fn failing_searches(mut self) -> Self {
        self.fail_searches = true;
        self
    }

    pub fn failing_sends(mut self) -> Self {
        self.fail_sends = true;
        self
    }

    pub fn search_count(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }

    pub fn session_lookups(&self) -> usize {
        self.session_lookups.load(Ordering::SeqCst)
    }

    /// Successfully delivered messages with their channel
    pub fn sent_messages(&self) -> Vec<(String, Message)> {
        lock(&self.sent).clone()
    }

    /// Wait until at least `count` sends were attempted, successful or not.
    /// Returns `false` if that does not happen within five seconds.
    pub async fn wait_for_send_attempts(&self, count: usize) -> bool {
        let wait = async {
            loop {
                let signal = self.send_signal.notified();
                if self.send_attempts.load(Ordering::SeqCst) >= count {
                    return;
                }
                signal.await;
            }
        };
        tokio::time::timeout(std::time::Duration::from_secs(5), wait)
            .await
            .is_ok()
    }
}

fn member(id: &str, username: &str, roles: &[&str]) -> Member {
    Member {
        user: DiscordUser {
            id: id.to_string(),
            username: username.to_string(),
        },
        roles: roles.iter().map(|r| r.to_string()).collect(),
    }
}

fn unauthorized() -> DiscordError {
    DiscordError::Api {
        status: 401,
        body: r#"{"message": "401: Unauthorized", "code": 0}"#.to_string(),
    }
}

#[async_trait]
impl ChatClient for ScriptedChatClient {
    async fn send_message(&self, channel_id: &str, message: &Message) -> DiscordResult<()> {
        let result = if self.fail_sends {
            Err(DiscordError::RequestFailed("connection reset".to_string()))
        } else if channel_id.trim().is_empty() {
            Err(DiscordError::EmptyChannel)
        } else {
            lock(&self.sent).push((channel_id.to_string(), message.clone()));
            Ok(())
        };

        self.send_attempts.fetch_add(1, Ordering::SeqCst);
        self.send_signal.notify_waiters();
        result
    }

    async fn search_members(&self, query: &str, limit: u32) -> DiscordResult<Vec<Member>> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        if self.fail_searches {
            return Err(DiscordError::RequestFailed("timed out".to_string()));
        }

        let query = query.to_lowercase();
        Ok(self
            .members
            .iter()
            .filter(|m| m.user.username.to_lowercase().starts_with(&query))
            .take(limit as usize)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl GuildSession for ScriptedChatClient {
    async fn exchange_code(&self, code: &str) -> DiscordResult<OAuthToken> {
        let access_token = self.codes.get(code).ok_or_else(|| DiscordError::Api {
            status: 400,
            body: r#"{"error": "invalid_grant"}"#.to_string(),
        })?;

        Ok(OAuthToken {
            access_token: access_token.clone(),
            expires_in: 604800,
            refresh_token: format!("refresh-{access_token}"),
            scope: "identify guilds.members.read".to_string(),
            token_type: "Bearer".to_string(),
        })
    }

    async fn current_member(&self, access_token: &str) -> DiscordResult<Member> {
        self.session_lookups.fetch_add(1, Ordering::SeqCst);
        self.sessions.get(access_token).cloned().ok_or_else(unauthorized)
    }
}
