//! Booking repository trait and its PostgreSQL implementation.
//!
//! The engine only depends on [`BookingRepository`], so tests can swap in an
//! in-memory store (see `test_support`).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};
use std::sync::Arc;

use super::errors::{RepositoryError, RepositoryResult};
use crate::booking::{
    Booking, BookingDraft, BookingId, BookingStatus, GameBookingCount, WeekDayBookingCount,
};

/// Trait for booking storage operations
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Bookings scheduled at or after `now`
    async fn active_bookings(&self, now: DateTime<Utc>) -> RepositoryResult<Vec<Booking>>;

    /// Find booking by ID
    async fn find_by_id(&self, id: BookingId) -> RepositoryResult<Booking>;

    /// Bookings owned by `username` or listing it as a player
    async fn find_by_username(&self, username: &str) -> RepositoryResult<Vec<Booking>>;

    /// Insert a new pending booking and return it with its generated ID
    async fn insert(&self, draft: &BookingDraft) -> RepositoryResult<Booking>;

    /// Overwrite the mutable fields, provided the stored status still equals `expected`
    async fn update(&self, booking: &Booking, expected: &BookingStatus) -> RepositoryResult<()>;

    /// Move a booking from `expected` to `status`
    async fn set_status(
        &self,
        id: BookingId,
        expected: &BookingStatus,
        status: &BookingStatus,
    ) -> RepositoryResult<()>;

    /// Accepted bookings per game, most played first
    async fn count_per_game(&self) -> RepositoryResult<Vec<GameBookingCount>>;

    /// Accepted bookings per day of the week, busiest first
    async fn count_per_week_day(&self) -> RepositoryResult<Vec<WeekDayBookingCount>>;

    /// Accepted bookings per game scheduled between `start` and `end` inclusive
    async fn count_per_game_in_period(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> RepositoryResult<Vec<GameBookingCount>>;
}

const BOOKING_COLUMNS: &str = r#"id, game, COALESCE("userId", '') AS user_id, COALESCE(username, '') AS username,
    points, description, status, COALESCE("reminderEnabled", false) AS reminder_enabled,
    "dateTime" AS date_time, players"#;

/// Statuses excluded from every aggregate
const UNCOUNTED_STATUSES: &str = "('pending', 'canceled', 'refused')";

/// PostgreSQL implementation of `BookingRepository`
#[derive(Clone)]
pub struct PgBookingRepository {
    pool: Arc<PgPool>,
}

impl PgBookingRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    fn booking_from_row(row: &PgRow) -> Booking {
        Booking {
            id: row.get("id"),
            game: row.get("game"),
            user_id: row.get("user_id"),
            username: row.get("username"),
            points: row.get("points"),
            description: row.get("description"),
            status: BookingStatus::from(row.get::<String, _>("status")),
            reminder_enabled: row.get("reminder_enabled"),
            date_time: row.get("date_time"),
            players: row.get("players"),
        }
    }

    /// Explain why a conditional write touched no row
    async fn write_miss(&self, id: BookingId, expected: &BookingStatus) -> RepositoryError {
        let current = sqlx::query(r#"SELECT status FROM "game-table-booking".booking WHERE id = $1"#)
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await;

        match current {
            Ok(Some(row)) => RepositoryError::StatusConflict {
                id,
                expected: expected.clone(),
                actual: BookingStatus::from(row.get::<String, _>("status")),
            },
            Ok(None) => RepositoryError::NotFound(id),
            Err(e) => RepositoryError::Database(e),
        }
    }

    fn game_counts(rows: Vec<PgRow>) -> Vec<GameBookingCount> {
        rows.iter()
            .map(|r| GameBookingCount {
                game: r.get("game"),
                count: r.get("booking_count"),
            })
            .collect()
    }
}

#[async_trait]
impl BookingRepository for PgBookingRepository {
    async fn active_bookings(&self, now: DateTime<Utc>) -> RepositoryResult<Vec<Booking>> {
        let rows = sqlx::query(&format!(
            r#"SELECT {BOOKING_COLUMNS} FROM "game-table-booking".booking
               WHERE "dateTime" >= $1
               ORDER BY "dateTime""#
        ))
        .bind(now)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows.iter().map(Self::booking_from_row).collect())
    }

    async fn find_by_id(&self, id: BookingId) -> RepositoryResult<Booking> {
        let row = sqlx::query(&format!(
            r#"SELECT {BOOKING_COLUMNS} FROM "game-table-booking".booking WHERE id = $1"#
        ))
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await?
        .ok_or(RepositoryError::NotFound(id))?;

        Ok(Self::booking_from_row(&row))
    }

    async fn find_by_username(&self, username: &str) -> RepositoryResult<Vec<Booking>> {
        let rows = sqlx::query(&format!(
            r#"SELECT {BOOKING_COLUMNS} FROM "game-table-booking".booking
               WHERE username = $1 OR $1 = ANY(players)
               ORDER BY "dateTime""#
        ))
        .bind(username)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows.iter().map(Self::booking_from_row).collect())
    }

    async fn insert(&self, draft: &BookingDraft) -> RepositoryResult<Booking> {
        let row = sqlx::query(
            r#"INSERT INTO "game-table-booking".booking
                (game, "userId", username, points, description, status, "reminderEnabled", "dateTime", players)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
               RETURNING id"#,
        )
        .bind(&draft.game)
        .bind(&draft.user_id)
        .bind(&draft.username)
        .bind(draft.points)
        .bind(&draft.description)
        .bind(BookingStatus::Pending.as_str())
        .bind(draft.reminder_enabled)
        .bind(draft.date_time)
        .bind(&draft.players)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(Booking::from_draft(row.get("id"), draft.clone()))
    }

    async fn update(&self, booking: &Booking, expected: &BookingStatus) -> RepositoryResult<()> {
        let result = sqlx::query(
            r#"UPDATE "game-table-booking".booking
               SET game = $1, points = $2, description = $3, "reminderEnabled" = $4,
                   "dateTime" = $5, players = $6
               WHERE id = $7 AND status = $8"#,
        )
        .bind(&booking.game)
        .bind(booking.points)
        .bind(&booking.description)
        .bind(booking.reminder_enabled)
        .bind(booking.date_time)
        .bind(&booking.players)
        .bind(booking.id)
        .bind(expected.as_str())
        .execute(self.pool.as_ref())
        .await?;

        if result.rows_affected() == 0 {
            return Err(self.write_miss(booking.id, expected).await);
        }

        Ok(())
    }

    async fn set_status(
        &self,
        id: BookingId,
        expected: &BookingStatus,
        status: &BookingStatus,
    ) -> RepositoryResult<()> {
        let result = sqlx::query(
            r#"UPDATE "game-table-booking".booking SET status = $1 WHERE id = $2 AND status = $3"#,
        )
        .bind(status.as_str())
        .bind(id)
        .bind(expected.as_str())
        .execute(self.pool.as_ref())
        .await?;

        if result.rows_affected() == 0 {
            return Err(self.write_miss(id, expected).await);
        }

        Ok(())
    }

    async fn count_per_game(&self) -> RepositoryResult<Vec<GameBookingCount>> {
        let rows = sqlx::query(&format!(
            r#"SELECT game, COUNT(*) AS booking_count FROM "game-table-booking".booking
               WHERE status NOT IN {UNCOUNTED_STATUSES}
               GROUP BY game
               ORDER BY booking_count DESC"#
        ))
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(Self::game_counts(rows))
    }

    async fn count_per_week_day(&self) -> RepositoryResult<Vec<WeekDayBookingCount>> {
        let rows = sqlx::query(&format!(
            r#"SELECT TRIM(TO_CHAR("dateTime", 'Day')) AS day_of_week, COUNT(*) AS booking_count
               FROM "game-table-booking".booking
               WHERE status NOT IN {UNCOUNTED_STATUSES}
               GROUP BY day_of_week
               ORDER BY booking_count DESC"#
        ))
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows
            .iter()
            .map(|r| WeekDayBookingCount {
                week_day: r.get("day_of_week"),
                count: r.get("booking_count"),
            })
            .collect())
    }

    async fn count_per_game_in_period(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> RepositoryResult<Vec<GameBookingCount>> {
        let rows = sqlx::query(&format!(
            r#"SELECT game, COUNT(*) AS booking_count FROM "game-table-booking".booking
               WHERE "dateTime" BETWEEN $1 AND $2
               AND status NOT IN {UNCOUNTED_STATUSES}
               GROUP BY game
               ORDER BY booking_count DESC"#
        ))
        .bind(start)
        .bind(end)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(Self::game_counts(rows))
    }
}
