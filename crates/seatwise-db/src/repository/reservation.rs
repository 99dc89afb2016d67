//! # Reservation Repository
//!
//! Database operations for reservations and the insert-if-no-overlap
//! primitive.
//!
//! ## Write Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    insert_if_free                                       │
//! │                                                                         │
//! │  1. ACQUIRE WRITE GATE                                                 │
//! │     └── process-wide async mutex; writes serialize                     │
//! │                                                                         │
//! │  2. BEGIN TRANSACTION                                                  │
//! │     └── overlap check: any non-expired row sharing a table whose       │
//! │         [start_at, end_at) intersects the requested interval?          │
//! │             │                                                           │
//! │             ├── yes → rollback → OverlapConflict                       │
//! │             │                                                           │
//! │             └── no  → INSERT reservations + reservation_tables         │
//! │                                                                         │
//! │  3. COMMIT, then publish ChangeEvent                                   │
//! │                                                                         │
//! │  The check covers the raw seating interval; turnover inflation is a    │
//! │  read-side concern owned by the interval index.                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::SqlitePool;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use seatwise_core::{ReservationRow, ReservationStatus};
use seatwise_engine::{ConfirmOutcome, HoldRequest, PersistenceLayer, ReservationStore, StoreError};

use crate::error::{DbError, DbResult};
use crate::events::ChangeFeed;

/// Repository for reservation database operations.
#[derive(Debug, Clone)]
pub struct ReservationRepository {
    pool: SqlitePool,
    feed: ChangeFeed,
    /// Serializes writes; shared via [`crate::Database`].
    write_gate: Arc<Mutex<()>>,
}

// =============================================================================
// Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct JoinedRow {
    id: String,
    venue_id: String,
    start_at: NaiveDateTime,
    end_at: NaiveDateTime,
    status: ReservationStatus,
    hold_expires_at: Option<NaiveDateTime>,
    table_id: String,
}

/// Folds joined rows (one per member table) into reservation rows.
fn fold_rows(joined: Vec<JoinedRow>) -> Vec<ReservationRow> {
    let mut rows: Vec<ReservationRow> = Vec::new();
    for j in joined {
        match rows.last_mut().filter(|r| r.id == j.id) {
            Some(row) => row.table_ids.push(j.table_id),
            None => rows.push(ReservationRow {
                id: j.id,
                venue_id: j.venue_id,
                table_ids: vec![j.table_id],
                start: j.start_at,
                end: j.end_at,
                status: j.status,
                hold_expires_at: j.hold_expires_at,
            }),
        }
    }
    for row in &mut rows {
        row.table_ids.sort();
    }
    rows
}

impl ReservationRepository {
    /// Creates a new ReservationRepository.
    pub fn new(pool: SqlitePool, feed: ChangeFeed, write_gate: Arc<Mutex<()>>) -> Self {
        ReservationRepository {
            pool,
            feed,
            write_gate,
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Fetches all rows for a venue overlapping `[from, to)`.
    pub async fn fetch_overlapping(
        &self,
        venue_id: &str,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> DbResult<Vec<ReservationRow>> {
        let joined: Vec<JoinedRow> = sqlx::query_as(
            r#"
            SELECT r.id, r.venue_id, r.start_at, r.end_at, r.status,
                   r.hold_expires_at, rt.table_id
            FROM reservations r
            JOIN reservation_tables rt ON rt.reservation_id = r.id
            WHERE r.venue_id = ?1 AND r.start_at < ?2 AND r.end_at > ?3
            ORDER BY r.start_at, r.id
            "#,
        )
        .bind(venue_id)
        .bind(to)
        .bind(from)
        .fetch_all(&self.pool)
        .await?;

        Ok(fold_rows(joined))
    }

    /// Gets one reservation with its member tables.
    pub async fn get_by_id(&self, reservation_id: &str) -> DbResult<ReservationRow> {
        let joined: Vec<JoinedRow> = sqlx::query_as(
            r#"
            SELECT r.id, r.venue_id, r.start_at, r.end_at, r.status,
                   r.hold_expires_at, rt.table_id
            FROM reservations r
            JOIN reservation_tables rt ON rt.reservation_id = r.id
            WHERE r.id = ?1
            "#,
        )
        .bind(reservation_id)
        .fetch_all(&self.pool)
        .await?;

        fold_rows(joined)
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("reservation", reservation_id))
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Atomically inserts a held row unless a non-expired row overlaps any
    /// requested table.
    ///
    /// ## Returns
    /// The new reservation id.
    pub async fn insert_if_free(
        &self,
        hold: &HoldRequest,
        as_of: NaiveDateTime,
    ) -> DbResult<String> {
        let _gate = self.write_gate.lock().await;
        let mut tx = self.pool.begin().await?;

        let placeholders = vec!["?"; hold.table_ids.len()].join(", ");
        let sql = format!(
            r#"
            SELECT COUNT(*)
            FROM reservations r
            JOIN reservation_tables rt ON rt.reservation_id = r.id
            WHERE r.venue_id = ?
              AND r.start_at < ?
              AND r.end_at > ?
              AND (r.status = 'confirmed' OR r.hold_expires_at > ?)
              AND rt.table_id IN ({placeholders})
            "#
        );
        let mut query = sqlx::query_scalar::<_, i64>(&sql)
            .bind(&hold.venue_id)
            .bind(hold.end)
            .bind(hold.start)
            .bind(as_of);
        for table_id in &hold.table_ids {
            query = query.bind(table_id);
        }
        let conflicts = query.fetch_one(&mut *tx).await?;

        if conflicts > 0 {
            debug!(
                venue_id = %hold.venue_id,
                tables = ?hold.table_ids,
                start = %hold.start,
                "Overlap check rejected reservation"
            );
            return Err(DbError::OverlapConflict {
                table_ids: hold.table_ids.clone(),
            });
        }

        let reservation_id = Uuid::new_v4().to_string();
        sqlx::query(
            r#"
            INSERT INTO reservations (id, venue_id, start_at, end_at, status, hold_expires_at)
            VALUES (?1, ?2, ?3, ?4, 'held', ?5)
            "#,
        )
        .bind(&reservation_id)
        .bind(&hold.venue_id)
        .bind(hold.start)
        .bind(hold.end)
        .bind(hold.expires_at)
        .execute(&mut *tx)
        .await?;

        for table_id in &hold.table_ids {
            sqlx::query(
                r#"
                INSERT INTO reservation_tables (reservation_id, table_id)
                VALUES (?1, ?2)
                "#,
            )
            .bind(&reservation_id)
            .bind(table_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(
            reservation_id = %reservation_id,
            venue_id = %hold.venue_id,
            start = %hold.start,
            "Hold inserted"
        );
        self.feed.publish(&hold.venue_id, hold.start.date());

        Ok(reservation_id)
    }

    /// Promotes a held row to confirmed, if its TTL has not elapsed.
    ///
    /// Confirming an already-confirmed row is idempotent.
    pub async fn confirm_hold(
        &self,
        reservation_id: &str,
        as_of: NaiveDateTime,
    ) -> DbResult<ConfirmOutcome> {
        let _gate = self.write_gate.lock().await;

        let row = self.get_by_id(reservation_id).await?;

        if row.status == ReservationStatus::Confirmed {
            return Ok(ConfirmOutcome::Confirmed(row));
        }
        if row.is_expired_hold(as_of) {
            return Ok(ConfirmOutcome::Expired(row));
        }

        sqlx::query(
            r#"
            UPDATE reservations
            SET status = 'confirmed', hold_expires_at = NULL, updated_at = datetime('now')
            WHERE id = ?1
            "#,
        )
        .bind(reservation_id)
        .execute(&self.pool)
        .await?;

        info!(reservation_id, "Hold confirmed");
        self.feed.publish(&row.venue_id, row.start.date());

        Ok(ConfirmOutcome::Confirmed(ReservationRow {
            status: ReservationStatus::Confirmed,
            hold_expires_at: None,
            ..row
        }))
    }

    /// Deletes a held row, releasing its tables. Returns the removed row.
    pub async fn cancel_hold(&self, reservation_id: &str) -> DbResult<ReservationRow> {
        let _gate = self.write_gate.lock().await;

        let row = self.get_by_id(reservation_id).await?;
        if row.status == ReservationStatus::Confirmed {
            return Err(DbError::AlreadyConfirmed {
                id: reservation_id.to_string(),
            });
        }

        sqlx::query("DELETE FROM reservations WHERE id = ?1")
            .bind(reservation_id)
            .execute(&self.pool)
            .await?;

        info!(reservation_id, "Hold cancelled");
        self.feed.publish(&row.venue_id, row.start.date());

        Ok(row)
    }

    /// Deletes held rows whose TTL elapsed at or before `as_of`.
    ///
    /// Expired holds stop occupying tables as soon as an index is built
    /// past their expiry, so this sweep is housekeeping, not correctness.
    ///
    /// ## Returns
    /// Number of rows removed.
    pub async fn sweep_expired(&self, as_of: NaiveDateTime) -> DbResult<u64> {
        let _gate = self.write_gate.lock().await;

        let touched: Vec<(String, NaiveDateTime)> = sqlx::query_as(
            r#"
            SELECT venue_id, start_at FROM reservations
            WHERE status = 'held' AND hold_expires_at <= ?1
            "#,
        )
        .bind(as_of)
        .fetch_all(&self.pool)
        .await?;

        let result = sqlx::query(
            r#"
            DELETE FROM reservations
            WHERE status = 'held' AND hold_expires_at <= ?1
            "#,
        )
        .bind(as_of)
        .execute(&self.pool)
        .await?;

        let swept = result.rows_affected();
        if swept > 0 {
            info!(swept, "Swept expired holds");
            for (venue_id, start) in touched {
                self.feed.publish(&venue_id, start.date());
            }
        }

        Ok(swept)
    }
}

// =============================================================================
// Collaborator Trait Implementations
// =============================================================================

#[async_trait]
impl ReservationStore for ReservationRepository {
    async fn fetch_day(
        &self,
        venue_id: &str,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> Result<Vec<ReservationRow>, StoreError> {
        self.fetch_overlapping(venue_id, from, to)
            .await
            .map_err(StoreError::from)
    }
}

#[async_trait]
impl PersistenceLayer for ReservationRepository {
    async fn insert_if_free(
        &self,
        hold: &HoldRequest,
        as_of: NaiveDateTime,
    ) -> Result<String, StoreError> {
        ReservationRepository::insert_if_free(self, hold, as_of)
            .await
            .map_err(StoreError::from)
    }

    async fn confirm_hold(
        &self,
        reservation_id: &str,
        as_of: NaiveDateTime,
    ) -> Result<ConfirmOutcome, StoreError> {
        ReservationRepository::confirm_hold(self, reservation_id, as_of)
            .await
            .map_err(StoreError::from)
    }

    async fn cancel_hold(&self, reservation_id: &str) -> Result<ReservationRow, StoreError> {
        ReservationRepository::cancel_hold(self, reservation_id)
            .await
            .map_err(StoreError::from)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    use seatwise_core::{Table, TableType};

    use crate::pool::{Database, DbConfig};

    const VENUE: &str = "11111111-1111-4111-8111-111111111111";

    fn dt(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 14)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    async fn seeded_db() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let venues = db.venues();
        venues.upsert_venue(VENUE, "Test Venue", 30).await.unwrap();
        for (id, max) in [("t-1", 4), ("t-2", 2)] {
            venues
                .insert_table(&Table {
                    id: id.to_string(),
                    venue_id: VENUE.to_string(),
                    table_number: id.to_string(),
                    capacity_min: 2,
                    capacity_max: max,
                    table_type: TableType::Standard,
                    is_active: true,
                })
                .await
                .unwrap();
        }
        db
    }

    // Holds stay live until seating start; expiry cases override expires_at.
    fn hold(table_ids: &[&str], start: NaiveDateTime, end: NaiveDateTime) -> HoldRequest {
        HoldRequest {
            venue_id: VENUE.to_string(),
            table_ids: table_ids.iter().map(|s| s.to_string()).collect(),
            start,
            end,
            expires_at: start,
        }
    }

    #[tokio::test]
    async fn test_insert_and_fetch_round_trip() {
        let db = seeded_db().await;
        let repo = db.reservations();

        let id = repo
            .insert_if_free(&hold(&["t-1"], dt(19, 0), dt(20, 0)), dt(12, 0))
            .await
            .unwrap();

        let rows = repo
            .fetch_overlapping(VENUE, dt(0, 0), dt(23, 59))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, id);
        assert_eq!(rows[0].table_ids, vec!["t-1".to_string()]);
        assert_eq!(rows[0].status, ReservationStatus::Held);
    }

    #[tokio::test]
    async fn test_overlap_rejected() {
        let db = seeded_db().await;
        let repo = db.reservations();

        repo.insert_if_free(&hold(&["t-1"], dt(19, 0), dt(20, 0)), dt(12, 0))
            .await
            .unwrap();

        let err = repo
            .insert_if_free(&hold(&["t-1"], dt(19, 30), dt(20, 30)), dt(12, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::OverlapConflict { .. }));

        // the other table is untouched
        repo.insert_if_free(&hold(&["t-2"], dt(19, 0), dt(20, 0)), dt(12, 0))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_adjacent_intervals_do_not_conflict() {
        let db = seeded_db().await;
        let repo = db.reservations();

        repo.insert_if_free(&hold(&["t-1"], dt(18, 0), dt(19, 0)), dt(12, 0))
            .await
            .unwrap();
        // [19:00, 20:00) touches but does not overlap [18:00, 19:00)
        repo.insert_if_free(&hold(&["t-1"], dt(19, 0), dt(20, 0)), dt(12, 0))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_expired_hold_does_not_block() {
        let db = seeded_db().await;
        let repo = db.reservations();

        let mut expired = hold(&["t-1"], dt(19, 0), dt(20, 0));
        expired.expires_at = dt(12, 5);
        repo.insert_if_free(&expired, dt(12, 0)).await.unwrap();

        // past the expiry the same interval is insertable again
        repo.insert_if_free(&hold(&["t-1"], dt(19, 0), dt(20, 0)), dt(12, 10))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_combination_occupies_every_member() {
        let db = seeded_db().await;
        let repo = db.reservations();

        repo.insert_if_free(&hold(&["t-1", "t-2"], dt(19, 0), dt(20, 0)), dt(12, 0))
            .await
            .unwrap();

        let err = repo
            .insert_if_free(&hold(&["t-2"], dt(19, 0), dt(20, 0)), dt(12, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::OverlapConflict { .. }));
    }

    #[tokio::test]
    async fn test_confirm_and_cancel_lifecycle() {
        let db = seeded_db().await;
        let repo = db.reservations();

        let id = repo
            .insert_if_free(&hold(&["t-1"], dt(19, 0), dt(20, 0)), dt(12, 0))
            .await
            .unwrap();

        let outcome = repo.confirm_hold(&id, dt(12, 1)).await.unwrap();
        assert!(matches!(outcome, ConfirmOutcome::Confirmed(_)));

        // idempotent confirm
        let outcome = repo.confirm_hold(&id, dt(12, 2)).await.unwrap();
        assert!(matches!(outcome, ConfirmOutcome::Confirmed(_)));

        // confirmed rows cannot be cancelled
        let err = repo.cancel_hold(&id).await.unwrap_err();
        assert!(matches!(err, DbError::AlreadyConfirmed { .. }));
    }

    #[tokio::test]
    async fn test_confirm_after_expiry_reports_expired() {
        let db = seeded_db().await;
        let repo = db.reservations();

        let mut stale = hold(&["t-1"], dt(19, 0), dt(20, 0));
        stale.expires_at = dt(12, 5);
        let id = repo.insert_if_free(&stale, dt(12, 0)).await.unwrap();

        let outcome = repo.confirm_hold(&id, dt(12, 30)).await.unwrap();
        assert!(matches!(outcome, ConfirmOutcome::Expired(_)));
    }

    #[tokio::test]
    async fn test_cancel_removes_row() {
        let db = seeded_db().await;
        let repo = db.reservations();

        let id = repo
            .insert_if_free(&hold(&["t-1"], dt(19, 0), dt(20, 0)), dt(12, 0))
            .await
            .unwrap();
        repo.cancel_hold(&id).await.unwrap();

        let err = repo.get_by_id(&id).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_sweep_expired_holds() {
        let db = seeded_db().await;
        let repo = db.reservations();

        let mut expired = hold(&["t-1"], dt(19, 0), dt(20, 0));
        expired.expires_at = dt(12, 5);
        repo.insert_if_free(&expired, dt(12, 0)).await.unwrap();
        repo.insert_if_free(&hold(&["t-2"], dt(19, 0), dt(20, 0)), dt(12, 0))
            .await
            .unwrap();

        let swept = repo.sweep_expired(dt(12, 10)).await.unwrap();
        assert_eq!(swept, 1);

        let rows = repo
            .fetch_overlapping(VENUE, dt(0, 0), dt(23, 59))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].table_ids, vec!["t-2".to_string()]);
    }

    #[tokio::test]
    async fn test_concurrent_inserts_one_wins() {
        let db = seeded_db().await;
        let repo_a = db.reservations();
        let repo_b = db.reservations();

        let request = hold(&["t-1"], dt(19, 0), dt(20, 0));
        let (a, b) = tokio::join!(
            repo_a.insert_if_free(&request, dt(12, 0)),
            repo_b.insert_if_free(&request, dt(12, 0)),
        );

        assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);
        let loser = if a.is_ok() { b } else { a };
        assert!(matches!(loser, Err(DbError::OverlapConflict { .. })));
    }
}
