//! # Venue Repository
//!
//! Database operations for venue layout and operating hours.
//!
//! ## What Lives Here
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Venue Repository                                  │
//! │                                                                         │
//! │  venues               → booking_window_days                            │
//! │  venue_tables         ┐                                                 │
//! │  table_joins          ┴─► TableCatalog (tables + combinability graph)  │
//! │  venue_shifts         ┐                                                 │
//! │  venue_special_hours  ├─► ShiftConfig (weekly / overrides / closures)  │
//! │  venue_closures       ┘                                                 │
//! │                                                                         │
//! │  Implements VenueConfigStore for the engine.                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Weekday storage: integer 0-6 with 0 = Monday, matching
//! `chrono::Weekday::num_days_from_monday`.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, Weekday};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use seatwise_core::shift::{Closure, Shift, ShiftConfig, SpecialHours};
use seatwise_core::{Table, TableCatalog, TableType};
use seatwise_engine::{StoreError, VenueConfigStore};

use crate::error::{DbError, DbResult};

/// Repository for venue configuration.
#[derive(Debug, Clone)]
pub struct VenueRepository {
    pool: SqlitePool,
}

// =============================================================================
// Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct VenueTableRow {
    id: String,
    venue_id: String,
    table_number: String,
    capacity_min: i64,
    capacity_max: i64,
    table_type: TableType,
    is_active: bool,
}

impl From<VenueTableRow> for Table {
    fn from(row: VenueTableRow) -> Self {
        Table {
            id: row.id,
            venue_id: row.venue_id,
            table_number: row.table_number,
            capacity_min: row.capacity_min as u32,
            capacity_max: row.capacity_max as u32,
            table_type: row.table_type,
            is_active: row.is_active,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ShiftRow {
    weekday: i64,
    open_time: NaiveTime,
    close_time: NaiveTime,
    turnover_minutes: i64,
    seating_duration_minutes: Option<i64>,
}

#[derive(sqlx::FromRow)]
struct SpecialHoursRow {
    date: NaiveDate,
    is_closed: bool,
    open_time: Option<NaiveTime>,
    close_time: Option<NaiveTime>,
    turnover_minutes: Option<i64>,
    seating_duration_minutes: Option<i64>,
    reason: Option<String>,
}

#[derive(sqlx::FromRow)]
struct ClosureRow {
    start_date: NaiveDate,
    end_date: NaiveDate,
    reason: Option<String>,
}

fn weekday_from_index(index: i64) -> Option<Weekday> {
    match index {
        0 => Some(Weekday::Mon),
        1 => Some(Weekday::Tue),
        2 => Some(Weekday::Wed),
        3 => Some(Weekday::Thu),
        4 => Some(Weekday::Fri),
        5 => Some(Weekday::Sat),
        6 => Some(Weekday::Sun),
        _ => None,
    }
}

impl VenueRepository {
    /// Creates a new VenueRepository.
    pub fn new(pool: SqlitePool) -> Self {
        VenueRepository { pool }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Gets the booking window for a venue.
    pub async fn booking_window_days(&self, venue_id: &str) -> DbResult<u32> {
        let days: Option<i64> =
            sqlx::query_scalar("SELECT booking_window_days FROM venues WHERE id = ?1")
                .bind(venue_id)
                .fetch_optional(&self.pool)
                .await?;

        days.map(|d| d as u32)
            .ok_or_else(|| DbError::not_found("venue", venue_id))
    }

    /// Loads the full table catalog for a venue.
    ///
    /// Inactive tables are included; the catalog itself hides them from
    /// candidate enumeration.
    pub async fn table_catalog(&self, venue_id: &str) -> DbResult<TableCatalog> {
        let tables: Vec<VenueTableRow> = sqlx::query_as(
            r#"
            SELECT id, venue_id, table_number, capacity_min, capacity_max,
                   table_type, is_active
            FROM venue_tables
            WHERE venue_id = ?1
            ORDER BY table_number
            "#,
        )
        .bind(venue_id)
        .fetch_all(&self.pool)
        .await?;

        let edges: Vec<(String, String)> = sqlx::query_as(
            r#"
            SELECT j.table_a, j.table_b
            FROM table_joins j
            JOIN venue_tables a ON a.id = j.table_a
            WHERE a.venue_id = ?1
            "#,
        )
        .bind(venue_id)
        .fetch_all(&self.pool)
        .await?;

        debug!(
            venue_id,
            tables = tables.len(),
            edges = edges.len(),
            "Loaded table catalog"
        );

        Ok(TableCatalog::new(
            tables.into_iter().map(Table::from).collect(),
            edges,
        ))
    }

    /// Loads the full shift configuration for a venue.
    pub async fn shift_config(&self, venue_id: &str) -> DbResult<ShiftConfig> {
        let shift_rows: Vec<ShiftRow> = sqlx::query_as(
            r#"
            SELECT weekday, open_time, close_time, turnover_minutes,
                   seating_duration_minutes
            FROM venue_shifts
            WHERE venue_id = ?1
            ORDER BY weekday, open_time
            "#,
        )
        .bind(venue_id)
        .fetch_all(&self.pool)
        .await?;

        let mut weekly: Vec<(Weekday, Vec<Shift>)> = Vec::new();
        for row in shift_rows {
            let Some(weekday) = weekday_from_index(row.weekday) else {
                continue;
            };
            let shift = Shift {
                open: row.open_time,
                close: row.close_time,
                turnover_minutes: row.turnover_minutes as u32,
                seating_duration_minutes: row.seating_duration_minutes.map(|m| m as u32),
            };
            match weekly.iter_mut().find(|(day, _)| *day == weekday) {
                Some((_, shifts)) => shifts.push(shift),
                None => weekly.push((weekday, vec![shift])),
            }
        }

        let special_rows: Vec<SpecialHoursRow> = sqlx::query_as(
            r#"
            SELECT date, is_closed, open_time, close_time, turnover_minutes,
                   seating_duration_minutes, reason
            FROM venue_special_hours
            WHERE venue_id = ?1
            ORDER BY date, open_time
            "#,
        )
        .bind(venue_id)
        .fetch_all(&self.pool)
        .await?;

        let mut special: Vec<SpecialHours> = Vec::new();
        for row in special_rows {
            let entry = match special.iter_mut().find(|s| s.date == row.date) {
                Some(entry) => entry,
                None => {
                    special.push(SpecialHours {
                        date: row.date,
                        is_closed: row.is_closed,
                        shifts: Vec::new(),
                        reason: row.reason.clone(),
                    });
                    special.last_mut().unwrap()
                }
            };
            if let (Some(open), Some(close)) = (row.open_time, row.close_time) {
                entry.shifts.push(Shift {
                    open,
                    close,
                    turnover_minutes: row.turnover_minutes.unwrap_or(90) as u32,
                    seating_duration_minutes: row.seating_duration_minutes.map(|m| m as u32),
                });
            }
        }

        let closure_rows: Vec<ClosureRow> = sqlx::query_as(
            r#"
            SELECT start_date, end_date, reason
            FROM venue_closures
            WHERE venue_id = ?1
            ORDER BY start_date
            "#,
        )
        .bind(venue_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ShiftConfig {
            weekly,
            special,
            closures: closure_rows
                .into_iter()
                .map(|row| Closure {
                    start_date: row.start_date,
                    end_date: row.end_date,
                    reason: row.reason,
                })
                .collect(),
        })
    }

    // =========================================================================
    // Writes (administration and seeding)
    // =========================================================================

    /// Inserts or updates a venue.
    pub async fn upsert_venue(
        &self,
        venue_id: &str,
        name: &str,
        booking_window_days: u32,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO venues (id, name, booking_window_days)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                booking_window_days = excluded.booking_window_days,
                updated_at = datetime('now')
            "#,
        )
        .bind(venue_id)
        .bind(name)
        .bind(booking_window_days as i64)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Inserts a table.
    pub async fn insert_table(&self, table: &Table) -> DbResult<()> {
        debug!(id = %table.id, table_number = %table.table_number, "Inserting table");

        sqlx::query(
            r#"
            INSERT INTO venue_tables (
                id, venue_id, table_number, capacity_min, capacity_max,
                table_type, is_active
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&table.id)
        .bind(&table.venue_id)
        .bind(&table.table_number)
        .bind(table.capacity_min as i64)
        .bind(table.capacity_max as i64)
        .bind(table.table_type)
        .bind(table.is_active)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Records that two tables may be physically joined.
    ///
    /// The pair is normalized to `(min, max)` id order before insert, so
    /// each undirected edge is stored once.
    pub async fn add_join(&self, table_a: &str, table_b: &str) -> DbResult<()> {
        let (a, b) = if table_a <= table_b {
            (table_a, table_b)
        } else {
            (table_b, table_a)
        };

        sqlx::query(
            r#"
            INSERT INTO table_joins (table_a, table_b)
            VALUES (?1, ?2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(a)
        .bind(b)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Inserts a weekly shift.
    pub async fn insert_shift(
        &self,
        venue_id: &str,
        weekday: Weekday,
        shift: &Shift,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO venue_shifts (
                id, venue_id, weekday, open_time, close_time,
                turnover_minutes, seating_duration_minutes
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(venue_id)
        .bind(weekday.num_days_from_monday() as i64)
        .bind(shift.open)
        .bind(shift.close)
        .bind(shift.turnover_minutes as i64)
        .bind(shift.seating_duration_minutes.map(|m| m as i64))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Inserts a dated override: one row when closed, one row per
    /// replacement shift otherwise.
    pub async fn insert_special_hours(
        &self,
        venue_id: &str,
        special: &SpecialHours,
    ) -> DbResult<()> {
        if special.is_closed || special.shifts.is_empty() {
            sqlx::query(
                r#"
                INSERT INTO venue_special_hours (id, venue_id, date, is_closed, reason)
                VALUES (?1, ?2, ?3, 1, ?4)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(venue_id)
            .bind(special.date)
            .bind(&special.reason)
            .execute(&self.pool)
            .await?;
            return Ok(());
        }

        for shift in &special.shifts {
            sqlx::query(
                r#"
                INSERT INTO venue_special_hours (
                    id, venue_id, date, is_closed, open_time, close_time,
                    turnover_minutes, seating_duration_minutes, reason
                ) VALUES (?1, ?2, ?3, 0, ?4, ?5, ?6, ?7, ?8)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(venue_id)
            .bind(special.date)
            .bind(shift.open)
            .bind(shift.close)
            .bind(shift.turnover_minutes as i64)
            .bind(shift.seating_duration_minutes.map(|m| m as i64))
            .bind(&special.reason)
            .execute(&self.pool)
            .await?;
        }

        Ok(())
    }

    /// Inserts a closure range.
    pub async fn insert_closure(&self, venue_id: &str, closure: &Closure) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO venue_closures (id, venue_id, start_date, end_date, reason)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(venue_id)
        .bind(closure.start_date)
        .bind(closure.end_date)
        .bind(&closure.reason)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// =============================================================================
// Collaborator Trait Implementation
// =============================================================================

#[async_trait]
impl VenueConfigStore for VenueRepository {
    async fn table_catalog(&self, venue_id: &str) -> Result<TableCatalog, StoreError> {
        VenueRepository::table_catalog(self, venue_id)
            .await
            .map_err(StoreError::from)
    }

    async fn shift_config(&self, venue_id: &str) -> Result<ShiftConfig, StoreError> {
        VenueRepository::shift_config(self, venue_id)
            .await
            .map_err(StoreError::from)
    }

    async fn booking_window_days(&self, venue_id: &str) -> Result<u32, StoreError> {
        VenueRepository::booking_window_days(self, venue_id)
            .await
            .map_err(StoreError::from)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
