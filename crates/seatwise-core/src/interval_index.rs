//! # Reservation Interval Index
//!
//! Per-table sorted occupied-interval lists, built fresh for every search
//! from raw reservation rows and queried during probing.
//!
//! ## Build Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Interval Index Build                                 │
//! │                                                                         │
//! │  Raw rows for (venue, date)                                            │
//! │       │                                                                 │
//! │       ├── drop holds whose TTL elapsed (as_of)                         │
//! │       │   (this is how an abandoned hold releases its slot)            │
//! │       │                                                                 │
//! │       ├── inflate: occupied = [start, max(end, start + turnover))      │
//! │       │   (turnover is the minimum turn time per seating)              │
//! │       │                                                                 │
//! │       ├── fan out to every member table of the row                     │
//! │       │                                                                 │
//! │       └── per table: sort by start, coalesce overlaps                  │
//! │                                                                         │
//! │  Result: per-table sorted, disjoint lists                              │
//! │          • one list with holds included (default view)                 │
//! │          • one list of confirmed rows only (waitlist admissibility)    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Query Cost
//! `is_table_free` is a single `partition_point` binary search over the
//! table's disjoint list: O(log n) per table per probe. Coalescing at build
//! time is what makes the single-neighbor check after the search sound -
//! held rows may transiently overlap each other, but never after merging.

use std::collections::HashMap;

use chrono::{Duration, NaiveDateTime};

use crate::types::{ReservationRow, ReservationStatus, TableId};

// =============================================================================
// Hold Policy
// =============================================================================

/// Whether held-but-unconfirmed reservations occupy their tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HoldPolicy {
    /// Holds occupy tables (the default for search and reserve).
    #[default]
    Include,
    /// Only confirmed rows occupy tables. Used when checking waitlist
    /// admissibility against confirmed bookings alone.
    ConfirmedOnly,
}

// =============================================================================
// Occupied Span
// =============================================================================

/// A half-open occupied interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Span {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

#[derive(Debug, Clone, Default)]
struct TableIntervals {
    /// Holds + confirmed, sorted and disjoint.
    all: Vec<Span>,
    /// Confirmed only, sorted and disjoint.
    confirmed: Vec<Span>,
}

// =============================================================================
// Interval Index
// =============================================================================

/// Derived occupied-interval index for one search execution.
///
/// The index is exclusively owned by the search that built it and is never
/// mutated in place; a new search builds a new index from a fresh read.
#[derive(Debug, Clone, Default)]
pub struct IntervalIndex {
    per_table: HashMap<TableId, TableIntervals>,
}

impl IntervalIndex {
    /// Builds the index from raw rows.
    ///
    /// ## Arguments
    /// * `rows` - raw reservation rows for the (venue, date) under search
    /// * `turnover_minutes` - minimum turn time enforced per seating
    /// * `as_of` - instant used to drop expired holds
    pub fn build(rows: &[ReservationRow], turnover_minutes: u32, as_of: NaiveDateTime) -> Self {
        let turnover = Duration::minutes(i64::from(turnover_minutes));
        let mut per_table: HashMap<TableId, TableIntervals> = HashMap::new();

        for row in rows {
            if row.is_expired_hold(as_of) {
                continue;
            }

            // A seating holds its table for at least the turn time.
            let occupied_end = row.end.max(row.start + turnover);
            let span = Span {
                start: row.start,
                end: occupied_end,
            };

            for table_id in &row.table_ids {
                let entry = per_table.entry(table_id.clone()).or_default();
                entry.all.push(span);
                if row.status == ReservationStatus::Confirmed {
                    entry.confirmed.push(span);
                }
            }
        }

        for intervals in per_table.values_mut() {
            coalesce(&mut intervals.all);
            coalesce(&mut intervals.confirmed);
        }

        IntervalIndex { per_table }
    }

    /// Whether `table_id` is free over the half-open window `[start, end)`.
    ///
    /// A table with no rows at all is free. Touching intervals do not
    /// conflict: a table occupied until `T` is free for a window starting
    /// at `T`.
    pub fn is_table_free(
        &self,
        table_id: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
        policy: HoldPolicy,
    ) -> bool {
        let Some(intervals) = self.per_table.get(table_id) else {
            return true;
        };
        let spans = match policy {
            HoldPolicy::Include => &intervals.all,
            HoldPolicy::ConfirmedOnly => &intervals.confirmed,
        };

        // First span that starts at-or-after the window end; only the span
        // before it can overlap, because spans are sorted and disjoint.
        let idx = spans.partition_point(|s| s.start < end);
        idx == 0 || spans[idx - 1].end <= start
    }

    /// Whether every table in `table_ids` is simultaneously free.
    pub fn all_free(
        &self,
        table_ids: &[TableId],
        start: NaiveDateTime,
        end: NaiveDateTime,
        policy: HoldPolicy,
    ) -> bool {
        table_ids
            .iter()
            .all(|id| self.is_table_free(id, start, end, policy))
    }

    /// Number of tables with at least one occupied interval.
    pub fn occupied_table_count(&self) -> usize {
        self.per_table.len()
    }
}

/// Sorts spans by start and merges overlapping or touching neighbors.
fn coalesce(spans: &mut Vec<Span>) {
    if spans.len() < 2 {
        return;
    }
    spans.sort_by_key(|s| s.start);
    let mut merged: Vec<Span> = Vec::with_capacity(spans.len());
    for span in spans.drain(..) {
        match merged.last_mut() {
            Some(last) if span.start <= last.end => {
                last.end = last.end.max(span.end);
            }
            _ => merged.push(span),
        }
    }
    *spans = merged;
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn dt(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 14)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn row(id: &str, tables: &[&str], start: NaiveDateTime, end: NaiveDateTime) -> ReservationRow {
        ReservationRow {
            id: id.to_string(),
            venue_id: "v-1".to_string(),
            table_ids: tables.iter().map(|t| t.to_string()).collect(),
            start,
            end,
            status: ReservationStatus::Confirmed,
            hold_expires_at: None,
        }
    }

    #[test]
    fn test_unknown_table_is_free() {
        let index = IntervalIndex::build(&[], 90, dt(12, 0));
        assert!(index.is_table_free("t1", dt(18, 0), dt(19, 0), HoldPolicy::Include));
    }

    #[test]
    fn test_basic_overlap_detection() {
        let rows = vec![row("r1", &["t1"], dt(19, 0), dt(20, 30))];
        let index = IntervalIndex::build(&rows, 0, dt(12, 0));

        assert!(index.is_table_free("t1", dt(18, 0), dt(19, 0), HoldPolicy::Include));
        assert!(!index.is_table_free("t1", dt(18, 30), dt(19, 30), HoldPolicy::Include));
        assert!(!index.is_table_free("t1", dt(19, 30), dt(20, 0), HoldPolicy::Include));
        // touching at the occupied end is fine: freed at 20:30, seatable at 20:30
        assert!(index.is_table_free("t1", dt(20, 30), dt(21, 30), HoldPolicy::Include));
    }

    #[test]
    fn test_turnover_extends_short_seatings() {
        // 30-minute seating, 90-minute minimum turn: occupied until 20:30
        let rows = vec![row("r1", &["t1"], dt(19, 0), dt(19, 30))];
        let index = IntervalIndex::build(&rows, 90, dt(12, 0));

        assert!(!index.is_table_free("t1", dt(19, 30), dt(20, 30), HoldPolicy::Include));
        assert!(!index.is_table_free("t1", dt(20, 0), dt(21, 0), HoldPolicy::Include));
        assert!(index.is_table_free("t1", dt(20, 30), dt(21, 30), HoldPolicy::Include));
    }

    #[test]
    fn test_turnover_never_shrinks_long_seatings() {
        // 3-hour banquet with a 90-minute turn configured: end stays 22:00
        let rows = vec![row("r1", &["t1"], dt(19, 0), dt(22, 0))];
        let index = IntervalIndex::build(&rows, 90, dt(12, 0));

        assert!(!index.is_table_free("t1", dt(21, 0), dt(22, 0), HoldPolicy::Include));
        assert!(index.is_table_free("t1", dt(22, 0), dt(23, 0), HoldPolicy::Include));
    }

    #[test]
    fn test_combination_rows_occupy_every_member() {
        let rows = vec![row("r1", &["t2", "t3"], dt(19, 0), dt(20, 30))];
        let index = IntervalIndex::build(&rows, 0, dt(12, 0));

        assert!(!index.is_table_free("t2", dt(19, 0), dt(20, 0), HoldPolicy::Include));
        assert!(!index.is_table_free("t3", dt(19, 0), dt(20, 0), HoldPolicy::Include));
        assert!(index.is_table_free("t4", dt(19, 0), dt(20, 0), HoldPolicy::Include));
    }

    #[test]
    fn test_expired_holds_release_their_interval() {
        let mut held = row("r1", &["t1"], dt(19, 0), dt(20, 30));
        held.status = ReservationStatus::Held;
        held.hold_expires_at = Some(dt(18, 5));

        // before expiry the hold occupies the table
        let index = IntervalIndex::build(&[held.clone()], 0, dt(18, 0));
        assert!(!index.is_table_free("t1", dt(19, 0), dt(20, 0), HoldPolicy::Include));

        // after expiry a rebuild releases it
        let index = IntervalIndex::build(&[held], 0, dt(18, 10));
        assert!(index.is_table_free("t1", dt(19, 0), dt(20, 0), HoldPolicy::Include));
    }

    #[test]
    fn test_confirmed_only_policy_ignores_live_holds() {
        let mut held = row("r1", &["t1"], dt(19, 0), dt(20, 30));
        held.status = ReservationStatus::Held;
        held.hold_expires_at = Some(dt(23, 0));
        let confirmed = row("r2", &["t1"], dt(21, 0), dt(22, 0));

        let index = IntervalIndex::build(&[held, confirmed], 0, dt(18, 0));

        assert!(!index.is_table_free("t1", dt(19, 0), dt(20, 0), HoldPolicy::Include));
        assert!(index.is_table_free("t1", dt(19, 0), dt(20, 0), HoldPolicy::ConfirmedOnly));
        // the confirmed row blocks under both policies
        assert!(!index.is_table_free("t1", dt(21, 0), dt(21, 30), HoldPolicy::ConfirmedOnly));
    }

    #[test]
    fn test_overlapping_holds_coalesce() {
        // Two holds transiently overlapping the same table must not confuse
        // the single-neighbor overlap check.
        let mut h1 = row("r1", &["t1"], dt(19, 0), dt(20, 0));
        h1.status = ReservationStatus::Held;
        h1.hold_expires_at = Some(dt(23, 0));
        let mut h2 = row("r2", &["t1"], dt(19, 30), dt(21, 0));
        h2.status = ReservationStatus::Held;
        h2.hold_expires_at = Some(dt(23, 0));

        let index = IntervalIndex::build(&[h1, h2], 0, dt(18, 0));
        assert!(!index.is_table_free("t1", dt(20, 0), dt(20, 30), HoldPolicy::Include));
        assert!(index.is_table_free("t1", dt(21, 0), dt(22, 0), HoldPolicy::Include));
    }

    #[test]
    fn test_all_free_requires_every_member() {
        let rows = vec![row("r1", &["t2"], dt(19, 0), dt(20, 0))];
        let index = IntervalIndex::build(&rows, 0, dt(12, 0));

        let pair = vec!["t2".to_string(), "t3".to_string()];
        assert!(!index.all_free(&pair, dt(19, 0), dt(20, 0), HoldPolicy::Include));
        assert!(index.all_free(&pair, dt(20, 0), dt(21, 0), HoldPolicy::Include));
    }
}
