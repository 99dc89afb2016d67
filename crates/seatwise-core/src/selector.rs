//! # Assignment Selector
//!
//! Confirm-time logic: re-validate the chosen candidate against a freshly
//! built interval index, and pick deterministically when the caller leaves
//! the choice open.
//!
//! ## No Silent Substitution
//! If the requested candidate is gone, the selector fails with
//! `SlotNoLongerAvailable` even when sibling candidates are still free.
//! The caller re-runs search; anything else would seat a party at tables
//! they never saw.

use chrono::{Duration, NaiveDateTime};

use crate::error::{EngineError, EngineResult};
use crate::interval_index::{HoldPolicy, IntervalIndex};
use crate::types::Candidate;

// =============================================================================
// Re-validation
// =============================================================================

/// Re-validates `candidate` at `slot` against a fresh index.
///
/// ## Arguments
/// * `index` - interval index rebuilt from a fresh store read; intervals may
///   have changed since the search that produced the candidate
/// * `seating_duration_minutes` - seating length being confirmed
///
/// ## Errors
/// [`EngineError::SlotNoLongerAvailable`] when any member table got taken.
pub fn revalidate(
    candidate: &Candidate,
    index: &IntervalIndex,
    slot: NaiveDateTime,
    seating_duration_minutes: u32,
) -> EngineResult<()> {
    let seating_end = slot + Duration::minutes(i64::from(seating_duration_minutes));
    if index.all_free(&candidate.table_ids, slot, seating_end, HoldPolicy::Include) {
        Ok(())
    } else {
        Err(EngineError::SlotNoLongerAvailable {
            slot,
            table_ids: candidate.table_ids.clone(),
        })
    }
}

// =============================================================================
// Deterministic Pick
// =============================================================================

/// Picks the best candidate from an already-probed slot: least wasted
/// capacity, ties broken by the lowest table id.
///
/// Returns `None` for an empty list - no availability, not an error.
pub fn best_candidate<'a>(candidates: &'a [Candidate], party_size: u32) -> Option<&'a Candidate> {
    candidates.iter().min_by(|a, b| {
        a.wasted_capacity(party_size)
            .cmp(&b.wasted_capacity(party_size))
            .then_with(|| a.table_ids.cmp(&b.table_ids))
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ReservationRow, ReservationStatus};
    use chrono::NaiveDate;

    fn dt(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 14)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn taken(table: &str, start: NaiveDateTime, end: NaiveDateTime) -> ReservationRow {
        ReservationRow {
            id: "r-1".to_string(),
            venue_id: "v-1".to_string(),
            table_ids: vec![table.to_string()],
            start,
            end,
            status: ReservationStatus::Confirmed,
            hold_expires_at: None,
        }
    }

    #[test]
    fn test_revalidate_passes_when_still_free() {
        let index = IntervalIndex::build(&[], 0, dt(12, 0));
        let candidate = Candidate::new(vec!["t1".into()], 4);
        assert!(revalidate(&candidate, &index, dt(19, 0), 90).is_ok());
    }

    #[test]
    fn test_revalidate_fails_after_losing_the_race() {
        // Another writer took t1 between search and confirm.
        let index = IntervalIndex::build(&[taken("t1", dt(19, 0), dt(20, 30))], 0, dt(18, 0));
        let candidate = Candidate::new(vec!["t1".into()], 4);

        let err = revalidate(&candidate, &index, dt(19, 0), 90).unwrap_err();
        assert!(matches!(err, EngineError::SlotNoLongerAvailable { .. }));
    }

    #[test]
    fn test_revalidate_combination_checks_every_member() {
        let index = IntervalIndex::build(&[taken("t3", dt(19, 0), dt(20, 0))], 0, dt(18, 0));
        let pair = Candidate::new(vec!["t2".into(), "t3".into()], 8);

        assert!(revalidate(&pair, &index, dt(19, 0), 60).is_err());
        assert!(revalidate(&pair, &index, dt(20, 0), 60).is_ok());
    }

    #[test]
    fn test_best_candidate_least_waste_then_lowest_id() {
        let candidates = vec![
            Candidate::new(vec!["t5".into()], 6),
            Candidate::new(vec!["t2".into()], 4),
            Candidate::new(vec!["t1".into()], 4),
        ];
        let best = best_candidate(&candidates, 4).unwrap();
        assert_eq!(best.table_ids, vec!["t1".to_string()]);

        assert!(best_candidate(&[], 4).is_none());
    }
}
