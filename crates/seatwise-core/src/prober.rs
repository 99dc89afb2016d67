//! # Time-Slot Prober
//!
//! Tests every candidate against the interval index for each slot in a
//! request window.
//!
//! ## Probe Loop
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Slot Probing                                     │
//! │                                                                         │
//! │  for slot in [window_start, window_end) step granularity               │
//! │       │                                                                 │
//! │       ├── skip slot if seating would run past the shift close          │
//! │       │                                                                 │
//! │       └── for each candidate                                           │
//! │               all member tables free over                              │
//! │               [slot, slot + seating_duration)?                         │
//! │                   ├── yes → candidate available at this slot           │
//! │                   └── no  → next candidate                             │
//! │                                                                         │
//! │  A slot with zero available candidates is still reported - as an       │
//! │  ordinary empty result, never an error.                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::BTreeSet;

use chrono::{Duration, NaiveDateTime};

use crate::catalog::TableCatalog;
use crate::interval_index::{HoldPolicy, IntervalIndex};
use crate::types::{Candidate, SlotResult, TableId};
use crate::DEFAULT_SLOT_GRANULARITY_MINUTES;

// =============================================================================
// Options
// =============================================================================

/// Knobs for a probing pass.
#[derive(Debug, Clone)]
pub struct ProbeOptions {
    /// Distance between consecutive slots, in minutes.
    pub granularity_minutes: u32,

    /// Length of the seating interval tested for each candidate.
    pub seating_duration_minutes: u32,

    /// Shift close; slots whose seating would run past it are skipped.
    /// `None` disables the check (callers that pre-clamp the window).
    pub hard_close: Option<NaiveDateTime>,

    /// Whether live holds occupy tables during this pass.
    pub policy: HoldPolicy,
}

impl ProbeOptions {
    /// Standard options for a seating length, default granularity.
    pub fn for_seating(seating_duration_minutes: u32) -> Self {
        ProbeOptions {
            granularity_minutes: DEFAULT_SLOT_GRANULARITY_MINUTES,
            seating_duration_minutes,
            hard_close: None,
            policy: HoldPolicy::Include,
        }
    }
}

// =============================================================================
// Probing
// =============================================================================

/// Probes every slot in `[window_start, window_end)`.
///
/// The window end is exclusive: a window of 18:00-21:00 with 30-minute
/// granularity probes 18:00 through 20:30.
pub fn probe_window(
    index: &IntervalIndex,
    candidates: &[Candidate],
    catalog: &TableCatalog,
    window_start: NaiveDateTime,
    window_end: NaiveDateTime,
    options: &ProbeOptions,
) -> Vec<SlotResult> {
    let step = Duration::minutes(i64::from(options.granularity_minutes.max(1)));
    let seating = Duration::minutes(i64::from(options.seating_duration_minutes));

    let mut results = Vec::new();
    let mut slot = window_start;
    while slot < window_end {
        let seating_end = slot + seating;
        let within_close = options.hard_close.map_or(true, |close| seating_end <= close);
        if within_close {
            results.push(probe_slot(index, candidates, catalog, slot, seating_end, options));
        }
        slot += step;
    }
    results
}

/// Probes a single slot, returning the available candidates and the
/// deduplicated capacity/type aggregations.
pub fn probe_slot(
    index: &IntervalIndex,
    candidates: &[Candidate],
    catalog: &TableCatalog,
    slot: NaiveDateTime,
    seating_end: NaiveDateTime,
    options: &ProbeOptions,
) -> SlotResult {
    let available: Vec<Candidate> = candidates
        .iter()
        .filter(|c| index.all_free(&c.table_ids, slot, seating_end, options.policy))
        .cloned()
        .collect();

    // One deduplicating aggregation step for capacity and types: a table
    // appearing in several candidates counts exactly once.
    let distinct: BTreeSet<&TableId> = available
        .iter()
        .flat_map(|c| c.table_ids.iter())
        .collect();
    let total_capacity = distinct
        .iter()
        .filter_map(|id| catalog.table(id))
        .map(|t| t.capacity_max)
        .sum();
    let table_types = distinct
        .iter()
        .filter_map(|id| catalog.table(id))
        .map(|t| t.table_type)
        .collect();

    SlotResult {
        slot,
        candidates: available,
        total_capacity,
        table_types,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
