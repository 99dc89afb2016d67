//! # Shift Calendar Resolver
//!
//! Converts a venue's operating-hours configuration into bounded
//! open/close spans for a given date.
//!
//! ## Resolution Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Shift Resolution                                   │
//! │                                                                         │
//! │  resolve(date)                                                         │
//! │       │                                                                 │
//! │       ├── 1. Closure covering the date?       → InvalidShift           │
//! │       │                                                                 │
//! │       ├── 2. Special hours for the date?                               │
//! │       │        ├── marked closed              → InvalidShift           │
//! │       │        └── has shifts                 → use them               │
//! │       │                                                                 │
//! │       ├── 3. Weekly hours for the weekday?    → use them               │
//! │       │                                                                 │
//! │       └── 4. Nothing configured               → InvalidShift           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Overnight Shifts
//! A shift whose close time is not after its open time (e.g. 18:00-01:00)
//! closes on the *next* calendar day. The resolved span carries full
//! datetimes so downstream code never re-derives day boundaries.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

// =============================================================================
// Shift Configuration
// =============================================================================

/// One operating shift: opening hours plus seating parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shift {
    pub open: NaiveTime,
    pub close: NaiveTime,

    /// Minimum turn time: a seating holds its table for at least this many
    /// minutes from the seating start, even if the party leaves early.
    pub turnover_minutes: u32,

    /// Length of the seating interval probed for new bookings. When absent,
    /// the party-size default from [`default_seating_minutes`] applies.
    pub seating_duration_minutes: Option<u32>,
}

/// A dated override of the weekly hours (holiday hours, private events).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialHours {
    pub date: NaiveDate,
    pub is_closed: bool,
    /// Replacement shifts when not closed.
    pub shifts: Vec<Shift>,
    pub reason: Option<String>,
}

/// An inclusive date range during which the venue is closed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Closure {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: Option<String>,
}

impl Closure {
    #[inline]
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}

/// Full shift configuration for a venue.
///
/// Weekly entries may hold several shifts per weekday (lunch and dinner
/// service); special hours override a single date; closures override
/// everything.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShiftConfig {
    /// Shifts per weekday. Missing weekday = closed that day.
    pub weekly: Vec<(Weekday, Vec<Shift>)>,
    pub special: Vec<SpecialHours>,
    pub closures: Vec<Closure>,
}

// =============================================================================
// Resolved Span
// =============================================================================

/// A shift resolved to concrete datetimes for one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftSpan {
    pub open: NaiveDateTime,
    pub close: NaiveDateTime,
    pub turnover_minutes: u32,
    pub seating_duration_minutes: Option<u32>,
}

impl ShiftSpan {
    /// Whether `[start, end)` lies entirely inside this span.
    #[inline]
    pub fn contains_window(&self, start: NaiveDateTime, end: NaiveDateTime) -> bool {
        self.open <= start && end <= self.close
    }

    /// Seating duration effective for a party, falling back to the
    /// party-size default when the shift doesn't pin one.
    #[inline]
    pub fn effective_seating_minutes(&self, party_size: u32) -> u32 {
        self.seating_duration_minutes
            .unwrap_or_else(|| default_seating_minutes(party_size))
    }
}

impl ShiftConfig {
    /// Resolves the configuration into ordered open/close spans for `date`.
    ///
    /// Fails with [`EngineError::InvalidShift`] when the venue has no shift
    /// on that date; callers must treat this as zero availability rather
    /// than a generic error.
    pub fn resolve(&self, date: NaiveDate) -> EngineResult<Vec<ShiftSpan>> {
        if self.closures.iter().any(|c| c.covers(date)) {
            return Err(EngineError::InvalidShift { date });
        }

        if let Some(special) = self.special.iter().find(|s| s.date == date) {
            if special.is_closed || special.shifts.is_empty() {
                return Err(EngineError::InvalidShift { date });
            }
            return Ok(materialize(&special.shifts, date));
        }

        let weekday = date.weekday();
        let shifts = self
            .weekly
            .iter()
            .find(|(day, _)| *day == weekday)
            .map(|(_, shifts)| shifts.as_slice())
            .unwrap_or_default();

        if shifts.is_empty() {
            return Err(EngineError::InvalidShift { date });
        }
        Ok(materialize(shifts, date))
    }
}

/// Turns configured shifts into datetime spans, handling overnight close.
fn materialize(shifts: &[Shift], date: NaiveDate) -> Vec<ShiftSpan> {
    let mut spans: Vec<ShiftSpan> = shifts
        .iter()
        .map(|s| {
            let open = date.and_time(s.open);
            // close <= open means the shift runs past midnight
            let close = if s.close > s.open {
                date.and_time(s.close)
            } else {
                date.and_time(s.close) + Duration::days(1)
            };
            ShiftSpan {
                open,
                close,
                turnover_minutes: s.turnover_minutes,
                seating_duration_minutes: s.seating_duration_minutes,
            }
        })
        .collect();
    spans.sort_by_key(|s| s.open);
    spans
}

// =============================================================================
// Seating Duration Defaults
// =============================================================================

/// Default seating duration by party size, in minutes.
///
/// ## Tiers
/// ```text
/// 1-2 guests   →  90 min
/// 3-4 guests   → 120 min
/// 5-6 guests   → 150 min
/// 7-12 guests  → 180 min
/// 13+ guests   → 240 min   (special-event territory)
/// ```
pub fn default_seating_minutes(party_size: u32) -> u32 {
    match party_size {
        0..=2 => 90,
        3..=4 => 120,
        5..=6 => 150,
        7..=12 => 180,
        _ => 240,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
