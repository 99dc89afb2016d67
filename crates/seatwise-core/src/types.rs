//! # Domain Types
//!
//! Core domain types used throughout Seatwise.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Table       │   │ ReservationRow  │   │    Candidate    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  table_ids      │       │
//! │  │  table_number   │   │  table_ids      │   │  combined_cap   │       │
//! │  │  capacity range │   │  start / end    │   │  requires_comb  │       │
//! │  │  table_type     │   │  status         │   └─────────────────┘       │
//! │  └─────────────────┘   └─────────────────┘                             │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   TableType     │   │ReservationStatus│   │   HoldStatus    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  Booth, Window  │   │  Held           │   │  Proposed       │       │
//! │  │  Patio, Standard│   │  Confirmed      │   │  Confirmed      │       │
//! │  │  Bar, Private   │   └─────────────────┘   │  Expired        │       │
//! │  └─────────────────┘                         │  Cancelled      │       │
//! │                                              └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID: (table_number, etc.) - human-readable, potentially mutable

use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Identifier for a venue table (UUID v4 as string).
pub type TableId = String;

// =============================================================================
// Table Type
// =============================================================================

/// Physical table category.
///
/// ## Why a Closed Enum?
/// Earlier iterations shuttled table types around as loose strings, merged
/// via flattening in some call paths and set-deduplicated in others. A closed
/// enum plus one explicit aggregation step ([`SlotResult::table_types`])
/// removes the duplicate-prone paths entirely.
///
/// The wildcard "any" is a guest *preference*, not a physical type, and is
/// expressed as an empty preference list instead of a variant.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TableType {
    Booth,
    Window,
    Patio,
    Standard,
    Bar,
    Private,
}

// =============================================================================
// Table
// =============================================================================

/// A physical table in a venue.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Table {
    /// Unique identifier (UUID v4).
    pub id: TableId,

    /// Venue this table belongs to.
    pub venue_id: String,

    /// Human-readable table number ("T1", "12", ...).
    pub table_number: String,

    /// Smallest party this table is offered to.
    pub capacity_min: u32,

    /// Largest party this table seats.
    pub capacity_max: u32,

    /// Physical category.
    pub table_type: TableType,

    /// Whether the table is in service (soft delete).
    pub is_active: bool,
}

impl Table {
    /// Checks whether a party fits this table on its own.
    #[inline]
    pub fn fits_party(&self, party_size: u32) -> bool {
        self.capacity_min <= party_size && party_size <= self.capacity_max
    }
}

// =============================================================================
// Reservation Status
// =============================================================================

/// Durable status of a reservation row.
///
/// Held rows occupy their tables by default; a hold past its expiry is
/// skipped when the interval index is built, which is how an abandoned
/// `Proposed` hold releases its interval back on the next search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    /// Temporary claim pending confirmation, subject to TTL expiry.
    Held,
    /// Finalized booking.
    Confirmed,
}

// =============================================================================
// Hold Status
// =============================================================================

/// Lifecycle of a hold handle: `Proposed → Confirmed | Expired | Cancelled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum HoldStatus {
    /// Created by `reserve`, waiting for confirmation.
    Proposed,
    /// Confirmed before the TTL elapsed.
    Confirmed,
    /// TTL elapsed without confirmation.
    Expired,
    /// Explicitly released by the caller.
    Cancelled,
}

// =============================================================================
// Reservation Row
// =============================================================================

/// A reservation as supplied by the Reservation Store.
///
/// `start`/`end` bound the *seating* interval (half-open, venue-local time).
/// The interval index inflates the end by the shift's turnover before the
/// table is considered free again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationRow {
    pub id: String,
    pub venue_id: String,
    /// One table for a plain booking, two or three for a combination.
    pub table_ids: Vec<TableId>,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub status: ReservationStatus,
    /// Expiry instant for held rows; `None` once confirmed.
    pub hold_expires_at: Option<NaiveDateTime>,
}

impl ReservationRow {
    /// True if this is a hold whose TTL has elapsed as of `as_of`.
    #[inline]
    pub fn is_expired_hold(&self, as_of: NaiveDateTime) -> bool {
        self.status == ReservationStatus::Held
            && self.hold_expires_at.map_or(false, |exp| exp <= as_of)
    }
}

// =============================================================================
// Time Window Request
// =============================================================================

/// A search request: seat `party_size` somewhere in `[start, end)` on `date`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TimeWindowRequest {
    pub venue_id: String,
    #[ts(as = "String")]
    pub date: NaiveDate,
    #[ts(as = "String")]
    pub start: NaiveTime,
    #[ts(as = "String")]
    pub end: NaiveTime,
    pub party_size: u32,
}

// =============================================================================
// Candidate
// =============================================================================

/// A single table or a valid table combination able to seat a party.
///
/// ## Invariants
/// - `table_ids` is sorted and holds 1 to [`crate::MAX_COMBINATION_TABLES`] ids
/// - `requires_combination` is `true` iff more than one id is present
/// - `combined_capacity >= party_size` for every candidate the generator emits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub table_ids: Vec<TableId>,
    pub combined_capacity: u32,
    pub requires_combination: bool,
}

impl Candidate {
    /// Builds a candidate from member tables, sorting ids for determinism.
    pub fn new(mut table_ids: Vec<TableId>, combined_capacity: u32) -> Self {
        table_ids.sort();
        let requires_combination = table_ids.len() > 1;
        Candidate {
            table_ids,
            combined_capacity,
            requires_combination,
        }
    }

    /// Seats beyond what the party needs.
    #[inline]
    pub fn wasted_capacity(&self, party_size: u32) -> u32 {
        self.combined_capacity.saturating_sub(party_size)
    }
}

// =============================================================================
// Slot Result
// =============================================================================

/// Availability outcome for one slot in a search window.
///
/// An empty `candidates` list is a normal "no availability" result, never an
/// error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotResult {
    /// Slot start (venue-local).
    pub slot: NaiveDateTime,

    /// Available candidates, in generator order (least wasted capacity first).
    pub candidates: Vec<Candidate>,

    /// Combined capacity over the *deduplicated* set of tables appearing in
    /// any candidate. A table shared by several candidates counts once.
    pub total_capacity: u32,

    /// Deduplicated table types across all candidates.
    ///
    /// This is the single aggregation step for type summaries; callers must
    /// not re-derive the value by concatenating per-candidate lists.
    pub table_types: BTreeSet<TableType>,
}

impl SlotResult {
    /// Distinct table ids across all candidates, sorted.
    pub fn distinct_tables(&self) -> BTreeSet<&TableId> {
        self.candidates
            .iter()
            .flat_map(|c| c.table_ids.iter())
            .collect()
    }

    /// True when nothing can seat the party at this slot.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

// =============================================================================
// Wire Shapes
// =============================================================================

/// Candidate as serialized for API consumers.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CandidateDto {
    pub table_ids: Vec<TableId>,
    pub capacity: u32,
    pub requires_combination: bool,
}

impl From<&Candidate> for CandidateDto {
    fn from(c: &Candidate) -> Self {
        CandidateDto {
            table_ids: c.table_ids.clone(),
            capacity: c.combined_capacity,
            requires_combination: c.requires_combination,
        }
    }
}

/// Slot result as serialized for API consumers:
/// `{ timeSlot: "HH:MM", candidates: [...], totalCapacity: int }`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SlotResultDto {
    /// Slot start formatted as "HH:MM".
    pub time_slot: String,
    pub candidates: Vec<CandidateDto>,
    pub total_capacity: u32,
}

impl From<&SlotResult> for SlotResultDto {
    fn from(r: &SlotResult) -> Self {
        SlotResultDto {
            time_slot: r.slot.format("%H:%M").to_string(),
            candidates: r.candidates.iter().map(CandidateDto::from).collect(),
            total_capacity: r.total_capacity,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
