//! # Collaborator Traits
//!
//! The seams between the orchestrator and the outside world.
//!
//! ## Collaborators
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    AvailabilityEngine Collaborators                     │
//! │                                                                         │
//! │  ┌──────────────────────┐  fetch_day(venue, from, to)                  │
//! │  │  ReservationStore    │  → Vec<ReservationRow>                       │
//! │  └──────────────────────┘    raw rows; index building stays in core    │
//! │                                                                         │
//! │  ┌──────────────────────┐  table_catalog / shift_config /              │
//! │  │  VenueConfigStore    │  booking_window_days                         │
//! │  └──────────────────────┘    venue layout + operating hours            │
//! │                                                                         │
//! │  ┌──────────────────────┐  insert_if_free / confirm_hold /             │
//! │  │  PersistenceLayer    │  cancel_hold                                 │
//! │  └──────────────────────┘    the arbiter; overlap checks are atomic    │
//! │                                                                         │
//! │  All three are injected as Arc<dyn Trait>; tests swap in in-memory     │
//! │  fakes, production wires the seatwise-db repositories.                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use chrono::NaiveDateTime;
use thiserror::Error;

use seatwise_core::{ReservationRow, ShiftConfig, TableCatalog, TableId};

// =============================================================================
// Store Error
// =============================================================================

/// Errors surfaced by collaborator implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A write was rejected because it conflicts with existing state.
    ///
    /// For `insert_if_free` this means an overlapping non-expired row won
    /// the race; the orchestrator remaps it to
    /// [`crate::OrchestratorError::ReservationConflict`].
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The referenced entity does not exist.
    #[error("Not found: {entity} '{id}'")]
    NotFound { entity: &'static str, id: String },

    /// Backend failure (database, network).
    #[error("Backend error: {0}")]
    Backend(String),
}

// =============================================================================
// Reservation Store
// =============================================================================

/// Read access to existing reservations.
#[async_trait]
pub trait ReservationStore: Send + Sync {
    /// Fetches all rows for `venue_id` whose seating interval overlaps
    /// `[from, to)`, including non-expired holds.
    ///
    /// Expired-hold filtering is NOT the store's job; the interval index
    /// drops them against the search instant so a single row set serves
    /// both hold policies.
    async fn fetch_day(
        &self,
        venue_id: &str,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> Result<Vec<ReservationRow>, StoreError>;
}

// =============================================================================
// Venue Config Store
// =============================================================================

/// Read access to venue layout and operating hours.
#[async_trait]
pub trait VenueConfigStore: Send + Sync {
    /// Tables and combinability edges for a venue.
    async fn table_catalog(&self, venue_id: &str) -> Result<TableCatalog, StoreError>;

    /// Weekly shifts, special hours and closures for a venue.
    async fn shift_config(&self, venue_id: &str) -> Result<ShiftConfig, StoreError>;

    /// How many days ahead this venue accepts bookings.
    async fn booking_window_days(&self, venue_id: &str) -> Result<u32, StoreError>;
}

// =============================================================================
// Persistence Layer
// =============================================================================

/// A requested hold, as handed to the persistence layer.
#[derive(Debug, Clone)]
pub struct HoldRequest {
    pub venue_id: String,
    /// Sorted member tables; one for a plain booking, up to three combined.
    pub table_ids: Vec<TableId>,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    /// Instant at which an unconfirmed hold stops occupying its tables.
    pub expires_at: NaiveDateTime,
}

/// Outcome of a confirm attempt.
#[derive(Debug, Clone)]
pub enum ConfirmOutcome {
    /// The hold was confirmed before its TTL elapsed.
    Confirmed(ReservationRow),
    /// The hold's TTL had already elapsed; the row is returned so the
    /// caller can report which slot and tables were lost.
    Expired(ReservationRow),
}

/// Write access guarded by the insert-if-no-overlap primitive.
///
/// ## The Arbiter Contract
/// `insert_if_free` must check for overlapping non-expired rows and insert
/// in one atomic step. The in-process interval index is advisory; this
/// method is the only authority on whether a reservation exists.
#[async_trait]
pub trait PersistenceLayer: Send + Sync {
    /// Atomically inserts a held row if no non-expired row overlaps any of
    /// its tables. Returns the new reservation id.
    ///
    /// `as_of` decides which existing holds count as expired.
    ///
    /// ## Errors
    /// - [`StoreError::Conflict`] when an overlapping row exists
    async fn insert_if_free(
        &self,
        hold: &HoldRequest,
        as_of: NaiveDateTime,
    ) -> Result<String, StoreError>;

    /// Promotes a held row to confirmed, if its TTL has not elapsed as of
    /// `as_of`.
    ///
    /// ## Errors
    /// - [`StoreError::NotFound`] for unknown or already-cancelled ids
    async fn confirm_hold(
        &self,
        reservation_id: &str,
        as_of: NaiveDateTime,
    ) -> Result<ConfirmOutcome, StoreError>;

    /// Deletes a held row, releasing its tables immediately. Returns the
    /// removed row.
    ///
    /// ## Errors
    /// - [`StoreError::NotFound`] for unknown ids
    /// - [`StoreError::Conflict`] when the row is already confirmed
    async fn cancel_hold(&self, reservation_id: &str) -> Result<ReservationRow, StoreError>;
}
