//! # seatwise-core: Pure Availability Logic for Seatwise
//!
//! This crate is the **heart** of the availability and table-combination
//! search engine. It decides whether, and how, a venue can seat a party of
//! a given size within a requested time window, as pure functions with zero
//! I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Seatwise Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                seatwise-engine (Orchestrator)                    │   │
//! │  │   search_time_range, check_availability, reserve, confirm       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ seatwise-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────────┐  ┌────────────┐             │   │
//! │  │   │   shift   │  │interval_index │  │ candidates │             │   │
//! │  │   │ calendar  │  │ binary search │  │  cliques   │             │   │
//! │  │   └───────────┘  └───────────────┘  └────────────┘             │   │
//! │  │   ┌───────────┐  ┌───────────────┐  ┌────────────┐             │   │
//! │  │   │  prober   │  │   selector    │  │ validation │             │   │
//! │  │   │ per-slot  │  │ deterministic │  │   input    │             │   │
//! │  │   └───────────┘  └───────────────┘  └────────────┘             │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK • PURE FUNCTIONS             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                   seatwise-db (Database Layer)                  │   │
//! │  │        SQLite collaborators, insert-if-no-overlap write         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Table, Candidate, SlotResult, ...)
//! - [`catalog`] - Table catalog with the combinability graph
//! - [`shift`] - Shift calendar resolution (weekly hours, special hours, closures)
//! - [`interval_index`] - Per-table occupied-interval index with turnover inflation
//! - [`candidates`] - Single-table and clique-combination enumeration
//! - [`prober`] - Per-slot availability probing
//! - [`selector`] - Confirm-time re-validation and deterministic pick
//! - [`validation`] - Request validation
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: same inputs (including "now") = same outputs
//! 2. **No I/O**: database, network, file system, clock access is FORBIDDEN here
//! 3. **Derived State**: the interval index is built fresh per search and owned
//!    exclusively by that search's execution - never mutated in place
//! 4. **Explicit Errors**: all errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod candidates;
pub mod catalog;
pub mod error;
pub mod interval_index;
pub mod prober;
pub mod selector;
pub mod shift;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use seatwise_core::Candidate` instead of
// `use seatwise_core::types::Candidate`

pub use catalog::TableCatalog;
pub use error::{EngineError, ValidationError};
pub use interval_index::{HoldPolicy, IntervalIndex};
pub use shift::{Shift, ShiftConfig, ShiftSpan};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum number of tables in a combination candidate.
///
/// ## Why 3?
/// The combinatorial growth of 4+-table cliques outweighs any real-world
/// benefit, and floor staff rarely join more than three tables.
pub const MAX_COMBINATION_TABLES: usize = 3;

/// Maximum party size accepted by request validation.
///
/// ## Business Reason
/// Parties beyond this size are private-event territory and are handled
/// outside the slot search entirely.
pub const MAX_PARTY_SIZE: u32 = 50;

/// Default ratio bounding how oversized a combination may be.
///
/// A combination candidate must satisfy
/// `party_size <= combined_capacity <= party_size * ratio`.
pub const DEFAULT_MAX_OVERSIZE_RATIO: f64 = 2.0;

/// Default slot granularity for probing a request window, in minutes.
pub const DEFAULT_SLOT_GRANULARITY_MINUTES: u32 = 30;

/// Default booking window: how many days ahead a request may target.
pub const DEFAULT_BOOKING_WINDOW_DAYS: u32 = 30;
