//! # Orchestrator Errors
//!
//! Error types for the availability orchestrator.
//!
//! ## Error Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     OrchestratorError Sources                           │
//! │                                                                         │
//! │  EngineError          - propagated from seatwise-core unchanged        │
//! │  StoreError           - collaborator failures (Backend / NotFound)     │
//! │  TimedOut             - a collaborator call missed its deadline        │
//! │  ReservationConflict  - insert-if-no-overlap rejected the write        │
//! │                                                                         │
//! │  Note: StoreError::Conflict from a reservation write is mapped to      │
//! │  ReservationConflict before the generic From impl can swallow it.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDateTime;
use thiserror::Error;

use seatwise_core::EngineError;

use crate::store::StoreError;

/// Errors returned by [`crate::AvailabilityEngine`] operations.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Scheduling-level failure from the core.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Collaborator failure that is not a reservation conflict.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// A collaborator call exceeded the configured deadline.
    ///
    /// ## Caller Contract
    /// The operation did NOT complete; for `reserve` the caller must treat
    /// the hold as not created and retry from search.
    #[error("Operation '{operation}' timed out")]
    TimedOut { operation: &'static str },

    /// Configuration file is unreadable or fails validation.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The persistence layer rejected the reservation write because a
    /// conflicting row landed first.
    ///
    /// ## When This Occurs
    /// Two callers raced for the same tables and the other one won at the
    /// insert-if-no-overlap gate. Retryable from search.
    #[error("Reservation conflict at {slot} for tables {table_ids:?}")]
    ReservationConflict {
        slot: NaiveDateTime,
        table_ids: Vec<String>,
    },
}

/// Convenience type alias for Results with OrchestratorError.
pub type OrchestratorResult<T> = Result<T, OrchestratorError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_timed_out_message() {
        let err = OrchestratorError::TimedOut {
            operation: "search_time_range",
        };
        assert_eq!(err.to_string(), "Operation 'search_time_range' timed out");
    }

    #[test]
    fn test_engine_error_passes_through() {
        let inner = EngineError::InvalidShift {
            date: NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
        };
        let err: OrchestratorError = inner.into();
        // transparent: the inner message is the outer message
        assert_eq!(err.to_string(), "Venue has no shift on 2026-03-14");
    }
}
