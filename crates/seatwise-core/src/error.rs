//! # Error Types
//!
//! Domain-specific error types for seatwise-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  seatwise-core errors (this file)                                      │
//! │  ├── EngineError      - Availability / scheduling failures             │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  seatwise-engine errors (separate crate)                               │
//! │  └── OrchestratorError - Adds TimedOut / ReservationConflict           │
//! │                                                                         │
//! │  seatwise-db errors (separate crate)                                   │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  Flow: ValidationError → EngineError → OrchestratorError → Caller      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (date, slot, table ids)
//! 3. Errors are enum variants, never String
//! 4. "No availability" is NOT an error - it is an ordinary empty result
//!    returned to the caller; only genuine failures live here

use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;

// =============================================================================
// Engine Error
// =============================================================================

/// Availability engine errors.
///
/// These represent request-level failures that propagate to the caller for
/// user-facing messaging. An empty slot list never raises any of these.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The request itself is malformed or falls outside operating hours.
    ///
    /// ## When This Occurs
    /// - Party size is zero or beyond [`crate::MAX_PARTY_SIZE`]
    /// - Window start is not before window end
    /// - The window is not entirely inside a resolved shift span
    /// - The date is past the venue's booking window
    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    /// The venue has no shift on the requested date.
    ///
    /// ## Caller Contract
    /// Callers must treat this as zero availability for the date, not as a
    /// generic error: the venue is closed, nothing more.
    #[error("Venue has no shift on {date}")]
    InvalidShift { date: NaiveDate },

    /// Lost race at confirm time: the chosen candidate is no longer free.
    ///
    /// ## Caller Contract
    /// Retryable. The caller re-runs search; the engine never silently
    /// substitutes a different candidate.
    #[error("Slot {slot} is no longer available for tables {table_ids:?}")]
    SlotNoLongerAvailable {
        slot: NaiveDateTime,
        table_ids: Vec<String>,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when a request doesn't meet basic requirements, before any
/// scheduling logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, inverted time window).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with EngineError.
pub type EngineResult<T> = Result<T, EngineError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = EngineError::InvalidShift {
            date: NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
        };
        assert_eq!(err.to_string(), "Venue has no shift on 2026-03-14");

        let err = EngineError::InvalidRequest {
            reason: "window starts before opening".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid request: window starts before opening"
        );
    }

    #[test]
    fn test_validation_converts_to_engine_error() {
        let validation_err = ValidationError::MustBePositive {
            field: "party_size".to_string(),
        };
        let engine_err: EngineError = validation_err.into();
        assert!(matches!(engine_err, EngineError::Validation(_)));
    }
}
