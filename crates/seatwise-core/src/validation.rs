//! # Validation Module
//!
//! Request validation for the availability engine.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: THIS MODULE - shape checks                                   │
//! │  ├── party size bounds, window ordering, id format, booking window     │
//! │  └── cheap, clock-free, runs before any collaborator is touched        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Orchestrator - schedule checks                               │
//! │  └── window entirely inside a resolved shift span (InvalidRequest)     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Persistence - the arbiter                                    │
//! │  └── insert-if-no-overlap constraint catches lost races                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;

use crate::error::ValidationError;
use crate::types::TimeWindowRequest;
use crate::MAX_PARTY_SIZE;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Field Validators
// =============================================================================

/// Validates a party size.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed [`MAX_PARTY_SIZE`]
pub fn validate_party_size(party_size: u32) -> ValidationResult<()> {
    if party_size == 0 {
        return Err(ValidationError::MustBePositive {
            field: "party_size".to_string(),
        });
    }

    if party_size > MAX_PARTY_SIZE {
        return Err(ValidationError::OutOfRange {
            field: "party_size".to_string(),
            min: 1,
            max: i64::from(MAX_PARTY_SIZE),
        });
    }

    Ok(())
}

/// Validates a venue or table identifier (UUID v4 format).
pub fn validate_uuid(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

/// Validates that a request window is properly ordered.
///
/// Note the window may legitimately cross midnight for overnight shifts;
/// that case is represented by `end < start` on the *times* but resolves to
/// ordered datetimes. This check therefore runs on the already-resolved
/// datetimes in the orchestrator; here we only reject the degenerate
/// zero-length window.
pub fn validate_request_shape(request: &TimeWindowRequest) -> ValidationResult<()> {
    if request.venue_id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "venue_id".to_string(),
        });
    }
    validate_party_size(request.party_size)?;
    if request.start == request.end {
        return Err(ValidationError::InvalidFormat {
            field: "window".to_string(),
            reason: "start and end must differ".to_string(),
        });
    }
    Ok(())
}

/// Validates the booking window: how far ahead `date` may lie.
///
/// ## Rules
/// - Dates in the past are rejected
/// - Dates more than `window_days` ahead of `today` are rejected
pub fn validate_booking_date(
    date: NaiveDate,
    today: NaiveDate,
    window_days: u32,
) -> ValidationResult<()> {
    let days_ahead = (date - today).num_days();
    if days_ahead < 0 {
        return Err(ValidationError::InvalidFormat {
            field: "date".to_string(),
            reason: "date is in the past".to_string(),
        });
    }
    if days_ahead > i64::from(window_days) {
        return Err(ValidationError::OutOfRange {
            field: "date".to_string(),
            min: 0,
            max: i64::from(window_days),
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
