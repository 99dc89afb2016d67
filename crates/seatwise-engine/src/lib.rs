//! # seatwise-engine
//!
//! The availability orchestrator for Seatwise.
//!
//! ## Crate Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        seatwise-engine                                  │
//! │                                                                         │
//! │  engine.rs   AvailabilityEngine - search / check / reserve /           │
//! │              confirm / cancel, with per-call deadlines                 │
//! │  store.rs    Collaborator traits + StoreError (the seams)              │
//! │  config.rs   EngineConfig - TOML + env + defaults                      │
//! │  cache.rs    SearchCache, ChangeEvent, invalidation listener           │
//! │  error.rs    OrchestratorError                                         │
//! │                                                                         │
//! │  Pure scheduling logic lives in seatwise-core; database                │
//! │  implementations of the traits live in seatwise-db.                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod store;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cache::{ChangeEvent, SearchCache};
pub use config::EngineConfig;
pub use engine::{AvailabilityEngine, ReservationHandle};
pub use error::{OrchestratorError, OrchestratorResult};
pub use store::{
    ConfirmOutcome, HoldRequest, PersistenceLayer, ReservationStore, StoreError, VenueConfigStore,
};
