//! # seatwise-db: SQLite Persistence for Seatwise
//!
//! This crate provides database access for the Seatwise availability engine.
//! It uses SQLite for storage with sqlx for async operations, and implements
//! the collaborator traits that `seatwise-engine` depends on.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Seatwise Data Flow                                │
//! │                                                                         │
//! │  AvailabilityEngine (seatwise-engine)                                  │
//! │       │  ReservationStore / VenueConfigStore / PersistenceLayer        │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    seatwise-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐    ┌─────────────┐  │   │
//! │  │   │   Database    │    │  Repositories  │    │ Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │ (venue.rs,     │    │ (embedded)  │  │   │
//! │  │   │               │    │  reservation.rs│    │             │  │   │
//! │  │   │ SqlitePool    │◄───│  )             │    │ 001_initial │  │   │
//! │  │   │ ChangeFeed    │    │                │    │ _schema.sql │  │   │
//! │  │   │ Write gate    │    │                │    │             │  │   │
//! │  │   └───────────────┘    └────────────────┘    └─────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`events`] - Change feed broadcast for cache invalidation
//! - [`repository`] - Repository implementations (venue, reservation)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use seatwise_db::{Database, DbConfig};
//!
//! // Create database with default config (runs migrations)
//! let config = DbConfig::new("path/to/seatwise.db");
//! let db = Database::new(config).await?;
//!
//! // Use repositories
//! let catalog = db.venues().table_catalog(&venue_id).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod events;
pub mod migrations;
pub mod pool;
pub mod repository;

#[cfg(test)]
mod scenarios;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use events::ChangeFeed;
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::reservation::ReservationRepository;
pub use repository::venue::VenueRepository;
