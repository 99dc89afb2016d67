//! # Repository Modules
//!
//! Database access organized by aggregate:
//! - `venue` - tables, combinability joins, operating hours
//! - `reservation` - reservation rows and the insert-if-no-overlap gate

pub mod reservation;
pub mod venue;
