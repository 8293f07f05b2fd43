//! I/O helpers: configuration, clock and the SQLite persistence gateway.

pub mod clock;
pub mod config;
pub mod schema;
pub mod store;
