//! Repository implementations for the checkout backend.
//!
//! - [`InMemoryStore`] keeps everything in process memory (tests, demos)
//! - [`PostgresStore`] persists to PostgreSQL through sqlx

pub mod memory;
pub mod postgres;

pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
