//! # Local Mirror Store
//!
//! SQLite-backed persistence for the liked-tracks mirror: users with their
//! token state, deduplicated artists/genres/tracks, and per-user liked rows.
//!
//! Repositories follow a trait-per-entity layout so callers depend on the
//! interface rather than the SQLite implementation.

pub mod db;
pub mod error;
pub mod models;
pub mod repositories;

pub use db::{create_pool, create_test_pool, DatabaseConfig};
pub use error::{Result, StoreError};
