//! # Runtime Infrastructure
//!
//! Shared infrastructure for the mirror workspace: logging initialization
//! and environment-backed configuration loading.
//!
//! ## Overview
//!
//! This crate carries the ambient concerns the domain crates rely on:
//! - `tracing`/`tracing-subscriber` setup with env-filter support
//! - Configuration for the database path and remote client credentials

pub mod config;
pub mod error;
pub mod logging;

pub use config::RuntimeConfig;
pub use error::{Result, RuntimeError};
pub use logging::{init_logging, LogFormat, LoggingConfig};
