//! # cooler-core
//!
//! Core library for the Cooler build service providing:
//! - Hierarchical runtime configuration (embedded defaults, file, environment)
//! - Managed component definitions built from configuration
//! - Retry policies for network operations

pub mod config;
pub mod error;
pub mod retry;
pub mod types;

pub use config::HierarchicalConfigLoader;
pub use error::{Error, Result};
pub use types::{ManagedComponent, RuntimeConfig, VersionMatch};
