//! Common test infrastructure for cooler-update tests
//!
//! # Usage
//!
//! In your test file, add:
//! ```ignore
//! mod common;
//! use common::*;
//! ```
//!
//! # Modules
//!
//! - `constants`: Component ids, tags, timings
//! - `builders`: Release JSON, archives and wired-up engine parts
//! - `mock_server`: Wiremock setup helpers for release and artifact endpoints
//! - `fake_host`: Recording in-memory host platform

// Not every test binary uses every helper
#![allow(dead_code)]
#![allow(unused_imports)]

pub mod builders;
pub mod constants;
pub mod fake_host;
pub mod mock_server;

pub use builders::*;
pub use constants::*;
pub use fake_host::*;
pub use mock_server::*;
