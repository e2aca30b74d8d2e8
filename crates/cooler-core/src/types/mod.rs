//! Type definitions for Cooler configuration and managed components

mod component;
mod runtime_config;

pub use component::*;
pub use runtime_config::*;
