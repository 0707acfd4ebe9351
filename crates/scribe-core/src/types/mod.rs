//! Type definitions for scribe runtime configuration

mod runtime_config;

pub use runtime_config::*;
