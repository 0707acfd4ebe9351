//! # scribe-core
//!
//! Core library for scribe providing:
//! - Retry execution engine with policy-based configuration
//! - Runtime configuration types (OpenAI, network, server, retry policies)
//! - Hierarchical configuration loading (defaults, YAML files, environment)

pub mod config;
pub mod error;
pub mod retry;
pub mod types;

pub use config::ConfigLoader;
pub use error::{Error, Result};
pub use types::RuntimeConfig;
