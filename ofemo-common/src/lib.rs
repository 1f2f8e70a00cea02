//! # ofemo Common Library
//!
//! Shared code for the ofemo site tooling:
//! - Error and result types
//! - Bootstrap TOML configuration and root folder resolution
//! - Persistent key-value store used for browser-profile style flags

pub mod config;
pub mod error;
pub mod store;

pub use error::{Error, Result};
pub use store::{JsonFileStore, KeyValueStore, MemoryStore};
