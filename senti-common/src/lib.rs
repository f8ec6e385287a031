//! # Senti Common Library
//!
//! Shared code for the sentiment worker crates:
//! - Configuration model and config file resolution
//! - Common error type
//! - Logging initialisation

pub mod config;
pub mod error;
pub mod logging;

pub use error::{Error, Result};
