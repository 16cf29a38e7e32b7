//! # mshelf Common Library
//!
//! Shared code for mshelf services including:
//! - Common error types
//! - Configuration loading and resolution
//! - Store timestamp and cooldown helpers

pub mod config;
pub mod error;
pub mod time;

pub use error::{Error, Result};
