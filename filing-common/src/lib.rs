//! # Filing Common Library
//!
//! Shared code for the filing pipeline services including:
//! - Error and result types
//! - Service configuration loading (TOML, environment, defaults)
//! - Record store schema bootstrap
//! - Time and UUID helpers

pub mod config;
pub mod db;
pub mod error;
pub mod time;
pub mod uuid_utils;

pub use error::{Error, Result};
