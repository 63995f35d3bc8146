//! # graphprobe-core
//!
//! Core types and utilities shared by the directory client and the
//! propagation benchmark.
//!
//! ## Modules
//!
//! - [`error`] - Error types and HTTP status code mapping
//! - [`ids`] - Strongly-typed identifiers for directory objects
//! - [`config`] - Endpoint and tenant configuration
//! - [`client`] - HTTP client settings and the visibility poll policy
//! - [`query`] - OData query parameter builder

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
pub mod error;
pub mod ids;
pub mod query;

// Re-export commonly used types
pub use error::{Error, Result};
