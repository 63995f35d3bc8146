//! Microsoft Graph directory client.
//!
//! This crate provides typed models and an asynchronous client for the subset
//! of Microsoft Graph the propagation benchmark needs: creating administrative
//! units, creating groups (top level or inside an administrative unit) and
//! reading groups back with a property projection.

#![deny(missing_docs)]

pub mod auth;
pub mod client;
pub mod directory;
pub mod models;

pub use auth::{AzureCliToken, ClientCredentials, StaticToken, TokenProvider};
pub use client::{GraphClient, GraphClientBuilder};
pub use directory::Directory;
pub use models::{
    AdministrativeUnit, DirectoryResponse, Group, GroupSnapshot, NewAdministrativeUnit, NewGroup,
    Projection, GROUP_TYPE_UNIFIED,
};

/// Convenient result alias that reuses the shared error type.
pub type Result<T> = graphprobe_core::Result<T>;
