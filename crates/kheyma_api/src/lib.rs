//! # Kheyma API
//!
//! This crate provides the HTTP gateway to the Kheyma booking backend.
//! It attaches bearer credentials, maps failures onto one error taxonomy,
//! logs every failed call in one place and invalidates the session when a
//! bearer token is rejected.
//!
//! ## Features
//!
//! - Environment-driven configuration with a development fallback URL
//! - Bearer credentials read from a pluggable [`CredentialProvider`]
//! - Typed errors carrying the backend's message or field validation messages
//! - Token-scoped invalidation when the backend answers 401
//! - Page, search and filter parameters in the backend's query format
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use kheyma_api::{ApiClient, ApiConfig, ApiError, LocationSort, NoCredentials, PageQuery};
//!
//! async fn newest_campsites() -> Result<(), ApiError> {
//!     let api = ApiClient::new(ApiConfig::from_env()?, Arc::new(NoCredentials))?;
//!     let page = api
//!         .list_locations(PageQuery::new(0, 6), &LocationSort::default())
//!         .await?;
//!     for location in page.content {
//!         println!("{} {}", location.id, location.title);
//!     }
//!     Ok(())
//! }
//! ```

/// Gateway configuration loaded from the environment
mod config;
pub use config::*;

/// Error taxonomy for gateway calls
mod error;
pub use error::*;

/// Credential source consulted before every protected call
mod credentials;
pub use credentials::*;

/// Request and response types of the backend contract
mod types;
pub use types::*;

/// HTTP client for the booking backend
mod client;
pub use client::*;
