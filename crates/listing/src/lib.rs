//! # Listing
//!
//! This crate drives server-side paging of large result sets: the admin
//! user table, campsite browsing, reviews and a user's bookings.
//! Only the response to the most recently issued page request is applied.

/// Page state observed by consumers
mod page;
pub use page::*;

/// Sources of pages backed by the gateway
mod source;
pub use source::*;

/// The paginated listing controller
mod controller;
pub use controller::*;

/// Read-only featured campsite fetch
mod featured;
pub use featured::*;
