//! # Booking Services
//!
//! This crate turns a campsite selection into a priced, submitted booking
//! and manages the bookings a user already has.
//!
//! ## Features
//!
//! - Reservation drafts validated against the campsite's packages
//! - Price summaries with a configurable fee schedule
//! - Single-flight checkout that requires a signed-in session
//! - Booking history, lookup and cancellation

/// Checkout failures
mod error;
pub use error::*;

/// Fee schedule loaded from the environment
mod fees;
pub use fees::*;

/// Reservation drafts and guest details
mod draft;
pub use draft::*;

/// Price summary computation
mod pricing;
pub use pricing::*;

/// The checkout workflow
mod checkout;
pub use checkout::*;

/// Booking history and cancellation
mod bookings;
pub use bookings::*;
