//! Waitlist service - validated, duplicate-free email registration.
//!
//! - Validates submitted handles before they reach storage
//! - Rejects duplicate registrations through the store's uniqueness constraint
//! - Serves the most recent registrants for display

pub mod api;
pub mod config;
pub mod error;
pub mod waitlist;

pub use config::Config;
pub use error::{RegistrationFailed, WaitlistError};
pub use waitlist::{RegisterOutcome, ValidHandle, ValidationError, WaitlistService};
