//! Waitlist registration: validation and the registration service.

mod service;
mod validation;

pub use service::{RegisterOutcome, WaitlistService};
pub use validation::{
    is_valid_email, validate, validate_str, ValidHandle, ValidationError, MAX_HANDLE_LEN,
};
