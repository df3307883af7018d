//! Handle validation.
//!
//! Runs before anything reaches storage. Pure: no I/O, no logging.

use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Maximum handle length in characters.
pub const MAX_HANDLE_LEN: usize = 100;

/// Why a submitted handle was rejected.
///
/// The display text is the message shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Email is required")]
    MissingField,

    #[error("Please enter a valid email address")]
    InvalidFormat,

    #[error("Email is required")]
    TooShort,

    #[error("Email is too long")]
    TooLong,
}

/// A handle that passed validation. Only [`validate`] constructs one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ValidHandle(String);

impl ValidHandle {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ValidHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validate a raw submitted field.
///
/// Checks run in order and the first failure wins: presence, upper length
/// bound, email syntax, lower length bound. The value is returned unchanged;
/// no trimming or case folding happens here.
pub fn validate(raw: Option<&Value>) -> Result<ValidHandle, ValidationError> {
    let handle = match raw {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => return Err(ValidationError::MissingField),
    };

    let len = handle.chars().count();

    if len > MAX_HANDLE_LEN {
        return Err(ValidationError::TooLong);
    }

    if !is_valid_email(&handle) {
        return Err(ValidationError::InvalidFormat);
    }

    if len < 1 {
        return Err(ValidationError::TooShort);
    }

    Ok(ValidHandle(handle))
}

/// Validate a plain string field.
pub fn validate_str(raw: &str) -> Result<ValidHandle, ValidationError> {
    validate(Some(&Value::String(raw.to_string())))
}

/// Syntactic email check.
///
/// Accepts `local@domain` where the local part is ASCII letters, digits and
/// `_ ' + - .` (not starting with `.`, ending in a letter, digit, `_`, `+`
/// or `-`), and the domain is at least two labels with an alphabetic
/// top-level label of two or more letters. `..` is rejected anywhere.
pub fn is_valid_email(value: &str) -> bool {
    if value.contains("..") {
        return false;
    }

    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };

    is_valid_local_part(local) && is_valid_domain(domain)
}

fn is_valid_local_part(local: &str) -> bool {
    let Some(last) = local.chars().last() else {
        return false;
    };

    if local.starts_with('.') {
        return false;
    }

    let allowed = |c: char| c.is_ascii_alphanumeric() || "_'+-.".contains(c);
    let allowed_last = |c: char| c.is_ascii_alphanumeric() || "_+-".contains(c);

    local.chars().all(allowed) && allowed_last(last)
}

fn is_valid_domain(domain: &str) -> bool {
    let labels: Vec<&str> = domain.split('.').collect();
    let Some((tld, rest)) = labels.split_last() else {
        return false;
    };

    if rest.is_empty() {
        return false;
    }

    let valid_label = |label: &&str| {
        let mut chars = label.chars();
        match chars.next() {
            Some(first) if first.is_ascii_alphanumeric() => {
                chars.all(|c| c.is_ascii_alphanumeric() || c == '-')
            }
            _ => false,
        }
    };

    rest.iter().all(valid_label)
        && tld.len() >= 2
        && tld.chars().all(|c| c.is_ascii_alphabetic())
}
