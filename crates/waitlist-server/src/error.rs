//! Error types for the waitlist service.

use crate::api::JoinResponse;
use crate::waitlist::ValidationError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use waitlist_store::StoreError;

/// Outcome of a join request that did not add a registrant.
///
/// The display text is what the user sees. Storage details are kept in
/// [`RegistrationFailed`] for logging only.
#[derive(Debug, Error)]
pub enum WaitlistError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("This email is already on the waitlist")]
    AlreadyRegistered,

    #[error("Failed to join waitlist")]
    RegistrationFailed(#[from] RegistrationFailed),
}

/// Storage or infrastructure fault on the write path.
#[derive(Debug, Error)]
#[error("Registration failed: {0}")]
pub struct RegistrationFailed(#[from] pub StoreError);

impl WaitlistError {
    pub fn status(&self) -> StatusCode {
        match self {
            WaitlistError::Validation(_) => StatusCode::BAD_REQUEST,
            WaitlistError::AlreadyRegistered => StatusCode::CONFLICT,
            WaitlistError::RegistrationFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for WaitlistError {
    fn into_response(self) -> Response {
        (self.status(), Json(JoinResponse::failed(self.to_string()))).into_response()
    }
}
