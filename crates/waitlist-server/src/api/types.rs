//! API request and response types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use waitlist_store::Registrant;

/// Response to a join request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinResponse {
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JoinResponse {
    pub fn joined() -> Self {
        Self {
            success: true,
            message: Some("Successfully joined the waitlist!".to_string()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error.into()),
        }
    }
}

/// Query string for the recent listing.
#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    pub limit: Option<usize>,
}

/// Public projection of a registrant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentEntry {
    pub handle: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl From<Registrant> for RecentEntry {
    fn from(registrant: Registrant) -> Self {
        Self {
            handle: registrant.handle,
            created_at: registrant.registered_at,
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub registrant_count: Option<usize>,
    pub read_failures: u64,
}
