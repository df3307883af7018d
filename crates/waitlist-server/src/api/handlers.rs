//! HTTP request handlers.

use super::types::{HealthResponse, JoinResponse, RecentEntry, RecentQuery};
use super::AppState;
use crate::error::WaitlistError;
use axum::{
    extract::{
        rejection::{FormRejection, JsonRejection},
        Query, State,
    },
    http::StatusCode,
    Form, Json,
};
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

/// Form field carrying the handle.
pub const HANDLE_FIELD: &str = "handle";

/// Health check endpoint.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let count = state.service.count().await;
    let status = if count.is_some() { "ok" } else { "degraded" };

    Json(HealthResponse {
        status: status.to_string(),
        registrant_count: count,
        read_failures: state.service.read_failures(),
    })
}

/// Join the waitlist with a JSON body, e.g. `{"handle": "a@example.com"}`.
///
/// An unreadable body is treated as a submission without a handle.
pub async fn join_json(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<JoinResponse>), WaitlistError> {
    match body {
        Ok(Json(body)) => join(&state, body.get(HANDLE_FIELD)).await,
        Err(rejection) => {
            debug!(%rejection, "Unreadable join body");
            join(&state, None).await
        }
    }
}

/// Join the waitlist with a url-encoded form body.
pub async fn join_form(
    State(state): State<AppState>,
    fields: Result<Form<HashMap<String, String>>, FormRejection>,
) -> Result<(StatusCode, Json<JoinResponse>), WaitlistError> {
    match fields {
        Ok(Form(fields)) => {
            let handle = fields.get(HANDLE_FIELD).cloned().map(Value::String);
            join(&state, handle.as_ref()).await
        }
        Err(rejection) => {
            debug!(%rejection, "Unreadable join form");
            join(&state, None).await
        }
    }
}

async fn join(
    state: &AppState,
    raw: Option<&Value>,
) -> Result<(StatusCode, Json<JoinResponse>), WaitlistError> {
    state.service.join_waitlist(raw).await?;
    Ok((StatusCode::CREATED, Json(JoinResponse::joined())))
}

/// Most recent registrants. Always answers with an array.
pub async fn recent(
    State(state): State<AppState>,
    query: Option<Query<RecentQuery>>,
) -> Json<Vec<RecentEntry>> {
    let limit = query.and_then(|Query(q)| q.limit);

    let entries = state
        .service
        .recent(limit)
        .await
        .into_iter()
        .map(RecentEntry::from)
        .collect();

    Json(entries)
}
