//! Outcomes as HTTP responses.

use crate::error::AppError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use formulaic_core::{ExposureGroups, Outcome};
use serde::Serialize;
use serde_json::Value;

/// An outcome rendered for an observer with `groups`.
///
/// The transport status is the exposed status of the outcome, except for
/// the informational lifecycle statuses of `Pending` and `SkippedRequest`
/// and the 204 of `NeverFetched`, which are sent as 200 so the body reaches
/// the client. The body is the exposed map.
#[derive(Debug, Clone)]
pub struct Exposed<T> {
    outcome: Outcome<T>,
    groups: ExposureGroups,
}

impl<T> Exposed<T> {
    /// Wrap `outcome` for an observer with `groups`.
    pub fn new(outcome: impl Into<Outcome<T>>, groups: ExposureGroups) -> Self {
        Self {
            outcome: outcome.into(),
            groups,
        }
    }

    /// The wrapped outcome.
    pub const fn outcome(&self) -> &Outcome<T> {
        &self.outcome
    }

    /// Transport status the response is sent with.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        transport_status(self.outcome.exposed_status(&self.groups))
    }
}

/// Transport status for an exposed outcome status.
#[must_use]
pub fn transport_status(status: u16) -> StatusCode {
    if status < 200 || status == 204 {
        return StatusCode::OK;
    }
    StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

impl<T: Serialize> IntoResponse for Exposed<T> {
    fn into_response(self) -> Response {
        let status = self.status();
        match self.outcome.expose(&self.groups) {
            Ok(body) => (status, Json(Value::Object(body))).into_response(),
            Err(error) => AppError::Internal(error.into()).into_response(),
        }
    }
}
