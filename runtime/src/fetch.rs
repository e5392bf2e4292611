//! Normalizing asynchronous calls into outcomes.
//!
//! Collaborators resolve to a bare value or an outcome, or fail with a
//! [`Rejection`]. [`wrap_fetch`] guarantees the caller always receives an
//! outcome:
//!
//! 1. a resolved outcome is returned unchanged
//! 2. a resolved bare value is wrapped in `Literal`
//! 3. a rejection carrying an outcome returns that outcome
//! 4. an API error is parsed: an outcome-shaped JSON body is returned,
//!    anything else becomes `FailedRequest` with the status and raw body
//! 5. any other failure becomes `FailedRequest` with status 500 and no
//!    detail
//!
//! # Example
//!
//! ```ignore
//! async fn load_user(id: u32) -> Result<User, Rejection<User>> {
//!     let response = client.get(format!("/users/{id}")).send().await?;
//!     if !response.status().is_success() {
//!         return Err(ApiError::from_response(response).await.into());
//!     }
//!     Ok(response.json().await?)
//! }
//!
//! let user: Outcome<User> = wrap_fetch(load_user(1)).await;
//! ```

use formulaic_core::variants::FailedRequest;
use formulaic_core::{IntoOutcome, Outcome, is_outcome};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::fmt;
use std::future::Future;
use thiserror::Error;

/// A failed HTTP call with its status and body.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("API request failed with status {status}")]
pub struct ApiError {
    /// Transport status.
    pub status: u16,
    /// Parsed body, or the raw text as a JSON string when it is not JSON.
    pub body: Value,
}

impl ApiError {
    /// Create an API error from an already parsed body.
    #[must_use]
    pub const fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    /// Create an API error from a raw body, parsing it as JSON when possible.
    #[must_use]
    pub fn from_text(status: u16, text: &str) -> Self {
        let body = serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()));
        Self { status, body }
    }

    /// Capture status and body of a failed response.
    ///
    /// A body that cannot be read is recorded as JSON `null`.
    pub async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status().as_u16();
        match response.text().await {
            Ok(text) => Self::from_text(status, &text),
            Err(error) => {
                tracing::debug!(status, error = %error, "Failed to read error response body");
                Self::new(status, Value::Null)
            }
        }
    }

    /// Outcome embedded in the body, if the body is outcome-shaped.
    fn embedded_outcome<T: DeserializeOwned>(&self) -> Option<Outcome<T>> {
        let candidate = match &self.body {
            Value::String(text) => serde_json::from_str(text).ok()?,
            other => other.clone(),
        };
        if !is_outcome(&candidate) {
            return None;
        }
        match Outcome::from_wire(candidate) {
            Ok(outcome) => Some(outcome),
            Err(error) => {
                tracing::warn!(status = self.status, error = %error, "Discarding malformed outcome in error body");
                None
            }
        }
    }

    /// Normalize into an outcome.
    pub fn normalize<T: DeserializeOwned>(self) -> Outcome<T> {
        self.embedded_outcome().unwrap_or_else(|| {
            Outcome::failed_request(
                self.status,
                Some(json!({ "status": self.status, "body": self.body })),
            )
        })
    }
}

/// Why a collaborator call did not resolve.
pub enum Rejection<T> {
    /// The collaborator raised an outcome.
    Outcome(Outcome<T>),
    /// An HTTP call failed with a status and body.
    Api(ApiError),
    /// Anything else.
    Other(anyhow::Error),
}

impl<T> fmt::Debug for Rejection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Outcome(outcome) => f.debug_tuple("Outcome").field(&outcome.kind()).finish(),
            Self::Api(error) => f.debug_tuple("Api").field(error).finish(),
            Self::Other(error) => f.debug_tuple("Other").field(error).finish(),
        }
    }
}

impl<T> fmt::Display for Rejection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Outcome(outcome) => write!(f, "collaborator raised {outcome}"),
            Self::Api(error) => error.fmt(f),
            Self::Other(error) => error.fmt(f),
        }
    }
}

impl<T> From<Outcome<T>> for Rejection<T> {
    fn from(outcome: Outcome<T>) -> Self {
        Self::Outcome(outcome)
    }
}

impl<T> From<ApiError> for Rejection<T> {
    fn from(error: ApiError) -> Self {
        Self::Api(error)
    }
}

impl<T> From<anyhow::Error> for Rejection<T> {
    fn from(error: anyhow::Error) -> Self {
        Self::Other(error)
    }
}

impl<T> From<reqwest::Error> for Rejection<T> {
    fn from(error: reqwest::Error) -> Self {
        Self::Other(error.into())
    }
}

impl<T> From<serde_json::Error> for Rejection<T> {
    fn from(error: serde_json::Error) -> Self {
        Self::Other(error.into())
    }
}

impl<T: DeserializeOwned> Rejection<T> {
    /// Normalize into an outcome (steps 3 to 5 of [`wrap_fetch`]).
    pub fn normalize(self) -> Outcome<T> {
        match self {
            Self::Outcome(outcome) => outcome,
            Self::Api(error) => error.normalize(),
            Self::Other(error) => {
                tracing::warn!(error = %error, "Collaborator call failed without an outcome");
                Outcome::failed_request(FailedRequest::FALLBACK_STATUS, None)
            }
        }
    }
}

/// Await `call` and normalize its result into an outcome.
pub async fn wrap_fetch<T, R, Fut>(call: Fut) -> Outcome<T>
where
    T: DeserializeOwned,
    R: IntoOutcome<T>,
    Fut: Future<Output = Result<R, Rejection<T>>>,
{
    match call.await {
        Ok(value) => value.into_outcome(),
        Err(rejection) => rejection.normalize(),
    }
}
