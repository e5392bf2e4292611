//! Error responses for web handlers.
//!
//! [`AppError`] covers failures that never became an outcome: the request
//! guard refused the call, or something broke underneath a handler. Bodies
//! follow the exposure groups like outcome bodies do:
//!
//! ```text
//! {"kind":"UnparsableJwt","statusCode":401,"reason":"not_jwt"}     reason: info
//! {"kind":"InvalidAuthentication","statusCode":401,"reason":"expired"}
//! {"kind":"Unauthenticated","statusCode":401}
//! {"kind":"Forbidden","statusCode":403}
//! {"kind":"InternalException","statusCode":500,
//!  "service":"api","version":"1.2.0",                            info
//!  "error":"connection reset"}                                    debug
//! ```
//!
//! A response built by `into_response` is rendered with production
//! settings and carries its [`ErrorDetails`] in the response extensions;
//! [`RequestContextLayer`](crate::middleware::RequestContextLayer)
//! re-renders it with the server's configured groups.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use formulaic_auth::AuthError;
use formulaic_core::{ExposureGroups, group};
use serde_json::{Map, Value};
use thiserror::Error;

/// Application error type for web handlers.
///
/// # Examples
///
/// ```ignore
/// async fn handler(context: RequestContext) -> Result<Exposed<Article>, AppError> {
///     let article = articles.load().await.context("loading article")?;
///     Ok(context.respond(article))
/// }
/// ```
#[derive(Debug, Error)]
pub enum AppError {
    /// The request guard refused the call.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Anything else.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Create an internal error from a message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(anyhow::Error::msg(message.into()))
    }

    /// What the response will say, before exposure filtering.
    #[must_use]
    pub fn details(&self) -> ErrorDetails {
        match self {
            Self::Auth(AuthError::UnparsableJwt { reason }) => {
                ErrorDetails::new(401, "UnparsableJwt").with_reason(reason.as_str())
            }
            Self::Auth(AuthError::InvalidAuthentication { reason }) => {
                ErrorDetails::new(401, "InvalidAuthentication").with_reason(reason.to_string())
            }
            Self::Auth(AuthError::Unauthenticated) => ErrorDetails::new(401, "Unauthenticated"),
            Self::Auth(AuthError::Forbidden) => ErrorDetails::new(403, "Forbidden"),
            Self::Auth(error) => ErrorDetails::internal(error.to_string()),
            Self::Internal(error) => ErrorDetails::internal(format!("{error:#}")),
        }
    }

    /// HTTP status code of the response.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.details().status_code()
    }

    /// Render with `settings` instead of the production defaults.
    #[must_use]
    pub fn render(self, settings: &ErrorSettings) -> Response {
        let details = self.details();
        details.log();
        details.render(settings)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.render(&ErrorSettings::default())
    }
}

/// Exposure groups and service identity used when rendering errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorSettings {
    /// Groups the caller may see.
    pub groups: ExposureGroups,
    /// Service name reported for internal errors.
    pub service: String,
    /// Service version reported for internal errors.
    pub version: String,
}

impl Default for ErrorSettings {
    fn default() -> Self {
        Self {
            groups: ExposureGroups::production(),
            service: "formulaic".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Unfiltered content of an error response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorDetails {
    /// Transport status.
    pub status: u16,
    /// Value of the `kind` field.
    pub kind: &'static str,
    /// Why the credentials were refused. Exposed to `info`.
    pub reason: Option<String>,
    /// Error message of an internal failure. Exposed to `debug`.
    pub error: Option<String>,
}

impl ErrorDetails {
    /// Details with no optional fields.
    #[must_use]
    pub const fn new(status: u16, kind: &'static str) -> Self {
        Self {
            status,
            kind,
            reason: None,
            error: None,
        }
    }

    /// Details of an internal exception.
    #[must_use]
    pub fn internal(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::new(500, "InternalException")
        }
    }

    /// Attach a reason.
    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Status as an HTTP status code.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Body for an observer with `settings`.
    #[must_use]
    pub fn body(&self, settings: &ErrorSettings) -> Map<String, Value> {
        let mut body = Map::new();
        body.insert("kind".into(), Value::from(self.kind));
        body.insert("statusCode".into(), Value::from(self.status));

        let info = settings.groups.contains(group::INFO);
        if info {
            if let Some(reason) = &self.reason {
                body.insert("reason".into(), Value::from(reason.as_str()));
            }
            if self.status >= 500 {
                body.insert("service".into(), Value::from(settings.service.as_str()));
                body.insert("version".into(), Value::from(settings.version.as_str()));
            }
        }
        if settings.groups.contains(group::DEBUG) {
            if let Some(error) = &self.error {
                body.insert("error".into(), Value::from(error.as_str()));
            }
        }
        body
    }

    /// Full response for an observer with `settings`.
    #[must_use]
    pub fn render(&self, settings: &ErrorSettings) -> Response {
        let mut response = (self.status_code(), Json(Value::Object(self.body(settings)))).into_response();
        response.extensions_mut().insert(self.clone());
        response
    }

    fn log(&self) {
        if self.status >= 500 {
            tracing::error!(
                status = self.status,
                kind = self.kind,
                error = self.error.as_deref().unwrap_or_default(),
                "Internal server error"
            );
        } else {
            tracing::debug!(
                status = self.status,
                kind = self.kind,
                reason = self.reason.as_deref().unwrap_or_default(),
                "Request refused"
            );
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use formulaic_auth::{InvalidAuthenticationReason, UnparsableJwtReason};
    use serde_json::json;

    fn settings(groups: ExposureGroups) -> ErrorSettings {
        ErrorSettings {
            groups,
            service: "articles".to_string(),
            version: "1.2.0".to_string(),
        }
    }

    #[test]
    fn unparsable_jwt_reason_needs_info() {
        let details = AppError::from(AuthError::UnparsableJwt {
            reason: UnparsableJwtReason::NotJwt,
        })
        .details();

        assert_eq!(
            Value::Object(details.body(&settings(ExposureGroups::new()))),
            json!({"kind": "UnparsableJwt", "statusCode": 401})
        );
        assert_eq!(
            Value::Object(details.body(&settings(ExposureGroups::production()))),
            json!({"kind": "UnparsableJwt", "statusCode": 401, "reason": "not_jwt"})
        );
    }

    #[test]
    fn auth_failures_keep_their_status() {
        let expired = AppError::from(AuthError::InvalidAuthentication {
            reason: InvalidAuthenticationReason::Expired,
        });
        assert_eq!(expired.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(expired.details().reason.as_deref(), Some("expired"));
        assert_eq!(AppError::from(AuthError::Forbidden).status(), StatusCode::FORBIDDEN);
        assert_eq!(
            AppError::from(AuthError::Unauthenticated).details().kind,
            "Unauthenticated"
        );
    }

    #[test]
    fn internal_exception_exposes_error_to_debug_only() {
        let details = AppError::from(anyhow::anyhow!("connection reset")).details();

        let production = details.body(&settings(ExposureGroups::production()));
        assert_eq!(production["service"], "articles");
        assert_eq!(production["version"], "1.2.0");
        assert!(!production.contains_key("error"));

        let development = details.body(&settings(ExposureGroups::development()));
        assert_eq!(development["error"], "connection reset");
    }

    #[test]
    fn verifier_outage_is_internal() {
        let error = AppError::from(AuthError::VerifierUnavailable("timeout".into()));
        assert_eq!(error.details().kind, "InternalException");
        assert_eq!(error.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn into_response_carries_details() {
        let response = AppError::internal("boom").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.extensions().get::<ErrorDetails>().map(|details| details.kind),
            Some("InternalException")
        );

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["statusCode"], 500);
        assert!(body.get("error").is_none());
    }
}
