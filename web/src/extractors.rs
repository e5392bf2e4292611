//! Per-request context handed to handlers.
//!
//! [`RequestContext`] is resolved once by
//! [`RequestContextLayer`](crate::middleware::RequestContextLayer) and
//! passed explicitly to every handler that needs the caller, its ability or
//! the exposure groups.
//!
//! # Examples
//!
//! ```ignore
//! async fn show_article(
//!     State(articles): State<Articles>,
//!     context: RequestContext,
//!     Path(id): Path<u32>,
//! ) -> Exposed<Article> {
//!     let article = articles.find_by_id(&id).await;
//!     let visible: Outcome<Article> = article.map(|article| {
//!         match context.ability().authorize_subject(Action::Browse, &article) {
//!             Ok(()) => Outcome::literal(article),
//!             Err(denied) => denied,
//!         }
//!     });
//!     context.respond(visible)
//! }
//! ```

use crate::error::AppError;
use crate::response::Exposed;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use formulaic_auth::{Ability, AuthContext, UserContext};
use formulaic_core::{ExposureGroups, Outcome};
use std::fmt;
use uuid::Uuid;

/// Correlation ID for request tracing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CorrelationId(pub Uuid);

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Everything a handler needs to know about the current request.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestContext {
    /// Correlation ID of the request.
    pub correlation_id: CorrelationId,
    /// Caller and ability.
    pub auth: AuthContext,
    /// Exposure groups responses are rendered with.
    pub groups: ExposureGroups,
}

impl RequestContext {
    /// The signed-in user, if any.
    #[must_use]
    pub const fn user(&self) -> Option<&UserContext> {
        self.auth.user()
    }

    /// What the caller may do.
    #[must_use]
    pub const fn ability(&self) -> &Ability {
        self.auth.ability()
    }

    /// Render `outcome` for this caller.
    pub fn respond<T>(&self, outcome: impl Into<Outcome<T>>) -> Exposed<T> {
        Exposed::new(outcome, self.groups.clone())
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or_else(|| AppError::internal("RequestContextLayer is not installed"))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CorrelationId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestContext>()
            .map(|context| context.correlation_id)
            .ok_or_else(|| AppError::internal("RequestContextLayer is not installed"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;
    use axum::http::{Request, StatusCode};

    #[tokio::test]
    async fn missing_layer_is_internal_error() {
        let (mut parts, ()) = Request::builder().uri("/").body(()).unwrap().into_parts();
        let error = RequestContext::from_request_parts(&mut parts, &()).await.unwrap_err();
        assert_eq!(error.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn context_is_read_from_extensions() {
        let context = RequestContext {
            correlation_id: CorrelationId(Uuid::new_v4()),
            auth: AuthContext::default(),
            groups: ExposureGroups::production(),
        };
        let (mut parts, ()) = Request::builder().uri("/").body(()).unwrap().into_parts();
        parts.extensions.insert(context.clone());

        let extracted = RequestContext::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(extracted, context);
        assert!(extracted.user().is_none());

        let id = CorrelationId::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(id, context.correlation_id);
    }
}
