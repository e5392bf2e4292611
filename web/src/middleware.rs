//! Request context resolution.
//!
//! [`RequestContextLayer`] runs before every handler:
//!
//! 1. **Correlate**: read the `X-Correlation-ID` header or generate a UUID
//! 2. **Authenticate**: run the [`AuthGuard`](formulaic_auth::AuthGuard)
//!    of the [`AppState`] with the layer's [`RouteRules`]; a refusal is
//!    answered immediately with the matching error body
//! 3. **Insert** a [`RequestContext`] into the request extensions
//! 4. **Render errors**: error responses produced by handlers are rendered
//!    again with the configured exposure groups and service identity
//! 5. **Echo** the correlation ID in the response header
//!
//! The handler future runs inside an `http_request` span carrying the
//! correlation ID, method, URI and, once known, the user.
//!
//! # Example
//!
//! ```ignore
//! let private = Router::new()
//!     .route("/articles", post(create_article))
//!     .route_layer(RequestContextLayer::new(state.clone()));
//!
//! let public = Router::new()
//!     .route("/articles/:id", get(show_article))
//!     .route_layer(RequestContextLayer::new(state.clone()).with_rules(RouteRules::public()));
//!
//! let app = private.merge(public).with_state(state);
//! ```

use crate::error::{AppError, ErrorDetails};
use crate::extractors::{CorrelationId, RequestContext};
use crate::state::AppState;
use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue, header::AUTHORIZATION},
    response::Response,
};
use formulaic_auth::{AuthError, RouteRules, UnparsableJwtReason};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::Instrument;
use uuid::Uuid;

/// Header name for correlation ID.
pub const CORRELATION_ID_HEADER: &str = "X-Correlation-ID";

/// Layer resolving the [`RequestContext`] of each request.
#[derive(Debug, Clone)]
pub struct RequestContextLayer {
    state: AppState,
    rules: RouteRules,
}

impl RequestContextLayer {
    /// Layer using the guard's default policy and no role requirement.
    #[must_use]
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            rules: RouteRules::default(),
        }
    }

    /// Use `rules` for the routes behind this layer.
    #[must_use]
    pub fn with_rules(mut self, rules: RouteRules) -> Self {
        self.rules = rules;
        self
    }
}

impl<S> Layer<S> for RequestContextLayer {
    type Service = RequestContextMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestContextMiddleware {
            inner,
            state: self.state.clone(),
            rules: self.rules.clone(),
        }
    }
}

/// Middleware service built by [`RequestContextLayer`].
#[derive(Debug, Clone)]
pub struct RequestContextMiddleware<S> {
    inner: S,
    state: AppState,
    rules: RouteRules,
}

impl<S> Service<Request> for RequestContextMiddleware<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request) -> Self::Future {
        let correlation_id = correlation_id(req.headers());
        let span = tracing::info_span!(
            "http_request",
            correlation_id = %correlation_id,
            method = %req.method(),
            uri = %req.uri(),
            user = tracing::field::Empty,
        );

        // The ready service handles this request; the clone takes its place.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let state = self.state.clone();
        let rules = self.rules.clone();

        Box::pin(
            async move {
                let settings = state.error_settings();
                let auth = match authorization(req.headers()) {
                    Ok(header) => state.guard().authenticate(header, &rules).await,
                    Err(error) => Err(error),
                };

                let mut response = match auth {
                    Ok(auth) => {
                        if let Some(user) = auth.user_id() {
                            tracing::Span::current().record("user", user);
                        }
                        req.extensions_mut().insert(RequestContext {
                            correlation_id,
                            auth,
                            groups: state.groups().clone(),
                        });

                        let response = inner.call(req).await?;
                        match response.extensions().get::<ErrorDetails>().cloned() {
                            Some(details) => details.render(&settings),
                            None => response,
                        }
                    }
                    Err(error) => AppError::from(error).render(&settings),
                };

                if let Ok(value) = HeaderValue::from_str(&correlation_id.to_string()) {
                    response.headers_mut().insert(CORRELATION_ID_HEADER, value);
                }
                Ok(response)
            }
            .instrument(span),
        )
    }
}

fn correlation_id(headers: &HeaderMap) -> CorrelationId {
    let id = headers
        .get(CORRELATION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| Uuid::parse_str(s).ok())
        .unwrap_or_else(Uuid::new_v4);
    CorrelationId(id)
}

fn authorization(headers: &HeaderMap) -> Result<Option<&str>, AuthError> {
    headers
        .get(AUTHORIZATION)
        .map(|value| {
            value.to_str().map_err(|_| AuthError::UnparsableJwt {
                reason: UnparsableJwtReason::AuthHeaderUnparsable,
            })
        })
        .transpose()
}
