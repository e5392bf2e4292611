//! Axum integration for formulaic outcomes.
//!
//! Handlers receive the caller explicitly through [`RequestContext`] and
//! answer with outcomes; this crate turns them into HTTP responses that
//! honor the configured exposure groups.
//!
//! # Request Flow
//!
//! 1. [`RequestContextLayer`] resolves the correlation ID and authenticates
//!    the caller through the [`AuthGuard`](formulaic_auth::AuthGuard)
//! 2. The handler extracts [`RequestContext`], checks the caller's ability
//!    and builds an outcome
//! 3. [`Exposed`] renders the outcome: status and body are filtered by the
//!    exposure groups
//! 4. Failures outside the outcome algebra become [`AppError`] bodies
//!
//! # Example
//!
//! ```ignore
//! use axum::{Router, extract::{Path, State}, routing::get};
//! use formulaic_web::{AppState, Exposed, RequestContext, RequestContextLayer};
//!
//! async fn show_user(
//!     State(users): State<Users>,
//!     context: RequestContext,
//!     Path(id): Path<u32>,
//! ) -> Exposed<User> {
//!     context.respond(users.find_by_id(&id).await)
//! }
//!
//! let config = ServerConfig::from_env()?;
//! formulaic_web::telemetry::init(&config)?;
//! let state = AppState::new(config, AuthGuard::new(verifier, abilities));
//!
//! let app = Router::new()
//!     .route("/users/:id", get(show_user))
//!     .route_layer(RequestContextLayer::new(state.clone()))
//!     .with_state(users);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod state;
pub mod telemetry;

// Re-export key types for convenience
pub use config::{ConfigError, Environment, ExposureConfig, ServerConfig};
pub use error::{AppError, ErrorDetails, ErrorSettings};
pub use extractors::{CorrelationId, RequestContext};
pub use middleware::{CORRELATION_ID_HEADER, RequestContextLayer, RequestContextMiddleware};
pub use response::{Exposed, transport_status};
pub use state::AppState;
pub use telemetry::TelemetryError;

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
