//! # Formulaic Runtime
//!
//! Client-side orchestration of calls that answer with outcomes.
//!
//! ## Core Components
//!
//! - **`wrap_fetch`**: normalizes any asynchronous call (value, outcome, or
//!   rejection) into an [`Outcome`](formulaic_core::Outcome)
//! - **`Query`**: repeatable queries with debounce, wait time, maximum
//!   delay, last-triggered-wins ordering and pending tracking
//! - **`Request`**: single-shot actions with `latest`, `last` and
//!   `last_data` views
//!
//! ## Example
//!
//! ```ignore
//! use formulaic_runtime::{Query, QueryOptions, Request};
//!
//! let search = Query::subscribe(
//!     |term: String| (!term.is_empty()).then(|| api.search(term)),
//!     String::new(),
//!     QueryOptions::new(),
//! );
//! search.set_args("rust".to_string());
//!
//! let create = Request::register(|draft: Draft| Some(api.create(draft)));
//! let created = create.fetch(draft).await;
//! ```

/// Normalization of asynchronous calls into outcomes
pub mod fetch;

/// Prometheus metrics for observability
pub mod metrics;

/// Repeatable queries
pub mod query;

/// Single-shot actions
pub mod request;

pub use fetch::{ApiError, Rejection, wrap_fetch};
pub use query::{Query, QueryConfiguration, QueryContext, QueryOptions, QueryStatus};
pub use request::{Request, RequestViews};
