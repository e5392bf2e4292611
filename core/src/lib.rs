//! # Formulaic Core
//!
//! A typed outcome algebra for values that may be present, absent, or an
//! error.
//!
//! ## Core Concepts
//!
//! - **Outcome**: a tagged variant with the facets `kind`, `status`,
//!   `hasData`, `hasError` and `noValue`
//! - **Variants**: `Literal` (data), `Empty`/`NotFound` (absence),
//!   `MissingPermission`/`UnexpectedError` (errors) and the request
//!   lifecycle variants used by the runtime
//! - **Combinators**: `map`/`chain` transform data, `or` recovers from
//!   anything that is not data, `alt` recovers from explicit absence only,
//!   `map_if`/`map_unless` select by kind
//! - **Exposure groups**: which fields survive when an outcome crosses a
//!   trust boundary
//!
//! ## Example
//!
//! ```
//! use formulaic_core::{ExposureGroups, Outcome};
//!
//! let lookup: Outcome<String> = Outcome::entity_not_found("User", None);
//!
//! let greeting = lookup
//!     .map(|name: String| format!("hello {name}"))
//!     .alt_value("hello stranger".to_string());
//!
//! assert_eq!(greeting.data().map(String::as_str), Some("hello stranger"));
//!
//! let body = greeting.to_json(&ExposureGroups::production());
//! assert!(body.is_ok());
//! ```

pub mod combinators;
pub mod entity;
pub mod error;
pub mod exposure;
pub mod kind;
pub mod outcome;
pub mod schema;
pub mod variants;
pub mod wire;

pub use entity::{EntityService, Repository, RepositoryError};
pub use error::{ExposureError, WireError};
pub use exposure::{ExposureGroups, group};
pub use kind::KindSelector;
pub use outcome::{IntoOutcome, Outcome, OutcomeState};
pub use variants::Kind;
pub use wire::is_outcome;
