//! Concrete outcome variants.
//!
//! Each struct here is one arm of [`Outcome`](crate::Outcome). The structs
//! carry the variant-specific fields; the shared facets (`kind`, `status`,
//! `hasData`, `hasError`, `noValue`) are exposed through the [`Kind`] trait
//! and through the accessors on [`Outcome`](crate::Outcome).
//!
//! | variant | kind | status | state |
//! |---|---|---|---|
//! | [`Literal`] | `Literal` | 200 (201 when created) | data |
//! | [`Empty`] | `Empty` | 404 | no value |
//! | [`NotFound`] | `NotFound` | 404, or 403 for permission errors | no value, error when forbidden |
//! | [`MissingPermission`] | `MissingPermission` | 401 | error |
//! | [`UnexpectedError`] | `UnexpectedError` | 500 | error |
//! | [`FailedRequest`] | `FailedRequest` | received | error |
//! | [`SkippedRequest`] | `SkippedRequest` | 100 | no value |
//! | [`Pending`] | `Pending` | 102 | no value |
//! | [`NeverFetched`] | `NeverFetched` | 204 | no value |
//! | [`Foreign`] | received | received | received |

use serde_json::{Map, Value};

/// A variant type with a static kind discriminator.
///
/// The constant always equals the runtime `kind` of the variant's
/// instances, so selecting by type and selecting by string agree.
pub trait Kind {
    /// The kind discriminator.
    const KIND: &'static str;
}

/// Wraps an arbitrary value as a successful outcome.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Literal<T> {
    /// The payload.
    pub data: T,
    /// Marks the payload as freshly created (status 201 instead of 200).
    pub created: bool,
}

impl<T> Literal<T> {
    /// Wrap a value.
    #[must_use]
    pub const fn new(data: T) -> Self {
        Self {
            data,
            created: false,
        }
    }

    /// Wrap a value that was just created.
    #[must_use]
    pub const fn created(data: T) -> Self {
        Self {
            data,
            created: true,
        }
    }

    /// Status code of the literal: 201 when created, 200 otherwise.
    #[must_use]
    pub const fn status(&self) -> u16 {
        if self.created { 201 } else { 200 }
    }

    /// Consume the literal and return its payload.
    #[must_use]
    pub fn into_inner(self) -> T {
        self.data
    }
}

impl<T> Kind for Literal<T> {
    const KIND: &'static str = "Literal";
}

/// Generic absence of a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Empty;

impl Kind for Empty {
    const KIND: &'static str = "Empty";
}

/// A missing or inaccessible entity.
///
/// Missing entities and forbidden entities share this one shape so that an
/// untrusted observer cannot tell them apart: the public status is always
/// 404 and `permissionError` is only exposed with the `debug` or
/// `exposeForbidden` groups.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NotFound {
    /// Name of the entity that was looked up, when known.
    pub entity_name: Option<String>,
    /// Set when the entity exists but the caller may not see it.
    pub permission_error: bool,
    /// Lookup options used for the search (debug only).
    pub find_options: Option<Value>,
}

impl NotFound {
    /// Create a not-found outcome for the named entity.
    #[must_use]
    pub fn new(entity_name: impl Into<String>, permission_error: bool) -> Self {
        Self {
            entity_name: Some(entity_name.into()),
            permission_error,
            find_options: None,
        }
    }

    /// The entity exists but the caller is not allowed to access it.
    #[must_use]
    pub fn access_forbidden(entity_name: impl Into<String>) -> Self {
        Self::new(entity_name, true)
    }

    /// No entity matched the lookup.
    #[must_use]
    pub fn entity_not_found(entity_name: impl Into<String>, find_options: Option<Value>) -> Self {
        Self {
            find_options,
            ..Self::new(entity_name, false)
        }
    }

    /// Whether this is the access-forbidden specialization.
    #[must_use]
    pub const fn is_access_forbidden(&self) -> bool {
        self.permission_error
    }

    /// Raw status: 403 for permission errors, 404 otherwise.
    #[must_use]
    pub const fn status(&self) -> u16 {
        if self.permission_error { 403 } else { 404 }
    }
}

impl Kind for NotFound {
    const KIND: &'static str = "NotFound";
}

/// The caller lacks the permission required for the operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MissingPermission;

impl Kind for MissingPermission {
    const KIND: &'static str = "MissingPermission";
}

/// Code carried by database failures.
pub const DATABASE_EXCEPTION: &str = "DatabaseException";

/// An unexpected internal failure.
///
/// The causing error is kept only as a serialized copy, which is exposed
/// with the `debug` group alone.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UnexpectedError {
    /// Machine-readable error code.
    pub code: Option<String>,
    /// JSON rendering of the causing error chain.
    pub serialized_error: Option<String>,
    /// Failing operation, set for database exceptions.
    pub method: Option<String>,
}

impl UnexpectedError {
    /// An unexpected error without detail.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            code: None,
            serialized_error: None,
            method: None,
        }
    }

    /// Capture the causing error.
    #[must_use]
    pub fn from_error(error: &(dyn std::error::Error + 'static)) -> Self {
        Self {
            serialized_error: Some(serialize_error(error)),
            ..Self::new()
        }
    }

    /// A failed database operation.
    #[must_use]
    pub fn database_exception(
        method: impl Into<String>,
        error: &(dyn std::error::Error + 'static),
    ) -> Self {
        Self {
            code: Some(DATABASE_EXCEPTION.to_string()),
            method: Some(method.into()),
            ..Self::from_error(error)
        }
    }

    /// Set the error code.
    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Whether this error came from a database operation.
    #[must_use]
    pub fn is_database_exception(&self) -> bool {
        self.code.as_deref() == Some(DATABASE_EXCEPTION)
    }
}

impl Kind for UnexpectedError {
    const KIND: &'static str = "UnexpectedError";
}

/// Render an error and its source chain as a JSON string.
fn serialize_error(error: &(dyn std::error::Error + 'static)) -> String {
    let mut sources = Vec::new();
    let mut current = error.source();
    while let Some(source) = current {
        sources.push(Value::String(source.to_string()));
        current = source.source();
    }

    let mut rendered = Map::new();
    rendered.insert("message".to_string(), Value::String(error.to_string()));
    if !sources.is_empty() {
        rendered.insert("sources".to_string(), Value::Array(sources));
    }
    Value::Object(rendered).to_string()
}

/// A request that failed without returning a recognizable outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedRequest {
    /// Transport status of the failure.
    pub status: u16,
    /// Raw failure detail (debug only).
    pub error: Option<Value>,
}

impl FailedRequest {
    /// Status used when nothing better is known.
    pub const FALLBACK_STATUS: u16 = 500;

    /// Create a failed request outcome.
    #[must_use]
    pub const fn new(status: u16, error: Option<Value>) -> Self {
        Self { status, error }
    }
}

impl Default for FailedRequest {
    fn default() -> Self {
        Self::new(Self::FALLBACK_STATUS, None)
    }
}

impl Kind for FailedRequest {
    const KIND: &'static str = "FailedRequest";
}

/// Validation rejected the call before it was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SkippedRequest;

impl Kind for SkippedRequest {
    const KIND: &'static str = "SkippedRequest";
}

/// The call is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Pending;

impl Kind for Pending {
    const KIND: &'static str = "Pending";
}

/// No call has been made yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NeverFetched;

impl Kind for NeverFetched {
    const KIND: &'static str = "NeverFetched";
}

/// A non-data outcome of a kind this crate does not model.
///
/// Produced when decoding outcomes received from another service. The
/// received fields are kept verbatim and exposed again unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Foreign {
    /// Received kind.
    pub kind: String,
    /// Received status.
    pub status: u16,
    /// Received `hasError` flag.
    pub has_error: bool,
    /// Received `noValue` flag.
    pub no_value: bool,
    /// Remaining received fields.
    pub fields: Map<String, Value>,
}
