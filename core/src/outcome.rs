//! The [`Outcome`] sum type and its normalization point.
//!
//! An outcome is one of three states:
//!
//! - **Data**: a usable payload ([`Literal`])
//! - **No value**: nothing went wrong, but nothing is there ([`Empty`],
//!   [`NotFound`], [`SkippedRequest`], [`Pending`], [`NeverFetched`])
//! - **Error**: the operation failed ([`MissingPermission`],
//!   [`UnexpectedError`], [`FailedRequest`], forbidden [`NotFound`])
//!
//! Every value that may or may not already be an outcome enters through
//! [`IntoOutcome`], which wraps bare values in [`Literal`] and passes
//! outcomes through untouched.
//!
//! # Example
//!
//! ```
//! use formulaic_core::{Outcome, OutcomeState};
//!
//! let found: Outcome<u32> = Outcome::wrap(7);
//! assert_eq!(found.kind(), "Literal");
//! assert_eq!(found.state(), OutcomeState::Data);
//!
//! let forbidden: Outcome<u32> = Outcome::access_forbidden("User");
//! assert!(forbidden.no_value() && forbidden.has_error());
//! ```

use crate::variants::{
    Empty, FailedRequest, Foreign, Kind, Literal, MissingPermission, NeverFetched, NotFound,
    Pending, SkippedRequest, UnexpectedError,
};
use serde_json::Value;
use std::fmt;

/// A value that may be present, absent, or an error.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    /// A usable payload.
    Literal(Literal<T>),
    /// Generic absence.
    Empty(Empty),
    /// Missing or inaccessible entity.
    NotFound(NotFound),
    /// Caller lacks a required permission.
    MissingPermission(MissingPermission),
    /// Unexpected internal failure.
    UnexpectedError(UnexpectedError),
    /// A request failed without a recognizable outcome.
    FailedRequest(FailedRequest),
    /// Validation rejected the call.
    SkippedRequest(SkippedRequest),
    /// The call is in flight.
    Pending(Pending),
    /// No call has been made yet.
    NeverFetched(NeverFetched),
    /// An unmodeled non-data outcome received from elsewhere.
    Foreign(Foreign),
}

/// The three conceptual states of an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutcomeState {
    /// `hasData`
    Data,
    /// `noValue` without error
    NoValue,
    /// `hasError`, with or without `noValue`
    Error,
}

/// Conversion into an outcome.
///
/// Implemented for every `T` (wrapped in [`Literal`]), for [`Outcome<T>`]
/// (returned unchanged) and for [`Literal<T>`]. Combinators accept any
/// closure result implementing this trait, so a closure can return either
/// a bare value or a complete outcome without double wrapping.
pub trait IntoOutcome<T> {
    /// Convert into an outcome.
    fn into_outcome(self) -> Outcome<T>;
}

impl<T> IntoOutcome<T> for T {
    fn into_outcome(self) -> Outcome<T> {
        Outcome::Literal(Literal::new(self))
    }
}

impl<T> IntoOutcome<T> for Outcome<T> {
    fn into_outcome(self) -> Outcome<T> {
        self
    }
}

impl<T> IntoOutcome<T> for Literal<T> {
    fn into_outcome(self) -> Outcome<T> {
        Outcome::Literal(self)
    }
}

impl<T> Outcome<T> {
    /// Normalize a bare value or an outcome.
    ///
    /// Wrapping is idempotent: `wrap(wrap(x)) == wrap(x)`.
    pub fn wrap(value: impl IntoOutcome<T>) -> Self {
        value.into_outcome()
    }

    /// Successful outcome carrying `data`.
    pub const fn literal(data: T) -> Self {
        Self::Literal(Literal::new(data))
    }

    /// Successful outcome for a freshly created payload.
    pub const fn created(data: T) -> Self {
        Self::Literal(Literal::created(data))
    }

    /// Generic absence.
    #[must_use]
    pub const fn empty() -> Self {
        Self::Empty(Empty)
    }

    /// The entity exists but may not be accessed.
    #[must_use]
    pub fn access_forbidden(entity_name: impl Into<String>) -> Self {
        Self::NotFound(NotFound::access_forbidden(entity_name))
    }

    /// No entity matched the lookup.
    #[must_use]
    pub fn entity_not_found(entity_name: impl Into<String>, find_options: Option<Value>) -> Self {
        Self::NotFound(NotFound::entity_not_found(entity_name, find_options))
    }

    /// Missing entity with an explicit permission flag.
    #[must_use]
    pub fn not_found(entity_name: impl Into<String>, permission_error: bool) -> Self {
        Self::NotFound(NotFound::new(entity_name, permission_error))
    }

    /// The caller lacks a required permission.
    #[must_use]
    pub const fn missing_permission() -> Self {
        Self::MissingPermission(MissingPermission)
    }

    /// Unexpected failure caused by `error`.
    #[must_use]
    pub fn unexpected(error: &(dyn std::error::Error + 'static)) -> Self {
        Self::UnexpectedError(UnexpectedError::from_error(error))
    }

    /// Failed database operation `method`.
    #[must_use]
    pub fn database_exception(
        method: impl Into<String>,
        error: &(dyn std::error::Error + 'static),
    ) -> Self {
        Self::UnexpectedError(UnexpectedError::database_exception(method, error))
    }

    /// Request failure with transport status and optional raw detail.
    #[must_use]
    pub const fn failed_request(status: u16, error: Option<Value>) -> Self {
        Self::FailedRequest(FailedRequest::new(status, error))
    }

    /// Validation rejected the call.
    #[must_use]
    pub const fn skipped() -> Self {
        Self::SkippedRequest(SkippedRequest)
    }

    /// The call is in flight.
    #[must_use]
    pub const fn pending() -> Self {
        Self::Pending(Pending)
    }

    /// No call has been made yet.
    #[must_use]
    pub const fn never_fetched() -> Self {
        Self::NeverFetched(NeverFetched)
    }

    /// Kind discriminator.
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Self::Literal(_) => Literal::<T>::KIND,
            Self::Empty(_) => Empty::KIND,
            Self::NotFound(_) => NotFound::KIND,
            Self::MissingPermission(_) => MissingPermission::KIND,
            Self::UnexpectedError(_) => UnexpectedError::KIND,
            Self::FailedRequest(_) => FailedRequest::KIND,
            Self::SkippedRequest(_) => SkippedRequest::KIND,
            Self::Pending(_) => Pending::KIND,
            Self::NeverFetched(_) => NeverFetched::KIND,
            Self::Foreign(foreign) => &foreign.kind,
        }
    }

    /// Raw status code, before exposure rules are applied.
    ///
    /// See [`Outcome::exposed_status`] for the status observers get to see.
    #[must_use]
    pub const fn status(&self) -> u16 {
        match self {
            Self::Literal(literal) => literal.status(),
            Self::Empty(_) => 404,
            Self::NotFound(not_found) => not_found.status(),
            Self::MissingPermission(_) => 401,
            Self::UnexpectedError(_) => 500,
            Self::FailedRequest(failed) => failed.status,
            Self::SkippedRequest(_) => 100,
            Self::Pending(_) => 102,
            Self::NeverFetched(_) => 204,
            Self::Foreign(foreign) => foreign.status,
        }
    }

    /// True iff the outcome carries a payload.
    #[must_use]
    pub const fn has_data(&self) -> bool {
        matches!(self, Self::Literal(_))
    }

    /// True iff the outcome represents a failure.
    #[must_use]
    pub const fn has_error(&self) -> bool {
        match self {
            Self::NotFound(not_found) => not_found.permission_error,
            Self::MissingPermission(_) | Self::UnexpectedError(_) | Self::FailedRequest(_) => true,
            Self::Foreign(foreign) => foreign.has_error,
            Self::Literal(_)
            | Self::Empty(_)
            | Self::SkippedRequest(_)
            | Self::Pending(_)
            | Self::NeverFetched(_) => false,
        }
    }

    /// True iff there is no payload because nothing is there.
    #[must_use]
    pub const fn no_value(&self) -> bool {
        match self {
            Self::Empty(_)
            | Self::NotFound(_)
            | Self::SkippedRequest(_)
            | Self::Pending(_)
            | Self::NeverFetched(_) => true,
            Self::Foreign(foreign) => foreign.no_value,
            Self::Literal(_)
            | Self::MissingPermission(_)
            | Self::UnexpectedError(_)
            | Self::FailedRequest(_) => false,
        }
    }

    /// Conceptual state of the outcome.
    #[must_use]
    pub const fn state(&self) -> OutcomeState {
        if self.has_data() {
            OutcomeState::Data
        } else if self.has_error() {
            OutcomeState::Error
        } else {
            OutcomeState::NoValue
        }
    }

    /// Whether the kind equals `kind`.
    #[must_use]
    pub fn is_kind(&self, kind: &str) -> bool {
        self.kind() == kind
    }

    /// Whether the kind equals the static kind of `K`.
    #[must_use]
    pub fn is<K: Kind>(&self) -> bool {
        self.is_kind(K::KIND)
    }

    /// Borrow the payload, if any.
    #[must_use]
    pub const fn data(&self) -> Option<&T> {
        match self {
            Self::Literal(literal) => Some(&literal.data),
            _ => None,
        }
    }

    /// Take the payload, if any.
    #[must_use]
    pub fn into_data(self) -> Option<T> {
        match self {
            Self::Literal(literal) => Some(literal.data),
            _ => None,
        }
    }

    /// Convert into a `Result`, keeping non-data outcomes as the error.
    ///
    /// # Errors
    ///
    /// Returns the outcome itself when it carries no payload.
    pub fn into_result(self) -> Result<T, Self> {
        match self {
            Self::Literal(literal) => Ok(literal.data),
            other => Err(other),
        }
    }

    /// Split a data outcome from the others, re-typing the others.
    ///
    /// Non-data variants carry no payload, so they convert to any payload
    /// type without changing at runtime.
    pub(crate) fn retag<U>(self) -> Result<Outcome<U>, Literal<T>> {
        Ok(match self {
            Self::Literal(literal) => return Err(literal),
            Self::Empty(v) => Outcome::Empty(v),
            Self::NotFound(v) => Outcome::NotFound(v),
            Self::MissingPermission(v) => Outcome::MissingPermission(v),
            Self::UnexpectedError(v) => Outcome::UnexpectedError(v),
            Self::FailedRequest(v) => Outcome::FailedRequest(v),
            Self::SkippedRequest(v) => Outcome::SkippedRequest(v),
            Self::Pending(v) => Outcome::Pending(v),
            Self::NeverFetched(v) => Outcome::NeverFetched(v),
            Self::Foreign(v) => Outcome::Foreign(v),
        })
    }
}

impl<T> Default for Outcome<T> {
    fn default() -> Self {
        Self::never_fetched()
    }
}

impl<T> fmt::Display for Outcome<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.kind(), self.status())
    }
}

impl<T> From<Literal<T>> for Outcome<T> {
    fn from(literal: Literal<T>) -> Self {
        Self::Literal(literal)
    }
}

macro_rules! impl_from_variant {
    ($($variant:ident),* $(,)?) => {
        $(
            impl<T> From<$variant> for Outcome<T> {
                fn from(value: $variant) -> Self {
                    Self::$variant(value)
                }
            }
        )*
    };
}

impl_from_variant!(
    Empty,
    NotFound,
    MissingPermission,
    UnexpectedError,
    FailedRequest,
    SkippedRequest,
    Pending,
    NeverFetched,
    Foreign,
);

#[cfg(test)]
mod tests {
    use super::*;

    fn all_kinds() -> Vec<Outcome<i32>> {
        vec![
            Outcome::literal(1),
            Outcome::created(1),
            Outcome::empty(),
            Outcome::access_forbidden("User"),
            Outcome::entity_not_found("User", None),
            Outcome::missing_permission(),
            Outcome::UnexpectedError(UnexpectedError::new()),
            Outcome::failed_request(502, None),
            Outcome::skipped(),
            Outcome::pending(),
            Outcome::never_fetched(),
        ]
    }

    #[test]
    fn data_never_coexists_with_error() {
        for outcome in all_kinds() {
            assert!(!(outcome.has_data() && outcome.has_error()), "{outcome}");
            assert!(!(outcome.has_data() && outcome.no_value()), "{outcome}");
            assert!(
                outcome.has_data() || outcome.has_error() || outcome.no_value(),
                "{outcome}"
            );
        }
    }

    #[test]
    fn statuses_follow_variants() {
        let statuses: Vec<u16> = all_kinds().iter().map(Outcome::status).collect();
        assert_eq!(
            statuses,
            vec![200, 201, 404, 403, 404, 401, 500, 502, 100, 102, 204]
        );
    }

    #[test]
    fn wrap_is_idempotent() {
        let once: Outcome<&str> = Outcome::wrap("x");
        let twice: Outcome<&str> = Outcome::wrap(once.clone());
        assert_eq!(once, twice);

        let absent: Outcome<&str> = Outcome::empty();
        assert_eq!(Outcome::wrap(absent.clone()), absent);
    }

    #[test]
    fn state_classifies_hybrids_as_errors() {
        let forbidden: Outcome<()> = Outcome::access_forbidden("Comment");
        assert_eq!(forbidden.state(), OutcomeState::Error);

        let missing: Outcome<()> = Outcome::entity_not_found("Comment", None);
        assert_eq!(missing.state(), OutcomeState::NoValue);
    }

    #[test]
    fn type_and_string_selection_agree() {
        let forbidden: Outcome<()> = Outcome::access_forbidden("Comment");
        assert!(forbidden.is::<NotFound>());
        assert!(forbidden.is_kind("NotFound"));
        assert!(!forbidden.is::<Empty>());
    }

    #[test]
    fn into_result_keeps_non_data() {
        assert_eq!(Outcome::literal(3).into_result(), Ok(3));
        assert_eq!(
            Outcome::<i32>::missing_permission().into_result(),
            Err(Outcome::missing_permission())
        );
    }
}
