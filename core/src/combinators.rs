//! Transformations and recoveries on [`Outcome`].
//!
//! | combinator | runs when | result |
//! |---|---|---|
//! | [`map`](Outcome::map), [`chain`](Outcome::chain) | `hasData` | `wrap(f(data))` |
//! | [`or`](Outcome::or), [`or_value`](Outcome::or_value), [`or_then`](Outcome::or_then) | `!hasData` | `wrap(f())` |
//! | [`alt`](Outcome::alt), [`alt_value`](Outcome::alt_value), [`alt_then`](Outcome::alt_then) | `noValue && !hasError` | `wrap(f())` |
//! | [`map_if`](Outcome::map_if) | kind matches | `wrap(f(self))` |
//! | [`map_unless`](Outcome::map_unless) | kind does not match | `wrap(f(self))` |
//!
//! Otherwise the outcome is returned unchanged and the closure is never
//! called. `or` recovers from everything that is not data; `alt` recovers
//! from explicit absence only, so forbidden lookups and hard failures pass
//! through it.
//!
//! # Example
//!
//! ```
//! use formulaic_core::Outcome;
//!
//! let forbidden: Outcome<u32> = Outcome::access_forbidden("Comment");
//! assert_eq!(forbidden.clone().alt(|| 5), forbidden);
//! assert_eq!(forbidden.or(|| 5), Outcome::literal(5));
//!
//! let next: Outcome<String> = Outcome::literal(10).map(|n: u32| (n + 1).to_string());
//! assert_eq!(next.data().map(String::as_str), Some("11"));
//! ```

use crate::kind::KindSelector;
use crate::outcome::{IntoOutcome, Outcome};
use std::future::Future;

impl<T> Outcome<T> {
    /// Transform the payload.
    ///
    /// Non-data outcomes keep their kind and only change payload type; `f`
    /// is not called for them.
    pub fn map<U, R, F>(self, f: F) -> Outcome<U>
    where
        F: FnOnce(T) -> R,
        R: IntoOutcome<U>,
    {
        match self.retag() {
            Ok(passed) => passed,
            Err(literal) => f(literal.data).into_outcome(),
        }
    }

    /// Asynchronous [`map`](Self::map).
    ///
    /// A panic or error inside `f` is not converted into an outcome here;
    /// that is the job of the fetch normalization layer.
    pub async fn chain<U, R, F, Fut>(self, f: F) -> Outcome<U>
    where
        F: FnOnce(T) -> Fut,
        Fut: Future<Output = R>,
        R: IntoOutcome<U>,
    {
        match self.retag() {
            Ok(passed) => passed,
            Err(literal) => f(literal.data).await.into_outcome(),
        }
    }

    /// Recover from any non-data outcome.
    pub fn or<R, F>(self, f: F) -> Self
    where
        F: FnOnce() -> R,
        R: IntoOutcome<T>,
    {
        if self.has_data() {
            self
        } else {
            f().into_outcome()
        }
    }

    /// Recover from any non-data outcome with a fixed value.
    pub fn or_value(self, value: impl IntoOutcome<T>) -> Self {
        if self.has_data() {
            self
        } else {
            value.into_outcome()
        }
    }

    /// Asynchronous [`or`](Self::or).
    pub async fn or_then<R, F, Fut>(self, f: F) -> Self
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = R>,
        R: IntoOutcome<T>,
    {
        if self.has_data() {
            self
        } else {
            f().await.into_outcome()
        }
    }

    /// Whether [`alt`](Self::alt) recovers from this outcome.
    #[must_use]
    pub const fn is_recoverable_absence(&self) -> bool {
        self.no_value() && !self.has_error()
    }

    /// Recover from explicit absence only.
    ///
    /// Errors pass through unchanged, including errors presented as absence
    /// such as forbidden lookups.
    pub fn alt<R, F>(self, f: F) -> Self
    where
        F: FnOnce() -> R,
        R: IntoOutcome<T>,
    {
        if self.is_recoverable_absence() {
            f().into_outcome()
        } else {
            self
        }
    }

    /// Recover from explicit absence with a fixed value.
    pub fn alt_value(self, value: impl IntoOutcome<T>) -> Self {
        if self.is_recoverable_absence() {
            value.into_outcome()
        } else {
            self
        }
    }

    /// Asynchronous [`alt`](Self::alt).
    pub async fn alt_then<R, F, Fut>(self, f: F) -> Self
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = R>,
        R: IntoOutcome<T>,
    {
        if self.is_recoverable_absence() {
            f().await.into_outcome()
        } else {
            self
        }
    }

    /// Replace the outcome when its kind matches the selector.
    pub fn map_if<R, F>(self, selector: impl Into<KindSelector>, f: F) -> Self
    where
        F: FnOnce(Self) -> R,
        R: IntoOutcome<T>,
    {
        if selector.into().matches(self.kind()) {
            f(self).into_outcome()
        } else {
            self
        }
    }

    /// Replace the outcome when its kind does not match the selector.
    pub fn map_unless<R, F>(self, selector: impl Into<KindSelector>, f: F) -> Self
    where
        F: FnOnce(Self) -> R,
        R: IntoOutcome<T>,
    {
        if selector.into().matches(self.kind()) {
            self
        } else {
            f(self).into_outcome()
        }
    }
}
