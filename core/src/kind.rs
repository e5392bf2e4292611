//! Kind selectors for [`Outcome::map_if`](crate::Outcome::map_if) and
//! [`Outcome::map_unless`](crate::Outcome::map_unless).
//!
//! Matching is always by kind string. Selecting a variant type uses its
//! [`Kind::KIND`] constant, so `NotFound` selects every not-found-like
//! outcome, forbidden ones included.
//!
//! # Example
//!
//! ```
//! use formulaic_core::{KindSelector, variants::{Empty, NotFound}};
//!
//! let absent = KindSelector::of::<Empty>().or_type::<NotFound>();
//! assert!(absent.matches("NotFound"));
//! assert!(!absent.matches("Literal"));
//!
//! let listed = KindSelector::from(["Pending", "NeverFetched"]);
//! assert!(listed.matches("Pending"));
//! ```

use crate::variants::Kind;

/// A set of kinds matched by logical OR.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KindSelector {
    kinds: Vec<String>,
}

impl KindSelector {
    /// Select the static kind of `K`.
    #[must_use]
    pub fn of<K: Kind>() -> Self {
        Self {
            kinds: vec![K::KIND.to_string()],
        }
    }

    /// Also select `kind`.
    #[must_use]
    pub fn or_kind(mut self, kind: impl Into<String>) -> Self {
        self.kinds.push(kind.into());
        self
    }

    /// Also select the static kind of `K`.
    #[must_use]
    pub fn or_type<K: Kind>(self) -> Self {
        self.or_kind(K::KIND)
    }

    /// Whether `kind` is selected.
    #[must_use]
    pub fn matches(&self, kind: &str) -> bool {
        self.kinds.iter().any(|selected| selected == kind)
    }

    /// Selected kinds in insertion order.
    #[must_use]
    pub fn kinds(&self) -> &[String] {
        &self.kinds
    }
}

impl From<&str> for KindSelector {
    fn from(kind: &str) -> Self {
        Self {
            kinds: vec![kind.to_string()],
        }
    }
}

impl From<String> for KindSelector {
    fn from(kind: String) -> Self {
        Self { kinds: vec![kind] }
    }
}

impl<const N: usize> From<[&str; N]> for KindSelector {
    fn from(kinds: [&str; N]) -> Self {
        kinds.into_iter().collect()
    }
}

impl From<Vec<&str>> for KindSelector {
    fn from(kinds: Vec<&str>) -> Self {
        kinds.into_iter().collect()
    }
}

impl From<Vec<String>> for KindSelector {
    fn from(kinds: Vec<String>) -> Self {
        Self { kinds }
    }
}

impl<S: Into<String>> FromIterator<S> for KindSelector {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            kinds: iter.into_iter().map(Into::into).collect(),
        }
    }
}
