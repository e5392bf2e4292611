//! Exposure groups: which outcome fields survive a trust boundary.
//!
//! Every exposed outcome carries `kind`, `status`, `hasData`, `hasError`
//! and `noValue`. Other fields are gated:
//!
//! | variant | field | groups |
//! |---|---|---|
//! | `Literal` | `data` | always |
//! | `NotFound` | `entityName` | `structure` |
//! | `NotFound` | `permissionError` | `debug`, `exposeForbidden` |
//! | `NotFound` | `findOptions` | `debug` |
//! | `UnexpectedError` | `code` | `debug`, `info`, `exposeUnexpectedType` |
//! | `UnexpectedError` | `serializedError`, `method` | `debug` |
//! | `FailedRequest` | `error` | `debug` |
//!
//! The status of not-found outcomes is computed: 403 for permission errors
//! only when `debug` or `exposeForbidden` is active, 404 in every other
//! case.
//!
//! # Example
//!
//! ```
//! use formulaic_core::{Outcome, ExposureGroups, group};
//!
//! let forbidden: Outcome<()> = Outcome::access_forbidden("User");
//!
//! let public = forbidden.expose(&ExposureGroups::new()).unwrap_or_default();
//! assert_eq!(public["status"], 404);
//! assert!(!public.contains_key("permissionError"));
//!
//! let debug = forbidden.expose(&ExposureGroups::new().with(group::DEBUG)).unwrap_or_default();
//! assert_eq!(debug["status"], 403);
//! assert_eq!(debug["permissionError"], true);
//! ```

use crate::error::ExposureError;
use crate::outcome::Outcome;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Well-known exposure group names.
pub mod group {
    /// Informational fields, active by default.
    pub const INFO: &str = "info";
    /// Internal detail for development environments.
    pub const DEBUG: &str = "debug";
    /// Structural metadata such as entity names.
    pub const STRUCTURE: &str = "structure";
    /// Reveal the difference between forbidden and missing.
    pub const EXPOSE_FORBIDDEN: &str = "exposeForbidden";
    /// Reveal the code of unexpected errors.
    pub const EXPOSE_UNEXPECTED_TYPE: &str = "exposeUnexpectedType";
}

/// The active set of exposure groups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExposureGroups {
    groups: BTreeSet<String>,
}

impl ExposureGroups {
    /// No groups: only ungated fields are exposed.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            groups: BTreeSet::new(),
        }
    }

    /// Default production policy: `info`.
    #[must_use]
    pub fn production() -> Self {
        Self::new().with(group::INFO)
    }

    /// Default development policy: `info` and `debug`.
    #[must_use]
    pub fn development() -> Self {
        Self::production().with(group::DEBUG)
    }

    /// Add a group.
    #[must_use]
    pub fn with(mut self, group: impl Into<String>) -> Self {
        self.groups.insert(group.into());
        self
    }

    /// Add a group in place.
    pub fn insert(&mut self, group: impl Into<String>) {
        self.groups.insert(group.into());
    }

    /// Whether `group` is active.
    #[must_use]
    pub fn contains(&self, group: &str) -> bool {
        self.groups.contains(group)
    }

    /// Whether any of `groups` is active.
    #[must_use]
    pub fn any_of(&self, groups: &[&str]) -> bool {
        groups.iter().any(|group| self.contains(group))
    }

    /// Active groups in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for ExposureGroups {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            groups: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl<S: Into<String>> Extend<S> for ExposureGroups {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        self.groups.extend(iter.into_iter().map(Into::into));
    }
}

const FORBIDDEN_GROUPS: &[&str] = &[group::DEBUG, group::EXPOSE_FORBIDDEN];
const CODE_GROUPS: &[&str] = &[group::DEBUG, group::EXPOSE_UNEXPECTED_TYPE];
const DEBUG_FIELDS: &[&str] = &["serializedError", "method", "findOptions", "error"];

/// Whether a field received on a foreign outcome may be passed on.
fn foreign_field_visible(key: &str, groups: &ExposureGroups) -> bool {
    match key {
        "permissionError" => groups.any_of(FORBIDDEN_GROUPS),
        "code" => groups.any_of(CODE_GROUPS),
        "entityName" => groups.contains(group::STRUCTURE),
        key if DEBUG_FIELDS.contains(&key) => groups.contains(group::DEBUG),
        _ => true,
    }
}

impl<T> Outcome<T> {
    /// Status an observer with `groups` is allowed to see.
    #[must_use]
    pub fn exposed_status(&self, groups: &ExposureGroups) -> u16 {
        match self {
            Self::NotFound(not_found) if groups.any_of(FORBIDDEN_GROUPS) => not_found.status(),
            Self::NotFound(_) => 404,
            other => other.status(),
        }
    }

    /// Convert into a plain map containing only the fields `groups` allow.
    ///
    /// # Errors
    ///
    /// Returns [`ExposureError::Payload`] if the data payload cannot be
    /// serialized to JSON.
    pub fn expose(&self, groups: &ExposureGroups) -> Result<Map<String, Value>, ExposureError>
    where
        T: Serialize,
    {
        let mut exposed = Map::new();
        exposed.insert("kind".into(), Value::from(self.kind()));
        exposed.insert("status".into(), Value::from(self.exposed_status(groups)));
        exposed.insert("hasData".into(), Value::Bool(self.has_data()));
        exposed.insert("hasError".into(), Value::Bool(self.has_error()));
        exposed.insert("noValue".into(), Value::Bool(self.no_value()));

        match self {
            Self::Literal(literal) => {
                let data =
                    serde_json::to_value(&literal.data).map_err(|source| ExposureError::Payload {
                        kind: self.kind().to_string(),
                        source,
                    })?;
                exposed.insert("data".into(), data);
            }
            Self::NotFound(not_found) => {
                if groups.contains(group::STRUCTURE) {
                    if let Some(name) = &not_found.entity_name {
                        exposed.insert("entityName".into(), Value::from(name.as_str()));
                    }
                }
                if groups.any_of(FORBIDDEN_GROUPS) {
                    exposed.insert(
                        "permissionError".into(),
                        Value::Bool(not_found.permission_error),
                    );
                }
                if groups.contains(group::DEBUG) {
                    if let Some(options) = &not_found.find_options {
                        exposed.insert("findOptions".into(), options.clone());
                    }
                }
            }
            Self::UnexpectedError(error) => {
                if groups.any_of(CODE_GROUPS) {
                    if let Some(code) = &error.code {
                        exposed.insert("code".into(), Value::from(code.as_str()));
                    }
                }
                if groups.contains(group::DEBUG) {
                    if let Some(serialized) = &error.serialized_error {
                        exposed.insert("serializedError".into(), Value::from(serialized.as_str()));
                    }
                    if let Some(method) = &error.method {
                        exposed.insert("method".into(), Value::from(method.as_str()));
                    }
                }
            }
            Self::FailedRequest(failed) => {
                if groups.contains(group::DEBUG) {
                    if let Some(error) = &failed.error {
                        exposed.insert("error".into(), error.clone());
                    }
                }
            }
            Self::Foreign(foreign) => {
                for (key, value) in &foreign.fields {
                    if foreign_field_visible(key, groups) {
                        exposed.entry(key.clone()).or_insert_with(|| value.clone());
                    }
                }
            }
            Self::Empty(_)
            | Self::MissingPermission(_)
            | Self::SkippedRequest(_)
            | Self::Pending(_)
            | Self::NeverFetched(_) => {}
        }

        Ok(exposed)
    }

    /// [`expose`](Self::expose) as a JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`ExposureError::Payload`] if the data payload cannot be
    /// serialized to JSON.
    pub fn to_json(&self, groups: &ExposureGroups) -> Result<Value, ExposureError>
    where
        T: Serialize,
    {
        self.expose(groups).map(Value::Object)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;
    use crate::variants::UnexpectedError;
    use serde_json::json;

    #[derive(Debug, thiserror::Error)]
    #[error("relation \"users\" does not exist")]
    struct MissingRelation;

    #[test]
    fn forbidden_is_hidden_without_groups() {
        let exposed = Outcome::<()>::access_forbidden("User")
            .expose(&ExposureGroups::new())
            .unwrap();

        assert_eq!(exposed["status"], 404);
        assert_eq!(exposed["kind"], "NotFound");
        assert!(!exposed.contains_key("permissionError"));
        assert!(!exposed.contains_key("entityName"));
    }

    #[test]
    fn forbidden_is_revealed_with_debug() {
        let exposed = Outcome::<()>::access_forbidden("User")
            .expose(&ExposureGroups::new().with(group::DEBUG))
            .unwrap();

        assert_eq!(exposed["status"], 403);
        assert_eq!(exposed["kind"], "NotFound");
        assert_eq!(exposed["permissionError"], true);
    }

    #[test]
    fn expose_forbidden_group_reveals_status_only() {
        let outcome = Outcome::<()>::entity_not_found("User", Some(json!({"where": {"id": 1}})));
        let groups = ExposureGroups::new().with(group::EXPOSE_FORBIDDEN);
        let exposed = outcome.expose(&groups).unwrap();

        assert_eq!(exposed["status"], 404);
        assert_eq!(exposed["permissionError"], false);
        assert!(!exposed.contains_key("findOptions"));
    }

    #[test]
    fn structure_group_names_the_entity() {
        let exposed = Outcome::<()>::entity_not_found("Comment", None)
            .expose(&ExposureGroups::new().with(group::STRUCTURE))
            .unwrap();
        assert_eq!(exposed["entityName"], "Comment");
    }

    #[test]
    fn unexpected_error_detail_requires_debug() {
        let outcome: Outcome<()> =
            Outcome::UnexpectedError(UnexpectedError::database_exception("find", &MissingRelation));

        let production = outcome.expose(&ExposureGroups::production()).unwrap();
        assert_eq!(production["status"], 500);
        assert_eq!(production["kind"], "UnexpectedError");
        assert!(!production.contains_key("code"));
        assert!(!production.contains_key("serializedError"));
        assert!(!production.contains_key("method"));

        let bare = outcome.expose(&ExposureGroups::new()).unwrap();
        assert!(!bare.contains_key("code"));

        let opted_in = outcome
            .expose(&ExposureGroups::production().with(group::EXPOSE_UNEXPECTED_TYPE))
            .unwrap();
        assert_eq!(opted_in["code"], "DatabaseException");
        assert!(!opted_in.contains_key("serializedError"));

        let development = outcome.expose(&ExposureGroups::development()).unwrap();
        assert_eq!(development["code"], "DatabaseException");
        assert_eq!(development["method"], "find");
        assert!(development["serializedError"]
            .as_str()
            .unwrap()
            .contains("does not exist"));
    }

    #[test]
    fn literal_always_carries_data() {
        let exposed = Outcome::created(json!({"id": 7}))
            .to_json(&ExposureGroups::new())
            .unwrap();
        assert_eq!(
            exposed,
            json!({
                "kind": "Literal",
                "status": 201,
                "hasData": true,
                "hasError": false,
                "noValue": false,
                "data": {"id": 7}
            })
        );
    }

    #[test]
    fn failed_request_detail_requires_debug() {
        let outcome: Outcome<()> = Outcome::failed_request(502, Some(json!({"body": "bad gateway"})));
        assert!(!outcome.expose(&ExposureGroups::production()).unwrap().contains_key("error"));
        assert_eq!(
            outcome.expose(&ExposureGroups::development()).unwrap()["error"]["body"],
            "bad gateway"
        );
    }

    #[test]
    fn foreign_debug_fields_require_debug() {
        let outcome: Outcome<()> = Outcome::from_wire(json!({
            "kind": "UpstreamFailure",
            "status": 502,
            "hasData": false,
            "hasError": true,
            "noValue": false,
            "serializedError": "{\"message\":\"pool exhausted\"}",
            "code": "PoolExhausted",
            "retryAfter": 5
        }))
        .unwrap();

        let production = outcome.expose(&ExposureGroups::production()).unwrap();
        assert!(!production.contains_key("serializedError"));
        assert!(!production.contains_key("code"));
        assert_eq!(production["retryAfter"], 5);

        let development = outcome.expose(&ExposureGroups::development()).unwrap();
        assert_eq!(development["code"], "PoolExhausted");
        assert!(development.contains_key("serializedError"));
    }
}
