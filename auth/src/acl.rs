//! Ordered-rule access control.
//!
//! An [`Ability`] is a list of [`Rule`]s. A check collects the rules whose
//! action, subject kind, conditions and fields apply, and the **last** of
//! them in declaration order decides: a `can` rule allows, a `cannot` rule
//! denies. When no rule applies, access is denied.
//!
//! Kind-level checks (no subject attributes) treat conditional and
//! field-restricted `can` rules as granting partial access, while
//! conditional or field-restricted `cannot` rules only deny the attributes
//! or fields they name.
//!
//! # Example
//!
//! ```
//! use formulaic_auth::acl::{AbilityBuilder, Action};
//! use serde_json::json;
//!
//! let mut builder = AbilityBuilder::new();
//! builder.can(Action::Browse, "Comment");
//! builder.cannot(Action::Browse, "Comment").when("staffDeleted", true);
//! let ability = builder.build();
//!
//! assert!(ability.can(Action::Browse, "Comment"));
//! let hidden = json!({ "kind": "Comment", "staffDeleted": true });
//! assert!(!ability.can_subject(Action::Browse, &hidden).unwrap_or(true));
//! ```

use crate::error::AclError;
use formulaic_core::Outcome;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Subject kind matching every kind.
pub const ALL: &str = "all";

/// Actions a user may perform on a subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Every action.
    Manage,
    /// Create a new entity.
    Create,
    /// Read an entity or a field.
    Browse,
    /// Change an existing entity.
    Update,
    /// Delete an entity, softly where the entity supports it.
    Delete,
    /// Hard-delete an entity.
    Remove,
    /// Application-specific primary action (publish, check out, run).
    Submit,
}

impl Action {
    /// Wire name of the action.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Manage => "manage",
            Self::Create => "create",
            Self::Browse => "browse",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Remove => "remove",
            Self::Submit => "submit",
        }
    }

    /// Whether a rule granted for `self` covers `requested`.
    #[must_use]
    pub fn covers(self, requested: Self) -> bool {
        self == Self::Manage || self == requested
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One or more actions a rule applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actions(Vec<Action>);

impl From<Action> for Actions {
    fn from(action: Action) -> Self {
        Self(vec![action])
    }
}

impl<const N: usize> From<[Action; N]> for Actions {
    fn from(actions: [Action; N]) -> Self {
        Self(actions.to_vec())
    }
}

impl From<Vec<Action>> for Actions {
    fn from(actions: Vec<Action>) -> Self {
        Self(actions)
    }
}

/// A single `can` or `cannot` declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    /// Actions the rule applies to.
    pub actions: Vec<Action>,
    /// Subject kind, or [`ALL`].
    pub subject: String,
    /// Fields the rule is restricted to; `None` covers the whole subject.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,
    /// Attribute values the subject must have.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub conditions: Map<String, Value>,
    /// `cannot` rule.
    #[serde(default, skip_serializing_if = "is_false")]
    pub inverted: bool,
    /// Explanation reported when the rule denies access.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[allow(clippy::trivially_copy_pass_by_ref)] // serde passes by reference
const fn is_false(value: &bool) -> bool {
    !*value
}

impl Rule {
    fn new(actions: Actions, subject: impl Into<String>, inverted: bool) -> Self {
        Self {
            actions: actions.0,
            subject: subject.into(),
            fields: None,
            conditions: Map::new(),
            inverted,
            reason: None,
        }
    }

    /// Only apply to subjects whose `field` equals `value`.
    pub fn when(&mut self, field: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.conditions.insert(field.into(), value.into());
        self
    }

    /// Restrict the rule to `fields`.
    pub fn fields<I, S>(&mut self, fields: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Attach an explanation.
    pub fn because(&mut self, reason: impl Into<String>) -> &mut Self {
        self.reason = Some(reason.into());
        self
    }

    fn covers(&self, action: Action, kind: &str) -> bool {
        (self.subject == ALL || self.subject == kind)
            && self.actions.iter().any(|granted| granted.covers(action))
    }

    fn applies_to_attributes(&self, attributes: Option<&Map<String, Value>>) -> bool {
        if self.conditions.is_empty() {
            return true;
        }
        match attributes {
            Some(attributes) => self
                .conditions
                .iter()
                .all(|(field, expected)| attributes.get(field) == Some(expected)),
            None => !self.inverted,
        }
    }

    fn applies_to_field(&self, field: Option<&str>) -> bool {
        match (&self.fields, field) {
            (None, _) => true,
            (Some(_), None) => !self.inverted,
            (Some(fields), Some(field)) => fields.iter().any(|f| f == field),
        }
    }
}

/// Collects rules and builds an [`Ability`].
#[derive(Debug, Default)]
pub struct AbilityBuilder {
    rules: Vec<Rule>,
}

impl AbilityBuilder {
    /// Start with no rules.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow `actions` on `subject`.
    pub fn can(&mut self, actions: impl Into<Actions>, subject: impl Into<String>) -> &mut Rule {
        self.push(Rule::new(actions.into(), subject, false))
    }

    /// Deny `actions` on `subject`, overriding earlier rules.
    pub fn cannot(&mut self, actions: impl Into<Actions>, subject: impl Into<String>) -> &mut Rule {
        self.push(Rule::new(actions.into(), subject, true))
    }

    /// Finish.
    #[must_use]
    pub fn build(self) -> Ability {
        Ability { rules: self.rules }
    }

    fn push(&mut self, rule: Rule) -> &mut Rule {
        let index = self.rules.len();
        self.rules.push(rule);
        &mut self.rules[index]
    }
}

/// What a user may do. The default ability denies everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ability {
    rules: Vec<Rule>,
}

impl Ability {
    /// Ability made of already declared rules, for example received from
    /// a server.
    #[must_use]
    pub const fn from_rules(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Declared rules in order.
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// The rule deciding a check, if any applies.
    #[must_use]
    pub fn relevant_rule(
        &self,
        action: Action,
        kind: &str,
        attributes: Option<&Map<String, Value>>,
        field: Option<&str>,
    ) -> Option<&Rule> {
        self.rules.iter().rev().find(|rule| {
            rule.covers(action, kind)
                && rule.applies_to_attributes(attributes)
                && rule.applies_to_field(field)
        })
    }

    /// General form of every check.
    #[must_use]
    pub fn check(
        &self,
        action: Action,
        kind: &str,
        attributes: Option<&Map<String, Value>>,
        field: Option<&str>,
    ) -> bool {
        self.relevant_rule(action, kind, attributes, field)
            .is_some_and(|rule| !rule.inverted)
    }

    /// Whether `action` is allowed on at least some subjects of `kind`.
    #[must_use]
    pub fn can(&self, action: Action, kind: &str) -> bool {
        self.check(action, kind, None, None)
    }

    /// Negation of [`can`](Self::can).
    #[must_use]
    pub fn cannot(&self, action: Action, kind: &str) -> bool {
        !self.can(action, kind)
    }

    /// Whether `action` is allowed on `field` of subjects of `kind`.
    #[must_use]
    pub fn can_field(&self, action: Action, kind: &str, field: &str) -> bool {
        self.check(action, kind, None, Some(field))
    }

    /// Whether `action` is allowed on a subject of `kind` with
    /// `attributes`.
    #[must_use]
    pub fn can_with(&self, action: Action, kind: &str, attributes: &Map<String, Value>) -> bool {
        self.check(action, kind, Some(attributes), None)
    }

    /// Whether `action` is allowed on a serializable subject carrying a
    /// `kind` field.
    ///
    /// # Errors
    ///
    /// Returns [`AclError`] if the subject does not serialize to an object
    /// with a string `kind`.
    pub fn can_subject<S: Serialize>(&self, action: Action, subject: &S) -> Result<bool, AclError> {
        let (kind, attributes) = subject_parts(subject)?;
        Ok(self.check(action, &kind, Some(&attributes), None))
    }

    /// [`can_subject`](Self::can_subject) restricted to `field`.
    ///
    /// # Errors
    ///
    /// Returns [`AclError`] if the subject does not serialize to an object
    /// with a string `kind`.
    pub fn can_subject_field<S: Serialize>(
        &self,
        action: Action,
        subject: &S,
        field: &str,
    ) -> Result<bool, AclError> {
        let (kind, attributes) = subject_parts(subject)?;
        Ok(self.check(action, &kind, Some(&attributes), Some(field)))
    }

    /// Fail with an access-forbidden outcome unless `action` is allowed on
    /// `kind`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` with its permission flag set.
    pub fn authorize<T>(&self, action: Action, kind: &str) -> Result<(), Outcome<T>> {
        if self.can(action, kind) {
            return Ok(());
        }
        tracing::debug!(%action, kind, "Access forbidden");
        Err(Outcome::access_forbidden(kind))
    }

    /// [`authorize`](Self::authorize) against a subject value.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` with its permission flag set, or
    /// `UnexpectedError` when the subject has no kind.
    pub fn authorize_subject<S: Serialize, T>(
        &self,
        action: Action,
        subject: &S,
    ) -> Result<(), Outcome<T>> {
        let (kind, attributes) = subject_parts(subject).map_err(|error| {
            tracing::warn!(error = %error, "Cannot check access to subject");
            Outcome::unexpected(&error)
        })?;
        match self.relevant_rule(action, &kind, Some(&attributes), None) {
            Some(rule) if !rule.inverted => Ok(()),
            rule => {
                let reason = rule.and_then(|rule| rule.reason.as_deref());
                tracing::debug!(%action, kind = %kind, reason, "Access forbidden");
                Err(Outcome::access_forbidden(kind))
            }
        }
    }

    /// Fail with a missing-permission outcome unless `action` is allowed on
    /// `kind`.
    ///
    /// # Errors
    ///
    /// Returns `MissingPermission`.
    pub fn require<T>(&self, action: Action, kind: &str) -> Result<(), Outcome<T>> {
        if self.can(action, kind) {
            Ok(())
        } else {
            Err(Outcome::missing_permission())
        }
    }
}

fn subject_parts<S: Serialize>(subject: &S) -> Result<(String, Map<String, Value>), AclError> {
    let Value::Object(attributes) = serde_json::to_value(subject)? else {
        return Err(AclError::MissingKind);
    };
    let kind = attributes
        .get("kind")
        .and_then(Value::as_str)
        .ok_or(AclError::MissingKind)?
        .to_string();
    Ok((kind, attributes))
}
