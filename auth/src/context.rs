//! Per-request authentication context.
//!
//! The guard produces one [`AuthContext`] per inbound call. Handlers
//! receive it as an argument and pass it on explicitly; nothing is stored
//! in ambient state.

use crate::acl::Ability;
use crate::providers::TokenClaims;
use formulaic_core::Outcome;
use serde_json::{Map, Value};

/// The authenticated user behind a request.
#[derive(Debug, Clone, PartialEq)]
pub struct UserContext {
    /// User identifier.
    pub id: String,
    /// Granted roles.
    pub roles: Vec<String>,
    /// Remaining token claims.
    pub claims: Map<String, Value>,
}

impl UserContext {
    /// Whether the user has `role`.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

impl From<TokenClaims> for UserContext {
    fn from(claims: TokenClaims) -> Self {
        Self {
            id: claims.subject,
            roles: claims.roles,
            claims: claims.extra,
        }
    }
}

/// Who is calling.
#[derive(Debug, Clone, PartialEq)]
pub enum Principal {
    /// No credentials were presented.
    Anonymous,
    /// A verified user.
    User(UserContext),
}

/// Current user and ability for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthContext {
    principal: Principal,
    ability: Ability,
}

impl AuthContext {
    /// Context for an anonymous caller.
    #[must_use]
    pub const fn anonymous(ability: Ability) -> Self {
        Self {
            principal: Principal::Anonymous,
            ability,
        }
    }

    /// Context for a verified user.
    #[must_use]
    pub const fn authenticated(user: UserContext, ability: Ability) -> Self {
        Self {
            principal: Principal::User(user),
            ability,
        }
    }

    /// Who is calling.
    #[must_use]
    pub const fn principal(&self) -> &Principal {
        &self.principal
    }

    /// The user, if one is signed in.
    #[must_use]
    pub const fn user(&self) -> Option<&UserContext> {
        match &self.principal {
            Principal::User(user) => Some(user),
            Principal::Anonymous => None,
        }
    }

    /// The user's identifier, if one is signed in.
    #[must_use]
    pub fn user_id(&self) -> Option<&str> {
        self.user().map(|user| user.id.as_str())
    }

    /// What the caller may do.
    #[must_use]
    pub const fn ability(&self) -> &Ability {
        &self.ability
    }

    /// The user, or a missing-permission outcome for anonymous callers.
    ///
    /// # Errors
    ///
    /// Returns `MissingPermission` when nobody is signed in.
    pub fn require_user<T>(&self) -> Result<&UserContext, Outcome<T>> {
        self.user().ok_or_else(Outcome::missing_permission)
    }
}

impl Default for AuthContext {
    fn default() -> Self {
        Self::anonymous(Ability::default())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;

    #[test]
    fn anonymous_callers_are_missing_permission() {
        let context = AuthContext::default();
        assert_eq!(context.user_id(), None);
        let missing = context.require_user::<()>().unwrap_err();
        assert!(missing.is_kind("MissingPermission"));
    }

    #[test]
    fn users_come_from_claims() {
        let claims = TokenClaims::new("u1").with_role("editor").with_claim("tenant", "acme");
        let context = AuthContext::authenticated(claims.into(), Ability::default());

        let user = context.require_user::<()>().unwrap();
        assert_eq!(user.id, "u1");
        assert!(user.has_role("editor"));
        assert_eq!(user.claims["tenant"], "acme");
    }
}
