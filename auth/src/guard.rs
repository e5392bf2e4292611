//! Request guard: bearer parsing, verification, route policy and roles.
//!
//! [`AuthGuard::authenticate`] turns the `Authorization` header of one
//! request into an [`AuthContext`]:
//!
//! 1. no header: anonymous, unless the route is private
//! 2. a header that is not `Bearer <token>`: unparsable
//! 3. the token is verified; expiry is reported as invalid authentication
//!    and every other refusal as unparsable
//! 4. role requirements of the route are checked
//! 5. the ability is built for the user

use crate::acl::Ability;
use crate::context::{AuthContext, UserContext};
use crate::error::{AuthError, InvalidAuthenticationReason, Result, UnparsableJwtReason};
use crate::providers::{TokenVerifier, VerifyError};
use chrono::Utc;
use std::fmt;
use std::sync::Arc;

/// Whether a route accepts anonymous callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoutePolicy {
    /// Anonymous callers are allowed.
    Public,
    /// Credentials are required.
    #[default]
    Private,
}

/// Roles a route requires.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleRequirement {
    all_of: Vec<String>,
    one_of: Vec<String>,
}

impl RoleRequirement {
    /// No requirement.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            all_of: Vec::new(),
            one_of: Vec::new(),
        }
    }

    /// Require every one of `roles`.
    #[must_use]
    pub fn all_of<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.all_of = roles.into_iter().map(Into::into).collect();
        self
    }

    /// Require at least one of `roles`.
    #[must_use]
    pub fn one_of<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.one_of = roles.into_iter().map(Into::into).collect();
        self
    }

    /// Whether `roles` satisfy the requirement. Empty lists are ignored.
    #[must_use]
    pub fn is_satisfied_by(&self, roles: &[String]) -> bool {
        let all = self.all_of.iter().all(|required| roles.contains(required));
        let one = self.one_of.is_empty() || self.one_of.iter().any(|wanted| roles.contains(wanted));
        all && one
    }
}

/// Guard settings of one route.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteRules {
    /// Overrides the guard's default policy.
    pub policy: Option<RoutePolicy>,
    /// Roles the caller must have.
    pub roles: RoleRequirement,
}

impl RouteRules {
    /// Rules of a route open to anonymous callers.
    #[must_use]
    pub const fn public() -> Self {
        Self {
            policy: Some(RoutePolicy::Public),
            roles: RoleRequirement::none(),
        }
    }

    /// Rules of a route requiring credentials.
    #[must_use]
    pub const fn private() -> Self {
        Self {
            policy: Some(RoutePolicy::Private),
            roles: RoleRequirement::none(),
        }
    }

    /// Require roles.
    #[must_use]
    pub fn require(mut self, roles: RoleRequirement) -> Self {
        self.roles = roles;
        self
    }
}

/// Builds the ability of a caller.
pub trait AbilityFactory: Send + Sync {
    /// Ability of `user`, or of an anonymous caller.
    fn ability_for(&self, user: Option<&UserContext>) -> Ability;
}

impl<F> AbilityFactory for F
where
    F: Fn(Option<&UserContext>) -> Ability + Send + Sync,
{
    fn ability_for(&self, user: Option<&UserContext>) -> Ability {
        self(user)
    }
}

/// Authenticates requests.
#[derive(Clone)]
pub struct AuthGuard {
    verifier: Arc<dyn TokenVerifier>,
    abilities: Arc<dyn AbilityFactory>,
    default_policy: RoutePolicy,
}

impl fmt::Debug for AuthGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthGuard")
            .field("default_policy", &self.default_policy)
            .finish_non_exhaustive()
    }
}

impl AuthGuard {
    /// Guard verifying with `verifier` and building abilities with
    /// `abilities`. Routes are private unless their rules say otherwise.
    pub fn new(
        verifier: impl TokenVerifier + 'static,
        abilities: impl AbilityFactory + 'static,
    ) -> Self {
        Self {
            verifier: Arc::new(verifier),
            abilities: Arc::new(abilities),
            default_policy: RoutePolicy::Private,
        }
    }

    /// Policy for routes that do not set one.
    #[must_use]
    pub const fn with_default_policy(mut self, policy: RoutePolicy) -> Self {
        self.default_policy = policy;
        self
    }

    /// Extract the token from an `Authorization` header value.
    ///
    /// Returns `Ok(None)` when no credentials were presented.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::UnparsableJwt`] when the header is not a bearer
    /// header or carries no token.
    pub fn bearer_token(authorization: Option<&str>) -> Result<Option<&str>> {
        let Some(header) = authorization.filter(|header| !header.is_empty()) else {
            return Ok(None);
        };
        let (scheme, token) = header.split_once(' ').ok_or(AuthError::UnparsableJwt {
            reason: UnparsableJwtReason::AuthHeaderUnparsable,
        })?;
        if !scheme.eq_ignore_ascii_case("bearer") {
            return Err(AuthError::UnparsableJwt {
                reason: UnparsableJwtReason::AuthHeaderUnparsable,
            });
        }
        match token.trim() {
            "" => Err(AuthError::UnparsableJwt {
                reason: UnparsableJwtReason::NotJwt,
            }),
            token => Ok(Some(token)),
        }
    }

    /// Authenticate one request.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] when the request may not proceed.
    pub async fn authenticate(
        &self,
        authorization: Option<&str>,
        route: &RouteRules,
    ) -> Result<AuthContext> {
        let policy = route.policy.unwrap_or(self.default_policy);

        let Some(token) = Self::bearer_token(authorization)? else {
            if policy == RoutePolicy::Private {
                tracing::debug!("Rejecting anonymous call to private route");
                return Err(AuthError::Unauthenticated);
            }
            return Ok(AuthContext::anonymous(self.abilities.ability_for(None)));
        };

        let claims = self.verifier.verify(token).await.map_err(|error| {
            tracing::debug!(error = %error, "Token verification failed");
            match error {
                VerifyError::Expired => AuthError::InvalidAuthentication {
                    reason: InvalidAuthenticationReason::Expired,
                },
                VerifyError::Malformed => AuthError::UnparsableJwt {
                    reason: UnparsableJwtReason::NotJwt,
                },
                VerifyError::Invalid(_) => AuthError::UnparsableJwt {
                    reason: UnparsableJwtReason::InvalidToken,
                },
                VerifyError::InvalidStructure(_) => AuthError::UnparsableJwt {
                    reason: UnparsableJwtReason::InvalidStructure,
                },
                VerifyError::Unavailable(message) => AuthError::VerifierUnavailable(message),
            }
        })?;

        if claims.is_expired_at(Utc::now()) {
            return Err(AuthError::InvalidAuthentication {
                reason: InvalidAuthenticationReason::Expired,
            });
        }

        if !route.roles.is_satisfied_by(&claims.roles) {
            tracing::debug!(user = %claims.subject, roles = ?claims.roles, "Missing required role");
            return Err(AuthError::Forbidden);
        }

        let user = UserContext::from(claims);
        let ability = self.abilities.ability_for(Some(&user));
        tracing::trace!(user = %user.id, "Request authenticated");
        Ok(AuthContext::authenticated(user, ability))
    }
}
