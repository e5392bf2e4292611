//! # Formulaic Authentication & Authorization
//!
//! Request guard, explicit per-request context and ordered-rule access
//! control for services that answer with outcomes.
//!
//! ## Features
//!
//! - **Guard**: bearer token parsing and verification, public and private
//!   routes, role requirements
//! - **Context**: an [`AuthContext`] per request, passed to handlers as an
//!   argument
//! - **Access control**: [`Ability`] checks whose denials are outcomes
//!   (`AccessForbidden`, `MissingPermission`)
//! - **Providers**: token verification, password hashing and identifier
//!   generation behind traits, with mocks for tests
//!
//! ## Example
//!
//! ```rust,ignore
//! use formulaic_auth::*;
//!
//! let guard = AuthGuard::new(verifier, |user: Option<&UserContext>| {
//!     let mut builder = AbilityBuilder::new();
//!     builder.can(Action::Browse, "Article");
//!     if user.is_some_and(|u| u.has_role("editor")) {
//!         builder.can(Action::Update, "Article");
//!     }
//!     builder.build()
//! });
//!
//! let context = guard.authenticate(Some("Bearer ..."), &RouteRules::public()).await?;
//! context.ability().authorize::<Article>(Action::Update, "Article")?;
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

// Public modules
pub mod acl;
pub mod context;
pub mod error;
pub mod guard;
pub mod providers;

// Mock implementations
#[cfg(any(test, feature = "test-utils"))]
pub mod mocks;

// Re-export main types for convenience
pub use acl::{Ability, AbilityBuilder, Action, Rule};
pub use context::{AuthContext, Principal, UserContext};
pub use error::{AclError, AuthError, InvalidAuthenticationReason, Result, UnparsableJwtReason};
pub use guard::{AbilityFactory, AuthGuard, RoleRequirement, RoutePolicy, RouteRules};
pub use providers::{TokenClaims, TokenVerifier, VerifyError};
