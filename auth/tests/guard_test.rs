//! Integration tests for the request guard.

#![allow(clippy::unwrap_used)] // Test code

use chrono::{Duration, Utc};
use tokio_test::assert_ok;
use formulaic_auth::mocks::MockTokenVerifier;
use formulaic_auth::{
    Ability, AbilityBuilder, Action, AuthError, AuthGuard, InvalidAuthenticationReason,
    RoleRequirement, RoutePolicy, RouteRules, TokenClaims, UnparsableJwtReason, UserContext,
    VerifyError,
};

// ============================================================================
// Test Fixtures
// ============================================================================

fn abilities(user: Option<&UserContext>) -> Ability {
    let mut builder = AbilityBuilder::new();
    builder.can(Action::Browse, "Article");
    if let Some(user) = user {
        builder.can(Action::Create, "Comment");
        if user.has_role("admin") {
            builder.can(Action::Manage, "all");
        }
    }
    builder.build()
}

fn guard() -> AuthGuard {
    formulaic_testing::init_test_tracing();
    let verifier = MockTokenVerifier::new()
        .with_token("reader", TokenClaims::new("u1").with_role("reader"))
        .with_token("admin", TokenClaims::new("u2").with_role("admin").with_role("editor"))
        .with_token(
            "stale",
            TokenClaims::new("u3").expiring_at(Utc::now() - Duration::minutes(5)),
        )
        .with_error("expired", VerifyError::Expired)
        .with_error("forged", VerifyError::Invalid("bad signature".into()));
    AuthGuard::new(verifier, abilities)
}

async fn authenticate(header: Option<&str>, route: &RouteRules) -> Result<formulaic_auth::AuthContext, AuthError> {
    guard().authenticate(header, route).await
}

// ============================================================================
// Route policy
// ============================================================================

#[tokio::test]
async fn public_routes_accept_anonymous_callers() {
    let context = authenticate(None, &RouteRules::public()).await.unwrap();
    assert_eq!(context.user(), None);
    assert!(context.ability().can(Action::Browse, "Article"));
    assert!(context.ability().cannot(Action::Create, "Comment"));
}

#[tokio::test]
async fn private_routes_reject_anonymous_callers() {
    let error = authenticate(None, &RouteRules::private()).await.unwrap_err();
    assert_eq!(error, AuthError::Unauthenticated);
}

#[tokio::test]
async fn routes_are_private_by_default() {
    let error = authenticate(None, &RouteRules::default()).await.unwrap_err();
    assert_eq!(error, AuthError::Unauthenticated);

    let open = guard().with_default_policy(RoutePolicy::Public);
    assert!(open.authenticate(None, &RouteRules::default()).await.is_ok());
}

#[tokio::test]
async fn tokens_are_verified_on_public_routes_too() {
    let context = authenticate(Some("Bearer reader"), &RouteRules::public()).await.unwrap();
    assert_eq!(context.user_id(), Some("u1"));
    assert!(context.ability().can(Action::Create, "Comment"));
}

// ============================================================================
// Token failures
// ============================================================================

#[tokio::test]
async fn token_failures_map_to_reasons() {
    let route = RouteRules::private();
    let cases = [
        (
            "Token reader",
            AuthError::UnparsableJwt { reason: UnparsableJwtReason::AuthHeaderUnparsable },
        ),
        (
            "Bearer nonsense",
            AuthError::UnparsableJwt { reason: UnparsableJwtReason::NotJwt },
        ),
        (
            "Bearer forged",
            AuthError::UnparsableJwt { reason: UnparsableJwtReason::InvalidToken },
        ),
        (
            "Bearer expired",
            AuthError::InvalidAuthentication { reason: InvalidAuthenticationReason::Expired },
        ),
        (
            "Bearer stale",
            AuthError::InvalidAuthentication { reason: InvalidAuthenticationReason::Expired },
        ),
    ];

    for (header, expected) in cases {
        let error = authenticate(Some(header), &route).await.unwrap_err();
        assert_eq!(error, expected, "header {header:?}");
        assert_eq!(error.status_code(), 401);
    }
}

// ============================================================================
// Roles
// ============================================================================

#[tokio::test]
async fn missing_roles_are_forbidden() {
    let route = RouteRules::private().require(RoleRequirement::none().all_of(["admin", "editor"]));

    assert!(authenticate(Some("Bearer admin"), &route).await.is_ok());
    let error = authenticate(Some("Bearer reader"), &route).await.unwrap_err();
    assert_eq!(error, AuthError::Forbidden);
    assert_eq!(error.status_code(), 403);
}

#[tokio::test]
async fn one_of_roles_is_enough() {
    let route = RouteRules::private().require(RoleRequirement::none().one_of(["reader", "admin"]));

    assert_ok!(authenticate(Some("Bearer reader"), &route).await);
    assert_ok!(authenticate(Some("Bearer admin"), &route).await);
}

#[tokio::test]
async fn abilities_are_built_for_the_user() {
    let context = authenticate(Some("Bearer admin"), &RouteRules::private()).await.unwrap();
    assert!(context.ability().can(Action::Remove, "Comment"));
    assert!(context.ability().authorize::<()>(Action::Update, "Article").is_ok());
}
