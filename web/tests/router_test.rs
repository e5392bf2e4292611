//! End-to-end tests of a small article service behind the request context
//! layer.

#![allow(clippy::unwrap_used, clippy::expect_used)] // Test code

use axum::{
    Router,
    body::{Body, to_bytes},
    extract::Path,
    http::{Request, StatusCode, header::AUTHORIZATION},
    response::Response,
    routing::get,
};
use formulaic_auth::mocks::MockTokenVerifier;
use formulaic_auth::{
    Ability, AbilityBuilder, Action, AuthGuard, RoleRequirement, RouteRules, TokenClaims,
    UserContext, VerifyError,
};
use formulaic_core::Outcome;
use formulaic_testing::init_test_tracing;
use formulaic_web::{
    AppError, AppState, CORRELATION_ID_HEADER, Environment, Exposed, RequestContext,
    RequestContextLayer, ServerConfig, WebResult,
};
use serde::Serialize;
use serde_json::{Value, json};
use tower::ServiceExt;

#[derive(Debug, Clone, Serialize)]
struct Article {
    kind: &'static str,
    id: u32,
    author: &'static str,
    published: bool,
}

fn article(id: u32) -> Outcome<Article> {
    match id {
        1 => Outcome::literal(Article {
            kind: "Article",
            id: 1,
            author: "alice",
            published: true,
        }),
        2 => Outcome::literal(Article {
            kind: "Article",
            id: 2,
            author: "alice",
            published: false,
        }),
        _ => Outcome::entity_not_found("Article", Some(json!({ "id": id }))),
    }
}

fn abilities(user: Option<&UserContext>) -> Ability {
    let mut builder = AbilityBuilder::new();
    builder.can(Action::Browse, "Article").when("published", true);
    if let Some(user) = user {
        builder
            .can([Action::Browse, Action::Update], "Article")
            .when("author", user.id.as_str());
    }
    builder.build()
}

fn guarded<T: Serialize>(context: &RequestContext, action: Action, outcome: Outcome<T>) -> Outcome<T> {
    outcome.map(|subject: T| -> Outcome<T> {
        match context.ability().authorize_subject(action, &subject) {
            Ok(()) => Outcome::literal(subject),
            Err(denied) => denied,
        }
    })
}

async fn show_article(context: RequestContext, Path(id): Path<u32>) -> Exposed<Article> {
    context.respond(guarded(&context, Action::Browse, article(id)))
}

async fn update_article(context: RequestContext, Path(id): Path<u32>) -> Exposed<Article> {
    let updated: Outcome<Article> = guarded(&context, Action::Update, article(id))
        .map(|article: Article| Outcome::created(article));
    context.respond(updated)
}

async fn whoami(context: RequestContext) -> Exposed<String> {
    let user: Outcome<String> = match context.auth.require_user() {
        Ok(user) => Outcome::literal(user.id.clone()),
        Err(missing) => missing,
    };
    context.respond(user)
}

async fn broken(_context: RequestContext) -> WebResult<Exposed<()>> {
    Err(AppError::internal("database connection reset"))
}

fn app(environment: Environment) -> Router {
    init_test_tracing();

    let verifier = MockTokenVerifier::new()
        .with_token("alice-token", TokenClaims::new("alice").with_role("writer"))
        .with_token("bob-token", TokenClaims::new("bob"))
        .with_error("stale-token", VerifyError::Expired);
    let mut config = ServerConfig::for_environment(environment);
    config.service_name = "articles".to_string();
    let state = AppState::new(config, AuthGuard::new(verifier, abilities));

    let public = Router::new()
        .route("/articles/:id", get(show_article))
        .route_layer(RequestContextLayer::new(state.clone()).with_rules(RouteRules::public()));
    let writers = Router::new()
        .route("/articles/:id/edit", get(update_article))
        .route_layer(
            RequestContextLayer::new(state.clone())
                .with_rules(RouteRules::private().require(RoleRequirement::none().one_of(["writer"]))),
        );
    let private = Router::new()
        .route("/me", get(whoami))
        .route("/broken", get(broken))
        .route_layer(RequestContextLayer::new(state));

    public.merge(writers).merge(private)
}

async fn call(app: Router, uri: &str, token: Option<&str>) -> Response {
    let mut request = Request::builder().uri(uri);
    if let Some(token) = token {
        request = request.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    app.oneshot(request.body(Body::empty()).unwrap()).await.unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn published_article_is_public() {
    let response = call(app(Environment::Production), "/articles/1", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key(CORRELATION_ID_HEADER));
    let body = json_body(response).await;
    assert_eq!(body["kind"], "Literal");
    assert_eq!(body["data"]["author"], "alice");
}

#[tokio::test]
async fn draft_is_hidden_in_production() {
    let response = call(app(Environment::Production), "/articles/2", None).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response).await;
    assert_eq!(body["kind"], "NotFound");
    assert!(body.get("permissionError").is_none());
}

#[tokio::test]
async fn draft_is_forbidden_in_development() {
    let response = call(app(Environment::Development), "/articles/2", None).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(json_body(response).await["permissionError"], true);
}

#[tokio::test]
async fn author_sees_own_draft() {
    let response = call(app(Environment::Production), "/articles/2", Some("alice-token")).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn missing_article_keeps_find_options_for_debug() {
    let production = json_body(call(app(Environment::Production), "/articles/9", None).await).await;
    assert!(production.get("findOptions").is_none());

    let development = json_body(call(app(Environment::Development), "/articles/9", None).await).await;
    assert_eq!(development["findOptions"], json!({"id": 9}));
}

#[tokio::test]
async fn private_route_requires_credentials() {
    let response = call(app(Environment::Production), "/me", None).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        json_body(response).await,
        json!({"kind": "Unauthenticated", "statusCode": 401})
    );
}

#[tokio::test]
async fn signed_in_user_is_passed_to_handler() {
    let response = call(app(Environment::Production), "/me", Some("bob-token")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["data"], "bob");
}

#[tokio::test]
async fn garbage_token_is_unparsable() {
    let response = call(app(Environment::Production), "/me", Some("garbage")).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        json_body(response).await,
        json!({"kind": "UnparsableJwt", "statusCode": 401, "reason": "not_jwt"})
    );
}

#[tokio::test]
async fn expired_token_is_invalid_authentication() {
    let response = call(app(Environment::Production), "/me", Some("stale-token")).await;

    let body = json_body(response).await;
    assert_eq!(body["kind"], "InvalidAuthentication");
    assert_eq!(body["reason"], "expired");
}

#[tokio::test]
async fn writer_role_is_required_to_edit() {
    let response = call(app(Environment::Production), "/articles/1/edit", Some("bob-token")).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(json_body(response).await["kind"], "Forbidden");

    let response = call(app(Environment::Production), "/articles/1/edit", Some("alice-token")).await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn internal_errors_follow_configured_groups() {
    let production = json_body(call(app(Environment::Production), "/broken", Some("bob-token")).await).await;
    assert_eq!(
        production,
        json!({
            "kind": "InternalException",
            "statusCode": 500,
            "service": "articles",
            "version": env!("CARGO_PKG_VERSION"),
        })
    );

    let development = json_body(call(app(Environment::Development), "/broken", Some("bob-token")).await).await;
    assert_eq!(development["error"], "database connection reset");
}
