//! Bearer token verification.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Payload of a verified token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// User identifier (`sub`).
    pub subject: String,

    /// Roles granted to the user.
    #[serde(default)]
    pub roles: Vec<String>,

    /// Expiry (`exp`), if the token has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,

    /// Every other claim.
    #[serde(default, flatten)]
    pub extra: Map<String, Value>,
}

impl TokenClaims {
    /// Claims for `subject` with no roles and no expiry.
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            roles: Vec::new(),
            expires_at: None,
            extra: Map::new(),
        }
    }

    /// Grant a role.
    #[must_use]
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.push(role.into());
        self
    }

    /// Set the expiry.
    #[must_use]
    pub const fn expiring_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Add an application claim.
    #[must_use]
    pub fn with_claim(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(name.into(), value.into());
        self
    }

    /// Whether the token has expired at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }
}

/// Why a token was refused by a verifier.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VerifyError {
    /// Not a token at all.
    #[error("Token is malformed")]
    Malformed,

    /// Signature or issuer checks failed.
    #[error("Token is invalid: {0}")]
    Invalid(String),

    /// The payload lacks required claims.
    #[error("Token payload has an unexpected structure: {0}")]
    InvalidStructure(String),

    /// The token has expired.
    #[error("Token has expired")]
    Expired,

    /// The verifier could not be reached.
    #[error("Verifier unavailable: {0}")]
    Unavailable(String),
}

/// Boxed future returned by [`TokenVerifier::verify`].
pub type VerifyFuture<'a> = Pin<Box<dyn Future<Output = Result<TokenClaims, VerifyError>> + Send + 'a>>;

/// Verifies bearer tokens.
///
/// Object safe so the guard can hold any verifier behind an `Arc`.
pub trait TokenVerifier: Send + Sync {
    /// Verify `token` and return its claims.
    fn verify<'a>(&'a self, token: &'a str) -> VerifyFuture<'a>;
}
