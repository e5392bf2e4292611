//! Mock token verifier for testing.

use crate::providers::{TokenClaims, TokenVerifier, VerifyError, VerifyFuture};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Mock token verifier.
///
/// Answers from a table of known tokens; unknown tokens are malformed.
/// Clones share the table.
#[derive(Debug, Clone, Default)]
pub struct MockTokenVerifier {
    tokens: Arc<Mutex<HashMap<String, Result<TokenClaims, VerifyError>>>>,
}

impl MockTokenVerifier {
    /// Create a verifier that knows no tokens.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `token` with `claims`.
    #[must_use]
    pub fn with_token(self, token: impl Into<String>, claims: TokenClaims) -> Self {
        self.answer(token, Ok(claims));
        self
    }

    /// Refuse `token` with `error`.
    #[must_use]
    pub fn with_error(self, token: impl Into<String>, error: VerifyError) -> Self {
        self.answer(token, Err(error));
        self
    }

    /// Set the answer for `token`.
    pub fn answer(&self, token: impl Into<String>, answer: Result<TokenClaims, VerifyError>) {
        self.tokens
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(token.into(), answer);
    }
}

impl TokenVerifier for MockTokenVerifier {
    fn verify<'a>(&'a self, token: &'a str) -> VerifyFuture<'a> {
        let answer = self
            .tokens
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(token)
            .cloned()
            .unwrap_or(Err(VerifyError::Malformed));
        Box::pin(async move { answer })
    }
}
