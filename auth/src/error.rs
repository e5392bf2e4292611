//! Error types for authentication and authorization operations.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type alias for authentication operations.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Why a bearer token could not be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnparsableJwtReason {
    /// The `Authorization` header is not a bearer header.
    AuthHeaderUnparsable,
    /// The token is not a JWT at all.
    NotJwt,
    /// The token looks like a JWT but failed verification.
    InvalidToken,
    /// The payload does not have the expected shape.
    InvalidStructure,
}

impl UnparsableJwtReason {
    /// Wire name of the reason.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AuthHeaderUnparsable => "auth_header_unparsable",
            Self::NotJwt => "not_jwt",
            Self::InvalidToken => "invalid_token",
            Self::InvalidStructure => "invalid_structure",
        }
    }
}

impl fmt::Display for UnparsableJwtReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a well-formed token is not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidAuthenticationReason {
    /// The token is past its expiry.
    Expired,
}

impl fmt::Display for InvalidAuthenticationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expired => f.write_str("expired"),
        }
    }
}

/// Failures of the request guard and its providers.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AuthError {
    // ═══════════════════════════════════════════════════════════
    // Authentication Errors
    // ═══════════════════════════════════════════════════════════

    /// A private route was called without credentials.
    #[error("Authentication required")]
    Unauthenticated,

    /// The bearer token could not be parsed or verified.
    #[error("Unparsable JWT: {reason}")]
    UnparsableJwt {
        /// What was wrong with the token
        reason: UnparsableJwtReason,
    },

    /// The token was read but is no longer acceptable.
    #[error("Invalid authentication: {reason}")]
    InvalidAuthentication {
        /// Why the token was refused
        reason: InvalidAuthenticationReason,
    },

    // ═══════════════════════════════════════════════════════════
    // Authorization Errors
    // ═══════════════════════════════════════════════════════════

    /// The user lacks a role the route requires.
    #[error("Forbidden")]
    Forbidden,

    // ═══════════════════════════════════════════════════════════
    // System Errors
    // ═══════════════════════════════════════════════════════════

    /// A stored password hash is not in the expected format.
    #[error("Malformed password hash")]
    MalformedHash,

    /// The token verifier could not be reached.
    #[error("Token verifier unavailable: {0}")]
    VerifierUnavailable(String),
}

impl AuthError {
    /// HTTP status code reported for this error.
    ///
    /// # Examples
    ///
    /// ```
    /// # use formulaic_auth::AuthError;
    /// assert_eq!(AuthError::Forbidden.status_code(), 403);
    /// assert_eq!(AuthError::Unauthenticated.status_code(), 401);
    /// ```
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Unauthenticated | Self::UnparsableJwt { .. } | Self::InvalidAuthentication { .. } => {
                401
            }
            Self::Forbidden => 403,
            Self::MalformedHash | Self::VerifierUnavailable(_) => 500,
        }
    }

    /// Returns `true` if the caller can fix this error with other
    /// credentials.
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        self.status_code() < 500
    }
}

/// Failures while evaluating access rules against a subject value.
#[derive(Debug, Error)]
pub enum AclError {
    /// The subject could not be converted to JSON.
    #[error("Subject could not be serialized: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The subject has no string `kind` field to select rules by.
    #[error("Subject has no kind")]
    MissingKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reasons_use_snake_case_on_the_wire() {
        let json = serde_json::to_value(UnparsableJwtReason::AuthHeaderUnparsable).ok();
        assert_eq!(json, Some(serde_json::json!("auth_header_unparsable")));
        assert_eq!(InvalidAuthenticationReason::Expired.to_string(), "expired");
    }

    #[test]
    fn system_errors_are_not_user_errors() {
        assert!(AuthError::Forbidden.is_user_error());
        assert!(!AuthError::VerifierUnavailable("down".into()).is_user_error());
    }
}
