//! Authentication providers.
//!
//! Traits for the collaborators the guard and services rely on, with
//! production implementations where they need nothing external:
//!
//! - [`TokenVerifier`]: bearer token verification (JWT mechanics live
//!   behind it)
//! - [`PasswordHasher`]: hash and compare, with [`Sha256PasswordHasher`]
//! - [`IdGenerator`]: random strings, with [`RandomIdGenerator`] and the
//!   [`IdService`] presets
//!
//! Mocks for tests live in [`crate::mocks`].

pub mod id;
pub mod password;
pub mod token;

pub use id::{IdDefinition, IdGenerator, IdService, RandomIdGenerator, Scale};
pub use password::{PasswordHasher, Sha256PasswordHasher};
pub use token::{TokenClaims, TokenVerifier, VerifyError, VerifyFuture};
