//! Mock provider implementations for testing.
//!
//! In-memory, deterministic implementations of the provider traits for use
//! in unit and integration tests.

pub mod id;
pub mod token;

pub use id::SequentialIdGenerator;
pub use token::MockTokenVerifier;
