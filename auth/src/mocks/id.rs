//! Deterministic identifier generator for testing.

use crate::providers::IdGenerator;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Generates identifiers from a shared counter.
///
/// The n-th call (starting at zero) yields `n` written in the alphabet's
/// base, left-padded with its first symbol to the requested length.
/// UUIDs are derived from the same counter.
#[derive(Debug, Clone, Default)]
pub struct SequentialIdGenerator {
    next: Arc<AtomicU64>,
}

impl SequentialIdGenerator {
    /// Start counting at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of identifiers generated so far.
    #[must_use]
    pub fn generated(&self) -> u64 {
        self.next.load(Ordering::SeqCst)
    }

    fn take(&self) -> u64 {
        self.next.fetch_add(1, Ordering::SeqCst)
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn generate(&self, alphabet: &str, length: usize) -> String {
        let symbols: Vec<char> = alphabet.chars().collect();
        let n = self.take();
        let Some(&zero) = symbols.first() else {
            return String::new();
        };

        let base = symbols.len() as u64;
        let mut digits = Vec::new();
        let mut rest = n;
        while rest > 0 {
            #[allow(clippy::cast_possible_truncation)] // remainder is below the alphabet size
            digits.push(symbols[(rest % base) as usize]);
            rest /= base;
        }
        while digits.len() < length {
            digits.push(zero);
        }
        digits.iter().rev().collect()
    }

    fn uuid(&self) -> String {
        uuid::Uuid::from_u128(u128::from(self.take())).to_string()
    }
}
