//! Random identifier generation.
//!
//! [`IdGenerator`] is the random-string backend; [`IdService`] picks an
//! alphabet and length per [`IdDefinition`].

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Characters without look-alikes (no `1`/`l`/`I`, `0`/`O`, ...), safe to
/// read aloud or type by hand.
pub const SAFE: &str = "6789BCDFGHJKLMNPQRTWbcdfghjkmnpqrtwz";

/// Digits and ASCII letters.
pub const ALPHANUMERIC: &str = "0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Digits only.
pub const NUMERIC: &str = "0123456789";

/// Random-string backend.
pub trait IdGenerator: Send + Sync {
    /// A string of `length` characters drawn from `alphabet`.
    fn generate(&self, alphabet: &str, length: usize) -> String;

    /// A random UUID v4.
    fn uuid(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// Uniformly random generator backed by the thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIdGenerator;

impl IdGenerator for RandomIdGenerator {
    fn generate(&self, alphabet: &str, length: usize) -> String {
        let symbols: Vec<char> = alphabet.chars().collect();
        if symbols.is_empty() {
            return String::new();
        }
        let mut rng = rand::thread_rng();
        (0..length)
            .map(|_| symbols[rng.gen_range(0..symbols.len())])
            .collect()
    }
}

/// Rough number of identifiers an entity expects to need.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scale {
    /// Hundreds.
    Hundreds,
    /// Thousands.
    Thousands,
    /// Tens of thousands.
    TensOfThousands,
    /// Hundreds of thousands.
    HundredThousands,
    /// Millions.
    Millions,
    /// Hundreds of millions.
    HundredMillions,
    /// Billions.
    Billions,
}

impl Scale {
    /// Length of a [`SAFE`] identifier at this scale.
    #[must_use]
    pub const fn safe_len(self) -> usize {
        match self {
            Self::Hundreds => 4,
            Self::Thousands => 6,
            Self::TensOfThousands => 7,
            Self::HundredThousands => 8,
            Self::Millions => 10,
            Self::HundredMillions => 12,
            Self::Billions => 13,
        }
    }

    /// Length of an [`ALPHANUMERIC`] identifier at this scale.
    #[must_use]
    pub const fn alphanumeric_len(self) -> usize {
        match self {
            Self::Hundreds => 4,
            Self::Thousands => 5,
            Self::TensOfThousands => 6,
            Self::HundredThousands => 7,
            Self::Millions => 8,
            Self::HundredMillions => 10,
            Self::Billions => 11,
        }
    }
}

/// How identifiers of one entity are generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdDefinition {
    /// UUID v4.
    Uuid,
    /// [`SAFE`] alphabet.
    Safe(Scale),
    /// [`ALPHANUMERIC`] alphabet.
    Alphanumeric(Scale),
    /// [`NUMERIC`] alphabet with an exact length.
    Numeric(usize),
}

/// Generates identifiers from definitions.
#[derive(Debug, Clone, Default)]
pub struct IdService<G = RandomIdGenerator> {
    generator: G,
}

impl<G: IdGenerator> IdService<G> {
    /// Service over `generator`.
    pub const fn new(generator: G) -> Self {
        Self { generator }
    }

    /// Identifier for `definition`.
    pub fn id(&self, definition: IdDefinition) -> String {
        match definition {
            IdDefinition::Uuid => self.generator.uuid(),
            IdDefinition::Safe(scale) => self.safe(scale.safe_len()),
            IdDefinition::Alphanumeric(scale) => self.alphanumeric(scale.alphanumeric_len()),
            IdDefinition::Numeric(length) => self.numeric(length),
        }
    }

    /// `length` characters of [`SAFE`].
    pub fn safe(&self, length: usize) -> String {
        self.generator.generate(SAFE, length)
    }

    /// `length` characters of [`ALPHANUMERIC`].
    pub fn alphanumeric(&self, length: usize) -> String {
        self.generator.generate(ALPHANUMERIC, length)
    }

    /// `length` digits.
    pub fn numeric(&self, length: usize) -> String {
        self.generator.generate(NUMERIC, length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_ids_use_the_alphabet() {
        let ids = IdService::new(RandomIdGenerator);
        let id = ids.id(IdDefinition::Safe(Scale::Millions));
        assert_eq!(id.len(), 10);
        assert!(id.chars().all(|c| SAFE.contains(c)));

        assert!(ids.numeric(6).chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn uuids_are_hyphenated() {
        let id = IdService::<RandomIdGenerator>::default().id(IdDefinition::Uuid);
        assert_eq!(id.len(), 36);
        assert_eq!(id.matches('-').count(), 4);
    }

    #[test]
    fn definitions_deserialize_from_config() {
        let definition: Result<IdDefinition, _> =
            serde_json::from_value(serde_json::json!({ "alphanumeric": "thousands" }));
        assert_eq!(definition.ok(), Some(IdDefinition::Alphanumeric(Scale::Thousands)));
    }
}
