//! Strongly-typed identifier value objects.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

use super::ValidationError;

/// Number of hex characters kept from the identity digest.
const CYCLE_ID_LEN: usize = 16;

/// Stable identifier for a cycle.
///
/// Derived from the cycle's name, type, collection and origin, so restarting
/// the same cycle definition yields the same id while renaming it does not.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CycleId(String);

impl CycleId {
    /// Derives the id from the identifying parts of a cycle definition.
    pub fn derive(name: &str, cycle_type: &str, collection: &str, origin: &str) -> Self {
        let mut hasher = Sha256::new();
        for part in [name, cycle_type, collection, origin] {
            hasher.update(part.as_bytes());
            hasher.update([0u8]);
        }
        let digest = hex::encode(hasher.finalize());
        Self(digest[..CYCLE_ID_LEN].to_string())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CycleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CycleId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != CYCLE_ID_LEN || !s.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ValidationError::invalid_format(
                "cycle_id",
                format!("expected {} hex characters", CYCLE_ID_LEN),
            ));
        }
        Ok(Self(s.to_ascii_lowercase()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_is_deterministic() {
        let a = CycleId::derive("archive", "ThrottledWholeCollection", "methode", "methode-web-pub");
        let b = CycleId::derive("archive", "ThrottledWholeCollection", "methode", "methode-web-pub");
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), CYCLE_ID_LEN);
    }

    #[test]
    fn renaming_changes_identity() {
        let a = CycleId::derive("archive", "ThrottledWholeCollection", "methode", "origin");
        let b = CycleId::derive("archive-2", "ThrottledWholeCollection", "methode", "origin");
        assert_ne!(a, b);
    }

    #[test]
    fn part_boundaries_are_significant() {
        let a = CycleId::derive("ab", "c", "d", "e");
        let b = CycleId::derive("a", "bc", "d", "e");
        assert_ne!(a, b);
    }

    #[test]
    fn parses_its_own_display_form() {
        let id = CycleId::derive("n", "FixedWindow", "c", "o");
        let parsed: CycleId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn rejects_malformed_ids() {
        assert!("not-an-id".parse::<CycleId>().is_err());
        assert!("zzzzzzzzzzzzzzzz".parse::<CycleId>().is_err());
    }
}
