//! Match, MatchKey, and FixtureAlgorithm.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Participant number (1-based).
pub type Participant = u32;

/// Stable identifier for an unordered pair: `"{min}-{max}"`.
///
/// This is the join key against persisted completion state, so it must never depend on
/// generation order or on which algorithm produced the match.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchKey(String);

impl MatchKey {
    /// Key for the pair {a, b}, regardless of argument order.
    pub fn from_pair(a: Participant, b: Participant) -> Self {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        Self(format!("{lo}-{hi}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for MatchKey {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl From<&str> for MatchKey {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

impl fmt::Display for MatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A required fixture between two distinct participants.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub key: MatchKey,
    /// Lower participant number.
    pub first: Participant,
    /// Higher participant number.
    pub second: Participant,
    /// 1-based round (circle method only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub round: Option<u32>,
}

impl Match {
    pub fn new(a: Participant, b: Participant, round: Option<u32>) -> Self {
        let (first, second) = if a <= b { (a, b) } else { (b, a) };
        Self {
            key: MatchKey::from_pair(first, second),
            first,
            second,
            round,
        }
    }
}

/// Which generator builds the fixture list. Chosen once per deployment.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixtureAlgorithm {
    /// All unordered pairs i < j in lexicographic order, no rounds.
    Combinatorial,
    /// Rotating schedule around a fixed anchor, grouped into rounds.
    #[default]
    CircleMethod,
}

impl FromStr for FixtureAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "combinatorial" | "pairs" => Ok(FixtureAlgorithm::Combinatorial),
            "circle" | "circle_method" | "round_robin" => Ok(FixtureAlgorithm::CircleMethod),
            other => Err(format!("unknown fixture algorithm: {other}")),
        }
    }
}
