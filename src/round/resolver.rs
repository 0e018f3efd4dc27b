//! Winner resolution from candle counts.

use serde::Serialize;
use strum::{Display, EnumString};

use crate::market::RoundStats;

/// Outcome submitted to the contract, encoded as `uint8`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString, Default,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum Outcome {
    /// Tie; the house wins.
    #[default]
    None,
    /// More green candles.
    Bull,
    /// More red candles.
    Bear,
}

impl Outcome {
    /// Contract encoding: 0 = NONE, 1 = BULL, 2 = BEAR.
    pub fn code(&self) -> u8 {
        match self {
            Outcome::None => 0,
            Outcome::Bull => 1,
            Outcome::Bear => 2,
        }
    }
}

/// Majority vote over green vs red candles.
pub fn decide(stats: RoundStats) -> Outcome {
    use std::cmp::Ordering;

    match stats.green.cmp(&stats.red) {
        Ordering::Greater => Outcome::Bull,
        Ordering::Less => Outcome::Bear,
        Ordering::Equal => Outcome::None,
    }
}

/// What to do with a tie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum TiePolicy {
    /// Send nothing for a tied symbol.
    Skip,
    /// Submit `Outcome::None` for a tied symbol.
    SubmitNone,
}

/// Per-symbol action after applying the tie policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Send a resolve transaction with this outcome.
    Submit(Outcome),
    /// Send nothing.
    Skip,
}

impl TiePolicy {
    /// Turn an outcome into an action.
    pub fn apply(&self, outcome: Outcome) -> Decision {
        match (outcome, self) {
            (Outcome::None, TiePolicy::Skip) => Decision::Skip,
            (outcome, _) => Decision::Submit(outcome),
        }
    }
}
