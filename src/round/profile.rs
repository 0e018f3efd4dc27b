//! Named round profiles.
//!
//! The daily and fifteen-minute deployments differ in lookback, gas limit,
//! tie handling, pacing and cadence. They are kept as two explicit profiles
//! rather than one merged policy.

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;
use strum::{Display, EnumString};

use super::resolver::TiePolicy;

/// Which deployment to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, EnumString, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
#[strum(ascii_case_insensitive)]
pub enum Profile {
    /// 24h lookback, one round per process, ties skipped.
    #[strum(to_string = "daily", serialize = "24h")]
    Daily,
    /// 15m lookback, fires on every quarter hour, ties submitted as NONE.
    #[strum(to_string = "fifteen-min", serialize = "15m")]
    #[value(name = "fifteen-min", alias = "15m")]
    FifteenMin,
}

/// When rounds run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Schedule {
    /// Run one round and exit.
    Once,
    /// Run a round at every 15-minute wall-clock boundary.
    QuarterHour,
}

/// Parameters for one profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoundProfile {
    /// Profile name.
    pub profile: Profile,
    /// Number of 1m candles in the window.
    pub lookback: u32,
    /// Gas limit for each resolve transaction.
    pub gas_limit: u64,
    /// Tie handling.
    pub tie_policy: TiePolicy,
    /// Pause after each successful submission.
    pub submit_pause: Duration,
    /// Round cadence.
    pub schedule: Schedule,
    /// Default contract address file.
    pub address_file: PathBuf,
    /// Default contract ABI artifact.
    pub abi_file: PathBuf,
}

impl Profile {
    /// Full parameter set for this profile.
    pub fn params(&self) -> RoundProfile {
        match self {
            Profile::Daily => RoundProfile {
                profile: *self,
                lookback: 1440,
                gas_limit: 300_000,
                tie_policy: TiePolicy::Skip,
                // RPC rate limits
                submit_pause: Duration::from_secs(2),
                schedule: Schedule::Once,
                address_file: PathBuf::from("contracts/deployed_v3_2_address.txt"),
                abi_file: PathBuf::from("contracts/BarWarsV2.json"),
            },
            Profile::FifteenMin => RoundProfile {
                profile: *self,
                lookback: 15,
                gas_limit: 200_000,
                tie_policy: TiePolicy::SubmitNone,
                submit_pause: Duration::ZERO,
                schedule: Schedule::QuarterHour,
                address_file: PathBuf::from("contracts/deployed_v4_15m_address.txt"),
                abi_file: PathBuf::from("contracts/artifacts/contracts/BarWars.sol/BarWars.json"),
            },
        }
    }
}
