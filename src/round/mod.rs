//! Round resolution: decide outcomes and submit them, one symbol at a time.
//!
//! This module handles:
//! - Winner resolution and tie policies
//! - Named round profiles
//! - The round driver and its nonce management
//! - Quarter-hour scheduling

pub mod driver;
pub mod profile;
pub mod resolver;
pub mod schedule;

pub use driver::{resolve_round, RoundReport, SymbolResolution, SymbolStatus};
pub use profile::{Profile, RoundProfile, Schedule};
pub use resolver::{decide, Decision, Outcome, TiePolicy};
pub use schedule::{is_trigger_time, BoundaryGate, BoundaryTicker};
