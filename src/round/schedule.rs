//! Quarter-hour round scheduling.
//!
//! Rounds fire at HH:00, HH:15, HH:30 and HH:45 UTC. The ticker sleeps until
//! the next boundary instead of polling, and the gate remembers the last
//! boundary it fired for so a boundary can never fire twice.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Timelike, Utc};
use tracing::debug;

/// Minutes between round boundaries.
pub const ROUND_INTERVAL_MINUTES: u32 = 15;

/// Seconds after a boundary during which a round may still start.
pub const TRIGGER_WINDOW_SECS: u32 = 10;

const ROUND_INTERVAL_SECS: i64 = ROUND_INTERVAL_MINUTES as i64 * 60;

/// Whether `now` falls inside the trigger window of a boundary.
pub fn is_trigger_time(now: DateTime<Utc>) -> bool {
    now.minute() % ROUND_INTERVAL_MINUTES == 0 && now.second() < TRIGGER_WINDOW_SECS
}

/// The boundary at or before `now`.
pub fn current_boundary(now: DateTime<Utc>) -> DateTime<Utc> {
    let into_interval = now.timestamp().rem_euclid(ROUND_INTERVAL_SECS);
    now - TimeDelta::seconds(into_interval)
        - TimeDelta::nanoseconds(i64::from(now.timestamp_subsec_nanos()))
}

/// The first boundary strictly after `now`.
pub fn next_boundary(now: DateTime<Utc>) -> DateTime<Utc> {
    current_boundary(now) + TimeDelta::seconds(ROUND_INTERVAL_SECS)
}

/// Fires at most once per boundary.
#[derive(Debug, Clone, Default)]
pub struct BoundaryGate {
    last_fired: Option<DateTime<Utc>>,
}

impl BoundaryGate {
    /// Create a gate that has never fired.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the boundary if a round should start now, marking it fired.
    pub fn should_fire(&mut self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        if !is_trigger_time(now) {
            return None;
        }

        let boundary = current_boundary(now);
        if self.last_fired == Some(boundary) {
            return None;
        }

        self.last_fired = Some(boundary);
        Some(boundary)
    }

    /// Last boundary fired, if any.
    pub fn last_fired(&self) -> Option<DateTime<Utc>> {
        self.last_fired
    }
}

type Clock = Box<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Sleeps until each quarter-hour boundary.
pub struct BoundaryTicker {
    gate: BoundaryGate,
    clock: Clock,
}

impl BoundaryTicker {
    /// Ticker driven by the system clock.
    pub fn new() -> Self {
        Self::with_clock(Utc::now)
    }

    /// Ticker driven by a custom wall clock.
    pub fn with_clock<F>(clock: F) -> Self
    where
        F: Fn() -> DateTime<Utc> + Send + Sync + 'static,
    {
        Self {
            gate: BoundaryGate::new(),
            clock: Box::new(clock),
        }
    }

    /// Wait for the next boundary that has not fired yet and return it.
    ///
    /// Returns immediately if called inside an unfired trigger window.
    pub async fn tick(&mut self) -> DateTime<Utc> {
        loop {
            let now = (self.clock)();
            if let Some(boundary) = self.gate.should_fire(now) {
                return boundary;
            }

            let next = next_boundary(now);
            let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
            debug!(next = %next, wait_secs = wait.as_secs(), "Waiting for next round boundary");
            tokio::time::sleep(wait).await;
        }
    }
}

impl Default for BoundaryTicker {
    fn default() -> Self {
        Self::new()
    }
}
