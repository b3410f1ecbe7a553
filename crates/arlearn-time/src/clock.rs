//! Simulated clock for the cooperative event loop

use std::time::Duration;

use arlearn_core::SimTime;

/// Clock configuration
#[derive(Clone, Debug)]
pub struct ClockConfig {
    /// Largest advance accepted from a single tick. Browser frames arrive in
    /// bursts after a tab sleeps; clamping keeps timers from firing in a pile.
    pub max_tick: Duration,
}

impl Default for ClockConfig {
    fn default() -> Self {
        ClockConfig {
            max_tick: Duration::from_millis(250),
        }
    }
}

impl ClockConfig {
    /// No clamping at all, for simulations that jump in large steps
    pub fn unclamped() -> Self {
        ClockConfig {
            max_tick: Duration::MAX,
        }
    }
}

/// Simulated clock
/// INVARIANT: time is monotonically non-decreasing
pub struct SimClock {
    /// Current simulated time
    value: SimTime,
    /// Number of ticks observed
    ticks: u64,
    config: ClockConfig,
}

impl SimClock {
    /// Create a new clock starting at zero
    pub fn new() -> Self {
        Self::with_config(ClockConfig::default())
    }

    pub fn with_config(config: ClockConfig) -> Self {
        SimClock {
            value: SimTime::ZERO,
            ticks: 0,
            config,
        }
    }

    /// Advance the clock by `dt` (clamped to `max_tick`)
    /// Returns the effective advance
    pub fn tick(&mut self, dt: Duration) -> Duration {
        let clamped = dt.min(self.config.max_tick);
        if clamped < dt {
            tracing::debug!(requested = ?dt, applied = ?clamped, "clock tick clamped");
        }
        self.value = self.value.saturating_add(clamped);
        self.ticks += 1;
        clamped
    }

    /// Get current time without advancing
    pub fn now(&self) -> SimTime {
        self.value
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new()
    }
}
