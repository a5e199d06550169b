//! Scheduler configuration.

use mapscript_language::VmLimits;

/// Timing and limits for a [`Scheduler`](crate::Scheduler).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SchedulerConfig {
    /// Real milliseconds between map-update broadcasts from the light timer.
    pub light_interval_ms: u64,
    /// Real milliseconds per game clock tick.
    pub clock_interval_ms: u64,
    /// Game ticks between queued map-update events.
    pub map_update_period: u32,
    /// Instructions one invocation may execute before it is killed.
    pub max_instructions: u64,
    /// Whether the critter round-robin runs.
    pub critters_enabled: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl SchedulerConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            light_interval_ms: 30_000,
            clock_interval_ms: 100,
            map_update_period: 600,
            max_instructions: VmLimits::default().max_instructions,
            critters_enabled: true,
        }
    }

    /// Sets the light-update interval.
    #[must_use]
    pub fn with_light_interval_ms(mut self, ms: u64) -> Self {
        self.light_interval_ms = ms;
        self
    }

    /// Sets the clock interval.
    #[must_use]
    pub fn with_clock_interval_ms(mut self, ms: u64) -> Self {
        self.clock_interval_ms = ms.max(1);
        self
    }

    /// Sets the map-update event period.
    #[must_use]
    pub fn with_map_update_period(mut self, ticks: u32) -> Self {
        self.map_update_period = ticks;
        self
    }

    /// Sets the per-invocation instruction limit.
    #[must_use]
    pub fn with_max_instructions(mut self, limit: u64) -> Self {
        self.max_instructions = limit;
        self
    }

    /// Enables or disables the critter round-robin.
    #[must_use]
    pub fn with_critters(mut self, enabled: bool) -> Self {
        self.critters_enabled = enabled;
        self
    }

    /// Interpreter limits derived from this configuration.
    #[must_use]
    pub fn vm_limits(&self) -> VmLimits {
        VmLimits {
            max_instructions: self.max_instructions,
            ..VmLimits::default()
        }
    }
}
