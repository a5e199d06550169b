//! The game clock and the real-time timers that drive it.

use mapscript_foundation::{Epoch, GameTime};

use crate::config::SchedulerConfig;

/// What a clock poll found due.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ClockPoll {
    /// The light interval elapsed; map-update should be broadcast.
    pub light_due: bool,
    /// The clock interval elapsed.
    pub ticked: bool,
}

/// Game time plus the wall-clock bookkeeping for light and clock intervals.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GameClock {
    time: GameTime,
    epoch: Epoch,
    last_light_ms: Option<u64>,
    last_tick_ms: Option<u64>,
}

impl Default for GameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl GameClock {
    /// A clock at the start of a new game.
    #[must_use]
    pub fn new() -> Self {
        Self::at(GameTime::START)
    }

    /// A clock at a given time.
    #[must_use]
    pub fn at(time: GameTime) -> Self {
        Self {
            time,
            epoch: Epoch::default(),
            last_light_ms: None,
            last_tick_ms: None,
        }
    }

    /// Sets the calendar origin.
    #[must_use]
    pub fn with_epoch(mut self, epoch: Epoch) -> Self {
        self.epoch = epoch;
        self
    }

    /// Current game time.
    #[must_use]
    pub fn time(&self) -> GameTime {
        self.time
    }

    /// Sets the game time.
    pub fn set_time(&mut self, time: GameTime) {
        self.time = time;
    }

    /// Advances game time.
    pub fn advance(&mut self, ticks: u32) {
        self.time = self.time.plus(ticks);
    }

    /// Calendar date as `(month, day, year)`.
    #[must_use]
    pub fn date(&self) -> (u32, u32, u32) {
        self.time.date(self.epoch)
    }

    /// Forgets the real-time reference points; the next poll restarts them.
    pub fn reset_timers(&mut self) {
        self.last_light_ms = None;
        self.last_tick_ms = None;
    }

    /// Checks the real-time intervals at `now_ms`.
    ///
    /// The first poll only records the reference points. Each elapsed clock
    /// interval advances game time by one tick unless `frozen` (combat).
    /// Missed intervals are not caught up.
    pub fn poll(&mut self, now_ms: u64, config: &SchedulerConfig, frozen: bool) -> ClockPoll {
        let light_since = *self.last_light_ms.get_or_insert(now_ms);
        let tick_since = *self.last_tick_ms.get_or_insert(now_ms);

        let light_due = now_ms.saturating_sub(light_since) >= config.light_interval_ms;
        if light_due {
            self.last_light_ms = Some(now_ms);
        }

        let ticked = now_ms.saturating_sub(tick_since) >= config.clock_interval_ms;
        if ticked {
            self.last_tick_ms = Some(now_ms);
            if !frozen {
                self.advance(1);
            }
        }

        ClockPoll { light_due, ticked }
    }
}
