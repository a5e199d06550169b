//! In-game time.
//!
//! Game time counts ticks of one tenth of a second since the campaign epoch.

use std::fmt;

const DAYS_PER_MONTH: [u32; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

/// Game time in ticks.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GameTime(pub u32);

impl GameTime {
    /// Ticks per real-time second of game time.
    pub const TICKS_PER_SECOND: u32 = 10;
    /// Ticks per in-game minute.
    pub const TICKS_PER_MINUTE: u32 = 600;
    /// Ticks per in-game hour.
    pub const TICKS_PER_HOUR: u32 = 60 * Self::TICKS_PER_MINUTE;
    /// Ticks per in-game day.
    pub const TICKS_PER_DAY: u32 = 864_000;
    /// Ticks per in-game year.
    pub const TICKS_PER_YEAR: u32 = 365 * Self::TICKS_PER_DAY;
    /// Time at which a new game starts (8:24 on the first day).
    pub const START: GameTime = GameTime(302_400);

    /// Returns the raw tick count.
    #[must_use]
    pub const fn ticks(self) -> u32 {
        self.0
    }

    /// Adds ticks, wrapping on overflow.
    #[must_use]
    pub const fn plus(self, ticks: u32) -> Self {
        Self(self.0.wrapping_add(ticks))
    }

    /// Hour and minute of the current day.
    #[must_use]
    pub const fn hour_minute(self) -> (u32, u32) {
        let minutes = self.0 / Self::TICKS_PER_MINUTE;
        ((minutes / 60) % 24, minutes % 60)
    }

    /// Military time (`hhmm`).
    #[must_use]
    pub const fn military(self) -> u32 {
        let (h, m) = self.hour_minute();
        h * 100 + m
    }

    /// Calendar date `(month, day, year)`, all one-based, counted from `epoch`.
    #[must_use]
    pub fn date(self, epoch: Epoch) -> (u32, u32, u32) {
        let elapsed_days = self.0 / Self::TICKS_PER_DAY + epoch.day;
        let mut year = elapsed_days / 365 + epoch.year;
        let mut day = elapsed_days % 365;
        let mut month = epoch.month as usize % 12;
        while day >= DAYS_PER_MONTH[month] {
            day -= DAYS_PER_MONTH[month];
            month += 1;
            if month == 12 {
                year += 1;
                month = 0;
            }
        }
        #[allow(clippy::cast_possible_truncation)]
        (month as u32 + 1, day + 1, year)
    }
}

impl fmt::Display for GameTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (h, m) = self.hour_minute();
        write!(f, "{h}:{m:02}")
    }
}

/// Calendar origin of game time. Month and day are zero-based.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Epoch {
    /// First year.
    pub year: u32,
    /// Zero-based month of the first day.
    pub month: u32,
    /// Zero-based day of the month of the first day.
    pub day: u32,
}

impl Default for Epoch {
    fn default() -> Self {
        Self {
            year: 2241,
            month: 6,
            day: 24,
        }
    }
}
