#![forbid(unsafe_code)]

//! Deterministic animation clock.
//!
//! The clock does not read wall time. A host advances it with
//! [`AnimationClock::advance`] and gets back how many ticks fell due: the
//! web runner with `requestAnimationFrame` deltas, scripts and tests with
//! literal durations. The interactive CLI instead runs a ticker thread per
//! schedule and checks each tick's epoch with [`AnimationClock::accepts`].
//!
//! # Invariants
//!
//! 1. At most one tick schedule is live: `start` while running is a no-op.
//! 2. `stop` is idempotent.
//! 3. Every `start`, `stop` and `reconfigure` of a running clock bumps the
//!    [`epoch`](AnimationClock::epoch). Ticks carrying an older epoch
//!    belong to a schedule that no longer exists.
//! 4. A reconfigure restarts the schedule: partial progress toward the next
//!    tick is discarded.

use serde::{Deserialize, Serialize};
use web_time::Duration;

/// Speed control value, `1..=10`.
///
/// The tick interval is `2000 ms / speed`: speed 4 ticks every 500 ms and
/// speed 10 every 200 ms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Speed(u8);

impl Speed {
    pub const MIN: u32 = 1;
    pub const MAX: u32 = 10;
    /// 1000 ms per step.
    pub const DEFAULT: Self = Self(2);

    #[must_use]
    pub fn new(value: u32) -> Option<Self> {
        (Self::MIN..=Self::MAX)
            .contains(&value)
            .then(|| Self(value as u8))
    }

    #[must_use]
    pub const fn get(self) -> u32 {
        self.0 as u32
    }

    /// Time between ticks.
    #[must_use]
    pub const fn interval(self) -> Duration {
        Duration::from_millis(2000 / self.0 as u64)
    }
}

impl Default for Speed {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<u32> for Speed {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| {
            format!(
                "speed must be between {} and {}, got {value}",
                Self::MIN,
                Self::MAX
            )
        })
    }
}

impl From<Speed> for u32 {
    fn from(speed: Speed) -> Self {
        speed.get()
    }
}

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Host-driven periodic tick source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimationClock {
    interval: Duration,
    running: bool,
    accumulated: Duration,
    epoch: u64,
}

impl AnimationClock {
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            running: false,
            accumulated: Duration::ZERO,
            epoch: 0,
        }
    }

    /// Start ticking. Returns `false` (and changes nothing) if already
    /// running.
    pub fn start(&mut self) -> bool {
        if self.running {
            return false;
        }
        self.running = true;
        self.accumulated = Duration::ZERO;
        self.epoch = self.epoch.wrapping_add(1);
        true
    }

    /// Stop ticking. Returns whether the clock was running.
    pub fn stop(&mut self) -> bool {
        if !self.running {
            return false;
        }
        self.running = false;
        self.accumulated = Duration::ZERO;
        self.epoch = self.epoch.wrapping_add(1);
        true
    }

    /// Change the interval; a running clock restarts on the new schedule.
    pub fn reconfigure(&mut self, interval: Duration) {
        self.interval = interval;
        if self.stop() {
            self.start();
        }
    }

    /// Let `dt` pass; returns the number of ticks that fell due.
    ///
    /// Saturates at `u32::MAX` ticks for absurdly large `dt`.
    pub fn advance(&mut self, dt: Duration) -> u32 {
        if !self.running || self.interval.is_zero() {
            return 0;
        }
        let accumulated = self.accumulated.saturating_add(dt).as_nanos();
        let interval = self.interval.as_nanos();
        let remainder = accumulated % interval;
        // remainder < interval, so the seconds fit back into a Duration.
        self.accumulated = Duration::new(
            (remainder / NANOS_PER_SEC) as u64,
            (remainder % NANOS_PER_SEC) as u32,
        );
        u32::try_from(accumulated / interval).unwrap_or(u32::MAX)
    }

    #[inline]
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }

    #[inline]
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Schedule identity; see the module invariants.
    #[inline]
    #[must_use]
    pub const fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Whether a tick stamped with `epoch` belongs to the live schedule.
    #[inline]
    #[must_use]
    pub const fn accepts(&self, epoch: u64) -> bool {
        self.running && self.epoch == epoch
    }
}

impl Default for AnimationClock {
    fn default() -> Self {
        Self::new(Speed::DEFAULT.interval())
    }
}
