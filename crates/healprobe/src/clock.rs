//! Virtual Clock for Deterministic Resolution
//!
//! The resolver schedules retries and settle delays against this clock and the
//! upload store stamps records with it. Tests install a fixed time and advance
//! it explicitly, so no test ever sleeps.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::result::{HealError, HealResult};

/// Where the clock reads time from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClockState {
    /// Installed, frozen until advanced
    Virtual,
    /// Not installed, reads system time
    System,
}

/// Options for clock installation
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ClockOptions {
    /// Initial time (milliseconds since Unix epoch)
    pub time_ms: u64,
}

impl ClockOptions {
    /// Start at the current system time
    #[must_use]
    pub fn now() -> Self {
        Self {
            time_ms: system_now_ms(),
        }
    }

    /// Start at a fixed time
    #[must_use]
    pub const fn fixed(time_ms: u64) -> Self {
        Self { time_ms }
    }

    /// Start at an RFC 3339 timestamp such as `2026-03-01T09:30:00Z`
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the timestamp does not parse or
    /// precedes the Unix epoch
    pub fn from_rfc3339(timestamp: &str) -> HealResult<Self> {
        let parsed = chrono::DateTime::parse_from_rfc3339(timestamp.trim())
            .map_err(|e| HealError::config(format!("invalid timestamp '{timestamp}': {e}")))?;
        let time_ms = u64::try_from(parsed.timestamp_millis())
            .map_err(|_| HealError::config(format!("timestamp '{timestamp}' precedes 1970")))?;
        Ok(Self { time_ms })
    }
}

impl Default for ClockOptions {
    fn default() -> Self {
        Self::now()
    }
}

/// Virtual clock shared by the resolver and the store.
///
/// Uninstalled, it reports system time. Installed, time only moves when
/// [`FakeClock::fast_forward`] or [`FakeClock::advance_to`] is called.
#[derive(Debug, Default)]
pub struct FakeClock {
    current_ms: AtomicU64,
    installed: AtomicBool,
}

impl FakeClock {
    /// Create an uninstalled clock
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a clock installed at a fixed time
    #[must_use]
    pub fn fixed(time_ms: u64) -> Self {
        let clock = Self::new();
        clock.current_ms.store(time_ms, Ordering::SeqCst);
        clock.installed.store(true, Ordering::SeqCst);
        clock
    }

    /// Install virtual time
    ///
    /// # Errors
    ///
    /// Returns error if the clock is already installed
    pub fn install(&self, options: ClockOptions) -> HealResult<()> {
        if self.installed.swap(true, Ordering::SeqCst) {
            return Err(HealError::invalid_operation("clock already installed"));
        }
        self.current_ms.store(options.time_ms, Ordering::SeqCst);
        Ok(())
    }

    /// Return to system time
    pub fn uninstall(&self) {
        self.installed.store(false, Ordering::SeqCst);
    }

    /// Check if virtual time is installed
    #[must_use]
    pub fn is_installed(&self) -> bool {
        self.installed.load(Ordering::SeqCst)
    }

    /// Current time in milliseconds since the Unix epoch
    #[must_use]
    pub fn now_ms(&self) -> u64 {
        if self.is_installed() {
            self.current_ms.load(Ordering::SeqCst)
        } else {
            system_now_ms()
        }
    }

    /// Set virtual time
    pub fn set_fixed_time(&self, time_ms: u64) {
        self.current_ms.store(time_ms, Ordering::SeqCst);
        self.installed.store(true, Ordering::SeqCst);
    }

    /// Advance virtual time by a duration
    pub fn fast_forward(&self, duration: Duration) {
        let step = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        self.current_ms.fetch_add(step, Ordering::SeqCst);
    }

    /// Advance virtual time to `time_ms`; never moves backwards
    pub fn advance_to(&self, time_ms: u64) {
        self.current_ms.fetch_max(time_ms, Ordering::SeqCst);
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> ClockState {
        if self.is_installed() {
            ClockState::Virtual
        } else {
            ClockState::System
        }
    }
}

/// Thread-safe clock handle
pub type Clock = Arc<FakeClock>;

/// Create a shared clock installed at `time_ms`
#[must_use]
pub fn fixed_clock(time_ms: u64) -> Clock {
    Arc::new(FakeClock::fixed(time_ms))
}

/// Create a shared clock that follows system time
#[must_use]
pub fn system_clock() -> Clock {
    Arc::new(FakeClock::new())
}

fn system_now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
