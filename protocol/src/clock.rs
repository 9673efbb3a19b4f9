// SPDX-FileCopyrightText: 2025 Roman Valls, 2025
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Wall clock fed by serial sync messages.
//!
//! The clock stores the last synced epoch value together with the
//! monotonic second at which it was set; the current time is derived
//! from those two on demand. Callers pass the monotonic time in, which
//! keeps this crate free of any timer driver.

/// Seconds after a sync before the clock wants a fresh one.
pub const RESYNC_INTERVAL_SECS: u64 = 300;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncStatus {
    /// Never synced; there is no time to show.
    NotSet,
    /// Synced once, but the resync interval has elapsed since.
    Stale,
    Synced,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Clock {
    base_epoch: u64,
    anchor_mono: u64,
    set: bool,
}

impl Clock {
    pub const fn new() -> Self {
        Clock { base_epoch: 0, anchor_mono: 0, set: false }
    }

    /// Overwrite the clock with a synced epoch value. `mono_now` is the
    /// current monotonic uptime in seconds.
    pub fn set(&mut self, epoch: u64, mono_now: u64) {
        self.base_epoch = epoch;
        self.anchor_mono = mono_now;
        self.set = true;
    }

    /// Current epoch seconds, or `None` before the first sync.
    pub fn now(&self, mono_now: u64) -> Option<u64> {
        if !self.set {
            return None;
        }
        let elapsed = mono_now.saturating_sub(self.anchor_mono);
        Some(self.base_epoch.saturating_add(elapsed))
    }

    pub fn status(&self, mono_now: u64) -> SyncStatus {
        if !self.set {
            SyncStatus::NotSet
        } else if mono_now.saturating_sub(self.anchor_mono) >= RESYNC_INTERVAL_SECS {
            SyncStatus::Stale
        } else {
            SyncStatus::Synced
        }
    }

    /// Whether a sync request should go out on this iteration.
    pub fn wants_sync(&self, mono_now: u64) -> bool {
        self.status(mono_now) != SyncStatus::Synced
    }
}

#[cfg(test)]
mod clock_tests {
    use super::*;

    #[test]
    fn fresh_clock_has_no_time() {
        let c = Clock::new();
        assert_eq!(c.now(42), None);
        assert_eq!(c.status(42), SyncStatus::NotSet);
        assert!(c.wants_sync(42));
    }

    #[test]
    fn set_clock_advances_with_monotonic_time() {
        let mut c = Clock::new();
        c.set(1_357_041_600, 100);
        assert_eq!(c.now(100), Some(1_357_041_600));
        assert_eq!(c.now(107), Some(1_357_041_607));
        assert_eq!(c.status(107), SyncStatus::Synced);
        assert!(!c.wants_sync(107));
    }

    #[test]
    fn clock_goes_stale_after_resync_interval() {
        let mut c = Clock::new();
        c.set(1_357_041_600, 0);
        assert_eq!(c.status(RESYNC_INTERVAL_SECS - 1), SyncStatus::Synced);
        assert_eq!(c.status(RESYNC_INTERVAL_SECS), SyncStatus::Stale);
        assert!(c.wants_sync(RESYNC_INTERVAL_SECS));
        // Stale still displays a (drifting) time.
        assert!(c.now(RESYNC_INTERVAL_SECS).is_some());
    }

    #[test]
    fn resync_replaces_the_anchor() {
        let mut c = Clock::new();
        c.set(1_357_041_600, 0);
        c.set(1_388_534_400, 500);
        assert_eq!(c.now(501), Some(1_388_534_401));
        assert_eq!(c.status(501), SyncStatus::Synced);
    }

    #[test]
    fn setting_the_same_time_twice_is_idempotent() {
        let mut c1 = Clock::new();
        let mut c2 = Clock::new();
        c1.set(1_357_041_600, 10);
        c2.set(1_357_041_600, 10);
        c2.set(1_357_041_600, 10);
        assert_eq!(c1.now(15), c2.now(15));
        assert_eq!(c1.status(15), c2.status(15));
    }

    #[test]
    fn saturates_near_the_end_of_time() {
        let mut c = Clock::new();
        c.set(u64::MAX, 0);
        assert_eq!(c.now(1_000), Some(u64::MAX));
    }
}
