// SPDX-FileCopyrightText: 2025 Roman Valls, 2025
//
// SPDX-License-Identifier: GPL-3.0-or-later

use esp_hal::gpio::{Level, Output, OutputConfig, interconnect::PeripheralOutput};
use protocol::clock::SyncStatus;

/// Sync indicator LED: lit while the clock is freshly synced, dark when
/// it has never been set or has gone stale.
pub struct StatusLed<'d> {
    pin: Output<'d>,
}

impl<'d> StatusLed<'d> {
    pub fn new(pin: impl PeripheralOutput<'d>) -> Self {
        StatusLed {
            pin: Output::new(pin, Level::Low, OutputConfig::default()),
        }
    }

    pub fn show(&mut self, status: SyncStatus) {
        let level = match status {
            SyncStatus::Synced => Level::High,
            SyncStatus::NotSet | SyncStatus::Stale => Level::Low,
        };
        self.pin.set_level(level);
    }
}
