// SPDX-FileCopyrightText: 2025 Roman Valls, 2025
//
// SPDX-License-Identifier: GPL-3.0-or-later

use esp_hal::gpio::{Level, Output, OutputConfig, interconnect::PeripheralOutput};

/// Slave-readiness line towards the SPI master: high means "a
/// transaction is armed, clock away", low means busy or idle.
pub struct Handshake<'d> {
    line: Output<'d>,
}

impl<'d> Handshake<'d> {
    pub fn new(pin: impl PeripheralOutput<'d>) -> Self {
        Handshake {
            line: Output::new(pin, Level::Low, OutputConfig::default()),
        }
    }

    /// Raise the line for the duration of the returned guard. Dropping
    /// the guard lowers it again, on the error path too.
    pub fn ready(&mut self) -> Ready<'_, 'd> {
        self.line.set_high();
        Ready { line: &mut self.line }
    }
}

pub struct Ready<'a, 'd> {
    line: &'a mut Output<'d>,
}

impl Drop for Ready<'_, '_> {
    fn drop(&mut self) {
        self.line.set_low();
    }
}
