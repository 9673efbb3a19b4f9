// SPDX-FileCopyrightText: 2025 Roman Valls, 2025
//
// SPDX-License-Identifier: GPL-3.0-or-later

use snafu::Snafu;

#[derive(Debug, Snafu)]
pub enum Error {
    /// UART bring-up failure. Aborts startup; there is no degraded
    /// mode to fall back to.
    #[snafu(display("UART configuration rejected: {source:?}"))]
    UartConfig { source: esp_hal::uart::ConfigError },

    /// A slave transaction could not be armed. The iteration is
    /// skipped and the loop tries again.
    #[snafu(display("SPI slave transfer failed: {source:?}"))]
    SpiTransfer { source: esp_hal::spi::Error },
}
