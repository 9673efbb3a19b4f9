// SPDX-FileCopyrightText: 2025 Roman Valls, 2025
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Framing helpers for the SPI slave echo loop.
//!
//! Every transaction reuses the same fixed-length DMA buffers. The
//! receive side is repainted with a sentinel before arming, so bytes
//! the master actually clocked in are distinguishable from leftovers.

use core::fmt;

/// Bytes exchanged per transaction, full duplex.
pub const TRANSFER_LEN: usize = 3;

/// Receive-buffer fill value written before every transaction.
pub const SENTINEL: u8 = 0xCC;

/// Repaint the receive buffer ahead of arming a transaction.
pub fn arm(rx: &mut [u8]) {
    rx.fill(SENTINEL);
}

/// Received bytes of a completed transaction, formatted for the console
/// as space-separated decimal values.
pub struct Frame<'a>(pub &'a [u8]);

impl fmt::Display for Frame<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.0 {
            write!(f, " {b:2}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod echo_tests {
    use super::*;

    #[test]
    fn arming_paints_the_whole_buffer() {
        let mut rx = [0u8; TRANSFER_LEN];
        arm(&mut rx);
        assert!(rx.iter().all(|&b| b == SENTINEL));
    }

    #[test]
    fn transaction_overwrites_exactly_what_was_received() {
        let mut rx = [0u8; TRANSFER_LEN];
        arm(&mut rx);
        // A master that only clocked two bytes.
        rx[..2].copy_from_slice(&[0x01, 0x0a]);
        assert_eq!(rx[..2], [0x01, 0x0a]);
        assert_eq!(rx[2], SENTINEL);
    }

    #[test]
    fn frame_prints_space_separated_decimals() {
        assert_eq!(format!("{}", Frame(&[1, 10, 204])), "  1 10 204");
    }

    #[test]
    fn rearming_clears_a_previous_transaction() {
        let mut rx = [0u8; TRANSFER_LEN];
        arm(&mut rx);
        rx.copy_from_slice(&[9, 9, 9]);
        arm(&mut rx);
        assert!(rx.iter().all(|&b| b == SENTINEL));
    }
}
