// SPDX-FileCopyrightText: 2025 Roman Valls, 2025
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Serial time-sync message scanner.
//!
//! The host answers a one-byte request with a tag character followed by
//! the current time as ASCII decimal seconds since the Unix epoch,
//! e.g. `T1357041600`. Anything before the tag is noise and gets
//! discarded; a value below [`FLOOR_EPOCH`] cannot be a real wall-clock
//! time and is dropped without comment.

use log::{debug, trace};

/// Tag byte announcing a time message on the wire.
pub const TAG: u8 = b'T';

/// Request byte the client emits to ask the host for the time (ASCII bell).
pub const REQUEST: u8 = 0x07;

/// Midday, Jan 1 2013. Values below this are garbage, not timestamps.
pub const FLOOR_EPOCH: u64 = 1_357_041_600;

enum Scan {
    /// Discarding bytes until the tag shows up.
    Seeking,
    /// Tag seen, accumulating decimal digits.
    Number { value: u64, digits: u8 },
}

/// Incremental scanner over the raw serial byte stream.
///
/// Bytes arrive in whatever chunks the UART delivers, so a number may
/// span several [`feed`](SyncParser::feed) calls. A non-digit byte ends
/// the number; [`flush`](SyncParser::flush) ends one that is still
/// pending when the poll loop has drained everything it has.
pub struct SyncParser {
    scan: Scan,
}

impl SyncParser {
    pub const fn new() -> Self {
        SyncParser { scan: Scan::Seeking }
    }

    /// Scan a chunk of incoming bytes. Returns the last acceptable
    /// timestamp completed inside this chunk, if any.
    pub fn feed(&mut self, bytes: &[u8]) -> Option<u64> {
        let mut accepted = None;
        for &b in bytes {
            match self.scan {
                Scan::Seeking => {
                    if b == TAG {
                        self.scan = Scan::Number { value: 0, digits: 0 };
                    }
                }
                Scan::Number { value, digits } => {
                    if b.is_ascii_digit() {
                        self.scan = Scan::Number {
                            value: value
                                .saturating_mul(10)
                                .saturating_add(u64::from(b - b'0')),
                            digits: digits.saturating_add(1),
                        };
                    } else {
                        if let Some(t) = Self::complete(value, digits) {
                            accepted = Some(t);
                        }
                        // The terminator itself may open the next message.
                        self.scan = if b == TAG {
                            Scan::Number { value: 0, digits: 0 }
                        } else {
                            Scan::Seeking
                        };
                    }
                }
            }
        }
        accepted
    }

    /// Finish a number still pending at the end of a poll. The stream
    /// is newline-agnostic, so a message may simply stop after its last
    /// digit.
    pub fn flush(&mut self) -> Option<u64> {
        match core::mem::replace(&mut self.scan, Scan::Seeking) {
            Scan::Seeking => None,
            Scan::Number { value, digits } => Self::complete(value, digits),
        }
    }

    fn complete(value: u64, digits: u8) -> Option<u64> {
        if digits == 0 {
            trace!("tag without digits, resuming scan");
            return None;
        }
        if value < FLOOR_EPOCH {
            debug!("rejecting sync value {value}, below sanity floor");
            return None;
        }
        Some(value)
    }
}

impl Default for SyncParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod sync_parser_tests {
    use super::*;

    #[test]
    fn stream_without_tag_yields_nothing() {
        let mut p = SyncParser::new();
        assert_eq!(p.feed(b"hello 1357041600 world\r\n"), None);
        assert_eq!(p.flush(), None);
    }

    #[test]
    fn tagged_value_at_floor_is_accepted() {
        let mut p = SyncParser::new();
        assert_eq!(p.feed(b"T1357041600\n"), Some(1_357_041_600));
    }

    #[test]
    fn value_below_floor_is_discarded() {
        let mut p = SyncParser::new();
        assert_eq!(p.feed(b"T1000\n"), None);
        assert_eq!(p.flush(), None);
    }

    #[test]
    fn flush_completes_a_trailing_number() {
        let mut p = SyncParser::new();
        // No terminator byte after the digits.
        assert_eq!(p.feed(b"T1357041600"), None);
        assert_eq!(p.flush(), Some(1_357_041_600));
    }

    #[test]
    fn chunk_boundaries_do_not_matter() {
        let stream = b"junkT1388534400\nmore";
        for split in 0..stream.len() {
            let mut whole = SyncParser::new();
            let mut split_parser = SyncParser::new();

            let got_whole = whole.feed(stream).or_else(|| whole.flush());

            let first = split_parser.feed(&stream[..split]);
            let second = split_parser.feed(&stream[split..]);
            let got_split = second.or(first).or_else(|| split_parser.flush());

            assert_eq!(got_whole, got_split, "split at {split}");
        }
    }

    #[test]
    fn noise_before_tag_is_skipped() {
        let mut p = SyncParser::new();
        assert_eq!(p.feed(b"\x00\xffgarbage T1357041601"), None);
        assert_eq!(p.flush(), Some(1_357_041_601));
    }

    #[test]
    fn tag_without_digits_resumes_scanning() {
        let mut p = SyncParser::new();
        assert_eq!(p.feed(b"TxT1357041602\n"), Some(1_357_041_602));
    }

    #[test]
    fn later_message_wins_within_a_chunk() {
        let mut p = SyncParser::new();
        assert_eq!(
            p.feed(b"T1357041600\nT1388534400\n"),
            Some(1_388_534_400)
        );
    }

    #[test]
    fn back_to_back_tags_restart_the_number() {
        // The first tag is terminated by the second before any digit.
        let mut p = SyncParser::new();
        assert_eq!(p.feed(b"TT1357041600\n"), Some(1_357_041_600));
    }

    #[test]
    fn absurdly_long_numbers_saturate_instead_of_wrapping() {
        let mut p = SyncParser::new();
        let accepted = p.feed(b"T99999999999999999999999999\n");
        assert_eq!(accepted, Some(u64::MAX));
    }
}
