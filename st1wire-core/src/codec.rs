//! Bit codec
//!
//! Each bit travels as a HIGH phase followed by a LOW phase. The phase
//! lengths carry the value, so the receiver only compares the two:
//!
//! ```text
//!  bit 1:  ┌──────long──────┐         bit 0:  ┌short┐
//!          │                └short┘           │     └──────long──────┘
//! ```
//!
//! A byte is preceded by a sync pulse (short HIGH, long LOW) and sent
//! most-significant bit first.

use crate::config::Timing;

/// One two-phase pulse: HIGH for `high_us`, then LOW for `low_us`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Pulse {
    /// Duration of the HIGH phase
    pub high_us: u32,
    /// Duration of the LOW phase
    pub low_us: u32,
}

/// Sync pulse the sender drives before the data bits
pub fn sync_pulse(timing: &Timing) -> Pulse {
    Pulse {
        high_us: timing.short_us,
        low_us: timing.long_us,
    }
}

/// Sync pulse the receiver drives to request a byte from the peer
pub fn request_pulse(timing: &Timing) -> Pulse {
    Pulse {
        high_us: timing.long_us,
        low_us: timing.long_us,
    }
}

/// Encode a single bit
pub fn encode_bit(bit: bool, timing: &Timing) -> Pulse {
    if bit {
        Pulse {
            high_us: timing.long_us,
            low_us: timing.short_us,
        }
    } else {
        Pulse {
            high_us: timing.short_us,
            low_us: timing.long_us,
        }
    }
}

/// Encode the 8 data bits of a byte, MSB first
pub fn encode_byte(byte: u8, timing: &Timing) -> impl Iterator<Item = Pulse> + '_ {
    (0..8).rev().map(move |i| encode_bit(byte & (1 << i) != 0, timing))
}

/// Decode a bit from the measured HIGH and LOW phase lengths
///
/// The unit does not matter as long as both use the same one (poll
/// counts on the host, microseconds on a logic analyzer).
pub fn decode_bit(high: u32, low: u32) -> bool {
    high > low
}

/// Accumulates decoded bits MSB first
#[derive(Debug, Clone, Copy, Default)]
pub struct ByteAccumulator {
    value: u8,
    bits: u8,
}

impl ByteAccumulator {
    /// Create an empty accumulator
    pub fn new() -> Self {
        Self::default()
    }

    /// Shift in one measured bit
    pub fn push(&mut self, high: u32, low: u32) {
        self.value = (self.value << 1) | decode_bit(high, low) as u8;
        self.bits = self.bits.saturating_add(1);
    }

    /// The byte, once all 8 bits are in
    pub fn finish(self) -> Option<u8> {
        (self.bits == 8).then_some(self.value)
    }
}
