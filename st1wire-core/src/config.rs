//! Speed profiles, timing tables and engine configuration
//!
//! All durations are in microseconds. The tables reproduce the timings of
//! the peripheral's single-contact ("slow") and three-contact ("fast")
//! interfaces.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default maximum frame payload in bytes
pub const MAX_FRAME_LEN: usize = 752;

/// Wake pulse: LOW hold
pub const WAKE_LOW_US: u32 = 1_000;

/// Wake pulse: HIGH settle time before the first transaction
pub const WAKE_SETTLE_US: u32 = 8_000;

/// Recovery pulse: hold per phase (slow profile only)
pub const RECOVERY_HOLD_US: u32 = 100_000;

/// Communication speed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Speed {
    /// Single-contact profile, line also powers the peripheral
    #[default]
    Slow,
    /// Three-contact profile with a dedicated supply
    Fast,
}

impl Speed {
    /// Convert a raw speed selector (0 = slow, 1 = fast)
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Speed::Slow),
            1 => Some(Speed::Fast),
            _ => None,
        }
    }

    /// Get the raw speed selector
    pub fn as_u8(self) -> u8 {
        match self {
            Speed::Slow => 0,
            Speed::Fast => 1,
        }
    }
}

/// Timing table of one speed profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Timing {
    /// Long phase of a bit
    pub long_us: u32,
    /// Short phase of a bit
    pub short_us: u32,
    /// LOW hold of the receiver's byte acknowledgment
    pub ack_us: u32,
    /// LOW hold of the start condition
    pub start_us: u32,
    /// Gap between two consecutive bytes of a frame
    pub inter_byte_us: u32,
    /// Trailing gap after a frame exchange
    pub inter_frame_us: u32,
    /// Gap between the header bytes of a read request
    pub request_gap_us: u32,
    /// Time the line must stay HIGH to count as idle
    pub idle_us: u32,
    /// Bound on a single bit phase while receiving
    pub receive_timeout_us: u32,
    /// Bound on each phase of the peer's byte acknowledgment
    pub ack_window_us: u32,
}

impl Timing {
    /// Single-contact profile
    pub const SLOW: Self = Self {
        long_us: 14,
        short_us: 4,
        ack_us: 14,
        start_us: 4 * (14 + 4),
        inter_byte_us: 8 * (14 + 4),
        inter_frame_us: 1_000,
        request_gap_us: 1_000,
        idle_us: 100,
        receive_timeout_us: 34_464,
        ack_window_us: 255,
    };

    /// Three-contact profile
    ///
    /// The start pulse is shared with the slow profile so a peripheral can
    /// detect it before it knows which profile is in use.
    pub const FAST: Self = Self {
        long_us: 5,
        short_us: 1,
        ack_us: 1,
        start_us: 4 * (14 + 4),
        inter_byte_us: 10,
        inter_frame_us: 10,
        request_gap_us: 10,
        idle_us: 100,
        receive_timeout_us: 34_464,
        ack_window_us: 255,
    };

    /// Check that every value is positive and long > short
    pub fn validate(&self) -> Result<(), ConfigError> {
        let values = [
            self.long_us,
            self.short_us,
            self.ack_us,
            self.start_us,
            self.inter_byte_us,
            self.inter_frame_us,
            self.request_gap_us,
            self.idle_us,
            self.receive_timeout_us,
            self.ack_window_us,
        ];
        if values.iter().any(|&v| v == 0) {
            return Err(ConfigError::ZeroTiming);
        }
        if self.long_us <= self.short_us {
            return Err(ConfigError::PulseOrdering);
        }
        Ok(())
    }
}

/// Width of the frame length prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LengthPrefix {
    /// Low 8 bits only
    OneByte,
    /// High 3 bits, then low 8 bits
    #[default]
    TwoBytes,
}

impl LengthPrefix {
    /// Largest length the prefix can carry
    pub fn max_len(self) -> usize {
        match self {
            LengthPrefix::OneByte => 0xFF,
            LengthPrefix::TwoBytes => 0x7FF,
        }
    }

    /// Number of prefix bytes on the wire
    pub fn width(self) -> usize {
        match self {
            LengthPrefix::OneByte => 1,
            LengthPrefix::TwoBytes => 2,
        }
    }

    /// Encode a length, big-endian
    ///
    /// Returns the prefix bytes and how many of them are used. Bits beyond
    /// the prefix width are dropped; callers check [`Self::max_len`] first.
    pub fn encode(self, len: u16) -> ([u8; 2], usize) {
        match self {
            LengthPrefix::OneByte => ([len as u8, 0], 1),
            LengthPrefix::TwoBytes => ([((len >> 8) & 0x07) as u8, len as u8], 2),
        }
    }

    /// Decode prefix bytes received from the peer
    ///
    /// The peer's high byte is taken whole.
    pub fn decode(self, bytes: &[u8]) -> u16 {
        match (self, bytes) {
            (LengthPrefix::TwoBytes, [hi, lo, ..]) => u16::from_be_bytes([*hi, *lo]),
            (_, [.., lo]) => *lo as u16,
            (_, []) => 0,
        }
    }
}

/// Errors rejecting a configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// A timing value is zero
    ZeroTiming,
    /// Long pulse is not longer than the short pulse
    PulseOrdering,
    /// Maximum frame length exceeds what the length prefix can carry
    FrameBoundExceedsPrefix,
    /// Arbitration would never be attempted
    NoArbitrationAttempts,
    /// Binary config could not be encoded or decoded
    Encoding,
}

/// Engine configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct St1WireConfig {
    /// Width of the length prefix
    pub length_prefix: LengthPrefix,
    /// Largest payload send-frame accepts
    pub max_frame_len: usize,
    /// Idle-detection attempts before giving up arbitration
    pub arbitration_attempts: u8,
    /// Slow profile timings
    pub slow: Timing,
    /// Fast profile timings
    pub fast: Timing,
}

impl Default for St1WireConfig {
    fn default() -> Self {
        Self {
            length_prefix: LengthPrefix::TwoBytes,
            max_frame_len: MAX_FRAME_LEN,
            arbitration_attempts: 32,
            slow: Timing::SLOW,
            fast: Timing::FAST,
        }
    }
}

impl St1WireConfig {
    /// Default configuration with a one-byte length prefix
    pub fn one_byte_prefix() -> Self {
        Self {
            length_prefix: LengthPrefix::OneByte,
            max_frame_len: LengthPrefix::OneByte.max_len(),
            ..Self::default()
        }
    }

    /// Timing table for a speed
    pub fn timing(&self, speed: Speed) -> &Timing {
        match speed {
            Speed::Slow => &self.slow,
            Speed::Fast => &self.fast,
        }
    }

    /// Check the configuration invariants
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.slow.validate()?;
        self.fast.validate()?;
        if self.max_frame_len > self.length_prefix.max_len() {
            return Err(ConfigError::FrameBoundExceedsPrefix);
        }
        if self.arbitration_attempts == 0 {
            return Err(ConfigError::NoArbitrationAttempts);
        }
        Ok(())
    }

    /// Serialize to postcard binary
    ///
    /// Returns the used part of `buf`.
    #[cfg(feature = "serde")]
    pub fn to_slice<'a>(&self, buf: &'a mut [u8]) -> Result<&'a mut [u8], ConfigError> {
        postcard::to_slice(self, buf).map_err(|_| ConfigError::Encoding)
    }

    /// Deserialize from postcard binary and validate
    #[cfg(feature = "serde")]
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ConfigError> {
        let config: Self = postcard::from_bytes(bytes).map_err(|_| ConfigError::Encoding)?;
        config.validate()?;
        Ok(config)
    }
}
