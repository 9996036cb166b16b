//! Board-agnostic ST1Wire protocol engine
//!
//! ST1Wire is a half-duplex, self-clocking serial link over one open-drain
//! line shared by host and peripheral. This crate implements it entirely
//! in software-timed pin toggling:
//!
//! - Bit codec: two-phase pulse encoding, duration-ratio decoding
//! - Byte transceiver: sync pulse, 8 data bits MSB first, per-byte ack
//! - Frame engine: arbitration, start condition, optional device address,
//!   length prefix, payload and the terminal frame acknowledgment
//! - Wake and recovery pulses
//! - Frame staging buffer for chunked command layers
//!
//! # Frame format
//!
//! ```text
//! ┌───────┬─────────┬──────────┬──────────────┬───────────┐
//! │ START │ ADDRESS │ LENGTH   │ PAYLOAD      │ FRAME ACK │
//! │ pulse │ 0–1B    │ 1B or 2B │ 0–752B       │ 1B (0x20) │
//! └───────┴─────────┴──────────┴──────────────┴───────────┘
//! ```
//!
//! A read is requested by sending a zero length; the peripheral answers with
//! the frame acknowledgment, its own length prefix and payload.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

#[macro_use]
mod fmt;

pub mod codec;
pub mod config;
pub mod engine;
pub mod error;
pub mod staging;
mod transceiver;

#[cfg(test)]
mod sim;

pub use codec::Pulse;
pub use config::{ConfigError, LengthPrefix, Speed, St1WireConfig, Timing};
pub use engine::{St1Wire, FRAME_ACK};
pub use error::BusError;
pub use staging::{FrameStager, TRANSFER_BUFFER_LEN};

pub use st1wire_hal::{BusId, BusLine, BusTimer, CriticalSection};
