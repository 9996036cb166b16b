//! ST1Wire Hardware Abstraction Layer
//!
//! This crate defines the hardware traits the single-wire protocol engine
//! is written against. Chip-specific crates implement them so the same
//! engine runs on any microcontroller with an open-drain capable GPIO and
//! a microsecond time base.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Command layer (secure element, etc.)   │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  st1wire-core (frame / byte / bit)      │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  st1wire-hal (this crate - traits)      │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │   st1wire-    │       │ st1wire-hal-  │
//! │   drivers     │       │    rp2040     │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::OpenDrainPin`] - One open-drain line with switchable direction
//! - [`line::BusLine`] - A set of lines addressed by bus index
//! - [`timer::BusTimer`] - Busy-wait delays and a one-shot timeout
//! - [`critical::CriticalSection`] - Interrupt-free scope for byte timing

#![no_std]
#![deny(unsafe_code)]

pub mod critical;
pub mod gpio;
pub mod line;
pub mod timer;

// Re-export key traits at crate root for convenience
pub use critical::CriticalSection;
pub use gpio::OpenDrainPin;
pub use line::{BusBank, BusId, BusLine, SingleBus};
pub use timer::BusTimer;
