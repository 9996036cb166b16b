//! Board-agnostic driver implementations
//!
//! Concrete implementations of the st1wire-hal traits on top of the
//! embedded ecosystem, for any chip with an `embedded-hal` 1.0 HAL:
//!
//! - Open-drain line on an `InputPin + OutputPin`
//! - Busy-wait timer on a `DelayNs` provider
//! - Interrupt-free scope on the `critical-section` crate

#![no_std]
#![deny(unsafe_code)]

pub mod critical;
pub mod pin;
pub mod timer;

pub use critical::InterruptFree;
pub use pin::OpenDrainIo;
pub use timer::DelayTimer;
