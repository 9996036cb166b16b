//! RP2040 bindings for the ST1Wire transport
//!
//! Implements the `st1wire-hal` traits on `embassy-rp` and `embassy-time`:
//!
//! - Bus line on a `Flex` GPIO with the internal pull-up enabled
//! - Busy-wait timer on the embassy time driver
//!
//! Interrupt masking comes from `st1wire-drivers`, backed by the
//! `critical-section` implementation embassy-rp provides (which also
//! locks out the second core).
//!
//! ```ignore
//! let p = embassy_rp::init(Default::default());
//! let mut se = st1wire_hal_rp2040::single_bus(p.PIN_2, St1WireConfig::default())?;
//! se.init()?;
//! se.wake(0)?;
//! se.send_frame(0, 0, Speed::Slow, &command)?;
//! ```

#![no_std]
#![deny(unsafe_code)]

pub mod line;
pub mod timer;

pub use line::FlexLine;
pub use timer::EmbassyTimer;

use embassy_rp::gpio::Pin;
use embassy_rp::Peri;
use st1wire_core::{ConfigError, St1Wire, St1WireConfig};
use st1wire_drivers::InterruptFree;
use st1wire_hal::{BusBank, SingleBus};

/// Engine on one RP2040 GPIO
pub type Rp2040Bus<'d> = St1Wire<SingleBus<FlexLine<'d>>, EmbassyTimer, InterruptFree>;

/// Engine on `N` RP2040 GPIOs, one bus each
pub type Rp2040BusBank<'d, const N: usize> =
    St1Wire<BusBank<FlexLine<'d>, N>, EmbassyTimer, InterruptFree>;

/// Create an engine driving a single bus on `pin`
pub fn single_bus<'d>(
    pin: Peri<'d, impl Pin>,
    config: St1WireConfig,
) -> Result<Rp2040Bus<'d>, ConfigError> {
    St1Wire::new(
        SingleBus::new(FlexLine::new(pin)),
        EmbassyTimer::new(),
        InterruptFree,
        config,
    )
}

/// Create an engine driving one bus per already configured line
pub fn bus_bank<'d, const N: usize>(
    lines: [FlexLine<'d>; N],
    config: St1WireConfig,
) -> Result<Rp2040BusBank<'d, N>, ConfigError> {
    St1Wire::new(BusBank::new(lines), EmbassyTimer::new(), InterruptFree, config)
}
