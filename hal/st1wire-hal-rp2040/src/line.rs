//! Bus line on an RP2040 GPIO
//!
//! The pad is switched between input and output with the level latched
//! in between, so the line is only driven while the engine owns it. The
//! internal pull-up (~50k) keeps the line HIGH when nobody drives it;
//! boards with long wires should add a stronger external one.

use embassy_rp::gpio::{Flex, Pin, Pull};
use embassy_rp::Peri;
use st1wire_hal::OpenDrainPin;

/// ST1Wire line on a flexible GPIO
pub struct FlexLine<'d> {
    pin: Flex<'d>,
}

impl<'d> FlexLine<'d> {
    /// Take a pin and release the line
    pub fn new(pin: Peri<'d, impl Pin>) -> Self {
        #[cfg(feature = "defmt")]
        defmt::debug!("st1wire: line on GPIO{}", pin.pin());
        let mut pin = Flex::new(pin);
        pin.set_pull(Pull::Up);
        pin.set_high();
        pin.set_as_input();
        Self { pin }
    }

    /// Get access to the underlying GPIO
    pub fn inner(&mut self) -> &mut Flex<'d> {
        &mut self.pin
    }
}

impl OpenDrainPin for FlexLine<'_> {
    fn set_as_input(&mut self) {
        self.pin.set_as_input();
    }

    fn set_as_output(&mut self) {
        self.pin.set_as_output();
    }

    fn set_high(&mut self) {
        self.pin.set_high();
    }

    fn set_low(&mut self) {
        self.pin.set_low();
    }

    fn is_high(&mut self) -> bool {
        self.pin.is_high()
    }
}
