//! Open-drain line on embedded-hal pins
//!
//! Most HALs expose an open-drain output that can also be read back
//! (`InputPin + OutputPin` on the same handle). Such a pin has no separate
//! input mode: driving HIGH already releases the line. The adapter keeps
//! the direction and the latched level itself and only drives LOW while
//! the engine has the line in output mode.

use core::convert::Infallible;

use embedded_hal::digital::{InputPin, OutputPin};
use st1wire_hal::OpenDrainPin;

/// Unwrap a pin result whose error cannot occur
fn settle<T>(result: Result<T, Infallible>) -> T {
    match result {
        Ok(value) => value,
        Err(never) => match never {},
    }
}

/// Open-drain bus pin built from an embedded-hal open-drain output
pub struct OpenDrainIo<P> {
    pin: P,
    output: bool,
    latch_high: bool,
}

impl<P> OpenDrainIo<P>
where
    P: InputPin + OutputPin<Error = Infallible>,
{
    /// Wrap a pin, releasing the line
    pub fn new(pin: P) -> Self {
        let mut io = Self {
            pin,
            output: false,
            latch_high: true,
        };
        io.apply();
        io
    }

    /// Get access to the underlying pin
    pub fn inner(&self) -> &P {
        &self.pin
    }

    /// Give back the underlying pin
    pub fn into_inner(self) -> P {
        self.pin
    }

    /// Whether the line is currently in output mode
    pub fn is_output(&self) -> bool {
        self.output
    }

    fn apply(&mut self) {
        if self.output && !self.latch_high {
            settle(self.pin.set_low());
        } else {
            settle(self.pin.set_high());
        }
    }
}

impl<P> OpenDrainPin for OpenDrainIo<P>
where
    P: InputPin + OutputPin<Error = Infallible>,
{
    fn set_as_input(&mut self) {
        self.output = false;
        self.apply();
    }

    fn set_as_output(&mut self) {
        self.output = true;
        self.apply();
    }

    fn set_high(&mut self) {
        self.latch_high = true;
        self.apply();
    }

    fn set_low(&mut self) {
        self.latch_high = false;
        self.apply();
    }

    fn is_high(&mut self) -> bool {
        settle(InputPin::is_high(&mut self.pin))
    }
}
