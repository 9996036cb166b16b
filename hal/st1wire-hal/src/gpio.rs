//! GPIO pin abstractions
//!
//! The single-wire bus is one open-drain line with an external pull-up.
//! Driving HIGH releases the line, driving LOW pulls it down, and switching
//! to input stops driving entirely so the peer can pull it low.

/// Open-drain I/O pin with switchable direction
///
/// Implementations should handle the actual hardware register manipulation
/// for the specific chip.
pub trait OpenDrainPin {
    /// Switch the pin to input (stop driving the line)
    fn set_as_input(&mut self);

    /// Switch the pin to output, driving the last latched level
    fn set_as_output(&mut self);

    /// Latch a high level (release the line)
    fn set_high(&mut self);

    /// Latch a low level (pull the line down)
    fn set_low(&mut self);

    /// Set the latched level
    fn set_state(&mut self, high: bool) {
        if high {
            self.set_high();
        } else {
            self.set_low();
        }
    }

    /// Sample the line level
    ///
    /// Takes `&mut self` because some GPIO blocks need a mutable handle
    /// to read the input register.
    fn is_high(&mut self) -> bool;

    /// Sample the line level, inverted
    fn is_low(&mut self) -> bool {
        !self.is_high()
    }
}

impl<P: OpenDrainPin + ?Sized> OpenDrainPin for &mut P {
    fn set_as_input(&mut self) {
        (**self).set_as_input();
    }

    fn set_as_output(&mut self) {
        (**self).set_as_output();
    }

    fn set_high(&mut self) {
        (**self).set_high();
    }

    fn set_low(&mut self) {
        (**self).set_low();
    }

    fn is_high(&mut self) -> bool {
        (**self).is_high()
    }
}
