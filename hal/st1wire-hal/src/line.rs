//! Indexed bus lines
//!
//! The engine addresses its lines by bus index so a single instance can
//! serve several peripherals, each on its own pin.

use crate::gpio::OpenDrainPin;

/// Index of a single-wire bus
pub type BusId = u8;

/// A set of open-drain lines addressed by [`BusId`]
///
/// Callers must check `bus < bus_count()` before using an index; the
/// provided adapters ignore out-of-range indices.
pub trait BusLine {
    /// Number of buses behind this driver
    fn bus_count(&self) -> usize {
        1
    }

    /// Switch a bus line to input
    fn set_as_input(&mut self, bus: BusId);

    /// Switch a bus line to output
    fn set_as_output(&mut self, bus: BusId);

    /// Release a bus line (latch high)
    fn set_high(&mut self, bus: BusId);

    /// Pull a bus line down (latch low)
    fn set_low(&mut self, bus: BusId);

    /// Sample a bus line
    fn is_high(&mut self, bus: BusId) -> bool;

    /// Sample a bus line, inverted
    fn is_low(&mut self, bus: BusId) -> bool {
        !self.is_high(bus)
    }

    /// Bring every line to the released, driven-high idle state
    fn init(&mut self) {
        for bus in 0..self.bus_count() {
            let bus = bus as BusId;
            self.set_high(bus);
            self.set_as_output(bus);
        }
    }

    /// Stop driving every line
    fn deinit(&mut self) {
        for bus in 0..self.bus_count() {
            self.set_as_input(bus as BusId);
        }
    }
}

/// One pin serving as bus 0
pub struct SingleBus<P> {
    pin: P,
}

impl<P: OpenDrainPin> SingleBus<P> {
    /// Wrap a pin as a one-line bus set
    pub fn new(pin: P) -> Self {
        Self { pin }
    }

    /// Get access to the underlying pin
    pub fn pin(&self) -> &P {
        &self.pin
    }

    /// Release the underlying pin
    pub fn into_inner(self) -> P {
        self.pin
    }

    fn get(&mut self, bus: BusId) -> Option<&mut P> {
        (bus == 0).then_some(&mut self.pin)
    }
}

/// `N` pins serving as buses `0..N`
pub struct BusBank<P, const N: usize> {
    pins: [P; N],
}

impl<P: OpenDrainPin, const N: usize> BusBank<P, N> {
    /// Create a bank from pins ordered by bus index
    pub fn new(pins: [P; N]) -> Self {
        Self { pins }
    }

    /// Get access to the pin of a bus
    pub fn pin(&self, bus: BusId) -> Option<&P> {
        self.pins.get(bus as usize)
    }

    /// Release the underlying pins
    pub fn into_inner(self) -> [P; N] {
        self.pins
    }

    fn get(&mut self, bus: BusId) -> Option<&mut P> {
        self.pins.get_mut(bus as usize)
    }
}

macro_rules! forward_bus_line {
    ($ty:ty, $($generics:tt)*) => {
        impl<$($generics)*> BusLine for $ty {
            fn bus_count(&self) -> usize {
                Self::COUNT
            }

            fn set_as_input(&mut self, bus: BusId) {
                if let Some(pin) = self.get(bus) {
                    pin.set_as_input();
                }
            }

            fn set_as_output(&mut self, bus: BusId) {
                if let Some(pin) = self.get(bus) {
                    pin.set_as_output();
                }
            }

            fn set_high(&mut self, bus: BusId) {
                if let Some(pin) = self.get(bus) {
                    pin.set_high();
                }
            }

            fn set_low(&mut self, bus: BusId) {
                if let Some(pin) = self.get(bus) {
                    pin.set_low();
                }
            }

            // An absent line reads as released
            fn is_high(&mut self, bus: BusId) -> bool {
                self.get(bus).map_or(true, |pin| pin.is_high())
            }
        }
    };
}

impl<P> SingleBus<P> {
    const COUNT: usize = 1;
}

impl<P, const N: usize> BusBank<P, N> {
    const COUNT: usize = N;
}

forward_bus_line!(SingleBus<P>, P: OpenDrainPin);
forward_bus_line!(BusBank<P, N>, P: OpenDrainPin, const N: usize);
