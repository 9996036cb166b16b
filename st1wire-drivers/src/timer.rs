//! Busy-wait timer on an embedded-hal delay provider
//!
//! `DelayNs` has no notion of elapsed time, so the timeout is kept as a
//! budget: every expiry check burns one step of delay and takes it off the
//! budget. Poll loops therefore run at most once per step, and a timeout of
//! `us` microseconds expires after at least `us` microseconds.

use embedded_hal::delay::DelayNs;
use st1wire_hal::BusTimer;

/// Default delay burned per timeout check
pub const DEFAULT_STEP_US: u32 = 1;

/// Bus timer on a `DelayNs` provider
pub struct DelayTimer<D> {
    delay: D,
    step_us: u32,
    remaining_us: u32,
}

impl<D: DelayNs> DelayTimer<D> {
    /// Create a timer burning the default step per timeout check
    pub fn new(delay: D) -> Self {
        Self::with_step(delay, DEFAULT_STEP_US)
    }

    /// Create a timer burning `step_us` per timeout check
    ///
    /// A zero step is raised to one microsecond.
    pub fn with_step(delay: D, step_us: u32) -> Self {
        #[cfg(feature = "defmt")]
        defmt::trace!("st1wire: delay timer, {} us per check", step_us.max(1));
        Self {
            delay,
            step_us: step_us.max(1),
            remaining_us: 0,
        }
    }

    /// Get access to the underlying delay provider
    pub fn inner(&self) -> &D {
        &self.delay
    }

    /// Give back the underlying delay provider
    pub fn into_inner(self) -> D {
        self.delay
    }
}

impl<D: DelayNs> BusTimer for DelayTimer<D> {
    fn delay_us(&mut self, us: u32) {
        self.delay.delay_us(us);
    }

    fn start_timeout(&mut self, us: u32) {
        self.remaining_us = us;
    }

    fn is_timeout_expired(&mut self) -> bool {
        if self.remaining_us == 0 {
            return true;
        }
        let step = self.step_us.min(self.remaining_us);
        self.delay.delay_us(step);
        self.remaining_us -= step;
        self.remaining_us == 0
    }
}
