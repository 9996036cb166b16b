//! Timing source abstraction
//!
//! The protocol engine never yields: every wait is a busy delay or a poll
//! loop bounded by the one-shot timeout provided here.

/// Microsecond delay and one-shot timeout
pub trait BusTimer {
    /// Busy-wait for the given number of microseconds
    fn delay_us(&mut self, us: u32);

    /// Arm the one-shot timeout, replacing any timeout still running
    fn start_timeout(&mut self, us: u32);

    /// Check whether the armed timeout has expired
    ///
    /// Called from tight poll loops, so implementations should be cheap.
    fn is_timeout_expired(&mut self) -> bool;
}

impl<T: BusTimer + ?Sized> BusTimer for &mut T {
    fn delay_us(&mut self, us: u32) {
        (**self).delay_us(us);
    }

    fn start_timeout(&mut self, us: u32) {
        (**self).start_timeout(us);
    }

    fn is_timeout_expired(&mut self) -> bool {
        (**self).is_timeout_expired()
    }
}
