//! Busy-wait timer on the embassy time driver
//!
//! The engine runs with interrupts masked, so nothing here may await.
//! `block_for` spins on the time driver's counter, which on the RP2040
//! is the 1 MHz system timer and keeps counting inside a critical section.

use embassy_time::{block_for, Duration, Instant};
use st1wire_hal::BusTimer;

/// Bus timer on `embassy-time`
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EmbassyTimer {
    deadline: Instant,
}

impl EmbassyTimer {
    /// Create a timer with no timeout armed
    pub fn new() -> Self {
        Self {
            deadline: Instant::now(),
        }
    }
}

impl Default for EmbassyTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl BusTimer for EmbassyTimer {
    fn delay_us(&mut self, us: u32) {
        block_for(Duration::from_micros(u64::from(us)));
    }

    fn start_timeout(&mut self, us: u32) {
        self.deadline = Instant::now() + Duration::from_micros(u64::from(us));
    }

    fn is_timeout_expired(&mut self) -> bool {
        Instant::now() >= self.deadline
    }
}
