//! Interrupt-free scope on the `critical-section` crate
//!
//! The chip HAL (or `cortex-m`'s single-core implementation) provides the
//! actual masking; this only adapts it to the engine's scope trait.

use st1wire_hal::CriticalSection;

/// Runs each byte transfer inside `critical_section::with`
#[derive(Debug, Default, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InterruptFree;

impl CriticalSection for InterruptFree {
    fn with<R>(&mut self, f: impl FnOnce() -> R) -> R {
        critical_section::with(|_| f())
    }
}
