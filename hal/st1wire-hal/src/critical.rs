//! Exclusive-access scope for timing-critical sections
//!
//! Byte transfers tolerate only a few microseconds of jitter, so they run
//! with interrupts masked (and, under an RTOS, the scheduler suspended).

/// Scope that masks interrupts for the duration of a closure
///
/// Implementations must restore the previous interrupt state when the
/// closure returns, whatever the closure returned.
pub trait CriticalSection {
    /// Run `f` with interrupts masked
    fn with<R>(&mut self, f: impl FnOnce() -> R) -> R;
}

impl<C: CriticalSection> CriticalSection for &mut C {
    fn with<R>(&mut self, f: impl FnOnce() -> R) -> R {
        (**self).with(f)
    }
}
