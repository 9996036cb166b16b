//! Byte transceiver
//!
//! Sends and receives one byte including the per-byte acknowledgment
//! handshake. Callers run these routines inside a critical section; the
//! timing tolerances are a few microseconds.

use st1wire_hal::{BusId, BusLine, BusTimer};

use crate::codec::{self, ByteAccumulator, Pulse};
use crate::config::Timing;
use crate::error::BusError;

/// Byte-level access to one bus for one transaction
pub(crate) struct Transceiver<'a, L, T> {
    line: &'a mut L,
    timer: &'a mut T,
    bus: BusId,
    timing: &'a Timing,
}

impl<'a, L: BusLine, T: BusTimer> Transceiver<'a, L, T> {
    pub(crate) fn new(line: &'a mut L, timer: &'a mut T, bus: BusId, timing: &'a Timing) -> Self {
        Self {
            line,
            timer,
            bus,
            timing,
        }
    }

    /// Send one byte and wait for the peer's acknowledgment
    ///
    /// The peer acknowledges by pulling the released line LOW and letting
    /// it go HIGH again, each within the ack window.
    pub(crate) fn send_byte(&mut self, byte: u8) -> Result<(), BusError> {
        self.line.set_as_output(self.bus);
        self.drive(codec::sync_pulse(self.timing));
        for pulse in codec::encode_byte(byte, self.timing) {
            self.drive(pulse);
        }

        // Release the line for the acknowledgment
        self.line.set_high(self.bus);
        self.line.set_as_input(self.bus);

        let window = self.timing.ack_window_us;
        self.measure(true, window).ok_or(BusError::AckError)?;
        self.measure(false, window).ok_or(BusError::AckError)?;
        Ok(())
    }

    /// Request one byte from the peer and acknowledge it
    ///
    /// A partially received byte is discarded on timeout.
    pub(crate) fn receive_byte(&mut self) -> Result<u8, BusError> {
        self.line.set_as_output(self.bus);
        self.drive(codec::request_pulse(self.timing));
        self.line.set_high(self.bus);
        self.line.set_as_input(self.bus);

        let window = self.timing.receive_timeout_us;
        let mut acc = ByteAccumulator::new();
        for _ in 0..8 {
            let high = self.measure(true, window).ok_or(BusError::ReceiveTimeout)?;
            let low = self.measure(false, window).ok_or(BusError::ReceiveTimeout)?;
            acc.push(high, low);
        }

        self.line.set_as_output(self.bus);
        self.line.set_low(self.bus);
        self.timer.delay_us(self.timing.ack_us);
        self.line.set_high(self.bus);

        acc.finish().ok_or(BusError::ReceiveTimeout)
    }

    fn drive(&mut self, pulse: Pulse) {
        self.line.set_high(self.bus);
        self.timer.delay_us(pulse.high_us);
        self.line.set_low(self.bus);
        self.timer.delay_us(pulse.low_us);
    }

    /// Count polls while the line stays at `high`
    ///
    /// Returns `None` if the level does not change before `window_us`.
    fn measure(&mut self, high: bool, window_us: u32) -> Option<u32> {
        self.timer.start_timeout(window_us);
        let mut polls = 0u32;
        while self.line.is_high(self.bus) == high {
            polls += 1;
            if self.timer.is_timeout_expired() {
                return None;
            }
        }
        Some(polls)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Speed, St1WireConfig};
    use crate::sim::Sim;
    use proptest::prelude::*;

    fn send(sim: &Sim, speed: Speed, byte: u8) -> Result<(), BusError> {
        let config = St1WireConfig::default();
        let (mut line, mut timer) = (sim.line(), sim.timer());
        Transceiver::new(&mut line, &mut timer, 0, config.timing(speed)).send_byte(byte)
    }

    fn receive(sim: &Sim, speed: Speed) -> Result<u8, BusError> {
        let config = St1WireConfig::default();
        let (mut line, mut timer) = (sim.line(), sim.timer());
        Transceiver::new(&mut line, &mut timer, 0, config.timing(speed)).receive_byte()
    }

    #[test]
    fn test_send_byte_is_decoded_by_peer() {
        let sim = Sim::new(Speed::Slow);
        assert_eq!(send(&sim, Speed::Slow, 0xA5), Ok(()));
        assert_eq!(sim.peer().received, [0xA5]);
    }

    #[test]
    fn test_send_byte_without_ack_fails_within_window() {
        let sim = Sim::new(Speed::Fast);
        sim.peer_mut().ack_bytes = false;

        let start = sim.now();
        assert_eq!(send(&sim, Speed::Fast, 0x3C), Err(BusError::AckError));

        // Byte drive time plus a single ack window
        let drive_us = 9 * u64::from(Timing::FAST.long_us + Timing::FAST.short_us);
        assert!(sim.now() - start <= drive_us + u64::from(Timing::FAST.ack_window_us) + 2);
    }

    #[test]
    fn test_send_byte_with_stuck_low_ack_fails() {
        let sim = Sim::new(Speed::Slow);
        sim.peer_mut().ack_hold_us = Some(10_000);
        assert_eq!(send(&sim, Speed::Slow, 0x01), Err(BusError::AckError));
    }

    #[test]
    fn test_receive_byte_from_peer() {
        let sim = Sim::new(Speed::Slow);
        sim.peer_mut().queue(&[0x5A]);
        assert_eq!(receive(&sim, Speed::Slow), Ok(0x5A));
    }

    #[test]
    fn test_receive_byte_acknowledges() {
        let sim = Sim::new(Speed::Fast);
        sim.peer_mut().queue(&[0x00]);
        receive(&sim, Speed::Fast).unwrap();

        // Request pulse, then the ack pulse as the last host-driven LOW
        let lows = sim.host_lows();
        assert_eq!(lows.len(), 2);
        let (fall, rise) = lows[1];
        assert_eq!(rise - fall, u64::from(Timing::FAST.ack_us));
    }

    #[test]
    fn test_receive_byte_silent_peer_times_out() {
        let sim = Sim::new(Speed::Fast);
        assert_eq!(receive(&sim, Speed::Fast), Err(BusError::ReceiveTimeout));
    }

    #[test]
    fn test_receive_byte_truncated_is_discarded() {
        let sim = Sim::new(Speed::Slow);
        {
            let mut peer = sim.peer_mut();
            peer.queue(&[0xFF]);
            peer.truncate_bits = Some(5);
        }
        assert_eq!(receive(&sim, Speed::Slow), Err(BusError::ReceiveTimeout));
        // No acknowledgment pulse follows a failed byte
        assert_eq!(sim.host_lows().len(), 1);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_byte_loopback(byte in any::<u8>(), fast in any::<bool>()) {
            let speed = if fast { Speed::Fast } else { Speed::Slow };

            let sim = Sim::new(speed);
            prop_assert_eq!(send(&sim, speed, byte), Ok(()));
            let echoed = sim.peer().received[0];
            prop_assert_eq!(echoed, byte);

            sim.peer_mut().queue(&[echoed]);
            prop_assert_eq!(receive(&sim, speed), Ok(byte));
        }
    }
}
