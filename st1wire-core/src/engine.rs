//! Frame engine
//!
//! Owns arbitration, the start condition, the optional device address, the
//! length prefix, the payload and the terminal frame acknowledgment.
//!
//! Each byte transfer runs in its own critical section; interrupts may run
//! between bytes, which the inter-byte delay absorbs. No protocol state
//! survives between calls: everything a call needs lives in a
//! [`Transaction`] created at its start.

use st1wire_hal::{BusId, BusLine, BusTimer, CriticalSection};

use crate::config::{
    ConfigError, Speed, St1WireConfig, Timing, RECOVERY_HOLD_US, WAKE_LOW_US, WAKE_SETTLE_US,
};
use crate::error::BusError;
use crate::transceiver::Transceiver;

/// Byte the peripheral returns to acknowledge a frame or a read request
pub const FRAME_ACK: u8 = 0x20;

/// Read request marker sent in place of the length prefix
const READ_REQUEST: u8 = 0x00;

/// Per-call state
#[derive(Debug, Clone, Copy)]
struct Transaction {
    bus: BusId,
    address: u8,
    speed: Speed,
    timing: Timing,
}

/// ST1Wire bus master
///
/// Generic over the line driver, the timing source and the interrupt
/// masking scope so it runs unchanged on any chip and in host tests.
pub struct St1Wire<L, T, C> {
    line: L,
    timer: T,
    cs: C,
    config: St1WireConfig,
}

impl<L: BusLine, T: BusTimer, C: CriticalSection> St1Wire<L, T, C> {
    /// Create an engine, validating the configuration
    pub fn new(line: L, timer: T, cs: C, config: St1WireConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            line,
            timer,
            cs,
            config,
        })
    }

    /// Get the active configuration
    pub fn config(&self) -> &St1WireConfig {
        &self.config
    }

    /// Give back the hardware resources
    pub fn release(self) -> (L, T, C) {
        (self.line, self.timer, self.cs)
    }

    /// Bring all bus lines to idle
    pub fn init(&mut self) -> Result<(), BusError> {
        self.line.init();
        debug!("st1wire: init {} bus(es)", self.line.bus_count());
        Ok(())
    }

    /// Stop driving all bus lines
    pub fn deinit(&mut self) -> Result<(), BusError> {
        self.line.deinit();
        debug!("st1wire: deinit");
        Ok(())
    }

    /// Send a frame to the peripheral
    ///
    /// `address` 0 means no address byte. On failure the whole frame must
    /// be retried by the caller. The payload is bounded by
    /// `max_frame_len` and by the length prefix: a one-byte prefix caps
    /// frames at 255 bytes, longer payloads fail with
    /// [`BusError::FrameTooLong`] before the line is touched.
    ///
    /// The inter-frame delay follows every exchange, including a lost
    /// arbitration.
    pub fn send_frame(
        &mut self,
        bus: BusId,
        address: u8,
        speed: Speed,
        payload: &[u8],
    ) -> Result<(), BusError> {
        let tx = self.transaction(bus, address, speed)?;
        let max_len = self
            .config
            .max_frame_len
            .min(self.config.length_prefix.max_len());
        if payload.len() > max_len {
            return Err(BusError::FrameTooLong);
        }

        trace!("st1wire {}: send {} bytes", bus, payload.len());
        let result = self
            .start_condition(&tx)
            .and_then(|()| self.write_frame(&tx, payload));
        self.timer.delay_us(tx.timing.inter_frame_us);
        result
    }

    /// Receive a frame from the peripheral into `buf`
    ///
    /// Returns the payload length. A peripheral announcing more bytes than
    /// `buf` holds fails with [`BusError::BufferOverrun`]. A byte lost
    /// while reading the length or the payload fails with
    /// [`BusError::ReceiveTimeout`]. A lost arbitration returns at once,
    /// without the inter-frame delay.
    pub fn receive_frame(
        &mut self,
        bus: BusId,
        address: u8,
        speed: Speed,
        buf: &mut [u8],
    ) -> Result<usize, BusError> {
        let tx = self.transaction(bus, address, speed)?;

        trace!("st1wire {}: receive", bus);
        self.start_condition(&tx)?;
        let result = self.read_frame(&tx, buf);
        self.timer.delay_us(tx.timing.inter_frame_us);
        result
    }

    /// Wake the peripheral from low-power mode
    pub fn wake(&mut self, bus: BusId) -> Result<(), BusError> {
        self.check_bus(bus)?;
        debug!("st1wire {}: wake", bus);
        self.line.set_as_output(bus);
        self.line.set_low(bus);
        self.timer.delay_us(WAKE_LOW_US);
        self.line.set_high(bus);
        self.timer.delay_us(WAKE_SETTLE_US);
        Ok(())
    }

    /// Force a stuck bus back to idle
    ///
    /// Only the slow profile needs it; with the fast profile this does
    /// nothing.
    pub fn recover(&mut self, bus: BusId, speed: Speed) -> Result<(), BusError> {
        self.check_bus(bus)?;
        if speed == Speed::Fast {
            return Ok(());
        }
        debug!("st1wire {}: recovery", bus);
        self.line.set_as_output(bus);
        self.line.set_low(bus);
        self.timer.delay_us(RECOVERY_HOLD_US);
        self.line.set_high(bus);
        self.timer.delay_us(RECOVERY_HOLD_US);
        Ok(())
    }

    fn check_bus(&self, bus: BusId) -> Result<(), BusError> {
        if usize::from(bus) >= self.line.bus_count() {
            return Err(BusError::InvalidBus);
        }
        Ok(())
    }

    fn transaction(&self, bus: BusId, address: u8, speed: Speed) -> Result<Transaction, BusError> {
        self.check_bus(bus)?;
        Ok(Transaction {
            bus,
            address,
            speed,
            timing: *self.config.timing(speed),
        })
    }

    fn write_frame(&mut self, tx: &Transaction, payload: &[u8]) -> Result<(), BusError> {
        if tx.address != 0 {
            self.send_byte(tx, tx.address).inspect_err(|_| {
                warn!("st1wire {}: address {} not acknowledged", tx.bus, tx.address);
            })?;
            self.gap(tx);
        }

        let (prefix, width) = self.config.length_prefix.encode(payload.len() as u16);
        for (i, &byte) in prefix[..width].iter().enumerate() {
            if i > 0 {
                self.gap(tx);
            }
            self.send_byte(tx, byte).inspect_err(|_| {
                warn!("st1wire {}: length not acknowledged", tx.bus);
            })?;
        }

        for (i, &byte) in payload.iter().enumerate() {
            self.gap(tx);
            self.send_byte(tx, byte).inspect_err(|_| {
                warn!("st1wire {}: data byte {} not acknowledged", tx.bus, i);
            })?;
        }

        self.gap(tx);
        self.expect_frame_ack(tx)
    }

    fn read_frame(&mut self, tx: &Transaction, buf: &mut [u8]) -> Result<usize, BusError> {
        if tx.address != 0 {
            self.send_byte(tx, tx.address).inspect_err(|_| {
                warn!("st1wire {}: address {} not acknowledged", tx.bus, tx.address);
            })?;
            self.timer.delay_us(tx.timing.request_gap_us);
        }

        // A zero length asks the peripheral to transmit
        let width = self.config.length_prefix.width();
        for i in 0..width {
            if i > 0 {
                self.timer.delay_us(tx.timing.request_gap_us);
            }
            self.send_byte(tx, READ_REQUEST).inspect_err(|_| {
                warn!("st1wire {}: read request not acknowledged", tx.bus);
            })?;
        }

        self.gap(tx);
        self.expect_frame_ack(tx)?;

        let mut prefix = [0u8; 2];
        for slot in prefix[..width].iter_mut() {
            self.gap(tx);
            *slot = self.receive_byte(tx)?;
        }
        let len = usize::from(self.config.length_prefix.decode(&prefix[..width]));
        if len > buf.len() {
            warn!("st1wire {}: frame of {} bytes exceeds buffer", tx.bus, len);
            return Err(BusError::BufferOverrun);
        }

        for (i, slot) in buf[..len].iter_mut().enumerate() {
            self.gap(tx);
            *slot = self.receive_byte(tx).inspect_err(|_| {
                warn!("st1wire {}: data byte {} lost", tx.bus, i);
            })?;
        }
        Ok(len)
    }

    /// Read the peripheral's acknowledgment byte
    fn expect_frame_ack(&mut self, tx: &Transaction) -> Result<(), BusError> {
        match self.receive_byte(tx) {
            Ok(FRAME_ACK) => Ok(()),
            Ok(other) => {
                warn!("st1wire {}: frame ack {=u8:#x}", tx.bus, other);
                Err(BusError::AckError)
            }
            Err(BusError::ReceiveTimeout) => {
                warn!("st1wire {}: frame ack timeout", tx.bus);
                Err(BusError::AckError)
            }
            Err(e) => Err(e),
        }
    }

    /// Wait for an idle line and drive the start condition
    fn start_condition(&mut self, tx: &Transaction) -> Result<(), BusError> {
        self.arbitrate(tx).inspect_err(|_| {
            warn!("st1wire {}: arbitration lost", tx.bus);
        })?;

        self.line.set_as_output(tx.bus);
        self.line.set_low(tx.bus);
        self.timer.delay_us(tx.timing.start_us);
        self.line.set_high(tx.bus);
        if tx.speed == Speed::Slow {
            // Let the peripheral's regulator settle on line power
            self.timer.delay_us(tx.timing.inter_byte_us);
        }
        Ok(())
    }

    /// Idle detection: the released line must stay HIGH for `idle_us`
    fn arbitrate(&mut self, tx: &Transaction) -> Result<(), BusError> {
        self.line.set_as_input(tx.bus);
        for _ in 0..self.config.arbitration_attempts {
            if self.line_idle(tx) {
                // Someone grabbed the line right after the idle window
                if self.line.is_low(tx.bus) {
                    return Err(BusError::ArbitrationFault);
                }
                return Ok(());
            }
            self.timer.delay_us(tx.timing.idle_us);
        }
        Err(BusError::ArbitrationFault)
    }

    fn line_idle(&mut self, tx: &Transaction) -> bool {
        self.timer.start_timeout(tx.timing.idle_us);
        while self.line.is_high(tx.bus) {
            if self.timer.is_timeout_expired() {
                return true;
            }
        }
        false
    }

    fn gap(&mut self, tx: &Transaction) {
        self.timer.delay_us(tx.timing.inter_byte_us);
    }

    fn send_byte(&mut self, tx: &Transaction, byte: u8) -> Result<(), BusError> {
        let (line, timer) = (&mut self.line, &mut self.timer);
        self.cs
            .with(|| Transceiver::new(line, timer, tx.bus, &tx.timing).send_byte(byte))
    }

    fn receive_byte(&mut self, tx: &Transaction) -> Result<u8, BusError> {
        let (line, timer) = (&mut self.line, &mut self.timer);
        self.cs
            .with(|| Transceiver::new(line, timer, tx.bus, &tx.timing).receive_byte())
    }
}
