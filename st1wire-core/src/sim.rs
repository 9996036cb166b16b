//! Simulated single-wire bus for host tests
//!
//! A microsecond clock, an open-drain line (wired-AND of host and peer) and
//! a scripted peripheral. Every host line operation is recorded; whenever
//! the host releases the line, the peripheral looks at the LOW pulses the
//! host drove since the previous release and reacts:
//!
//! - a LOW longer than [`START_MIN_US`] is a start condition
//! - nine LOW pulses are a sync pulse plus 8 data bits, decoded with the
//!   bit codec and acknowledged
//! - anything shorter is a byte request, answered from the transmit queue

use std::cell::{Ref, RefCell, RefMut};
use std::collections::VecDeque;
use std::rc::Rc;
use std::vec::Vec;

use st1wire_hal::{BusId, BusLine, BusTimer, CriticalSection};

use crate::codec::{self, ByteAccumulator};
use crate::config::{LengthPrefix, Speed, St1WireConfig, Timing};
use crate::engine::{St1Wire, FRAME_ACK};

/// Shortest LOW the peripheral treats as a start condition
pub const START_MIN_US: u64 = 50;

/// Each line sample costs one microsecond of simulated time
const POLL_US: u64 = 1;

/// Frame-level state of the simulated peripheral
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Address,
    LengthHigh,
    LengthLow,
    Payload,
    Respond,
}

/// Scripted peripheral
#[derive(Debug)]
pub struct Peer {
    /// Device address to expect after the start condition (0 = none)
    pub address: u8,
    /// Length prefix width the peripheral speaks
    pub prefix: LengthPrefix,
    /// Acknowledge every byte
    pub ack_bytes: bool,
    /// Acknowledge only this many bytes in total
    pub ack_limit: Option<usize>,
    /// Hold the acknowledgment LOW this long instead of the profile's ack
    pub ack_hold_us: Option<u32>,
    /// Stop transmitting after this many bits of a byte
    pub truncate_bits: Option<usize>,
    /// Stop after `bits` bits of the byte served at `index` since the
    /// last start condition, as `(index, bits)`
    pub truncate_at: Option<(usize, usize)>,
    /// Byte returned as frame acknowledgment
    pub frame_ack: u8,
    /// Payload served on a read request
    pub response: Vec<u8>,
    /// Every byte decoded from the host
    pub received: Vec<u8>,
    /// Completed write frames
    pub frames: Vec<Vec<u8>>,
    /// Start conditions seen
    pub starts: usize,
    phase: Phase,
    length_high: u16,
    remaining: usize,
    /// Bytes served since the last start condition
    served: usize,
    pending: Vec<u8>,
    tx: VecDeque<u8>,
}

impl Peer {
    fn new() -> Self {
        Self {
            address: 0,
            prefix: LengthPrefix::TwoBytes,
            ack_bytes: true,
            ack_limit: None,
            ack_hold_us: None,
            truncate_bits: None,
            truncate_at: None,
            frame_ack: FRAME_ACK,
            response: Vec::new(),
            received: Vec::new(),
            frames: Vec::new(),
            starts: 0,
            phase: Phase::Idle,
            length_high: 0,
            remaining: 0,
            served: 0,
            pending: Vec::new(),
            tx: VecDeque::new(),
        }
    }

    /// Queue raw bytes to answer byte requests with
    pub fn queue(&mut self, bytes: &[u8]) {
        self.tx.extend(bytes.iter().copied());
    }

    fn length_phase(&self) -> Phase {
        match self.prefix {
            LengthPrefix::OneByte => Phase::LengthLow,
            LengthPrefix::TwoBytes => Phase::LengthHigh,
        }
    }

    fn on_start(&mut self) {
        self.starts += 1;
        self.tx.clear();
        self.served = 0;
        self.length_high = 0;
        self.phase = if self.address != 0 {
            Phase::Address
        } else {
            self.length_phase()
        };
    }

    /// Returns whether the byte is acknowledged
    fn on_byte(&mut self, byte: u8) -> bool {
        self.received.push(byte);
        let over_limit = self.ack_limit.is_some_and(|n| self.received.len() > n);
        if !self.ack_bytes || over_limit {
            return false;
        }
        match self.phase {
            Phase::Address => {
                if byte != self.address {
                    self.phase = Phase::Idle;
                    return false;
                }
                self.phase = self.length_phase();
            }
            Phase::LengthHigh => {
                self.length_high = u16::from(byte);
                self.phase = Phase::LengthLow;
            }
            Phase::LengthLow => {
                let len = usize::from((self.length_high << 8) | u16::from(byte));
                if len == 0 {
                    self.tx.push_back(self.frame_ack);
                    let (prefix, width) = self.prefix.encode(self.response.len() as u16);
                    let response = self.response.clone();
                    self.queue(&prefix[..width]);
                    self.queue(&response);
                    self.phase = Phase::Respond;
                } else {
                    self.pending.clear();
                    self.remaining = len;
                    self.phase = Phase::Payload;
                }
            }
            Phase::Payload => {
                self.pending.push(byte);
                self.remaining -= 1;
                if self.remaining == 0 {
                    self.frames.push(self.pending.clone());
                    self.tx.push_back(self.frame_ack);
                    self.phase = Phase::Respond;
                }
            }
            Phase::Idle | Phase::Respond => {}
        }
        true
    }
}

/// Simulated world shared by the line, timer and critical section handles
#[derive(Debug)]
struct World {
    now: u64,
    deadline: u64,
    timing: Timing,
    output: bool,
    latch_high: bool,
    /// Host LOW pulses as (fall, rise) times
    host_lows: Vec<(u64, u64)>,
    /// Fall time of the host LOW in progress
    host_fall: Option<u64>,
    /// First host LOW not yet seen by the peer
    unseen: usize,
    peer_lows: Vec<(u64, u64)>,
    stuck_low: bool,
    cs_depth: u32,
    cs_entries: u32,
    peer: Peer,
}

impl World {
    fn host_driving_low(&self) -> bool {
        self.output && !self.latch_high
    }

    fn update_drive(&mut self) {
        match (self.host_fall, self.host_driving_low()) {
            (None, true) => self.host_fall = Some(self.now),
            (Some(fall), false) => {
                self.host_lows.push((fall, self.now));
                self.host_fall = None;
            }
            _ => {}
        }
    }

    fn level(&self) -> bool {
        let now = self.now;
        let peer_low = self.peer_lows.iter().any(|&(a, b)| a <= now && now < b);
        !(self.stuck_low || self.host_driving_low() || peer_low)
    }

    fn on_release(&mut self) {
        let now = self.now;
        self.peer_lows.retain(|&(_, end)| end > now);

        let mut lows = &self.host_lows[self.unseen..];
        self.unseen = self.host_lows.len();

        if let Some(pos) = lows.iter().rposition(|&(a, b)| b - a >= START_MIN_US) {
            self.peer.on_start();
            lows = &lows[pos + 1..];
        }

        if lows.len() >= 9 {
            let frame = &lows[lows.len() - 9..];
            let mut acc = ByteAccumulator::new();
            for pair in frame.windows(2) {
                let (prev, bit) = (pair[0], pair[1]);
                acc.push((bit.0 - prev.1) as u32, (bit.1 - bit.0) as u32);
            }
            let Some(byte) = acc.finish() else { return };
            if self.peer.on_byte(byte) {
                let hold = self.peer.ack_hold_us.unwrap_or(self.timing.ack_us);
                let start = now + 1;
                self.peer_lows.push((start, start + u64::from(hold)));
            }
        } else if let Some(byte) = self.peer.tx.pop_front() {
            let index = self.peer.served;
            self.peer.served += 1;
            let bits = match self.peer.truncate_at {
                Some((at, bits)) if at == index => bits,
                _ => self.peer.truncate_bits.unwrap_or(8),
            };
            let mut t = now;
            for pulse in codec::encode_byte(byte, &self.timing).take(bits) {
                let fall = t + u64::from(pulse.high_us);
                let rise = fall + u64::from(pulse.low_us);
                self.peer_lows.push((fall, rise));
                t = rise;
            }
        }
    }
}

/// Handle to a simulated bus
#[derive(Clone)]
pub struct Sim(Rc<RefCell<World>>);

impl Sim {
    pub fn new(speed: Speed) -> Self {
        let timing = *St1WireConfig::default().timing(speed);
        Self(Rc::new(RefCell::new(World {
            now: 0,
            deadline: 0,
            timing,
            output: false,
            latch_high: true,
            host_lows: Vec::new(),
            host_fall: None,
            unseen: 0,
            peer_lows: Vec::new(),
            stuck_low: false,
            cs_depth: 0,
            cs_entries: 0,
            peer: Peer::new(),
        })))
    }

    pub fn line(&self) -> SimLine {
        SimLine(self.clone())
    }

    pub fn timer(&self) -> SimTimer {
        SimTimer(self.clone())
    }

    pub fn section(&self) -> SimSection {
        SimSection(self.clone())
    }

    pub fn engine(&self, config: St1WireConfig) -> St1Wire<SimLine, SimTimer, SimSection> {
        St1Wire::new(self.line(), self.timer(), self.section(), config).unwrap()
    }

    pub fn peer(&self) -> Ref<'_, Peer> {
        Ref::map(self.0.borrow(), |w| &w.peer)
    }

    pub fn peer_mut(&self) -> RefMut<'_, Peer> {
        RefMut::map(self.0.borrow_mut(), |w| &mut w.peer)
    }

    pub fn now(&self) -> u64 {
        self.0.borrow().now
    }

    pub fn host_lows(&self) -> Vec<(u64, u64)> {
        self.0.borrow().host_lows.clone()
    }

    pub fn is_output(&self) -> bool {
        self.0.borrow().output
    }

    /// Let the peer hold the line LOW during `[start, end)`
    pub fn pull_low(&self, start: u64, end: u64) {
        self.0.borrow_mut().peer_lows.push((start, end));
    }

    pub fn set_stuck_low(&self, stuck: bool) {
        self.0.borrow_mut().stuck_low = stuck;
    }

    /// Critical sections entered so far
    pub fn cs_entries(&self) -> u32 {
        self.0.borrow().cs_entries
    }

    pub fn cs_depth(&self) -> u32 {
        self.0.borrow().cs_depth
    }
}

pub struct SimLine(Sim);

impl BusLine for SimLine {
    fn set_as_input(&mut self, _bus: BusId) {
        let mut w = self.0 .0.borrow_mut();
        w.output = false;
        w.update_drive();
        w.on_release();
    }

    fn set_as_output(&mut self, _bus: BusId) {
        let mut w = self.0 .0.borrow_mut();
        w.output = true;
        w.update_drive();
    }

    fn set_high(&mut self, _bus: BusId) {
        let mut w = self.0 .0.borrow_mut();
        w.latch_high = true;
        w.update_drive();
    }

    fn set_low(&mut self, _bus: BusId) {
        let mut w = self.0 .0.borrow_mut();
        w.latch_high = false;
        w.update_drive();
    }

    fn is_high(&mut self, _bus: BusId) -> bool {
        let mut w = self.0 .0.borrow_mut();
        let level = w.level();
        w.now += POLL_US;
        level
    }
}

pub struct SimTimer(Sim);

impl BusTimer for SimTimer {
    fn delay_us(&mut self, us: u32) {
        self.0 .0.borrow_mut().now += u64::from(us);
    }

    fn start_timeout(&mut self, us: u32) {
        let mut w = self.0 .0.borrow_mut();
        w.deadline = w.now + u64::from(us);
    }

    fn is_timeout_expired(&mut self) -> bool {
        let w = self.0 .0.borrow();
        w.now >= w.deadline
    }
}

pub struct SimSection(Sim);

impl CriticalSection for SimSection {
    fn with<R>(&mut self, f: impl FnOnce() -> R) -> R {
        {
            let mut w = self.0 .0.borrow_mut();
            assert_eq!(w.cs_depth, 0, "critical sections must not nest");
            w.cs_depth += 1;
            w.cs_entries += 1;
        }
        let result = f();
        self.0 .0.borrow_mut().cs_depth -= 1;
        result
    }
}
