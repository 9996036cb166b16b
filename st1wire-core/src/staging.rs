//! Frame staging buffer
//!
//! Command layers build a frame in pieces (header, payload, MAC) and read
//! responses the same way. The stager collects the pieces of an outgoing
//! frame and hands the whole frame to the engine in one call, and holds a
//! complete incoming frame while the caller drains it chunk by chunk.
//!
//! ```text
//!   send_start(len) ─► send_continue(..)* ─► send_stop(..) ──► send_frame
//!
//!   receive_start(..) ──► receive_frame ─► receive_continue(..)* ─► receive_stop(..)
//! ```

use heapless::Vec;
use st1wire_hal::{BusId, BusLine, BusTimer, CriticalSection};

use crate::config::{Speed, MAX_FRAME_LEN};
use crate::engine::St1Wire;
use crate::error::BusError;

/// Default transfer buffer size, large enough for the longest frame
pub const TRANSFER_BUFFER_LEN: usize = MAX_FRAME_LEN;

/// Transfer buffer with a chunked send/receive interface
pub struct FrameStager<const N: usize = TRANSFER_BUFFER_LEN> {
    buf: Vec<u8, N>,
    /// Declared length of the frame being built
    frame_len: usize,
    /// Read position in a received frame
    cursor: usize,
}

impl<const N: usize> FrameStager<N> {
    /// Create an empty stager
    pub const fn new() -> Self {
        Self {
            buf: Vec::new(),
            frame_len: 0,
            cursor: 0,
        }
    }

    /// Bytes staged or received so far
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Bytes of the received frame not yet handed out
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.cursor
    }

    /// Begin an outgoing frame of `len` bytes
    pub fn send_start(&mut self, len: usize) -> Result<(), BusError> {
        if len > N {
            return Err(BusError::BufferOverrun);
        }
        self.buf.clear();
        self.frame_len = len;
        self.cursor = 0;
        Ok(())
    }

    /// Append a chunk, or `size` zero bytes when `data` is `None`
    pub fn send_continue(&mut self, data: Option<&[u8]>, size: usize) -> Result<(), BusError> {
        if size == 0 {
            return Ok(());
        }
        if self.buf.len() + size > self.frame_len {
            return Err(BusError::BufferOverrun);
        }
        match data {
            Some(data) => {
                let chunk = data.get(..size).ok_or(BusError::BufferOverrun)?;
                self.buf
                    .extend_from_slice(chunk)
                    .map_err(|_| BusError::BufferOverrun)?;
            }
            None => {
                let len = self.buf.len() + size;
                self.buf
                    .resize(len, 0)
                    .map_err(|_| BusError::BufferOverrun)?;
            }
        }
        Ok(())
    }

    /// Append the last chunk and send the frame
    ///
    /// Anything the caller did not fill up to the declared length is sent
    /// as zeros.
    pub fn send_stop<L, T, C>(
        &mut self,
        engine: &mut St1Wire<L, T, C>,
        bus: BusId,
        address: u8,
        speed: Speed,
        data: Option<&[u8]>,
        size: usize,
    ) -> Result<(), BusError>
    where
        L: BusLine,
        T: BusTimer,
        C: CriticalSection,
    {
        self.send_continue(data, size)?;
        self.buf
            .resize(self.frame_len, 0)
            .map_err(|_| BusError::BufferOverrun)?;
        engine.send_frame(bus, address, speed, &self.buf)
    }

    /// Receive a whole frame of at most `expected` bytes into the buffer
    ///
    /// Returns the length the peripheral announced.
    pub fn receive_start<L, T, C>(
        &mut self,
        engine: &mut St1Wire<L, T, C>,
        bus: BusId,
        address: u8,
        speed: Speed,
        expected: usize,
    ) -> Result<usize, BusError>
    where
        L: BusLine,
        T: BusTimer,
        C: CriticalSection,
    {
        if expected > N {
            return Err(BusError::BufferOverrun);
        }
        self.buf.clear();
        self.cursor = 0;
        self.buf
            .resize(N, 0)
            .map_err(|_| BusError::BufferOverrun)?;

        let result = engine.receive_frame(bus, address, speed, &mut self.buf);
        self.buf.truncate(*result.as_ref().unwrap_or(&0));
        result
    }

    /// Copy the next `size` bytes out, or skip them when `dest` is `None`
    pub fn receive_continue(
        &mut self,
        dest: Option<&mut [u8]>,
        size: usize,
    ) -> Result<(), BusError> {
        if size > self.remaining() {
            return Err(BusError::BufferOverrun);
        }
        let chunk = &self.buf[self.cursor..self.cursor + size];
        if let Some(dest) = dest {
            dest.get_mut(..size)
                .ok_or(BusError::BufferOverrun)?
                .copy_from_slice(chunk);
        }
        self.cursor += size;
        Ok(())
    }

    /// Copy the last chunk out and rewind the read cursor
    pub fn receive_stop(&mut self, dest: Option<&mut [u8]>, size: usize) -> Result<(), BusError> {
        let result = self.receive_continue(dest, size);
        self.cursor = 0;
        result
    }
}

impl<const N: usize> Default for FrameStager<N> {
    fn default() -> Self {
        Self::new()
    }
}
