//! Bus fault taxonomy

use core::fmt;

/// Faults reported by the ST1Wire engine
///
/// Every sub-operation returns its fault immediately; the engine never
/// retries. Retry policy belongs to the caller, see [`BusError::is_retryable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusError {
    /// Line never went idle, or was pulled low right after idle detection
    ArbitrationFault,
    /// Peer did not acknowledge a byte, or returned a wrong frame ack
    AckError,
    /// A bit phase exceeded the receive timeout
    ReceiveTimeout,
    /// Frame length exceeds the transfer buffer
    BufferOverrun,
    /// Payload does not fit the length prefix or the maximum frame length
    FrameTooLong,
    /// Bus index outside the configured bus set
    InvalidBus,
}

impl BusError {
    /// Numeric fault code for reporting (0 is reserved for success)
    pub fn code(self) -> u8 {
        match self {
            BusError::ArbitrationFault => 1,
            BusError::AckError => 2,
            BusError::ReceiveTimeout => 3,
            BusError::BufferOverrun => 4,
            BusError::FrameTooLong => 5,
            BusError::InvalidBus => 6,
        }
    }

    /// Whether repeating the whole frame may succeed
    ///
    /// Arbitration faults need a back-off before the retry; ack and receive
    /// faults may be bus noise or a peripheral whose supply is still
    /// settling. Buffer and argument faults fail again on every retry.
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            BusError::ArbitrationFault | BusError::AckError | BusError::ReceiveTimeout
        )
    }
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            BusError::ArbitrationFault => "bus arbitration fault",
            BusError::AckError => "bus acknowledge error",
            BusError::ReceiveTimeout => "bus receive timeout",
            BusError::BufferOverrun => "frame exceeds transfer buffer",
            BusError::FrameTooLong => "frame length does not fit length prefix",
            BusError::InvalidBus => "bus index out of range",
        };
        f.write_str(msg)
    }
}
