use stacker_bus::BusError;
use stacker_icd::ProtocolError;
use thiserror::Error;

/// Master-side link errors.
///
/// `Bus` and `ShortRead` are transaction failures and feed the fallback-clock
/// hysteresis; `NotReady` and `Protocol` are local conditions and do not.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LinkError {
    /// The link has not completed a successful `init()` or `ping()` yet.
    #[error("link not ready, node never answered")]
    NotReady,

    /// The bus layer reported a transaction failure.
    #[error("bus error: {0}")]
    Bus(#[from] BusError),

    /// The node answered with fewer bytes than the register holds.
    #[error("short read on {register}: expected {expected} bytes, got {actual}")]
    ShortRead {
        register: &'static str,
        expected: usize,
        actual: usize,
    },

    /// The node's bytes failed to decode.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Requested bus clock outside the supported 10 kHz..=1 MHz range.
    #[error("unsupported bus frequency: {0} Hz")]
    InvalidFrequency(u32),
}
