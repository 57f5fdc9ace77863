//! Transport collaborator
//!
//! Socket, framing dan retry-on-disconnect ada di luar crate ini. Yang
//! dibutuhkan client hanya satu round trip: kirim payload, terima response
//! mentah (envelope + record).

use std::io;

use thiserror::Error;

use crate::protocol::Command;

/// Failures reported by a [`Transport`].
#[derive(Debug, Error)]
pub enum TransportError {
    /// Backend is not running or its socket is missing
    #[error("lookup backend unavailable")]
    Unavailable,

    #[error("transport I/O error: {0}")]
    Io(#[from] io::Error),

    /// Backend answered with an error status
    #[error("backend returned errno {0}")]
    Status(i32),
}

impl TransportError {
    /// errno value reported to NSS callers.
    pub fn errno(&self) -> i32 {
        match self {
            Self::Unavailable => libc::ENOENT,
            Self::Io(e) => e.raw_os_error().unwrap_or(libc::EIO),
            Self::Status(errno) => *errno,
        }
    }
}

/// One request/response exchange with the lookup backend.
pub trait Transport {
    /// Send `payload` under `command`, return the raw response bytes.
    fn make_request(&mut self, command: Command, payload: &[u8]) -> Result<Vec<u8>, TransportError>;
}
