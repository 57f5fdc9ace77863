//! Error taxonomy untuk encoder/decoder.
//!
//! `OutOfRange` sengaja dipisah dari `Truncated`: caller (NSS layer) bereaksi
//! berbeda. Out-of-range artinya "ulangi dengan buffer lebih besar", yang lain
//! adalah lookup failure biasa.

use thiserror::Error;

/// Result alias for codec operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Failures detected while encoding a request or decoding a response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// Caller-supplied name or protocol is empty, too long, or holds an
    /// embedded NUL.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// Response ended before the structure it claims to contain.
    #[error("response truncated: need {needed} bytes, {available} left")]
    Truncated { needed: usize, available: usize },

    /// Response is well formed but the destination buffer is too small.
    #[error("destination buffer too small: need {needed} bytes, {available} left")]
    OutOfRange { needed: usize, available: usize },

    /// Result count other than 0 or 1.
    #[error("unsupported result count: {0}")]
    MalformedCount(u32),

    /// Bytes left over after the record (strict mode only).
    #[error("{0} trailing bytes after record")]
    TrailingBytes(usize),
}

impl ProtocolError {
    /// errno value reported to NSS callers.
    pub fn errno(&self) -> i32 {
        match self {
            Self::InvalidArgument(_) => libc::EINVAL,
            Self::OutOfRange { .. } => libc::ERANGE,
            Self::Truncated { .. } | Self::MalformedCount(_) | Self::TrailingBytes(_) => {
                libc::EBADMSG
            }
        }
    }

    /// True when the only problem is destination capacity.
    #[inline(always)]
    pub fn is_out_of_range(&self) -> bool {
        matches!(self, Self::OutOfRange { .. })
    }
}
