//! Services lookup message format
//!
//! Request (by name):
//! ┌──────────┬──────────────┐
//! │ name NUL │ protocol NUL │      protocol kosong = "any"
//! └──────────┴──────────────┘
//!
//! Request (by port):
//! ┌──────────┬──────────────┬──────────────┐
//! │ u32 port │ u32 reserved │ protocol NUL │
//! └──────────┴──────────────┴──────────────┘
//!
//! Response:
//! ┌──────────────────┬──────────────┬──────────────────┐
//! │ u32 result_count │ u32 reserved │ RecordBlock * N  │
//! └──────────────────┴──────────────┴──────────────────┘
//!
//! RecordBlock:
//! ┌──────────┬─────────────────┬──────────┬──────────────┬────────────────┐
//! │ u32 port │ u32 alias_count │ name NUL │ protocol NUL │ alias NUL * n  │
//! └──────────┴─────────────────┴──────────┴──────────────┴────────────────┘
//!
//! Semua integer dalam network byte order.

use crate::error::{ProtocolError, Result};

/// Envelope header size (`result_count` + reserved)
pub const ENVELOPE_SIZE: usize = 8;

/// Fixed part of a record block (`port` + `alias_count`)
pub const RECORD_FIXED_SIZE: usize = 8;

/// Smallest possible record block: fixed part, 1-char name + NUL, empty
/// protocol NUL.
pub const MIN_RECORD_SIZE: usize = RECORD_FIXED_SIZE + 3;

/// Backend command codes
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    GetServByName = 0x0051,
    GetServByPort = 0x0052,
}

/// A services lookup request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceQuery<'a> {
    /// Lookup by service name, optionally restricted to a protocol
    ByName {
        name: &'a str,
        protocol: Option<&'a str>,
    },
    /// Lookup by port, optionally restricted to a protocol
    ByPort {
        port: u16,
        protocol: Option<&'a str>,
    },
}

impl<'a> ServiceQuery<'a> {
    pub fn by_name(name: &'a str, protocol: Option<&'a str>) -> Self {
        Self::ByName { name, protocol }
    }

    pub fn by_port(port: u16, protocol: Option<&'a str>) -> Self {
        Self::ByPort { port, protocol }
    }

    /// Command code untuk query ini
    #[inline(always)]
    pub fn command(&self) -> Command {
        match self {
            Self::ByName { .. } => Command::GetServByName,
            Self::ByPort { .. } => Command::GetServByPort,
        }
    }

    /// Protocol filter; absent means "any" and goes out as an empty string.
    #[inline(always)]
    pub fn protocol(&self) -> &'a str {
        match self {
            Self::ByName { protocol, .. } | Self::ByPort { protocol, .. } => {
                protocol.unwrap_or("")
            }
        }
    }
}

/// Length check for caller-supplied strings.
///
/// Rejects strings longer than `max_len` or holding a NUL byte. Empty strings
/// pass; emptiness is the caller's policy.
pub fn checked_name_len(s: &str, max_len: usize, what: &'static str) -> Result<usize> {
    let bytes = s.as_bytes();
    if bytes.len() > max_len || bytes.contains(&0) {
        return Err(ProtocolError::InvalidArgument(what));
    }
    Ok(bytes.len())
}

/// Response envelope, record bytes not yet decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Envelope<'a> {
    /// `result_count == 0`
    NotFound,
    /// Exactly one record follows
    Single(&'a [u8]),
}

impl<'a> Envelope<'a> {
    /// Parse envelope header dan dispatch berdasarkan `result_count`.
    ///
    /// Record tidak di-parse di sini; 0 langsung `NotFound`, >= 2 langsung
    /// `MalformedCount`.
    pub fn parse(raw: &'a [u8]) -> Result<Self> {
        if raw.len() < ENVELOPE_SIZE {
            return Err(ProtocolError::Truncated {
                needed: ENVELOPE_SIZE,
                available: raw.len(),
            });
        }

        match read_u32_be(raw, 0) {
            0 => Ok(Self::NotFound),
            1 => Ok(Self::Single(&raw[ENVELOPE_SIZE..])),
            n => Err(ProtocolError::MalformedCount(n)),
        }
    }
}

/// Read a network-order u32; caller guarantees `at + 4 <= buf.len()`.
#[inline(always)]
pub(crate) fn read_u32_be(buf: &[u8], at: usize) -> u32 {
    u32::from_be_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}
