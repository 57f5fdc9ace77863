//! Services lookup client
//!
//! Entry point per jenis query. Request/response round trip dijalankan di
//! bawah exchange lock sehingga hanya satu request in flight di transport.
//!
//! Status mengikuti konvensi NSS reentrant API: `TryAgain` dengan errno
//! `ERANGE` artinya "ulangi query yang sama dengan buffer lebih besar".
//! Hanya [`LookupOutcome::BufferTooSmall`] yang membawa arti itu; `ERANGE`
//! yang datang dari backend tetap `TryAgain` biasa.

use std::sync::{Mutex, PoisonError};

use tracing::{debug, warn};

use super::transport::{Transport, TransportError};
use crate::config::LookupConfig;
use crate::protocol::{decode_response, Decoded, Encoder, ServiceEntry, ServiceQuery};

/// NSS status codes, values as in glibc's `enum nss_status`.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NssStatus {
    TryAgain = -2,
    Unavail = -1,
    NotFound = 0,
    Success = 1,
}

/// Result of one lookup
#[derive(Debug)]
pub enum LookupOutcome<'a> {
    /// Record decoded into the caller's buffer
    Found(ServiceEntry<'a>),
    /// No record; errno is 0, or `EINVAL` for a rejected argument
    NotFound { errno: i32 },
    /// Destination buffer cannot hold the record (`TryAgain`, `ERANGE`)
    BufferTooSmall,
    /// Lookup failed for any other reason
    TryAgain { errno: i32 },
    /// Backend not reachable, or operation not supported
    Unavailable,
}

impl<'a> LookupOutcome<'a> {
    pub fn status(&self) -> NssStatus {
        match self {
            Self::Found(_) => NssStatus::Success,
            Self::NotFound { .. } => NssStatus::NotFound,
            Self::BufferTooSmall | Self::TryAgain { .. } => NssStatus::TryAgain,
            Self::Unavailable => NssStatus::Unavail,
        }
    }

    pub fn errno(&self) -> i32 {
        match self {
            Self::NotFound { errno } | Self::TryAgain { errno } => *errno,
            Self::BufferTooSmall => libc::ERANGE,
            Self::Found(_) | Self::Unavailable => 0,
        }
    }

    /// True iff retrying with a larger buffer may succeed.
    #[inline(always)]
    pub fn needs_larger_buffer(&self) -> bool {
        matches!(self, Self::BufferTooSmall)
    }

    pub fn entry(&self) -> Option<&ServiceEntry<'a>> {
        match self {
            Self::Found(entry) => Some(entry),
            _ => None,
        }
    }
}

struct Exchange<T> {
    transport: T,
    encoder: Encoder,
}

/// Lookup client over a [`Transport`].
pub struct ServiceClient<T> {
    exchange: Mutex<Exchange<T>>,
    config: LookupConfig,
}

impl<T: Transport> ServiceClient<T> {
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, LookupConfig::default())
    }

    pub fn with_config(transport: T, config: LookupConfig) -> Self {
        let config = config.clamped();
        Self {
            exchange: Mutex::new(Exchange {
                transport,
                encoder: Encoder::new(config),
            }),
            config,
        }
    }

    pub fn config(&self) -> &LookupConfig {
        &self.config
    }

    /// `getservbyname_r`: lookup by name, optional protocol filter
    pub fn get_by_name<'b>(
        &self,
        name: &str,
        protocol: Option<&str>,
        buf: &'b mut [u8],
    ) -> LookupOutcome<'b> {
        self.lookup(&ServiceQuery::by_name(name, protocol), buf)
    }

    /// `getservbyport_r`: lookup by port, optional protocol filter
    pub fn get_by_port<'b>(
        &self,
        port: u16,
        protocol: Option<&str>,
        buf: &'b mut [u8],
    ) -> LookupOutcome<'b> {
        self.lookup(&ServiceQuery::by_port(port, protocol), buf)
    }

    /// Satu round trip: encode, kirim, decode ke `buf`.
    pub fn lookup<'b>(&self, query: &ServiceQuery<'_>, buf: &'b mut [u8]) -> LookupOutcome<'b> {
        if buf.is_empty() {
            debug!(?query, "empty destination buffer");
            return LookupOutcome::BufferTooSmall;
        }

        // Poisoned lock: tidak ada state yang perlu diperbaiki
        let mut exchange = self.exchange.lock().unwrap_or_else(PoisonError::into_inner);
        let Exchange { transport, encoder } = &mut *exchange;

        let payload = match encoder.encode(query) {
            Ok(payload) => payload,
            Err(e) => {
                debug!(?query, error = %e, "rejected lookup argument");
                return LookupOutcome::NotFound { errno: e.errno() };
            }
        };

        let raw = match transport.make_request(query.command(), payload) {
            Ok(raw) => raw,
            Err(TransportError::Unavailable) => {
                debug!(command = ?query.command(), "lookup backend unavailable");
                return LookupOutcome::Unavailable;
            }
            Err(e) => {
                warn!(command = ?query.command(), error = %e, "lookup request failed");
                return LookupOutcome::TryAgain { errno: e.errno() };
            }
        };

        match decode_response(&raw, buf, &self.config) {
            Ok(Decoded::NotFound) => {
                debug!(?query, "service not found");
                LookupOutcome::NotFound { errno: 0 }
            }
            Ok(Decoded::Found(entry)) => {
                debug!(?query, port = entry.port(), aliases = entry.alias_count(), "service found");
                LookupOutcome::Found(entry)
            }
            Err(e) if e.is_out_of_range() => {
                debug!(?query, error = %e, "destination buffer too small");
                LookupOutcome::BufferTooSmall
            }
            Err(e) => {
                warn!(?query, error = %e, "malformed lookup response");
                LookupOutcome::TryAgain { errno: e.errno() }
            }
        }
    }

    /// `setservent`: enumeration is not provided by the backend.
    pub fn set_enumeration(&self) -> NssStatus {
        debug!("service enumeration unavailable");
        NssStatus::Unavail
    }

    /// `getservent_r`: always unavailable, `buf` is left untouched.
    pub fn next_entry<'b>(&self, _buf: &'b mut [u8]) -> LookupOutcome<'b> {
        debug!("service enumeration unavailable");
        LookupOutcome::Unavailable
    }

    /// `endservent`
    pub fn end_enumeration(&self) -> NssStatus {
        NssStatus::Unavail
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Command;

    /// Scripted transport: satu response untuk setiap request
    struct Scripted {
        responses: Vec<Result<Vec<u8>, TransportError>>,
        seen: Vec<(Command, Vec<u8>)>,
    }

    impl Scripted {
        fn new(responses: Vec<Result<Vec<u8>, TransportError>>) -> Self {
            Self {
                responses,
                seen: Vec::new(),
            }
        }
    }

    impl Transport for Scripted {
        fn make_request(
            &mut self,
            command: Command,
            payload: &[u8],
        ) -> Result<Vec<u8>, TransportError> {
            self.seen.push((command, payload.to_vec()));
            self.responses.remove(0)
        }
    }

    fn found_response(port: u32, name: &str, proto: &str, aliases: &[&str]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&1u32.to_be_bytes());
        out.extend_from_slice(&[0; 4]);
        out.extend_from_slice(&port.to_be_bytes());
        out.extend_from_slice(&(aliases.len() as u32).to_be_bytes());
        for s in [name, proto].iter().chain(aliases) {
            out.extend_from_slice(s.as_bytes());
            out.push(0);
        }
        out
    }

    #[test]
    fn test_get_by_name_found() {
        let client = ServiceClient::new(Scripted::new(vec![Ok(found_response(
            80,
            "http",
            "tcp",
            &["www"],
        ))]));
        let mut buf = [0u8; 256];

        let outcome = client.get_by_name("http", Some("tcp"), &mut buf);
        assert_eq!(outcome.status(), NssStatus::Success);
        let entry = outcome.entry().unwrap();
        assert_eq!(entry.name(), b"http");
        assert_eq!(entry.alias(0), Some(&b"www"[..]));
        drop(outcome);

        let exchange = client.exchange.lock().unwrap();
        assert_eq!(
            exchange.transport.seen,
            vec![(Command::GetServByName, b"http\0tcp\0".to_vec())]
        );
    }

    #[test]
    fn test_get_by_port_sends_port_request() {
        let client = ServiceClient::new(Scripted::new(vec![Ok(vec![0; 8])]));
        let mut buf = [0u8; 64];

        let outcome = client.get_by_port(53, None, &mut buf);
        assert_eq!(outcome.status(), NssStatus::NotFound);
        assert_eq!(outcome.errno(), 0);

        let exchange = client.exchange.lock().unwrap();
        assert_eq!(
            exchange.transport.seen,
            vec![(Command::GetServByPort, vec![0, 0, 0, 53, 0, 0, 0, 0, 0])]
        );
    }

    #[test]
    fn test_invalid_name_skips_round_trip() {
        let client = ServiceClient::new(Scripted::new(vec![]));
        let mut buf = [0u8; 64];

        let outcome = client.get_by_name("", None, &mut buf);
        assert_eq!(outcome.status(), NssStatus::NotFound);
        assert_eq!(outcome.errno(), libc::EINVAL);
        assert!(client.exchange.lock().unwrap().transport.seen.is_empty());
    }

    #[test]
    fn test_empty_buffer_is_erange() {
        let client = ServiceClient::new(Scripted::new(vec![]));
        let mut empty: [u8; 0] = [];
        let outcome = client.get_by_name("http", None, &mut empty);
        assert!(matches!(outcome, LookupOutcome::BufferTooSmall));
        assert!(outcome.needs_larger_buffer());
        assert_eq!(outcome.status(), NssStatus::TryAgain);
        assert_eq!(outcome.errno(), libc::ERANGE);
    }

    #[test]
    fn test_small_buffer_asks_for_growth() {
        let client = ServiceClient::new(Scripted::new(vec![Ok(found_response(
            80,
            "http",
            "tcp",
            &["www", "web"],
        ))]));
        let mut buf = [0u8; 12];

        let outcome = client.get_by_name("http", None, &mut buf);
        assert_eq!(outcome.status(), NssStatus::TryAgain);
        assert_eq!(outcome.errno(), libc::ERANGE);
        assert!(outcome.needs_larger_buffer());
    }

    #[test]
    fn test_malformed_count_is_try_again_without_growth() {
        let mut raw = found_response(80, "http", "tcp", &[]);
        raw[..4].copy_from_slice(&2u32.to_be_bytes());
        let client = ServiceClient::new(Scripted::new(vec![Ok(raw)]));
        let mut buf = [0u8; 256];

        let outcome = client.get_by_name("http", None, &mut buf);
        assert_eq!(outcome.status(), NssStatus::TryAgain);
        assert_eq!(outcome.errno(), libc::EBADMSG);
        assert!(!outcome.needs_larger_buffer());
    }

    #[test]
    fn test_transport_failures() {
        let client = ServiceClient::new(Scripted::new(vec![
            Err(TransportError::Unavailable),
            Err(TransportError::Status(libc::EAGAIN)),
        ]));
        let mut buf = [0u8; 64];

        let outcome = client.get_by_port(80, None, &mut buf);
        assert_eq!(outcome.status(), NssStatus::Unavail);

        let outcome = client.get_by_port(80, None, &mut buf);
        assert_eq!(outcome.status(), NssStatus::TryAgain);
        assert_eq!(outcome.errno(), libc::EAGAIN);
    }

    #[test]
    fn test_backend_erange_is_not_buffer_growth() {
        let client = ServiceClient::new(Scripted::new(vec![Err(TransportError::Status(
            libc::ERANGE,
        ))]));
        let mut buf = [0u8; 4096];

        let outcome = client.get_by_name("http", None, &mut buf);
        assert!(matches!(outcome, LookupOutcome::TryAgain { errno } if errno == libc::ERANGE));
        assert_eq!(outcome.status(), NssStatus::TryAgain);
        assert!(!outcome.needs_larger_buffer());
    }

    #[test]
    fn test_huge_name_limit_is_capped() {
        let config = LookupConfig {
            max_name_len: usize::MAX,
            strict_trailing: false,
        };
        let client = ServiceClient::with_config(Scripted::new(vec![Ok(vec![0; 8])]), config);
        assert_eq!(client.config().max_name_len, crate::config::MAX_NAME_LEN_CEILING);

        let mut buf = [0u8; 64];
        assert_eq!(client.get_by_name("http", None, &mut buf).status(), NssStatus::NotFound);
    }

    #[test]
    fn test_enumeration_unavailable() {
        let client = ServiceClient::new(Scripted::new(vec![]));
        let mut buf = [0xAAu8; 16];

        assert_eq!(client.set_enumeration(), NssStatus::Unavail);
        assert_eq!(client.next_entry(&mut buf).status(), NssStatus::Unavail);
        assert_eq!(client.end_enumeration(), NssStatus::Unavail);
        assert_eq!(buf, [0xAAu8; 16]);
        assert!(client.exchange.lock().unwrap().transport.seen.is_empty());
    }

    #[test]
    fn test_status_codes_match_glibc() {
        assert_eq!(NssStatus::TryAgain as i32, -2);
        assert_eq!(NssStatus::Unavail as i32, -1);
        assert_eq!(NssStatus::NotFound as i32, 0);
        assert_eq!(NssStatus::Success as i32, 1);
    }
}
