//! nss-svc - services lookup wire codec
//!
//! Arsitektur:
//! - Request Encoder: query by name / by port ke payload biner
//! - Response Decoder: record di-decode langsung ke buffer milik caller
//! - Client: satu round trip per lookup di bawah exchange lock
//!
//! ```
//! use nss_svc::protocol::{decode_record, encode_query, ServiceQuery};
//! use nss_svc::LookupConfig;
//!
//! let payload = encode_query(&ServiceQuery::by_name("http", Some("tcp")), &LookupConfig::default())?;
//! assert_eq!(payload, b"http\0tcp\0");
//!
//! let mut block = Vec::new();
//! block.extend_from_slice(&80u32.to_be_bytes());
//! block.extend_from_slice(&1u32.to_be_bytes());
//! block.extend_from_slice(b"http\0tcp\0www\0");
//!
//! let mut dest = [0u8; 64];
//! let (entry, _) = decode_record(&block, &mut dest)?;
//! assert_eq!(entry.port(), 80);
//! assert_eq!(entry.alias(0), Some(&b"www"[..]));
//! # Ok::<(), nss_svc::ProtocolError>(())
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod network;
pub mod protocol;

pub use config::LookupConfig;
pub use error::{ProtocolError, Result};
pub use network::{LookupOutcome, NssStatus, ServiceClient, Transport, TransportError};
