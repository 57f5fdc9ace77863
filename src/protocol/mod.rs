//! Protocol Layer: services lookup wire format
//!
//! Prinsip desain:
//! - Flat Binary: integer network byte order, string NUL-terminated
//! - Bounded decode: setiap field dicek terhadap sisa source dan destination
//! - No allocation: decode langsung ke buffer milik caller

mod encoder;
mod message;

pub use encoder::{
    decode_record, decode_response, encode_into, encode_query, encoded_len, Aliases, Decoded,
    Encoder, RecordDecoder, ServiceEntry, ServiceRecord, PORT_HEADER_SIZE,
};
pub use message::{
    checked_name_len, Command, Envelope, ServiceQuery, ENVELOPE_SIZE, MIN_RECORD_SIZE,
    RECORD_FIXED_SIZE,
};
