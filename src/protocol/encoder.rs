//! Zero-Allocation Encoder/Decoder
//!
//! Encoder menulis request ke buffer; Decoder menulis isi response langsung
//! ke destination buffer milik caller. Tidak ada alokasi di jalur decode.

use super::message::{
    checked_name_len, read_u32_be, Envelope, ServiceQuery, MIN_RECORD_SIZE, RECORD_FIXED_SIZE,
};
use crate::config::LookupConfig;
use crate::core::{read_slot, DestArena, Span, SENTINEL, SLOT_SIZE};
use crate::error::{ProtocolError, Result};

/// Port + reserved prefix of a by-port request
pub const PORT_HEADER_SIZE: usize = 8;

/// Payload size for `query`, without validation.
#[inline(always)]
pub fn encoded_len(query: &ServiceQuery<'_>) -> usize {
    let proto = query.protocol().len() + 1;
    match query {
        ServiceQuery::ByName { name, .. } => name.len() + 1 + proto,
        ServiceQuery::ByPort { .. } => PORT_HEADER_SIZE + proto,
    }
}

/// Encode `query` into `out`, returning the payload length.
///
/// `out` terlalu kecil menghasilkan `OutOfRange`; nama kosong, terlalu panjang
/// atau berisi NUL menghasilkan `InvalidArgument`.
pub fn encode_into(
    query: &ServiceQuery<'_>,
    out: &mut [u8],
    config: &LookupConfig,
) -> Result<usize> {
    let protocol = query.protocol();
    checked_name_len(protocol, config.max_name_len, "protocol")?;

    if let ServiceQuery::ByName { name, .. } = query {
        if checked_name_len(name, config.max_name_len, "name")? == 0 {
            return Err(ProtocolError::InvalidArgument("name"));
        }
    }

    let total = encoded_len(query);
    if total > out.len() {
        return Err(ProtocolError::OutOfRange {
            needed: total,
            available: out.len(),
        });
    }

    let mut pos = 0;
    match *query {
        ServiceQuery::ByName { name, .. } => put_terminated(out, &mut pos, name),
        ServiceQuery::ByPort { port, .. } => {
            out[..4].copy_from_slice(&u32::from(port).to_be_bytes());
            // Padding
            out[4..PORT_HEADER_SIZE].fill(0);
            pos = PORT_HEADER_SIZE;
        }
    }
    put_terminated(out, &mut pos, protocol);

    debug_assert_eq!(pos, total);
    Ok(pos)
}

/// Encode `query` into a freshly sized payload.
pub fn encode_query(query: &ServiceQuery<'_>, config: &LookupConfig) -> Result<Vec<u8>> {
    let mut payload = vec![0u8; encoded_len(query)];
    let len = encode_into(query, &mut payload, config)?;
    payload.truncate(len);
    Ok(payload)
}

#[inline(always)]
fn put_terminated(out: &mut [u8], pos: &mut usize, s: &str) {
    let bytes = s.as_bytes();
    out[*pos..*pos + bytes.len()].copy_from_slice(bytes);
    out[*pos + bytes.len()] = 0;
    *pos += bytes.len() + 1;
}

/// Pre-allocated request encoder
///
/// Buffer dipakai ulang untuk setiap request, tidak ada alokasi setelah init.
pub struct Encoder {
    buffer: Box<[u8]>,
    config: LookupConfig,
}

impl Encoder {
    /// Buffer cukup untuk request terbesar yang diizinkan `config`
    ///
    /// `max_name_len` dipotong ke
    /// [`MAX_NAME_LEN_CEILING`](crate::config::MAX_NAME_LEN_CEILING) lebih dulu.
    pub fn new(config: LookupConfig) -> Self {
        let config = config.clamped();
        // by-name: two strings at the limit plus terminators
        let capacity = (config.max_name_len + 1) * 2;
        Self {
            buffer: vec![0u8; capacity.max(PORT_HEADER_SIZE + config.max_name_len + 1)]
                .into_boxed_slice(),
            config,
        }
    }

    /// Encode `query`, returns slice ke payload
    #[inline(always)]
    pub fn encode(&mut self, query: &ServiceQuery<'_>) -> Result<&[u8]> {
        let len = encode_into(query, &mut self.buffer, &self.config)?;
        Ok(&self.buffer[..len])
    }
}

/// Decoded service record; every field is a span into the destination buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceRecord {
    /// Port in host representation
    pub port: u16,
    pub name: Span,
    pub protocol: Span,
    /// Slot array, `alias_count + 1` slots including the sentinel
    pub alias_slots: Span,
    pub alias_count: usize,
}

/// Read-only view of a [`ServiceRecord`] over the buffer it was decoded into.
#[derive(Debug, Clone, Copy)]
pub struct ServiceEntry<'a> {
    record: ServiceRecord,
    buf: &'a [u8],
}

impl<'a> ServiceEntry<'a> {
    #[inline(always)]
    pub fn port(&self) -> u16 {
        self.record.port
    }

    /// Canonical service name (no terminator)
    #[inline(always)]
    pub fn name(&self) -> &'a [u8] {
        self.record.name.slice(self.buf)
    }

    /// Protocol, empty when unspecified
    #[inline(always)]
    pub fn protocol(&self) -> &'a [u8] {
        self.record.protocol.slice(self.buf)
    }

    #[inline(always)]
    pub fn alias_count(&self) -> usize {
        self.record.alias_count
    }

    /// Alias ke-`index`, `None` jika di luar jumlah alias
    pub fn alias(&self, index: usize) -> Option<&'a [u8]> {
        if index >= self.record.alias_count {
            return None;
        }
        Some(self.string_at(read_slot(self.buf, self.record.alias_slots.offset, index)))
    }

    /// Iterate aliases by walking the slot array up to the sentinel.
    pub fn aliases(&self) -> Aliases<'a> {
        Aliases {
            buf: self.buf,
            slots_offset: self.record.alias_slots.offset,
            index: 0,
            remaining: self.record.alias_count,
        }
    }

    pub fn record(&self) -> &ServiceRecord {
        &self.record
    }

    /// Destination buffer backing every field
    pub fn buffer(&self) -> &'a [u8] {
        self.buf
    }

    #[inline(always)]
    fn string_at(&self, offset: usize) -> &'a [u8] {
        string_at(self.buf, offset)
    }
}

#[inline(always)]
fn string_at(buf: &[u8], offset: usize) -> &[u8] {
    let rest = &buf[offset..];
    let len = rest.iter().position(|&b| b == 0).unwrap_or(rest.len());
    &rest[..len]
}

/// Iterator over aliases, stops at the sentinel slot
pub struct Aliases<'a> {
    buf: &'a [u8],
    slots_offset: usize,
    index: usize,
    remaining: usize,
}

impl<'a> Iterator for Aliases<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let offset = read_slot(self.buf, self.slots_offset, self.index);
        if offset == SENTINEL {
            self.remaining = 0;
            return None;
        }
        self.index += 1;
        self.remaining -= 1;
        Some(string_at(self.buf, offset))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}

/// Record block decoder
///
/// Satu cursor maju di source, satu cursor maju di destination (arena).
pub struct RecordDecoder<'a> {
    src: &'a [u8],
    read_pos: usize,
}

impl<'a> RecordDecoder<'a> {
    /// Membuat decoder dari record block (envelope header sudah dibuang)
    pub fn new(src: &'a [u8]) -> Self {
        Self { src, read_pos: 0 }
    }

    /// Source bytes not consumed yet
    #[inline(always)]
    pub fn remaining(&self) -> usize {
        self.src.len().saturating_sub(self.read_pos)
    }

    /// Decode the record into `dest`.
    ///
    /// Returns the entry plus the count of unconsumed source bytes. On error
    /// the bytes written so far are zeroed and no record is produced.
    pub fn decode<'d>(&mut self, dest: &'d mut [u8]) -> Result<(ServiceEntry<'d>, usize)> {
        self.decode_with(dest, false)
    }

    fn decode_with<'d>(
        &mut self,
        dest: &'d mut [u8],
        strict_trailing: bool,
    ) -> Result<(ServiceEntry<'d>, usize)> {
        let mut arena = DestArena::new(dest);

        let outcome = self.decode_into(&mut arena).and_then(|record| {
            match self.remaining() {
                n if strict_trailing && n > 0 => Err(ProtocolError::TrailingBytes(n)),
                n => Ok((record, n)),
            }
        });

        match outcome {
            Ok((record, remaining)) => Ok((
                ServiceEntry {
                    record,
                    buf: arena.freeze(),
                },
                remaining,
            )),
            Err(e) => {
                arena.scrub();
                Err(e)
            }
        }
    }

    fn decode_into(&mut self, arena: &mut DestArena<'_>) -> Result<ServiceRecord> {
        // Two u32s, 1-char name + NUL, protocol NUL
        if self.src.len() < MIN_RECORD_SIZE {
            return Err(ProtocolError::Truncated {
                needed: MIN_RECORD_SIZE,
                available: self.src.len(),
            });
        }

        let port = read_u32_be(self.src, 0) as u16;
        let alias_count = read_u32_be(self.src, 4) as usize;
        self.read_pos = RECORD_FIXED_SIZE;

        let name = arena.copy_string(self.src, &mut self.read_pos)?;
        let protocol = arena.copy_string(self.src, &mut self.read_pos)?;

        let slot_count = alias_count
            .checked_add(1)
            .ok_or(ProtocolError::OutOfRange {
                needed: usize::MAX,
                available: arena.available(),
            })?;
        let alias_slots = arena.reserve_slots(slot_count)?;
        arena.write_slot(alias_slots, alias_count, SENTINEL);

        for index in 0..alias_count {
            let alias = arena.copy_string(self.src, &mut self.read_pos)?;
            arena.write_slot(alias_slots, index, alias.offset);
        }

        debug_assert_eq!(alias_slots.len, slot_count * SLOT_SIZE);

        Ok(ServiceRecord {
            port,
            name,
            protocol,
            alias_slots,
            alias_count,
        })
    }
}

/// Decode a single record block into `dest`.
pub fn decode_record<'d>(src: &[u8], dest: &'d mut [u8]) -> Result<(ServiceEntry<'d>, usize)> {
    RecordDecoder::new(src).decode(dest)
}

/// Outcome of decoding a full response
#[derive(Debug, Clone, Copy)]
pub enum Decoded<'a> {
    NotFound,
    Found(ServiceEntry<'a>),
}

/// Decode a full response (envelope + record) into `dest`.
///
/// `result_count == 0` is reported before any record parsing; leftover bytes
/// are rejected only when `config.strict_trailing` is set.
pub fn decode_response<'d>(
    raw: &[u8],
    dest: &'d mut [u8],
    config: &LookupConfig,
) -> Result<Decoded<'d>> {
    match Envelope::parse(raw)? {
        Envelope::NotFound => Ok(Decoded::NotFound),
        Envelope::Single(block) => {
            let (entry, _) = RecordDecoder::new(block).decode_with(dest, config.strict_trailing)?;
            Ok(Decoded::Found(entry))
        }
    }
}
