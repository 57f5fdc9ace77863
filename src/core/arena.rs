//! Destination arena: satu buffer milik caller, satu write cursor
//!
//! Semua string dan slot array hasil decode ditulis berurutan ke buffer ini.
//! Tidak ada alokasi; posisi direpresentasikan sebagai `Span` (offset, len),
//! bukan pointer mentah.
//!
//! Layout setelah decode sukses:
//! ┌──────────┬──────────────┬─────┬──────────────────────┬──────────────────┐
//! │ name NUL │ protocol NUL │ pad │ slot[0..n] + sentinel │ alias NUL ...    │
//! └──────────┴──────────────┴─────┴──────────────────────┴──────────────────┘

use crate::error::{ProtocolError, Result};

/// Width of one alias slot (machine pointer size).
pub const SLOT_SIZE: usize = std::mem::size_of::<usize>();

/// Value of the slot one past the last alias.
///
/// Offset 0 always belongs to the service name, so it never starts an alias.
pub const SENTINEL: usize = 0;

/// Region inside the destination buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub offset: usize,
    pub len: usize,
}

impl Span {
    #[inline(always)]
    pub fn end(&self) -> usize {
        self.offset + self.len
    }

    #[inline(always)]
    pub fn slice<'a>(&self, buf: &'a [u8]) -> &'a [u8] {
        &buf[self.offset..self.end()]
    }
}

/// Round `offset` up to the next multiple of `align`.
///
/// `align` must be a power of two (0 and 1 leave `offset` unchanged).
/// Result `r` satisfies `r >= offset`, `r % align == 0` and `r - offset < align`.
#[inline(always)]
pub fn align_up(offset: usize, align: usize) -> usize {
    if align <= 1 {
        return offset;
    }
    debug_assert!(align.is_power_of_two());
    (offset + (align - 1)) & !(align - 1)
}

/// Bounded copy of one NUL-terminated string.
///
/// Scans `source[*source_cursor..]` for the terminator and copies the string
/// plus terminator to `dest[*dest_cursor..]`, advancing both cursors. Returns
/// the string length without terminator.
///
/// Source bound dicek duluan: tanpa terminator hasilnya `Truncated`, walaupun
/// destination juga penuh.
pub fn copy_terminated_string(
    source: &[u8],
    source_cursor: &mut usize,
    dest: &mut [u8],
    dest_cursor: &mut usize,
) -> Result<usize> {
    let rest = source.get(*source_cursor..).unwrap_or_default();

    let len = match rest.iter().position(|&b| b == 0) {
        Some(len) => len,
        None => {
            return Err(ProtocolError::Truncated {
                needed: rest.len() + 1,
                available: rest.len(),
            })
        }
    };

    let available = dest.len().saturating_sub(*dest_cursor);
    if len + 1 > available {
        return Err(ProtocolError::OutOfRange {
            needed: len + 1,
            available,
        });
    }

    dest[*dest_cursor..*dest_cursor + len + 1].copy_from_slice(&rest[..=len]);
    *source_cursor += len + 1;
    *dest_cursor += len + 1;

    Ok(len)
}

/// Read back the slot at `index` of an array starting at `slots_offset`.
///
/// Caller menjamin slot ada di dalam `buf` (record hasil decode).
#[inline(always)]
pub(crate) fn read_slot(buf: &[u8], slots_offset: usize, index: usize) -> usize {
    let start = slots_offset + index * SLOT_SIZE;
    let mut raw = [0u8; SLOT_SIZE];
    raw.copy_from_slice(&buf[start..start + SLOT_SIZE]);
    usize::from_ne_bytes(raw)
}

/// Monotonic bump writer over the caller's destination buffer.
pub struct DestArena<'a> {
    buf: &'a mut [u8],
    write_pos: usize,
}

impl<'a> DestArena<'a> {
    /// Membuat arena dari buffer caller, cursor di offset 0
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, write_pos: 0 }
    }

    #[inline(always)]
    pub fn position(&self) -> usize {
        self.write_pos
    }

    /// Sisa kapasitas
    #[inline(always)]
    pub fn available(&self) -> usize {
        self.buf.len() - self.write_pos
    }

    /// Copy the next terminated string from `source` to the cursor.
    ///
    /// The returned span excludes the terminator.
    pub fn copy_string(&mut self, source: &[u8], source_cursor: &mut usize) -> Result<Span> {
        let offset = self.write_pos;
        let len = copy_terminated_string(source, source_cursor, self.buf, &mut self.write_pos)?;
        Ok(Span { offset, len })
    }

    /// Reserve `count` aligned slots at the cursor.
    ///
    /// Padding before the array counts against capacity. Overflow while
    /// sizing the request is reported as `OutOfRange` too.
    pub fn reserve_slots(&mut self, count: usize) -> Result<Span> {
        let start = align_up(self.write_pos, SLOT_SIZE);
        let pad = start - self.write_pos;
        let available = self.available();

        let needed = count
            .checked_mul(SLOT_SIZE)
            .and_then(|bytes| bytes.checked_add(pad))
            .ok_or(ProtocolError::OutOfRange {
                needed: usize::MAX,
                available,
            })?;

        if needed > available {
            return Err(ProtocolError::OutOfRange { needed, available });
        }

        self.buf[self.write_pos..start].fill(0);
        self.write_pos += needed;

        Ok(Span {
            offset: start,
            len: needed - pad,
        })
    }

    /// Store `value` into slot `index` of a reserved array.
    #[inline(always)]
    pub fn write_slot(&mut self, slots: Span, index: usize, value: usize) {
        let start = slots.offset + index * SLOT_SIZE;
        debug_assert!(start + SLOT_SIZE <= slots.end());
        self.buf[start..start + SLOT_SIZE].copy_from_slice(&value.to_ne_bytes());
    }

    /// Zero everything written so far and rewind the cursor.
    pub fn scrub(&mut self) {
        self.buf[..self.write_pos].fill(0);
        self.write_pos = 0;
    }

    /// Selesai menulis, kembalikan buffer sebagai read-only
    pub fn freeze(self) -> &'a [u8] {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_align_up_boundaries() {
        assert_eq!(align_up(0, 4), 0);
        assert_eq!(align_up(1, 4), 4);
        assert_eq!(align_up(2, 4), 4);
        assert_eq!(align_up(3, 4), 4);
        assert_eq!(align_up(4, 4), 4);
        assert_eq!(align_up(5, 4), 8);
    }

    #[test]
    fn test_align_up_pointer_size() {
        for offset in 0..=4 * SLOT_SIZE {
            let aligned = align_up(offset, SLOT_SIZE);
            assert_eq!(aligned % SLOT_SIZE, 0);
            assert!(aligned >= offset);
            assert!(aligned - offset < SLOT_SIZE);
        }
        assert_eq!(align_up(7, 1), 7);
        assert_eq!(align_up(7, 0), 7);
    }

    #[test]
    fn test_copy_string_advances_both_cursors() {
        let source = b"http\0tcp\0";
        let mut dest = [0xAAu8; 16];
        let (mut src_pos, mut dst_pos) = (0, 0);

        let len = copy_terminated_string(source, &mut src_pos, &mut dest, &mut dst_pos).unwrap();
        assert_eq!(len, 4);
        assert_eq!((src_pos, dst_pos), (5, 5));
        assert_eq!(&dest[..5], b"http\0");

        let len = copy_terminated_string(source, &mut src_pos, &mut dest, &mut dst_pos).unwrap();
        assert_eq!(len, 3);
        assert_eq!((src_pos, dst_pos), (9, 9));
        assert_eq!(&dest[5..9], b"tcp\0");
    }

    #[test]
    fn test_copy_string_exact_fit() {
        let mut dest = [0u8; 4];
        let (mut src_pos, mut dst_pos) = (0, 0);
        copy_terminated_string(b"abc\0", &mut src_pos, &mut dest, &mut dst_pos).unwrap();
        assert_eq!(&dest, b"abc\0");
    }

    #[test]
    fn test_copy_string_missing_terminator_is_truncated() {
        let mut dest = [0u8; 16];
        let (mut src_pos, mut dst_pos) = (0, 0);
        let err = copy_terminated_string(b"abc", &mut src_pos, &mut dest, &mut dst_pos).unwrap_err();
        assert_eq!(err, ProtocolError::Truncated { needed: 4, available: 3 });
        assert_eq!((src_pos, dst_pos), (0, 0));
    }

    #[test]
    fn test_copy_string_source_checked_before_dest() {
        let mut dest = [0u8; 1];
        let (mut src_pos, mut dst_pos) = (0, 0);
        let err = copy_terminated_string(b"abc", &mut src_pos, &mut dest, &mut dst_pos).unwrap_err();
        assert!(matches!(err, ProtocolError::Truncated { .. }));
    }

    #[test]
    fn test_copy_string_dest_too_small() {
        let mut dest = [0u8; 3];
        let (mut src_pos, mut dst_pos) = (0, 0);
        let err = copy_terminated_string(b"abc\0", &mut src_pos, &mut dest, &mut dst_pos).unwrap_err();
        assert_eq!(err, ProtocolError::OutOfRange { needed: 4, available: 3 });
        assert_eq!(dest, [0u8; 3]);
    }

    #[test]
    fn test_copy_string_cursor_past_end() {
        let mut dest = [0u8; 4];
        let (mut src_pos, mut dst_pos) = (10, 0);
        let err = copy_terminated_string(b"a\0", &mut src_pos, &mut dest, &mut dst_pos).unwrap_err();
        assert_eq!(err, ProtocolError::Truncated { needed: 1, available: 0 });
    }

    #[test]
    fn test_reserve_slots_pads_to_slot_boundary() {
        let mut buf = [0xFFu8; 64];
        let mut arena = DestArena::new(&mut buf);
        let mut cursor = 0;
        arena.copy_string(b"ab\0", &mut cursor).unwrap();
        assert_eq!(arena.position(), 3);

        let slots = arena.reserve_slots(2).unwrap();
        assert_eq!(slots.offset, SLOT_SIZE);
        assert_eq!(slots.len, 2 * SLOT_SIZE);
        assert_eq!(arena.position(), 3 * SLOT_SIZE);

        arena.write_slot(slots, 0, 42);
        arena.write_slot(slots, 1, SENTINEL);
        let buf = arena.freeze();
        assert_eq!(read_slot(buf, slots.offset, 0), 42);
        assert_eq!(read_slot(buf, slots.offset, 1), SENTINEL);
        assert!(buf[3..SLOT_SIZE].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_reserve_slots_counts_padding() {
        // 1 byte written, pad = SLOT_SIZE - 1, plus one slot
        let mut buf = vec![0u8; 2 * SLOT_SIZE - 1];
        let mut arena = DestArena::new(&mut buf);
        let mut cursor = 0;
        arena.copy_string(b"\0", &mut cursor).unwrap();

        let err = arena.reserve_slots(1).unwrap_err();
        assert_eq!(
            err,
            ProtocolError::OutOfRange {
                needed: 2 * SLOT_SIZE - 1,
                available: 2 * SLOT_SIZE - 2,
            }
        );
    }

    #[test]
    fn test_reserve_slots_overflow_is_out_of_range() {
        let mut buf = [0u8; 16];
        let mut arena = DestArena::new(&mut buf);
        let err = arena.reserve_slots(usize::MAX).unwrap_err();
        assert!(err.is_out_of_range());
    }

    #[test]
    fn test_scrub_zeroes_written_prefix() {
        let mut buf = [0u8; 16];
        let mut arena = DestArena::new(&mut buf);
        let mut cursor = 0;
        arena.copy_string(b"secret\0", &mut cursor).unwrap();
        arena.scrub();
        assert_eq!(arena.position(), 0);
        assert_eq!(arena.freeze(), &[0u8; 16]);
    }
}
