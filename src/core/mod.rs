//! Core module: destination buffer primitives
//!
//! Prinsip desain:
//! - No-Allocation: decode langsung ke buffer milik caller
//! - Bounded: setiap copy dicek terhadap sisa source dan sisa destination
//! - Offsets, bukan pointer: hasil decode berupa `Span` ke dalam buffer

mod arena;

pub use arena::{align_up, copy_terminated_string, DestArena, Span, SENTINEL, SLOT_SIZE};
pub(crate) use arena::read_slot;
