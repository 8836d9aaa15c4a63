//! Byte-level (de)serialization helpers for the plain-old-data structures
//! that are persisted verbatim to the backing file.
//!
//! Mirrors the teacher's `reinterpret`-style casting (e.g.
//! `dev.write_all(reinterpret(&superblock))` in `mkfs`'s ext2 factory):
//! every on-disk record is a `#[repr(C)]` struct of plain integers with no
//! padding-sensitive invariants, so a byte-for-byte view is safe.

use std::mem::size_of;
use std::ptr;

/// Returns `val` as a byte slice of its in-memory representation.
pub fn as_bytes<T: Copy>(val: &T) -> &[u8] {
	unsafe { std::slice::from_raw_parts(val as *const T as *const u8, size_of::<T>()) }
}

/// Reads a `T` out of `bytes`, which must hold at least `size_of::<T>()` bytes.
///
/// Uses an unaligned read since the source is a raw block buffer with no
/// alignment guarantee beyond 1.
pub fn from_bytes<T: Copy>(bytes: &[u8]) -> T {
	assert!(bytes.len() >= size_of::<T>(), "buffer too small for type");
	unsafe { ptr::read_unaligned(bytes.as_ptr() as *const T) }
}
