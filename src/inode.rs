//! The inode table: a fixed-size array of file records persisted
//! contiguously in blocks 2–9.
//!
//! Lookup and free-slot discovery are both linear scans, which is cheap
//! enough at `MAX_FILES = 256` and keeps the implementation free of any
//! secondary index to go stale.

use std::io;

use crate::disk::BackingFile;
use crate::layout::{
	block_offset, BLOCK_SIZE, INODE_TABLE_BLOCKS, INODE_TABLE_START, MAX_DIRECT_BLOCKS,
	MAX_FILENAME, MAX_FILES, NO_BLOCK,
};
use crate::wire;

/// On-disk inode record. `blocks[j]` holds a data block index or
/// [`NO_BLOCK`].
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawInode {
	pub used: u8,
	pub name: [u8; MAX_FILENAME],
	pub size: u32,
	pub blocks: [i32; MAX_DIRECT_BLOCKS],
	_reserved: [u8; RawInode::RESERVED_LEN],
}

impl RawInode {
	const RESERVED_LEN: usize = 44;

	/// A free (unused) slot.
	pub const fn free() -> Self {
		Self {
			used: 0,
			name: [0; MAX_FILENAME],
			size: 0,
			blocks: [NO_BLOCK as i32; MAX_DIRECT_BLOCKS],
			_reserved: [0; Self::RESERVED_LEN],
		}
	}

	pub fn is_used(&self) -> bool {
		self.used != 0
	}

	/// The name, truncated at the first NUL within the `MAX_FILENAME`
	/// field, decoded as UTF-8 lossily (names are expected to be ASCII in
	/// practice but the field makes no such guarantee once corrupted).
	pub fn name_str(&self) -> String {
		let len = self.name.iter().position(|&b| b == 0).unwrap_or(self.name.len());
		String::from_utf8_lossy(&self.name[..len]).into_owned()
	}

	/// Copies `name` into the fixed-width field, truncating to
	/// `MAX_FILENAME` bytes and null-terminating when there is room.
	pub fn set_name(&mut self, name: &str) {
		let bytes = name.as_bytes();
		let len = bytes.len().min(MAX_FILENAME);
		self.name = [0; MAX_FILENAME];
		self.name[..len].copy_from_slice(&bytes[..len]);
	}

	/// Count of non-sentinel block pointers.
	pub fn block_count(&self) -> usize {
		self.blocks.iter().filter(|&&b| b != NO_BLOCK as i32).count()
	}
}

/// The in-memory view of the whole inode table, read and written as a
/// single unit (acceptable at the 256-entry bound spec'd; see DESIGN.md for
/// the named trade-off).
pub struct InodeTable {
	entries: Vec<RawInode>,
}

impl InodeTable {
	/// The canonical, all-free table written by `format`.
	pub fn canonical() -> Self {
		Self {
			entries: vec![RawInode::free(); MAX_FILES],
		}
	}

	/// Reads the whole table from blocks `INODE_TABLE_START..INODE_TABLE_START+INODE_TABLE_BLOCKS`.
	pub fn read(dev: &mut BackingFile) -> io::Result<Self> {
		let mut bytes = Vec::with_capacity(INODE_TABLE_BLOCKS * BLOCK_SIZE);
		for b in 0..INODE_TABLE_BLOCKS {
			bytes.extend_from_slice(&dev.read_block(INODE_TABLE_START + b)?);
		}
		let entry_size = std::mem::size_of::<RawInode>();
		let entries = (0..MAX_FILES)
			.map(|i| wire::from_bytes(&bytes[i * entry_size..(i + 1) * entry_size]))
			.collect();
		Ok(Self { entries })
	}

	/// Rewrites the whole table.
	pub fn write(&self, dev: &mut BackingFile) -> io::Result<()> {
		let mut bytes = vec![0u8; INODE_TABLE_BLOCKS * BLOCK_SIZE];
		let entry_size = std::mem::size_of::<RawInode>();
		for (i, entry) in self.entries.iter().enumerate() {
			let dst = &mut bytes[i * entry_size..(i + 1) * entry_size];
			dst.copy_from_slice(wire::as_bytes(entry));
		}
		for b in 0..INODE_TABLE_BLOCKS {
			let mut block = [0u8; BLOCK_SIZE];
			block.copy_from_slice(&bytes[b * BLOCK_SIZE..(b + 1) * BLOCK_SIZE]);
			dev.write_block(INODE_TABLE_START + b, &block)?;
		}
		Ok(())
	}

	pub fn get(&self, i: usize) -> &RawInode {
		&self.entries[i]
	}

	pub fn get_mut(&mut self, i: usize) -> &mut RawInode {
		&mut self.entries[i]
	}

	/// Returns the index of the unique used inode named `name`, if any.
	pub fn find_inode(&self, name: &str) -> Option<usize> {
		self.entries
			.iter()
			.position(|e| e.is_used() && e.name_str() == name)
	}

	/// Returns the lowest-indexed free slot, if any.
	pub fn find_free_inode(&self) -> Option<usize> {
		self.entries.iter().position(|e| !e.is_used())
	}

	/// Count of inodes currently marked used.
	pub fn used_count(&self) -> usize {
		self.entries.iter().filter(|e| e.is_used()).count()
	}

	/// Iterates over all slots in table order.
	pub fn entries_iter(&self) -> impl Iterator<Item = &RawInode> {
		self.entries.iter()
	}
}

/// Byte offset of the `i`th inode table block, exposed for tests.
pub const fn table_block_offset(b: usize) -> u64 {
	block_offset(INODE_TABLE_START + b)
}
