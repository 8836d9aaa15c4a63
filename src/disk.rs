//! Positioned read/write of fixed-size blocks against the backing file.
//!
//! Every helper takes full responsibility for positioning via an absolute
//! offset; there is no "current position" shared across callers, mirroring
//! how `mkfs`'s ext2 factory seeks before every read/write rather than
//! relying on sequential access.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::layout::{block_offset, BLOCK_SIZE, MAX_BLOCKS};

/// A single regular file used as a virtual disk, addressed in fixed-size
/// blocks.
pub struct BackingFile {
	file: File,
}

impl BackingFile {
	/// Creates or truncates the backing file at `path` and sizes it to
	/// exactly `MAX_BLOCKS * BLOCK_SIZE` bytes, as `format` requires.
	pub fn create(path: &Path) -> io::Result<Self> {
		let file = OpenOptions::new()
			.read(true)
			.write(true)
			.create(true)
			.truncate(true)
			.open(path)?;
		let mut this = Self { file };
		this.set_len()?;
		Ok(this)
	}

	/// Opens an existing backing file for mount.
	pub fn open(path: &Path) -> io::Result<Self> {
		let file = OpenOptions::new().read(true).write(true).open(path)?;
		Ok(Self { file })
	}

	/// Sizes the file to the full image length by writing a single
	/// terminating byte at the final offset, as spec'd.
	fn set_len(&mut self) -> io::Result<()> {
		let last = block_offset(MAX_BLOCKS) - 1;
		self.file.seek(SeekFrom::Start(last))?;
		self.file.write_all(&[0u8])?;
		self.file.flush()
	}

	/// Reads block `i` in full.
	pub fn read_block(&mut self, i: usize) -> io::Result<[u8; BLOCK_SIZE]> {
		let mut buf = [0u8; BLOCK_SIZE];
		self.file.seek(SeekFrom::Start(block_offset(i)))?;
		self.file.read_exact(&mut buf)?;
		Ok(buf)
	}

	/// Writes block `i` in full.
	pub fn write_block(&mut self, i: usize, data: &[u8; BLOCK_SIZE]) -> io::Result<()> {
		self.file.seek(SeekFrom::Start(block_offset(i)))?;
		self.file.write_all(data)
	}

	/// Writes `data` (at most `BLOCK_SIZE` bytes) at the start of block `i`,
	/// leaving the rest of the block untouched. Used for partial final
	/// blocks during `write`.
	pub fn write_block_prefix(&mut self, i: usize, data: &[u8]) -> io::Result<()> {
		debug_assert!(data.len() <= BLOCK_SIZE);
		self.file.seek(SeekFrom::Start(block_offset(i)))?;
		self.file.write_all(data)
	}

	/// Reads at most `buf.len()` bytes starting at the beginning of block
	/// `i`. Used when reading a partial final block.
	pub fn read_block_prefix(&mut self, i: usize, buf: &mut [u8]) -> io::Result<()> {
		debug_assert!(buf.len() <= BLOCK_SIZE);
		self.file.seek(SeekFrom::Start(block_offset(i)))?;
		self.file.read_exact(buf)
	}

	/// Flushes any buffered writes to the underlying file.
	pub fn sync(&mut self) -> io::Result<()> {
		self.file.sync_data()
	}
}
