//! The file operations layer and the per-mount context.
//!
//! [`Volume`] is the re-architected replacement for the original design's
//! single process-wide mount state (REDESIGN FLAGS, spec §9): operations
//! are only reachable once a `Volume` exists, and `Volume` is produced only
//! by [`Volume::mount`] or [`Volume::format`]. [`crate::global::GlobalFs`]
//! is a thin façade reproducing the literal global-state call shape for
//! callers that want it.

use std::path::Path;

use log::{debug, info, warn};

use crate::bitmap::Bitmap;
use crate::disk::BackingFile;
use crate::error::{Error, Result};
use crate::inode::{InodeTable, RawInode};
use crate::layout::{BLOCK_SIZE, MAX_DIRECT_BLOCKS, MAX_FILENAME, MAX_FILES, NO_BLOCK};
use crate::superblock::RawSuperblock;

/// A mounted filesystem image: the backing file handle plus the cached
/// superblock, bitmap, and inode table.
pub struct Volume {
	dev: BackingFile,
	superblock: RawSuperblock,
	bitmap: Bitmap,
	inodes: InodeTable,
}

fn validate_name(name: &str) -> Result<()> {
	if name.is_empty() {
		return Err(Error::InvalidArgument("name must not be empty"));
	}
	if name.len() > MAX_FILENAME {
		return Err(Error::InvalidArgument("name exceeds MAX_FILENAME"));
	}
	Ok(())
}

impl Volume {
	/// Creates or truncates the backing file at `path`, sizes it, and
	/// writes the canonical empty image: the superblock with
	/// `free_blocks = MAX_BLOCKS - DATA_START` and `free_inodes =
	/// MAX_FILES`, a bitmap with the reserved range set, and an
	/// all-free inode table.
	///
	/// Unlike `mount`, `format` does not keep the image mounted: the handle
	/// is closed once the canonical image is written.
	pub fn format(path: &Path) -> Result<()> {
		let mut dev = BackingFile::create(path)?;
		let superblock = RawSuperblock::canonical();
		let bitmap = Bitmap::canonical();
		let inodes = InodeTable::canonical();

		superblock.write(&mut dev)?;
		bitmap.write(&mut dev)?;
		inodes.write(&mut dev)?;
		dev.sync()?;

		info!("formatted {}", path.display());
		Ok(())
	}

	/// Opens the backing file at `path`, validates it, and returns a
	/// mounted [`Volume`]. Fails if the image is structurally invalid.
	pub fn mount(path: &Path) -> Result<Self> {
		let mut dev = BackingFile::open(path)?;

		let superblock = RawSuperblock::read(&mut dev)?;
		let bitmap = Bitmap::read(&mut dev)?;
		let inodes = InodeTable::read(&mut dev)?;

		if !superblock.is_valid() {
			warn!("mount refused: superblock capacity mismatch");
			return Err(Error::InvalidImage);
		}
		if !bitmap.reserved_range_is_set() {
			warn!("mount refused: reserved blocks not marked used in bitmap");
			return Err(Error::InvalidImage);
		}
		// Inode `size` is stored as an unsigned field, so spec §4.1's
		// "every used inode has size >= 0" holds by construction.

		info!("mounted {} ({} free blocks, {} free inodes)", path.display(), superblock.free_blocks, superblock.free_inodes);
		Ok(Self {
			dev,
			superblock,
			bitmap,
			inodes,
		})
	}

	/// Closes the backing file handle. Never fails.
	pub fn unmount(self) {
		debug!("unmounted");
		// Dropping `self.dev` closes the handle.
	}

	/// Reports the current `free_blocks` counter.
	pub fn free_blocks(&self) -> u32 {
		self.superblock.free_blocks
	}

	/// Creates an empty file named `name`. No data blocks are allocated.
	pub fn create(&mut self, name: &str) -> Result<()> {
		validate_name(name)?;

		if self.inodes.find_inode(name).is_some() {
			return Err(Error::Exists);
		}
		let slot = self.inodes.find_free_inode().ok_or(Error::NoFreeInodes)?;

		let mut entry = RawInode::free();
		entry.used = 1;
		entry.set_name(name);
		*self.inodes.get_mut(slot) = entry;
		self.inodes.write(&mut self.dev)?;

		self.superblock.free_inodes -= 1;
		self.superblock.write(&mut self.dev)?;

		debug!("create {name:?} -> inode {slot}");
		Ok(())
	}

	/// Removes the file named `name`, freeing its data blocks and inode
	/// slot.
	pub fn delete(&mut self, name: &str) -> Result<()> {
		validate_name(name)?;

		let slot = self.inodes.find_inode(name).ok_or(Error::NotFound)?;
		let entry = self.inodes.get_mut(slot);
		let mut freed = 0u32;
		for j in 0..MAX_DIRECT_BLOCKS {
			let b = entry.blocks[j];
			if b != NO_BLOCK as i32 {
				self.bitmap.mark_free(b as usize);
				entry.blocks[j] = NO_BLOCK as i32;
				freed += 1;
			}
		}
		entry.used = 0;
		entry.size = 0;
		self.inodes.write(&mut self.dev)?;
		self.bitmap.write(&mut self.dev)?;

		self.superblock.free_blocks += freed;
		self.superblock.free_inodes += 1;
		self.superblock.write(&mut self.dev)?;

		debug!("delete {name:?} freed {freed} blocks");
		Ok(())
	}

	/// Lists up to `max` distinct used file names, in inode table order.
	/// `max` must be in `(0, MAX_FILES]`.
	pub fn list(&self, max: usize) -> Result<Vec<String>> {
		if max == 0 || max > MAX_FILES {
			return Err(Error::InvalidArgument("max must be in (0, MAX_FILES]"));
		}
		let mut out = Vec::new();
		for entry in self.inodes.entries_iter() {
			if out.len() >= max {
				break;
			}
			if !entry.is_used() {
				continue;
			}
			let name = entry.name_str();
			// Defensive de-duplication: invariants guarantee uniqueness,
			// but a corrupt table must not be allowed to return a name
			// twice.
			if !out.contains(&name) {
				out.push(name);
			}
		}
		Ok(out)
	}

	/// Overwrites (or creates the content of) the file named `name` with
	/// `data`. On `Exhausted`, the inode is left holding a prefix of
	/// `data`: the partial-failure policy of spec §4.5/§7. The critical
	/// invariant preserved is that every bit set in the bitmap corresponds
	/// to a pointer in some inode; no block is ever orphaned.
	pub fn write(&mut self, name: &str, data: &[u8]) -> Result<()> {
		validate_name(name)?;
		let size = data.len();

		let slot = self.inodes.find_inode(name).ok_or(Error::NotFound)?;

		let need = (size + BLOCK_SIZE - 1) / BLOCK_SIZE;
		if need > MAX_DIRECT_BLOCKS {
			return Err(Error::OutOfSpace);
		}

		let old = self.inodes.get(slot).block_count();

		// Reconcile the cached counter against the bitmap: the bitmap wins.
		let actual_free = self.bitmap.count_free_data_blocks() as u32;
		if actual_free < self.superblock.free_blocks {
			self.superblock.free_blocks = actual_free;
		}

		if need > self.superblock.free_blocks as usize + old {
			return Err(Error::OutOfSpace);
		}

		// Free the inode's current blocks; they count toward the budget
		// just checked.
		{
			let entry = self.inodes.get_mut(slot);
			for j in 0..MAX_DIRECT_BLOCKS {
				let b = entry.blocks[j];
				if b != NO_BLOCK as i32 {
					self.bitmap.mark_free(b as usize);
					entry.blocks[j] = NO_BLOCK as i32;
				}
			}
		}
		self.superblock.free_blocks += old as u32;
		self.superblock.write(&mut self.dev)?;

		for i in 0..need {
			let Some(b) = self.bitmap.find_free_block() else {
				// Out of space mid-write: persist what was acquired so far
				// so no bitmap bit is ever set without a pointer to it. The
				// inode reports the full requested size even though only a
				// prefix is reachable, per the partial-failure contract.
				let entry = self.inodes.get_mut(slot);
				entry.used = 1;
				entry.size = size as u32;
				self.inodes.write(&mut self.dev)?;
				self.bitmap.write(&mut self.dev)?;
				self.superblock.write(&mut self.dev)?;
				warn!("write {name:?} ran out of space after {i}/{need} blocks");
				return Err(Error::OutOfSpace);
			};
			self.inodes.get_mut(slot).blocks[i] = b as i32;
			self.bitmap.mark_used(b);
			self.superblock.free_blocks -= 1;

			let start = i * BLOCK_SIZE;
			let n = (size - start).min(BLOCK_SIZE);
			self.dev.write_block_prefix(b, &data[start..start + n])?;
		}

		let entry = self.inodes.get_mut(slot);
		entry.used = 1;
		entry.size = size as u32;
		self.inodes.write(&mut self.dev)?;
		self.bitmap.write(&mut self.dev)?;
		self.superblock.write(&mut self.dev)?;

		debug!("write {name:?}: {size} bytes over {need} blocks");
		Ok(())
	}

	/// Reads up to `buf.len()` bytes (clamped to the file's stored size)
	/// from `name` into `buf`. Returns the number of bytes copied.
	pub fn read(&mut self, name: &str, buf: &mut [u8]) -> Result<usize> {
		validate_name(name)?;

		let slot = self.inodes.find_inode(name).ok_or(Error::NotFound)?;
		let entry = self.inodes.get(slot);
		let size = (entry.size as usize).min(buf.len());

		let blocks: Vec<i32> = entry.blocks.to_vec();
		let mut copied = 0;
		for b in blocks {
			if copied >= size {
				break;
			}
			if b == NO_BLOCK as i32 {
				continue;
			}
			let n = (size - copied).min(BLOCK_SIZE);
			self.dev.read_block_prefix(b as usize, &mut buf[copied..copied + n])?;
			copied += n;
		}
		Ok(copied)
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::layout::{BLOCK_SIZE, MAX_BLOCKS, MAX_DIRECT_BLOCKS, MAX_FILENAME, MAX_FILES};
	use tempfile::NamedTempFile;

	fn formatted() -> (NamedTempFile, Volume) {
		let tmp = NamedTempFile::new().unwrap();
		Volume::format(tmp.path()).unwrap();
		let vol = Volume::mount(tmp.path()).unwrap();
		(tmp, vol)
	}

	#[test]
	fn create_then_write_then_read_roundtrip() {
		let (_tmp, mut vol) = formatted();
		vol.create("f").unwrap();
		vol.write("f", b"hello").unwrap();

		let mut buf = [0u8; 16];
		let n = vol.read("f", &mut buf).unwrap();
		assert_eq!(n, 5);
		assert_eq!(&buf[..5], b"hello");
	}

	#[test]
	fn create_duplicate_name_fails() {
		let (_tmp, mut vol) = formatted();
		vol.create("f").unwrap();
		assert!(matches!(vol.create("f"), Err(Error::Exists)));
	}

	#[test]
	fn write_missing_file_fails() {
		let (_tmp, mut vol) = formatted();
		assert!(matches!(vol.write("nope", b"x"), Err(Error::NotFound)));
	}

	#[test]
	fn name_boundary_lengths() {
		let (_tmp, mut vol) = formatted();
		let exact = "a".repeat(MAX_FILENAME);
		assert!(vol.create(&exact).is_ok());

		let too_long = "a".repeat(MAX_FILENAME + 1);
		assert!(matches!(
			vol.create(&too_long),
			Err(Error::InvalidArgument(_))
		));

		assert!(matches!(vol.create(""), Err(Error::InvalidArgument(_))));
	}

	#[test]
	fn write_at_direct_block_cap_succeeds_one_more_byte_fails() {
		let (_tmp, mut vol) = formatted();
		vol.create("f").unwrap();

		let max_bytes = MAX_DIRECT_BLOCKS * BLOCK_SIZE;
		let data = vec![0xAAu8; max_bytes];
		assert!(vol.write("f", &data).is_ok());

		let too_big = vec![0xAAu8; max_bytes + 1];
		assert!(matches!(vol.write("f", &too_big), Err(Error::OutOfSpace)));
	}

	#[test]
	fn write_zero_bytes_leaves_zero_blocks() {
		let (_tmp, mut vol) = formatted();
		vol.create("f").unwrap();
		vol.write("f", b"some content").unwrap();
		vol.write("f", b"").unwrap();

		let mut buf = [0u8; 8];
		assert_eq!(vol.read("f", &mut buf).unwrap(), 0);
	}

	#[test]
	fn overwrite_shrink_reclaims_blocks() {
		let (_tmp, mut vol) = formatted();
		vol.create("f").unwrap();

		let before = vol.free_blocks();
		let a = vec![b'A'; MAX_DIRECT_BLOCKS * BLOCK_SIZE];
		vol.write("f", &a).unwrap();
		assert_eq!(vol.free_blocks(), before - MAX_DIRECT_BLOCKS as u32);

		vol.write("f", b"short").unwrap();
		assert_eq!(vol.free_blocks(), before - 1);

		let mut buf = [0u8; 5];
		assert_eq!(vol.read("f", &mut buf).unwrap(), 5);
		assert_eq!(&buf, b"short");
	}

	#[test]
	fn delete_then_create_succeeds_double_delete_fails() {
		let (_tmp, mut vol) = formatted();
		vol.create("f").unwrap();
		vol.write("f", b"x").unwrap();

		assert!(vol.delete("f").is_ok());
		assert!(vol.create("f").is_ok());
		assert!(vol.delete("f").is_ok());
		assert!(matches!(vol.delete("f"), Err(Error::NotFound)));
	}

	#[test]
	fn inode_exhaustion() {
		let (_tmp, mut vol) = formatted();
		for i in 0..MAX_FILES {
			vol.create(&format!("f{i}")).unwrap();
		}
		assert!(matches!(vol.create("one_too_many"), Err(Error::NoFreeInodes)));
	}

	#[test]
	fn list_deduplicates_and_respects_max() {
		let (_tmp, mut vol) = formatted();
		vol.create("a").unwrap();
		vol.create("b").unwrap();
		vol.create("c").unwrap();

		let names = vol.list(2).unwrap();
		assert_eq!(names.len(), 2);

		let all = vol.list(MAX_FILES).unwrap();
		assert_eq!(all, vec!["a".to_string(), "b".to_string(), "c".to_string()]);
	}

	#[test]
	fn list_rejects_bad_max() {
		let (_tmp, vol) = formatted();
		assert!(matches!(vol.list(0), Err(Error::InvalidArgument(_))));
		assert!(matches!(vol.list(MAX_FILES + 1), Err(Error::InvalidArgument(_))));
	}

	#[test]
	fn block_exhaustion_mid_write_has_no_orphaned_blocks() {
		let (_tmp, mut vol) = formatted();

		// Consume data blocks down to exactly 3 free, packing each filler
		// file with up to MAX_DIRECT_BLOCKS blocks so the inode table
		// (256 slots) never becomes the bottleneck.
		let total_free = vol.free_blocks() as usize;
		let target_free = 3;
		let mut consumed = 0usize;
		let mut i = 0;
		while total_free - consumed > target_free {
			let take = (total_free - consumed - target_free).min(MAX_DIRECT_BLOCKS);
			let name = format!("filler{i}");
			vol.create(&name).unwrap();
			vol.write(&name, &vec![0u8; take * BLOCK_SIZE]).unwrap();
			consumed += take;
			i += 1;
		}
		assert_eq!(vol.free_blocks() as usize, target_free);

		vol.create("big").unwrap();
		let data = vec![0u8; 5 * BLOCK_SIZE];
		assert!(matches!(vol.write("big", &data), Err(Error::OutOfSpace)));
		assert!(vol.free_blocks() as usize <= target_free);

		// No block bit may be set without a pointer: every consumed block
		// plus every remaining free block must account for the full range.
		assert_eq!(
			consumed + vol.free_blocks() as usize,
			MAX_BLOCKS - crate::layout::DATA_START
		);
	}

	#[test]
	fn persistence_across_remount() {
		let tmp = NamedTempFile::new().unwrap();
		Volume::format(tmp.path()).unwrap();

		let mut vol = Volume::mount(tmp.path()).unwrap();
		vol.create("p").unwrap();
		vol.write("p", b"hello\0").unwrap();
		vol.unmount();

		let mut vol = Volume::mount(tmp.path()).unwrap();
		assert_eq!(vol.list(MAX_FILES).unwrap(), vec!["p".to_string()]);
		let mut buf = [0u8; 6];
		assert_eq!(vol.read("p", &mut buf).unwrap(), 6);
		assert_eq!(&buf, b"hello\0");
	}
}
