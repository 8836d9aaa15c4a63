//! On-disk layout constants and offset arithmetic.
//!
//! The image is a flat sequence of fixed-size blocks: block 0 is the
//! superblock, block 1 is the block bitmap, blocks 2 through 9 hold the
//! inode table, and blocks 10.. are data.

use std::mem::size_of;

use crate::inode::RawInode;
use crate::superblock::RawSuperblock;

/// Bytes per block.
pub const BLOCK_SIZE: usize = 4096;
/// Total blocks in the image.
pub const MAX_BLOCKS: usize = 2560;
/// Inode table capacity.
pub const MAX_FILES: usize = 256;
/// Maximum meaningful bytes in a file name.
pub const MAX_FILENAME: usize = 28;
/// Direct block pointers per inode.
pub const MAX_DIRECT_BLOCKS: usize = 12;

/// Block index of the superblock.
pub const SUPERBLOCK_BLOCK: usize = 0;
/// Block index of the bitmap.
pub const BITMAP_BLOCK: usize = 1;
/// First block of the inode table.
pub const INODE_TABLE_START: usize = 2;
/// First block past the inode table, i.e. the first data block.
pub const DATA_START: usize = 10;

/// Sentinel value for an empty block pointer in an inode.
pub const NO_BLOCK: i64 = -1;

const _: () = assert!(INODE_TABLE_START == BITMAP_BLOCK + 1);
const _: () = assert!(DATA_START == INODE_TABLE_START + INODE_TABLE_BLOCKS);
const _: () = assert!(MAX_BLOCKS > DATA_START);

/// Number of blocks occupied by the inode table.
pub const INODE_TABLE_BLOCKS: usize = {
	let bytes = MAX_FILES * size_of::<RawInode>();
	(bytes + BLOCK_SIZE - 1) / BLOCK_SIZE
};

const _: () = assert!(size_of::<RawSuperblock>() <= BLOCK_SIZE);
const _: () = assert!(MAX_BLOCKS / 8 <= BLOCK_SIZE, "bitmap must fit in one block");

/// Byte offset of block `i` from the start of the image.
pub const fn block_offset(i: usize) -> u64 {
	(i * BLOCK_SIZE) as u64
}
