//! `blockfs`: a small, self-contained block-based file storage engine
//! backed by a single regular file acting as a virtual disk.
//!
//! The engine implements a flat, directory-less filesystem of fixed
//! capacity: create, delete, list, overwrite-write and read, over a
//! superblock + bitmap + inode table layout reminiscent of a minimal
//! ext2. It has no directories, permissions, timestamps, concurrency
//! coordination, journaling, sparse files, or indirect block pointers —
//! file size is hard-capped by [`layout::MAX_DIRECT_BLOCKS`] direct
//! pointers.
//!
//! Two ways to use it:
//!
//! - [`Volume`], the idiomatic entry point: `Volume::mount` returns a
//!   context on which operations are defined; there is no way to call an
//!   operation without first holding a mounted `Volume`.
//! - [`GlobalFs`], a façade over a single process-wide mount state, for
//!   callers that want the global format/mount/unmount call shape of the
//!   system this crate's layout is modeled on.

pub mod bitmap;
pub mod disk;
pub mod error;
pub mod global;
pub mod inode;
pub mod layout;
pub mod superblock;
pub mod volume;
mod wire;

pub use error::{Error, Kind, Operation, Result};
pub use global::GlobalFs;
pub use volume::Volume;
