//! A thin façade reproducing the original design's single process-wide
//! mount state (spec §4.1), built entirely on top of [`crate::volume::Volume`].
//!
//! Prefer [`crate::volume::Volume`] directly in new code: it makes the
//! "mounted" invariant a type-level fact instead of a runtime check. This
//! façade exists for callers, and tests, that want the literal
//! format/mount/unmount/create/delete/list/write/read call shape described
//! in the spec.

use std::path::Path;
use std::sync::{Mutex, OnceLock};

use crate::error::{Error, Result};
use crate::volume::Volume;

/// The global lifecycle controller: one process-wide mount state.
pub struct GlobalFs;

fn state() -> &'static Mutex<Option<Volume>> {
	static STATE: OnceLock<Mutex<Option<Volume>>> = OnceLock::new();
	STATE.get_or_init(|| Mutex::new(None))
}

impl GlobalFs {
	/// Formats the backing file at `path`. Fails if a filesystem is
	/// currently mounted.
	pub fn format(path: &Path) -> Result<()> {
		let guard = state().lock().unwrap();
		if guard.is_some() {
			return Err(Error::AlreadyMounted);
		}
		drop(guard);
		Volume::format(path)
	}

	/// Mounts the backing file at `path`. Fails if a filesystem is already
	/// mounted or the image is invalid.
	pub fn mount(path: &Path) -> Result<()> {
		let mut guard = state().lock().unwrap();
		if guard.is_some() {
			return Err(Error::AlreadyMounted);
		}
		*guard = Some(Volume::mount(path)?);
		Ok(())
	}

	/// Unmounts the filesystem. Never fails; a no-op if not mounted.
	pub fn unmount() {
		if let Some(vol) = state().lock().unwrap().take() {
			vol.unmount();
		}
	}

	/// Reports whether a filesystem is currently mounted.
	pub fn is_mounted() -> bool {
		state().lock().unwrap().is_some()
	}

	fn with_mounted<T>(f: impl FnOnce(&mut Volume) -> Result<T>) -> Result<T> {
		let mut guard = state().lock().unwrap();
		match guard.as_mut() {
			Some(vol) => f(vol),
			None => Err(Error::NotMounted),
		}
	}

	/// See [`Volume::create`]. Refuses with [`Error::NotMounted`] if not
	/// mounted.
	pub fn create(name: &str) -> Result<()> {
		Self::with_mounted(|vol| vol.create(name))
	}

	/// See [`Volume::delete`]. Refuses with [`Error::NotMounted`] if not
	/// mounted.
	pub fn delete(name: &str) -> Result<()> {
		Self::with_mounted(|vol| vol.delete(name))
	}

	/// See [`Volume::list`]. Refuses with [`Error::NotMounted`] if not
	/// mounted.
	pub fn list(max: usize) -> Result<Vec<String>> {
		Self::with_mounted(|vol| vol.list(max))
	}

	/// See [`Volume::write`]. Refuses with [`Error::NotMounted`] if not
	/// mounted.
	pub fn write(name: &str, data: &[u8]) -> Result<()> {
		Self::with_mounted(|vol| vol.write(name, data))
	}

	/// See [`Volume::read`]. Refuses with [`Error::NotMounted`] if not
	/// mounted.
	pub fn read(name: &str, buf: &mut [u8]) -> Result<usize> {
		Self::with_mounted(|vol| vol.read(name, buf))
	}

	/// Reports the current `free_blocks` counter. Refuses with
	/// [`Error::NotMounted`] if not mounted.
	pub fn free_blocks() -> Result<u32> {
		Self::with_mounted(|vol| Ok(vol.free_blocks()))
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use std::sync::Mutex as StdMutex;
	use tempfile::NamedTempFile;

	// `GlobalFs` is, by design, one process-wide mount state. Serialize the
	// tests that drive it so they don't observe each other's mounts.
	static TEST_LOCK: StdMutex<()> = StdMutex::new(());

	#[test]
	fn mount_gate_refuses_unmounted_operations() {
		let _guard = TEST_LOCK.lock().unwrap();
		let tmp = NamedTempFile::new().unwrap();

		GlobalFs::format(tmp.path()).unwrap();
		assert!(matches!(GlobalFs::create("a"), Err(Error::NotMounted)));

		GlobalFs::mount(tmp.path()).unwrap();
		assert!(GlobalFs::create("a").is_ok());
		GlobalFs::unmount();
	}

	#[test]
	fn double_mount_is_rejected() {
		let _guard = TEST_LOCK.lock().unwrap();
		let tmp = NamedTempFile::new().unwrap();

		GlobalFs::format(tmp.path()).unwrap();
		GlobalFs::mount(tmp.path()).unwrap();
		assert!(matches!(GlobalFs::mount(tmp.path()), Err(Error::AlreadyMounted)));
		assert!(matches!(GlobalFs::format(tmp.path()), Err(Error::AlreadyMounted)));
		GlobalFs::unmount();
	}

	#[test]
	fn legacy_codes_match_spec_table() {
		let _guard = TEST_LOCK.lock().unwrap();
		let tmp = NamedTempFile::new().unwrap();

		GlobalFs::format(tmp.path()).unwrap();
		GlobalFs::mount(tmp.path()).unwrap();

		GlobalFs::create("f").unwrap();
		let err = GlobalFs::create("f").unwrap_err();
		assert_eq!(err.legacy_code(crate::error::Operation::Create), -1);

		let err = GlobalFs::delete("missing").unwrap_err();
		assert_eq!(err.legacy_code(crate::error::Operation::Delete), -1);

		let err = GlobalFs::write("missing", b"x").unwrap_err();
		assert_eq!(err.legacy_code(crate::error::Operation::Write), -1);

		let err = GlobalFs::read("missing", &mut [0u8; 1]).unwrap_err();
		assert_eq!(err.legacy_code(crate::error::Operation::Read), -1);

		GlobalFs::unmount();
	}
}
