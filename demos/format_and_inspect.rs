//! Formats a fresh image, mounts it, creates and writes a couple of
//! files, lists the directory, and prints the free-block count. Meant
//! to be run and read, not asserted on.

use std::env;
use std::path::PathBuf;
use std::process::exit;

use blockfs::Volume;

fn main() {
	env_logger::init();

	let path = env::args().nth(1).map(PathBuf::from).unwrap_or_else(|| {
		env::temp_dir().join("blockfs.img")
	});

	if let Err(e) = run(&path) {
		eprintln!("format_and_inspect: {e}");
		exit(1);
	}
}

fn run(path: &PathBuf) -> blockfs::Result<()> {
	Volume::format(path)?;
	let mut vol = Volume::mount(path)?;

	vol.create("hello.txt")?;
	vol.write("hello.txt", b"hello, blockfs\n")?;

	vol.create("empty.txt")?;

	for name in vol.list(16)? {
		println!("{name}");
	}

	println!("free_blocks = {}", vol.free_blocks());

	vol.unmount();
	Ok(())
}
