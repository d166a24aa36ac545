//! Serialization of an [`Image`] to and from a single binary image file,
//! laid out field by field: version, then the two bitmaps, then the inode
//! table, then the block table.

use std::fs::File;
use std::io::{self, Read, Write};
use std::mem::size_of;
use std::path::Path;
use std::slice;

use crate::image::{Image, Inode, MAX_BLOCK, MAX_INODE};

/// Name of the on-disk image file, relative to the working directory the
/// shell was started in.
pub const DATA_FILE: &str = "data.dsk";

/// Writes `image` to `path`, overwriting any existing file.
pub fn save(image: &Image, path: &Path) -> io::Result<()> {
	let mut file = File::create(path)?;
	file.write_all(&image.version.to_ne_bytes())?;
	file.write_all(&image.super_block.inode_bitmap)?;
	file.write_all(&image.super_block.block_bitmap)?;

	// `Inode` and `Block` are `#[repr(C)]` and `Copy`, and the arrays are
	// contiguous, so a single reinterpreting write covers each table.
	let nodes_bytes =
		unsafe { slice::from_raw_parts(image.nodes.as_ptr() as *const u8, MAX_INODE * size_of::<Inode>()) };
	file.write_all(nodes_bytes)?;

	let blocks_bytes =
		unsafe { slice::from_raw_parts(image.blocks.as_ptr() as *const u8, MAX_BLOCK * crate::image::BLOCK_SIZE) };
	file.write_all(blocks_bytes)?;

	Ok(())
}

/// Reads an [`Image`] back from `path`. Does not check
/// [`crate::image::CURRENT_VERSION`] itself; callers decide whether a
/// version mismatch should be tolerated or treated as a reason to reformat.
pub fn load(path: &Path) -> io::Result<Image> {
	let mut file = File::open(path)?;
	let mut image = Image::zeroed();

	let mut version_bytes = [0u8; 4];
	file.read_exact(&mut version_bytes)?;
	image.version = u32::from_ne_bytes(version_bytes);

	file.read_exact(&mut image.super_block.inode_bitmap)?;
	file.read_exact(&mut image.super_block.block_bitmap)?;

	let nodes_bytes = unsafe {
		slice::from_raw_parts_mut(image.nodes.as_mut_ptr() as *mut u8, MAX_INODE * size_of::<Inode>())
	};
	file.read_exact(nodes_bytes)?;

	let blocks_bytes = unsafe {
		slice::from_raw_parts_mut(image.blocks.as_mut_ptr() as *mut u8, MAX_BLOCK * crate::image::BLOCK_SIZE)
	};
	file.read_exact(blocks_bytes)?;

	Ok(image)
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::alloc;
	use crate::image::{InodeKind, BLOCK_DIR_ENTRY};

	#[test]
	fn save_then_load_roundtrips_a_populated_image() {
		let dir = std::env::temp_dir().join(format!("extfs-persist-test-{}", std::process::id()));
		std::fs::create_dir_all(&dir).unwrap();
		let path = dir.join("data.dsk");

		let mut image = Image::zeroed();
		image.version = crate::image::CURRENT_VERSION;
		let root = alloc::allocate(&mut image, InodeKind::Directory, BLOCK_DIR_ENTRY).unwrap();
		let file = alloc::allocate(&mut image, InodeKind::File, crate::image::BLOCK_DATA).unwrap();
		crate::dir::insert(&mut image, root, "f", file).unwrap();

		save(&image, &path).unwrap();
		let loaded = load(&path).unwrap();

		assert_eq!(loaded.version, crate::image::CURRENT_VERSION);
		assert_eq!(loaded.super_block.inode_bitmap[root as usize], 1);
		assert_eq!(loaded.super_block.inode_bitmap[file as usize], 1);
		assert_eq!(crate::dir::lookup(&loaded, root, "f"), Some(file));

		let _ = std::fs::remove_file(&path);
	}

	#[test]
	fn load_fails_on_missing_file() {
		let path = std::env::temp_dir().join("extfs-persist-test-missing.dsk");
		let _ = std::fs::remove_file(&path);
		assert!(load(&path).is_err());
	}
}
