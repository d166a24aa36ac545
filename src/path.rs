//! Path resolution: translates a textual path into an inode id, without
//! mutating the committed working-directory state. Callers copy the
//! returned stack in on success.

use crate::dir;
use crate::error::{FsError, Result};
use crate::image::{Image, InodeId, MAX_PATH_DEPTH};

/// The result of resolving a path: the target inode, its parent (`None`
/// only for the root directory), and the full ancestor stack from root to
/// target inclusive.
///
/// Callers would otherwise recompute the parent from a depth counter.
/// Carrying `parent` directly here keeps `rmdir` from underflowing when the
/// path normalizes to the current directory (e.g. `rmdir .`).
pub struct ResolvedPath {
	pub inode: InodeId,
	pub parent: Option<InodeId>,
	pub stack: Vec<InodeId>,
}

impl ResolvedPath {
	/// The depth of the resolved inode: `0` for root.
	pub fn depth(&self) -> usize {
		self.stack.len() - 1
	}

	fn from_stack(stack: Vec<InodeId>) -> Self {
		let inode = *stack.last().expect("resolver stack is never empty");
		let parent = (stack.len() > 1).then(|| stack[stack.len() - 2]);
		Self { inode, parent, stack }
	}
}

/// Resolves `path` against the working-directory state `(dir_inodes,
/// cur_depth)`, where `dir_inodes[0..=cur_depth]` is the committed ancestor
/// stack. An absolute path (leading `/`) starts at `dir_inodes[0]`; a
/// relative path (including the empty path) starts at the current
/// directory.
pub fn resolve(image: &Image, path: &str, dir_inodes: &[InodeId], cur_depth: usize) -> Result<ResolvedPath> {
	if path.is_empty() {
		return Ok(ResolvedPath::from_stack(dir_inodes[..=cur_depth].to_vec()));
	}

	let (mut stack, rest): (Vec<InodeId>, &str) = if let Some(rest) = path.strip_prefix('/') {
		(vec![dir_inodes[0]], rest)
	} else {
		(dir_inodes[..=cur_depth].to_vec(), path)
	};

	for component in rest.split('/') {
		if component.is_empty() || component == "." {
			continue;
		}
		if component == ".." {
			if stack.len() <= 1 {
				return Err(FsError::AlreadyAtRoot);
			}
			stack.pop();
			continue;
		}

		let cur = *stack.last().expect("resolver stack is never empty");
		let next = dir::lookup(image, cur, component).ok_or(FsError::PathNotFound)?;
		if stack.len() >= MAX_PATH_DEPTH {
			return Err(FsError::PathNotFound);
		}
		stack.push(next);
	}

	Ok(ResolvedPath::from_stack(stack))
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::alloc;
	use crate::image::{InodeKind, BLOCK_DATA, BLOCK_DIR_ENTRY};

	fn root_image() -> (Image, InodeId) {
		let mut image = Image::zeroed();
		let root = alloc::allocate(&mut image, InodeKind::Directory, BLOCK_DIR_ENTRY).unwrap();
		(image, root)
	}

	#[test]
	fn empty_path_yields_current_directory() {
		let (image, root) = root_image();
		let resolved = resolve(&image, "", &[root], 0).unwrap();
		assert_eq!(resolved.inode, root);
		assert_eq!(resolved.parent, None);
		assert_eq!(resolved.depth(), 0);
	}

	#[test]
	fn absolute_and_relative_paths_find_nested_dirs() {
		let (mut image, root) = root_image();
		let a = alloc::allocate(&mut image, InodeKind::Directory, BLOCK_DIR_ENTRY).unwrap();
		dir::insert(&mut image, root, "a", a).unwrap();
		let b = alloc::allocate(&mut image, InodeKind::Directory, BLOCK_DIR_ENTRY).unwrap();
		dir::insert(&mut image, a, "b", b).unwrap();

		let resolved = resolve(&image, "/a/b", &[root], 0).unwrap();
		assert_eq!(resolved.inode, b);
		assert_eq!(resolved.parent, Some(a));
		assert_eq!(resolved.stack, vec![root, a, b]);

		let resolved = resolve(&image, "a/b", &[root], 0).unwrap();
		assert_eq!(resolved.inode, b);
	}

	#[test]
	fn dot_dot_walks_up_and_underflows_at_root() {
		let (mut image, root) = root_image();
		let a = alloc::allocate(&mut image, InodeKind::Directory, BLOCK_DIR_ENTRY).unwrap();
		dir::insert(&mut image, root, "a", a).unwrap();

		let resolved = resolve(&image, "a/..", &[root], 0).unwrap();
		assert_eq!(resolved.inode, root);

		let err = resolve(&image, "..", &[root], 0).unwrap_err();
		assert!(matches!(err, FsError::AlreadyAtRoot));
	}

	#[test]
	fn missing_component_is_path_not_found() {
		let (image, root) = root_image();
		let err = resolve(&image, "nope", &[root], 0).unwrap_err();
		assert!(matches!(err, FsError::PathNotFound));
	}

	#[test]
	fn traversal_through_a_file_is_path_not_found() {
		let (mut image, root) = root_image();
		let file = alloc::allocate(&mut image, InodeKind::File, BLOCK_DATA).unwrap();
		dir::insert(&mut image, root, "f", file).unwrap();

		let err = resolve(&image, "f/inside", &[root], 0).unwrap_err();
		assert!(matches!(err, FsError::PathNotFound));
	}

	#[test]
	fn rmdir_dot_parent_is_the_real_parent_not_an_underflow() {
		let (mut image, root) = root_image();
		let a = alloc::allocate(&mut image, InodeKind::Directory, BLOCK_DIR_ENTRY).unwrap();
		dir::insert(&mut image, root, "a", a).unwrap();

		// Resolving "." from within `a` must report `a`'s parent as `root`,
		// not underflow the way `temp_cur_depth - 1` would at depth 0.
		let resolved = resolve(&image, ".", &[root, a], 1).unwrap();
		assert_eq!(resolved.inode, a);
		assert_eq!(resolved.parent, Some(root));

		let resolved = resolve(&image, ".", &[root], 0).unwrap();
		assert_eq!(resolved.inode, root);
		assert_eq!(resolved.parent, None);
	}
}
