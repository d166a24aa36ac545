//! The directory engine: a directory is a linked chain of inodes whose head
//! has [`InodeKind::Directory`] and whose zero-or-more tail inodes have
//! [`InodeKind::Continuation`]. Each chain member owns exactly one entry
//! block of sixteen slots.

use crate::alloc;
use crate::error::{FsError, Result};
use crate::image::{Image, InodeId, InodeKind, BLOCK_DIR_ENTRY, DIRENTRY_PER_BLOCK, INVALID_INODE, MAX_FILENAME};

/// Validates a name against invariant 9 in the spec: non-empty, short
/// enough, `[A-Za-z0-9._]` only, and not `.` or `..`.
pub fn validate_name(name: &str) -> Result<()> {
	if name.is_empty() {
		return Err(FsError::NameEmpty);
	}
	if name.len() >= MAX_FILENAME - 1 {
		return Err(FsError::NameTooLong);
	}
	if !name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'.' || b == b'_') {
		return Err(FsError::NameInvalidChar);
	}
	if name == "." || name == ".." {
		return Err(FsError::NameDotOrDotDot);
	}
	Ok(())
}

/// Returns the chain members starting at `head`, in chain order.
fn chain_members(image: &Image, head: InodeId) -> Vec<InodeId> {
	let mut members = Vec::new();
	let mut cur = head;
	loop {
		members.push(cur);
		let next = image.nodes[cur as usize].next_inode;
		if next == INVALID_INODE {
			break;
		}
		cur = next as InodeId;
	}
	members
}

/// Looks up `name` in the directory chain rooted at `head`.
pub fn lookup(image: &Image, head: InodeId, name: &str) -> Option<InodeId> {
	for m in chain_members(image, head) {
		let block = image.nodes[m as usize].block() as usize;
		let entries = image.blocks[block].as_entries();
		for i in 0..DIRENTRY_PER_BLOCK {
			if image.nodes[m as usize].slot_used(i) && entries[i].name_str() == name {
				return Some(entries[i].id);
			}
		}
	}
	None
}

/// Inserts `(name, target)` into the directory chain rooted at `head`.
/// Returns `true` if doing so required allocating a new continuation inode
/// (the directory's sixteen-per-block capacity was exhausted), `false` if
/// an existing slot was used.
///
/// If no chain member has a free slot, a new continuation inode is
/// allocated and linked at the tail. If that allocation fails, nothing is
/// mutated beyond what had already been true (no half-linked chain); the
/// caller is still responsible for releasing `target` itself, since insert
/// does not know whether the caller just allocated it.
pub fn insert(image: &mut Image, head: InodeId, name: &str, target: InodeId) -> Result<bool> {
	validate_name(name)?;
	if lookup(image, head, name).is_some() {
		return Err(FsError::NameOccupied);
	}

	let members = chain_members(image, head);
	for &m in &members {
		if let Some(slot) = image.nodes[m as usize].first_free_slot() {
			let block = image.nodes[m as usize].block() as usize;
			image.nodes[m as usize].set_slot(slot, true);
			image.nodes[m as usize].entry_count += 1;
			let entry = &mut image.blocks[block].as_entries_mut()[slot];
			entry.set_name(name);
			entry.id = target;
			return Ok(false);
		}
	}

	let last = *members.last().expect("a directory chain always has at least its head");
	let cont = alloc::allocate(image, InodeKind::Continuation, BLOCK_DIR_ENTRY)?;
	image.nodes[last as usize].next_inode = cont as u16;
	image.nodes[cont as usize].set_slot(0, true);
	image.nodes[cont as usize].entry_count += 1;
	let block = image.nodes[cont as usize].block() as usize;
	let entry = &mut image.blocks[block].as_entries_mut()[0];
	entry.set_name(name);
	entry.id = target;
	Ok(true)
}

/// Removes `name` from the directory chain rooted at `head`, returning the
/// inode id it pointed to. The caller releases that inode (and its chain,
/// for directories); files and directories are torn down differently.
///
/// A non-head chain member whose `entry_count` drops to zero is unlinked
/// from the chain and released; the head is never unlinked even when
/// empty, since it anchors the directory itself.
pub fn remove(image: &mut Image, head: InodeId, name: &str) -> Result<InodeId> {
	let members = chain_members(image, head);
	let mut prev: Option<InodeId> = None;

	for &m in &members {
		let block = image.nodes[m as usize].block() as usize;
		let found = (0..DIRENTRY_PER_BLOCK).find(|&i| {
			image.nodes[m as usize].slot_used(i) && image.blocks[block].as_entries()[i].name_str() == name
		});

		if let Some(i) = found {
			let target = image.blocks[block].as_entries()[i].id;
			image.nodes[m as usize].set_slot(i, false);
			image.nodes[m as usize].entry_count -= 1;

			if m != head && image.nodes[m as usize].entry_count == 0 {
				let next = image.nodes[m as usize].next_inode;
				if let Some(p) = prev {
					image.nodes[p as usize].next_inode = next;
				}
				alloc::release(image, m);
			}

			return Ok(target);
		}

		prev = Some(m);
	}

	Err(FsError::PathNotFound)
}

/// Finds the name under which `target` is filed in the chain rooted at
/// `head`, if any. Used by `rmdir`, which resolves straight to the target
/// directory's inode and so needs its name looked up after the fact.
pub fn name_of(image: &Image, head: InodeId, target: InodeId) -> Option<String> {
	iterate(image, head).into_iter().find(|(_, id, _)| *id == target).map(|(name, _, _)| name)
}

/// Releases every chain member of the directory rooted at `head`, including
/// the head itself. Callers must have already unlinked `head` from its
/// parent and torn down its contents with [`teardown`].
pub fn release_chain(image: &mut Image, head: InodeId) {
	for m in chain_members(image, head) {
		alloc::release(image, m);
	}
}

/// Yields `(name, target, kind)` for every occupied slot in the chain, in
/// chain order.
pub fn iterate(image: &Image, head: InodeId) -> Vec<(String, InodeId, InodeKind)> {
	let mut out = Vec::new();
	for m in chain_members(image, head) {
		let block = image.nodes[m as usize].block() as usize;
		let entries = image.blocks[block].as_entries();
		for i in 0..DIRENTRY_PER_BLOCK {
			if image.nodes[m as usize].slot_used(i) {
				let e = &entries[i];
				let kind = image.nodes[e.id as usize]
					.kind()
					.expect("directory entry points to an inode with no valid mode");
				out.push((e.name_str().to_string(), e.id, kind));
			}
		}
	}
	out
}

/// Recursively tears down every entry of the directory chain rooted at
/// `head`: sub-directories are torn down first, then every chain member of
/// each sub-entry is released and its slot cleared. `head` itself is never
/// released; the caller decides whether and how to release it (root is
/// exempt entirely, non-root directories are released as a whole chain by
/// the caller after teardown).
pub fn teardown(image: &mut Image, head: InodeId) {
	for m in chain_members(image, head) {
		let block = image.nodes[m as usize].block() as usize;
		for i in 0..DIRENTRY_PER_BLOCK {
			if !image.nodes[m as usize].slot_used(i) {
				continue;
			}
			let target = image.blocks[block].as_entries()[i].id;

			if image.nodes[target as usize].kind() == Some(InodeKind::Directory) {
				teardown(image, target);
			}

			image.nodes[m as usize].set_slot(i, false);
			image.nodes[m as usize].entry_count -= 1;

			for sub in chain_members(image, target) {
				alloc::release(image, sub);
			}
		}
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::image::Image;

	fn new_dir(image: &mut Image) -> InodeId {
		alloc::allocate(image, InodeKind::Directory, BLOCK_DIR_ENTRY).unwrap()
	}

	#[test]
	fn validate_name_rejects_invalid_chars() {
		assert!(matches!(validate_name("a b"), Err(FsError::NameInvalidChar)));
		assert!(matches!(validate_name(""), Err(FsError::NameEmpty)));
		assert!(matches!(validate_name("."), Err(FsError::NameDotOrDotDot)));
		assert!(matches!(validate_name(".."), Err(FsError::NameDotOrDotDot)));
		assert!(validate_name("n01").is_ok());
		assert!(validate_name("a.b_c").is_ok());
	}

	#[test]
	fn validate_name_enforces_length_limit() {
		let max_ok = "a".repeat(MAX_FILENAME - 2);
		let too_long = "a".repeat(MAX_FILENAME - 1);
		assert!(validate_name(&max_ok).is_ok());
		assert!(matches!(validate_name(&too_long), Err(FsError::NameTooLong)));
	}

	#[test]
	fn insert_then_lookup_roundtrips() {
		let mut image = Image::zeroed();
		let dir = new_dir(&mut image);
		let file = alloc::allocate(&mut image, InodeKind::File, crate::image::BLOCK_DATA).unwrap();

		insert(&mut image, dir, "hello.txt", file).unwrap();
		assert_eq!(lookup(&image, dir, "hello.txt"), Some(file));
	}

	#[test]
	fn insert_rejects_duplicate_name() {
		let mut image = Image::zeroed();
		let dir = new_dir(&mut image);
		let a = new_dir(&mut image);
		let b = new_dir(&mut image);

		insert(&mut image, dir, "a", a).unwrap();
		assert!(matches!(insert(&mut image, dir, "a", b), Err(FsError::NameOccupied)));
	}

	#[test]
	fn insert_overflows_into_continuation_inode() {
		let mut image = Image::zeroed();
		let dir = new_dir(&mut image);

		for i in 0..17 {
			let child = new_dir(&mut image);
			insert(&mut image, dir, &format!("n{i:02}"), child).unwrap();
		}

		assert_ne!(image.nodes[dir as usize].next_inode, INVALID_INODE);
		let entries = iterate(&image, dir);
		assert_eq!(entries.len(), 17);
	}

	#[test]
	fn remove_clears_slot_and_returns_target() {
		let mut image = Image::zeroed();
		let dir = new_dir(&mut image);
		let file = alloc::allocate(&mut image, InodeKind::File, crate::image::BLOCK_DATA).unwrap();
		insert(&mut image, dir, "f", file).unwrap();

		let removed = remove(&mut image, dir, "f").unwrap();
		assert_eq!(removed, file);
		assert_eq!(lookup(&image, dir, "f"), None);
	}

	#[test]
	fn remove_unlinks_empty_continuation() {
		let mut image = Image::zeroed();
		let dir = new_dir(&mut image);
		let mut children = Vec::new();
		for i in 0..17 {
			let child = new_dir(&mut image);
			insert(&mut image, dir, &format!("n{i:02}"), child).unwrap();
			children.push(child);
		}

		let cont = image.nodes[dir as usize].next_inode as InodeId;
		assert_ne!(cont, INVALID_INODE as InodeId);

		// The 17th entry is the sole occupant of the continuation inode.
		remove(&mut image, dir, "n16").unwrap();

		assert_eq!(image.nodes[dir as usize].next_inode, INVALID_INODE);
		assert_eq!(image.super_block.inode_bitmap[cont as usize], 0);
	}

	#[test]
	fn teardown_releases_nested_directories_but_not_head() {
		let mut image = Image::zeroed();
		let root = new_dir(&mut image);
		let child = new_dir(&mut image);
		let grandchild = new_dir(&mut image);
		insert(&mut image, root, "child", child).unwrap();
		insert(&mut image, child, "grandchild", grandchild).unwrap();

		teardown(&mut image, root);

		assert_eq!(image.super_block.inode_bitmap[child as usize], 0);
		assert_eq!(image.super_block.inode_bitmap[grandchild as usize], 0);
		assert_eq!(image.super_block.inode_bitmap[root as usize], 1);
		assert_eq!(image.nodes[root as usize].entry_count, 0);
	}
}
