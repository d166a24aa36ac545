//! The operations layer: one method per shell command, each built on top of
//! the path resolver, the directory engine, and the allocator. A
//! [`Filesystem`] owns the image plus the working-directory ancestor stack
//! that the resolver reads and `cd`/`rmdir`/`format_disk` commit to.

use std::path::Path;

use crate::alloc;
use crate::dir;
use crate::error::{FsError, Result};
use crate::image::{Image, InodeId, InodeKind, BLOCK_DATA, BLOCK_DIR_ENTRY, BLOCK_SIZE, CURRENT_VERSION, MAX_PATH_DEPTH};
use crate::path;
use crate::persist;

/// Splits a path into `(parent, final component)`, mirroring how the shell
/// peels the last path segment off before resolving the rest: no final
/// slash means the whole string is the final component and the parent is
/// the current directory; a single leading slash with nothing else before
/// it means the parent is root.
fn split_path(path: &str) -> (&str, &str) {
	match path.rfind('/') {
		None => ("", path),
		Some(0) => ("/", &path[1..]),
		Some(i) => (&path[..i], &path[i + 1..]),
	}
}

/// The outcome of [`Filesystem::write`]: a success path is stdout-only, a
/// failure path also carries a message meant for stderr, matching the
/// original's split between `printf` and `fprintf(stderr, ...)`.
pub struct WriteReport {
	pub stdout: Vec<String>,
	pub stderr: Option<String>,
}

/// The whole filesystem: the image plus the working directory. `dir_inodes`
/// holds the ancestor stack from root to the current directory inclusive;
/// only `dir_inodes[..=cur_depth]` is meaningful.
pub struct Filesystem {
	pub image: Image,
	dir_inodes: [InodeId; MAX_PATH_DEPTH],
	cur_depth: usize,
}

impl Filesystem {
	/// Builds a freshly formatted filesystem: a zeroed image with just a
	/// root directory, working directory at root.
	pub fn new_formatted() -> Self {
		let mut image = Image::zeroed();
		image.version = CURRENT_VERSION;
		let root = alloc::allocate(&mut image, InodeKind::Directory, BLOCK_DIR_ENTRY)
			.expect("a freshly zeroed image always has room for the root directory");
		let mut dir_inodes = [0; MAX_PATH_DEPTH];
		dir_inodes[0] = root;
		Self {
			image,
			dir_inodes,
			cur_depth: 0,
		}
	}

	fn resolve(&self, path: &str) -> Result<path::ResolvedPath> {
		path::resolve(&self.image, path, &self.dir_inodes, self.cur_depth)
	}

	/// The absolute path of the working directory, `/`-joined, with a
	/// leading and (for anything but root) no trailing slash.
	pub fn pwd(&self) -> String {
		if self.cur_depth == 0 {
			return "/".to_string();
		}
		let mut out = String::new();
		for depth in 1..=self.cur_depth {
			let parent = self.dir_inodes[depth - 1];
			let child = self.dir_inodes[depth];
			let name = dir::name_of(&self.image, parent, child)
				.expect("every working-directory ancestor is filed under its parent");
			out.push('/');
			out.push_str(&name);
		}
		out
	}

	/// `cd <path>`. An empty path argument (as opposed to a missing one) is
	/// a no-op that succeeds, matching `cd ""`.
	pub fn cd(&mut self, path: Option<&str>) -> Result<()> {
		let path = path.ok_or(FsError::PathCannotBeEmpty)?;
		let resolved = self.resolve(path)?;
		if self.image.nodes[resolved.inode as usize].kind() != Some(InodeKind::Directory) {
			return Err(FsError::NotADirectory);
		}
		self.dir_inodes[..=resolved.depth()].copy_from_slice(&resolved.stack);
		self.cur_depth = resolved.depth();
		Ok(())
	}

	/// `ls [<path>]`, defaulting to the working directory. A file target
	/// lists just its own name; a directory target lists `../` and `./`
	/// (the latter omitted at root, which has no parent) followed by its
	/// entries, directories suffixed with `/`.
	pub fn ls(&self, path: Option<&str>) -> Result<Vec<String>> {
		let resolved = self.resolve(path.unwrap_or(""))?;

		if self.image.nodes[resolved.inode as usize].kind() != Some(InodeKind::Directory) {
			let parent = resolved.parent.expect("a file can never be the root");
			let name = dir::name_of(&self.image, parent, resolved.inode)
				.expect("a resolved file always appears in its parent's entries");
			return Ok(vec![name]);
		}

		let mut lines = Vec::new();
		if resolved.depth() > 0 {
			lines.push("../".to_string());
		}
		lines.push("./".to_string());
		for (name, _, kind) in dir::iterate(&self.image, resolved.inode) {
			if kind == InodeKind::Directory {
				lines.push(format!("{name}/"));
			} else {
				lines.push(name);
			}
		}
		Ok(lines)
	}

	/// `mkdir <path>`.
	pub fn mkdir(&mut self, path: Option<&str>) -> Result<()> {
		let path = path.ok_or(FsError::PathCannotBeEmpty)?;
		if path == "/" {
			return Err(FsError::MkdirRoot);
		}
		let path = path.trim_end_matches('/');

		let (parent_path, name) = split_path(path);
		let resolved = self.resolve(parent_path)?;
		dir::validate_name(name)?;
		if self.image.nodes[resolved.inode as usize].kind() != Some(InodeKind::Directory) {
			return Err(FsError::NotADirectory);
		}

		let new_inode = alloc::allocate(&mut self.image, InodeKind::Directory, BLOCK_DIR_ENTRY)?;
		if let Err(e) = dir::insert(&mut self.image, resolved.inode, name, new_inode) {
			alloc::release(&mut self.image, new_inode);
			return Err(e);
		}
		Ok(())
	}

	/// `rmdir <path>`. Removing the root reformats the entire image, same
	/// as the explicit `fmt` command. Removing an ancestor of the working
	/// directory rewinds it to the nearest surviving ancestor.
	pub fn rmdir(&mut self, path: Option<&str>) -> Result<Vec<String>> {
		let path = path.ok_or(FsError::PathCannotBeEmpty)?;
		let resolved = self.resolve(path)?;

		if resolved.inode == self.dir_inodes[0] {
			return Ok(self.format_disk());
		}
		if self.image.nodes[resolved.inode as usize].kind() != Some(InodeKind::Directory) {
			return Err(FsError::RmdirOnFile);
		}

		let parent = resolved.parent.expect("a non-root directory always has a parent");
		let name = dir::name_of(&self.image, parent, resolved.inode)
			.expect("a resolved directory always appears in its parent's entries");

		dir::teardown(&mut self.image, resolved.inode);
		dir::remove(&mut self.image, parent, &name)?;
		dir::release_chain(&mut self.image, resolved.inode);

		while self.image.super_block.inode_bitmap[self.dir_inodes[self.cur_depth] as usize] == 0 {
			self.cur_depth -= 1;
		}

		Ok(vec![format!("Changing dir to: {}", self.pwd())])
	}

	/// `echo <str> <path>`: creates a file at `path` holding `str`'s bytes.
	pub fn echo(&mut self, content: Option<&str>, path: Option<&str>) -> Result<()> {
		let (content, path) = match (content, path) {
			(Some(c), Some(p)) => (c, p),
			_ => return Err(FsError::EchoMissingArgs),
		};

		let bytes = content.as_bytes();
		if bytes.len() > BLOCK_SIZE {
			return Err(FsError::ContentTooLarge);
		}

		let path = path.trim_end_matches('/');
		let (parent_path, name) = split_path(path);
		let resolved = self.resolve(parent_path)?;
		dir::validate_name(name)?;
		if self.image.nodes[resolved.inode as usize].kind() != Some(InodeKind::Directory) {
			return Err(FsError::NotADirectory);
		}

		let new_inode = alloc::allocate(&mut self.image, InodeKind::File, BLOCK_DATA)?;
		if let Err(e) = dir::insert(&mut self.image, resolved.inode, name, new_inode) {
			alloc::release(&mut self.image, new_inode);
			return Err(e);
		}

		self.image.nodes[new_inode as usize].file_size = bytes.len() as u32;
		let block = self.image.nodes[new_inode as usize].block() as usize;
		self.image.blocks[block].data_mut()[..bytes.len()].copy_from_slice(bytes);
		Ok(())
	}

	/// `cat <path>`: returns the file's contents as a string.
	pub fn cat(&self, path: Option<&str>) -> Result<String> {
		let path = path.ok_or(FsError::SpecifyFilePath)?;
		let (parent_path, name) = split_path(path);
		let resolved = self.resolve(parent_path)?;
		dir::validate_name(name)?;

		let target = dir::lookup(&self.image, resolved.inode, name).ok_or(FsError::FileNotFound)?;
		if self.image.nodes[target as usize].kind() == Some(InodeKind::Directory) {
			return Err(FsError::IsADirectory);
		}

		let size = self.image.nodes[target as usize].file_size as usize;
		let block = self.image.nodes[target as usize].block() as usize;
		Ok(String::from_utf8_lossy(&self.image.blocks[block].data()[..size]).into_owned())
	}

	/// `rm <path>`.
	pub fn rm(&mut self, path: Option<&str>) -> Result<()> {
		let path = path.ok_or(FsError::SpecifyFilePath)?;
		if path.ends_with('/') {
			return Err(FsError::RmTrailingSlash);
		}

		let (parent_path, name) = split_path(path);
		let resolved = self.resolve(parent_path)?;
		dir::validate_name(name)?;

		let target = dir::lookup(&self.image, resolved.inode, name).ok_or(FsError::FileNotFound)?;
		if self.image.nodes[target as usize].kind() == Some(InodeKind::Directory) {
			return Err(FsError::RmOnDirectory);
		}

		dir::remove(&mut self.image, resolved.inode, name)?;
		alloc::release(&mut self.image, target);
		Ok(())
	}

	/// `fmt`: wipes the image and recreates an empty root directory.
	pub fn format_disk(&mut self) -> Vec<String> {
		let mut lines = vec!["Formatting disk...".to_string()];
		*self = Self::new_formatted();
		lines.push("Formatting done...".to_string());
		lines
	}

	/// `dmp`: dumps every allocated inode, its kind, and (for directories
	/// and continuations) the chain of entry blocks reached by following
	/// `next_inode` from that very inode onward.
	pub fn dmp(&self) -> Vec<String> {
		let mut lines = Vec::new();
		for i in 0..crate::image::MAX_INODE {
			if self.image.super_block.inode_bitmap[i] == 0 {
				continue;
			}
			let inode_id = i as InodeId;
			match self.image.nodes[i].kind() {
				Some(InodeKind::Directory) | Some(InodeKind::Continuation) => {
					let label = if self.image.nodes[i].kind() == Some(InodeKind::Directory) {
						"dir"
					} else {
						"cont"
					};
					lines.push(format!("Inode #{i}: {label}"));

					let mut cur = inode_id;
					loop {
						let block = self.image.nodes[cur as usize].block();
						lines.push(format!("Block #{block}:"));
						let entries = self.image.blocks[block as usize].as_entries();
						for (j, entry) in entries.iter().enumerate() {
							if self.image.nodes[cur as usize].slot_used(j) {
								lines.push(format!("Item #{j}: Id: {} Name: {}", entry.id, entry.name_str()));
							}
						}

						let next = self.image.nodes[cur as usize].next_inode;
						if next == crate::image::INVALID_INODE {
							break;
						}
						lines.push(format!("Going to next:{next}"));
						cur = next as InodeId;
					}
				}
				Some(InodeKind::File) => {
					lines.push(format!("Inode #{i}: file"));
					let block = self.image.nodes[i].block();
					let size = self.image.nodes[i].file_size as usize;
					let content = String::from_utf8_lossy(&self.image.blocks[block as usize].data()[..size]);
					lines.push(format!("Block: {block} Content: {content}"));
				}
				None => {}
			}
		}
		lines
	}

	/// Loads the image from [`persist::DATA_FILE`], falling back to a fresh
	/// format on a missing file or a version mismatch. Does not touch the
	/// working-directory stack, which is not part of the persisted image.
	pub fn read(&mut self) -> Vec<String> {
		let mut lines = vec![format!("Reading fs from {} ...", persist::DATA_FILE)];
		match persist::load(Path::new(persist::DATA_FILE)) {
			Ok(image) if image.version == CURRENT_VERSION => {
				lines.push("Reading done.".to_string());
				self.image = image;
			}
			Ok(_) => {
				lines.push("Reading done.".to_string());
				lines.push("ERR: disk version mismatch -- creating a new disk.".to_string());
				lines.extend(self.format_disk());
			}
			Err(_) => {
				lines.push("File not found -- creating a new disk.".to_string());
				lines.extend(self.format_disk());
			}
		}
		lines
	}

	/// Saves the image to [`persist::DATA_FILE`].
	pub fn write(&self) -> WriteReport {
		let mut stdout = vec!["Now saving data to disk..".to_string()];
		match persist::save(&self.image, Path::new(persist::DATA_FILE)) {
			Ok(()) => {
				stdout.push("Saving done.".to_string());
				WriteReport { stdout, stderr: None }
			}
			Err(_) => WriteReport {
				stdout,
				stderr: Some(format!("Open {} failed. Will lose all changes.", persist::DATA_FILE)),
			},
		}
	}
}
