//! The domain error type shared by every layer of the filesystem.

use std::fmt;
use std::io;

/// Everything that can go wrong while mutating or querying the image.
///
/// Each variant's [`fmt::Display`] impl renders exactly the line the shell
/// prints for that failure, so the library can stay `Result`-based while
/// preserving the original `ERR:`/`INFO:` wording.
#[derive(Debug)]
pub enum FsError {
	/// No free inode was left in the inode table.
	NoFreeInode,
	/// No free block was left in the block table.
	NoFreeBlock,
	/// A path component could not be found.
	PathNotFound,
	/// `..` was used while already at the root directory.
	AlreadyAtRoot,
	/// A name was the empty string.
	NameEmpty,
	/// A name was `MAX_FILENAME - 1` characters or longer.
	NameTooLong,
	/// A name contained a character outside `[A-Za-z0-9._]`.
	NameInvalidChar,
	/// A name was exactly `.` or `..`.
	NameDotOrDotDot,
	/// A name already exists in the target directory.
	NameOccupied,
	/// The path given to `cd` did not resolve to a directory.
	NotADirectory,
	/// The path given to `cat`/`rm` resolved to a directory.
	IsADirectory,
	/// `rmdir` was used on something that is not a directory.
	RmdirOnFile,
	/// `rm` was used on a path ending in `/`.
	RmTrailingSlash,
	/// `rm` was used on a directory.
	RmOnDirectory,
	/// `mkdir /` was attempted.
	MkdirRoot,
	/// `cd`/`mkdir`/`rmdir` was given no path argument.
	PathCannotBeEmpty,
	/// `echo` was given no string and/or no path argument.
	EchoMissingArgs,
	/// `cat`/`rm` was given no path argument.
	SpecifyFilePath,
	/// A file was not found by `cat`/`rm`.
	FileNotFound,
	/// `echo` content is larger than a single block.
	ContentTooLarge,
	/// An I/O error occurred while reading or writing `data.dsk`.
	Io(io::Error),
}

impl fmt::Display for FsError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::NoFreeInode => write!(f, "ERR: No inode left."),
			Self::NoFreeBlock => write!(f, "ERR: No block left."),
			Self::PathNotFound => write!(f, "ERR: Path not found."),
			Self::AlreadyAtRoot => write!(f, "ERR: Already at root."),
			Self::NameEmpty => write!(f, "ERR: Name cannot be empty."),
			Self::NameTooLong => write!(f, "ERR: Name length exceed limit."),
			Self::NameInvalidChar => write!(f, "ERR: Name cannot contain invalid char."),
			Self::NameDotOrDotDot => write!(f, "ERR: Name cannot be \"..\" or \".\"."),
			Self::NameOccupied => write!(f, "ERR: Name already occupied."),
			Self::NotADirectory => write!(f, "ERR: Bad path."),
			Self::IsADirectory => write!(f, "ERR: Cannot cat a dir."),
			Self::RmdirOnFile => write!(f, "ERR: Cannot rmdir a file."),
			Self::RmTrailingSlash => write!(f, "ERR: Use rmdir to remove dir."),
			Self::RmOnDirectory => write!(f, "ERR: Use mkdir to remove dir."),
			Self::MkdirRoot => write!(f, "ERR: Cannot mkdir root."),
			Self::PathCannotBeEmpty => write!(f, "ERR: Path cannot be empty."),
			Self::EchoMissingArgs => write!(f, "ERR: Please input str and path."),
			Self::SpecifyFilePath => write!(f, "ERR: Please specify file path."),
			Self::FileNotFound => write!(f, "ERR: File not found."),
			Self::ContentTooLarge => write!(f, "ERR: Content exceeds block size."),
			Self::Io(e) => write!(f, "ERR: {e}"),
		}
	}
}

impl std::error::Error for FsError {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self {
			Self::Io(e) => Some(e),
			_ => None,
		}
	}
}

impl From<io::Error> for FsError {
	fn from(e: io::Error) -> Self {
		Self::Io(e)
	}
}

pub type Result<T> = std::result::Result<T, FsError>;
