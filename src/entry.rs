use std::ffi::OsStr;
use std::path::Path;

use rustix::fs::{FileType, Stat};

/// A single filesystem entry visited by the walk.
///
/// Built fresh for every entry right before the predicates run and dropped
/// once the entry (and, for directories, its subtree) has been processed.
/// Borrows its name and path from the engine's stack frame.
#[derive(Debug, Clone, Copy)]
pub struct Entry<'a> {
    /// Full path from the traversal root, built by joining the parent path
    /// and `name` with `/`.
    pub path: &'a Path,

    /// The entry's own name component. For the root this is the root
    /// argument exactly as it was given.
    pub name: &'a OsStr,

    /// How deep in the traversal this entry was found. Root = 0.
    pub depth: usize,

    /// Status of the open handle, fetched with `fstat`.
    pub metadata: Metadata,
}

/// The subset of `stat` the predicates look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Metadata {
    /// Inode number.
    pub ino: u64,

    /// Size in bytes.
    pub size: i64,

    /// Hard-link count.
    pub nlink: u64,

    /// File type bits.
    pub kind: EntryKind,
}

impl Metadata {
    #[allow(clippy::unnecessary_cast)]
    pub(crate) fn from_stat(stat: &Stat) -> Self {
        Self {
            ino:   stat.st_ino as u64,
            size:  stat.st_size as i64,
            nlink: stat.st_nlink as u64,
            kind:  EntryKind::from(FileType::from_raw_mode(stat.st_mode as _)),
        }
    }

    /// Whether the walk descends into this entry.
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Dir
    }
}

/// The kind of a traversed entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// A regular file.
    File,

    /// A directory.
    Dir,

    /// A symbolic link. Only seen for links opened in link-inert mode;
    /// never descended into.
    Symlink,

    /// Anything else (device files, pipes, sockets, etc.).
    Other,

    /// The directory listing gave no type hint.
    Unknown,
}

impl From<FileType> for EntryKind {
    fn from(ft: FileType) -> Self {
        match ft {
            FileType::RegularFile => Self::File,
            FileType::Directory   => Self::Dir,
            FileType::Symlink     => Self::Symlink,
            FileType::Unknown     => Self::Unknown,
            _                     => Self::Other,
        }
    }
}
