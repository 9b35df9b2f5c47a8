use std::ffi::{CStr, OsStr, OsString};
use std::io;
use std::mem::MaybeUninit;
use std::os::fd::BorrowedFd;
use std::os::unix::ffi::OsStrExt;

use rustix::fs::{Dir, RawDir};

use crate::entry::EntryKind;

/// Size of the buffer raw directory records are read into.
pub const DENTS_BUFSIZE: usize = 4096;

/// How a directory's children are enumerated.
///
/// Both strategies read through the directory's already-open handle and
/// yield the same `(name, type hint)` pairs, `.` and `..` included.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Listing {
    /// Read raw entry records with `getdents64` into a fixed
    /// [`DENTS_BUFSIZE`]-byte buffer. Each record's length field advances to
    /// the next one; a read returning zero bytes ends the listing.
    #[default]
    Raw,

    /// Use the directory-stream API on a fresh handle for the same
    /// directory.
    Stream,
}

/// One child reported by a listing.
pub(crate) struct Child {
    pub name: OsString,
    pub hint: EntryKind,
}

impl Child {
    fn new(name: &CStr, hint: EntryKind) -> Self {
        Self {
            name: OsStr::from_bytes(name.to_bytes()).to_os_string(),
            hint,
        }
    }

    /// `.` and `..` are never visited.
    pub fn is_dot(&self) -> bool {
        matches!(self.name.as_bytes(), b"." | b"..")
    }
}

/// Buffer backing a raw listing. Owned by the caller so it can outlive the
/// [`Children`] that borrows it.
pub(crate) fn dents_buffer() -> Vec<MaybeUninit<u8>> {
    vec![MaybeUninit::uninit(); DENTS_BUFSIZE]
}

/// A lazy sequence of children. Can only be restarted by reopening the
/// directory. Dropping it releases the stream's own resources; the
/// directory handle itself stays with its owner.
pub(crate) enum Children<'a> {
    Raw(RawDir<'a, BorrowedFd<'a>>),
    Stream(Dir),
}

impl<'a> Children<'a> {
    pub fn open(
        fd: BorrowedFd<'a>,
        listing: Listing,
        buf: &'a mut [MaybeUninit<u8>],
    ) -> io::Result<Self> {
        match listing {
            Listing::Raw    => Ok(Self::Raw(RawDir::new(fd, buf))),
            Listing::Stream => Ok(Self::Stream(Dir::read_from(fd)?)),
        }
    }

    /// The next child, `None` at end of directory, or the read error that
    /// ended the listing.
    pub fn next_child(&mut self) -> Option<io::Result<Child>> {
        match self {
            Self::Raw(dir) => dir.next().map(|res| {
                res.map(|e| Child::new(e.file_name(), e.file_type().into()))
                    .map_err(io::Error::from)
            }),
            Self::Stream(dir) => dir.read().map(|res| {
                res.map(|e| Child::new(e.file_name(), e.file_type().into()))
                    .map_err(io::Error::from)
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::fs;
    use std::os::fd::AsFd;

    use rustix::fs::{open, Mode, OFlags};

    use super::*;

    fn names(listing: Listing) -> BTreeSet<OsString> {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a"), b"x").unwrap();
        fs::create_dir(dir.path().join("b")).unwrap();

        let fd = open(dir.path(), OFlags::RDONLY | OFlags::DIRECTORY, Mode::empty()).unwrap();
        let mut buf = dents_buffer();
        let mut children = Children::open(fd.as_fd(), listing, &mut buf).unwrap();

        let mut seen = BTreeSet::new();
        while let Some(child) = children.next_child() {
            let child = child.unwrap();
            if child.name == "b" {
                assert!(matches!(child.hint, EntryKind::Dir | EntryKind::Unknown));
            }
            seen.insert(child.name);
        }
        seen
    }

    #[test]
    fn both_listings_yield_the_same_children() {
        let expected: BTreeSet<OsString> =
            [".", "..", "a", "b"].iter().map(OsString::from).collect();
        assert_eq!(names(Listing::Raw), expected);
        assert_eq!(names(Listing::Stream), expected);
    }

    #[test]
    fn raw_listing_spans_several_buffer_fills() {
        let dir = tempfile::tempdir().unwrap();
        // Long names so the records cannot fit in one buffer.
        for i in 0..200 {
            fs::write(dir.path().join(format!("{i:0>60}")), b"").unwrap();
        }

        let fd = open(dir.path(), OFlags::RDONLY | OFlags::DIRECTORY, Mode::empty()).unwrap();
        let mut buf = dents_buffer();
        let mut children = Children::open(fd.as_fd(), Listing::Raw, &mut buf).unwrap();

        let mut count = 0;
        while let Some(child) = children.next_child() {
            if !child.unwrap().is_dot() {
                count += 1;
            }
        }
        assert_eq!(count, 200);
    }
}
