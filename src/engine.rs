use std::ffi::{OsStr, OsString};
use std::io;
use std::os::fd::{AsFd, BorrowedFd, OwnedFd};
use std::path::{Path, PathBuf};
use std::time::Instant;

use rustix::fs::{fstat, open, openat, Mode, OFlags};
use rustix::io::Errno;

use crate::entry::{Entry, EntryKind, Metadata};
use crate::error::{FindError, WalkError};
use crate::listing::{dents_buffer, Child, Children, Listing};
use crate::results::Results;
use crate::traits::{Matcher, Sink, WalkState};

// ---------------------------------------------------------------------------
// WalkConfig
// ---------------------------------------------------------------------------

/// Traversal parameters passed from the builder to the engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct WalkConfig {
    pub listing:   Listing,
    pub max_depth: Option<usize>,
}

// ---------------------------------------------------------------------------
// Engine options
// ---------------------------------------------------------------------------

/// Internal options passed from the builder to `run()`.
pub(crate) struct EngineOptions<'m> {
    pub config:         WalkConfig,
    pub matcher:        &'m dyn Matcher,
    pub collect_paths:  bool,
    pub collect_errors: bool,
}

// ---------------------------------------------------------------------------
// run()
// ---------------------------------------------------------------------------

/// Open `root` and walk everything below it.
///
/// The root is opened once by path; every other entry is opened relative to
/// its parent's handle. Only a failure to open the root is returned as an
/// error; everything after that is reported through `sink` and the walk
/// carries on unless the sink returns [`WalkState::Quit`].
pub(crate) fn run<S: Sink + ?Sized>(
    root: &Path,
    opts: EngineOptions<'_>,
    sink: &mut S,
) -> Result<Results, FindError> {
    let root_fd = open(root, OFlags::RDONLY | OFlags::NONBLOCK | OFlags::CLOEXEC, Mode::empty())
        .map_err(|e| FindError::RootOpen {
            path:   root.to_path_buf(),
            source: e.into(),
        })?;

    let start = Instant::now();
    let mut walker = Walker {
        config:  opts.config,
        matcher: opts.matcher,
        sink,
        results: Results::default(),
        collect_paths:  opts.collect_paths,
        collect_errors: opts.collect_errors,
    };

    let state = walker.walk(root_fd.as_fd(), root, root.as_os_str(), 0);

    let mut results = walker.results;
    results.quit = state == WalkState::Quit;
    results.stats.finish(start.elapsed());
    Ok(results)
}

// ---------------------------------------------------------------------------
// Walker
// ---------------------------------------------------------------------------

/// State for one walk. The matcher is read-only; `sink` and `results` are
/// the only things the recursion writes to.
struct Walker<'a, S: Sink + ?Sized> {
    config:         WalkConfig,
    matcher:        &'a dyn Matcher,
    sink:           &'a mut S,
    results:        Results,
    collect_paths:  bool,
    collect_errors: bool,
}

impl<S: Sink + ?Sized> Walker<'_, S> {
    /// Visit the entry behind `fd`, then its children if it is a directory.
    ///
    /// `fd` belongs to the caller and stays open until this returns. Every
    /// child handle opened here is dropped before the next sibling is opened.
    /// Returns [`WalkState::Quit`] once the sink asks to stop.
    fn walk(&mut self, fd: BorrowedFd<'_>, path: &Path, name: &OsStr, depth: usize) -> WalkState {
        let metadata = match fstat(fd) {
            Ok(stat) => Metadata::from_stat(&stat),
            Err(e) => {
                return self.report(WalkError::Stat {
                    path:   path.to_path_buf(),
                    source: e.into(),
                });
            }
        };

        let entry = Entry { path, name, depth, metadata };
        tracing::trace!(path = %path.display(), kind = ?metadata.kind, "visit");
        self.results.stats.count(metadata.kind);

        if self.matcher.is_match(&entry) && self.matched(&entry) == WalkState::Quit {
            return WalkState::Quit;
        }

        if !metadata.is_dir() {
            return WalkState::Continue;
        }

        if self.config.max_depth.is_some_and(|max| depth >= max) {
            return WalkState::Continue;
        }

        self.walk_children(fd, path, depth)
    }

    fn walk_children(&mut self, fd: BorrowedFd<'_>, path: &Path, depth: usize) -> WalkState {
        tracing::debug!(path = %path.display(), listing = ?self.config.listing, "listing directory");

        let mut buf = dents_buffer();
        let mut children = match Children::open(fd, self.config.listing, &mut buf) {
            Ok(children) => children,
            Err(e) => {
                return self.report(WalkError::ReadDir {
                    path:   path.to_path_buf(),
                    source: e,
                });
            }
        };

        while let Some(next) = children.next_child() {
            let child = match next {
                Ok(child) => child,
                Err(e) => {
                    return self.report(WalkError::ReadDir {
                        path:   path.to_path_buf(),
                        source: e,
                    });
                }
            };

            if child.is_dot() {
                continue;
            }

            let child_path = join(path, &child.name);
            let child_fd = match open_child(fd, &child, &child_path) {
                Ok(child_fd) => child_fd,
                Err(e) => {
                    let state = self.report(WalkError::Open {
                        path:   child_path,
                        source: e,
                    });
                    if state == WalkState::Quit {
                        return state;
                    }
                    continue;
                }
            };

            if self.walk(child_fd.as_fd(), &child_path, &child.name, depth + 1) == WalkState::Quit {
                tracing::debug!(path = %path.display(), "walk stopped by sink");
                return WalkState::Quit;
            }
        }

        WalkState::Continue
    }

    fn matched(&mut self, entry: &Entry<'_>) -> WalkState {
        self.results.matches += 1;
        if self.collect_paths {
            self.results.paths.push(entry.path.to_path_buf());
        }
        self.sink.matched(entry)
    }

    fn report(&mut self, error: WalkError) -> WalkState {
        self.results.stats.failures += 1;
        let state = self.sink.error(&error);
        if self.collect_errors {
            self.results.errors.push(error);
        }
        state
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Open `child` inside `parent` without following a symlink.
///
/// A symlink makes the no-follow open fail with `ELOOP`; it is then opened
/// with `O_PATH`, which yields a handle to the link itself. `fstat` on that
/// handle reports a symlink, never a directory, so the walk visits the link
/// but does not descend through it. When the listing already says the child
/// is a symlink the first attempt is skipped.
fn open_child(parent: BorrowedFd<'_>, child: &Child, path: &Path) -> io::Result<OwnedFd> {
    let link_inert = || {
        openat(parent, child.name.as_os_str(), OFlags::PATH | OFlags::NOFOLLOW | OFlags::CLOEXEC, Mode::empty())
    };

    if child.hint == EntryKind::Symlink {
        return link_inert().map_err(io::Error::from);
    }

    let flags = OFlags::RDONLY | OFlags::NOFOLLOW | OFlags::NONBLOCK | OFlags::CLOEXEC;
    match openat(parent, child.name.as_os_str(), flags, Mode::empty()) {
        Err(e) if e == Errno::LOOP => {
            tracing::debug!(path = %path.display(), "symlink, reopening link-inert");
            link_inert().map_err(io::Error::from)
        }
        other => other.map_err(io::Error::from),
    }
}

/// `parent + "/" + name`, byte for byte.
fn join(parent: &Path, name: &OsStr) -> PathBuf {
    let mut joined = OsString::with_capacity(parent.as_os_str().len() + 1 + name.len());
    joined.push(parent.as_os_str());
    joined.push("/");
    joined.push(name);
    PathBuf::from(joined)
}
