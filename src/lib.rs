//! # dirfind
//!
//! Recursive file finder that walks a directory tree through directory
//! handles instead of path strings.
//!
//! Every directory is opened exactly once, relative to its parent's handle,
//! without following symlinks. Each visited entry is `fstat`ed and run through
//! a [`PredicateSet`]; entries that pass every predicate are reported in
//! depth-first pre-order. A failure on one entry is reported and skipped; it
//! never stops the rest of the walk.
//!
//! # Quick Start
//!
//! ```rust
//! use dirfind::{Predicate, SizeTest};
//!
//! let dir = tempfile::tempdir().unwrap();
//! std::fs::write(dir.path().join("big"), vec![0u8; 100]).unwrap();
//! std::fs::write(dir.path().join("small"), b"x").unwrap();
//!
//! let results = dirfind::search(dir.path())
//!     .predicate(Predicate::Size(SizeTest::parse("+60").unwrap()))
//!     .predicate(Predicate::Name("big".into()))
//!     .collect_paths(true)
//!     .run()
//!     .unwrap();
//!
//! assert_eq!(results.matches, 1);
//! assert!(results.paths[0].ends_with("big"));
//! ```
//!
//! # Streaming output
//!
//! Implement [`Sink`] (or use [`ConsoleSink`]) to receive matches and errors
//! as the walk produces them:
//!
//! ```rust,no_run
//! use dirfind::ConsoleSink;
//!
//! let mut sink = ConsoleSink::stdio();
//! dirfind::search(".").run_with(&mut sink)?;
//! sink.finish()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![forbid(unsafe_code)]

pub mod engine;

mod builder;
mod entry;
mod error;
mod listing;
mod output;
mod predicate;
mod results;
mod traits;

// ── Public re-exports ─────────────────────────────────────────────────────────

pub use builder::SearchBuilder;
pub use entry::{Entry, EntryKind, Metadata};
pub use error::{FindError, WalkError};
pub use listing::{Listing, DENTS_BUFSIZE};
pub use output::ConsoleSink;
pub use predicate::{parse_expression, Predicate, PredicateSet, ShellRunner, SizeCmp, SizeTest};
pub use results::{Results, ScanStats};
pub use traits::{CommandRunner, Matcher, Sink, WalkState};

// ── Entry point ───────────────────────────────────────────────────────────────

/// Create a new [`SearchBuilder`] rooted at `root`.
///
/// The root is the only path ever opened by name; it is not resolved again
/// once the walk has started.
pub fn search(root: impl Into<std::path::PathBuf>) -> SearchBuilder {
    SearchBuilder::new(root)
}
