use std::ffi::OsStr;
use std::path::Path;

use crate::entry::Entry;
use crate::error::WalkError;

/// Determines whether an entry is a match.
///
/// The engine consults the matcher once per visited entry.
/// [`PredicateSet`](crate::PredicateSet) is the implementation the builder
/// hands it.
///
/// # Thread Safety
///
/// `Send + Sync` are required: the matcher is immutable for the whole walk
/// and may be shared by callers that run several walks at once.
///
/// # Example
///
/// ```rust
/// use dirfind::{Entry, Matcher};
///
/// struct Empty;
///
/// impl Matcher for Empty {
///     fn is_match(&self, entry: &Entry<'_>) -> bool {
///         entry.metadata.size == 0
///     }
/// }
/// ```
pub trait Matcher: Send + Sync {
    /// Returns `true` if this entry should be reported.
    fn is_match(&self, entry: &Entry<'_>) -> bool;
}

/// What the walk does after a sink has seen an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkState {
    /// Keep walking.
    Continue,

    /// Stop the whole walk. No further entry is visited, so no further
    /// predicate (`-exec` included) runs.
    Quit,
}

/// Receives the output of a walk as it happens.
///
/// Matches arrive in depth-first pre-order; errors arrive at the point they
/// are detected. Both methods default to doing nothing and continuing, so
/// `()` is a valid sink for callers that only want
/// [`Results`](crate::Results).
///
/// Returning [`WalkState::Quit`] unwinds the walk: every open directory
/// handle is released on the way out.
pub trait Sink {
    /// Called once for every entry that passed all predicates.
    fn matched(&mut self, _entry: &Entry<'_>) -> WalkState {
        WalkState::Continue
    }

    /// Called once for every recoverable per-entry error.
    fn error(&mut self, _error: &WalkError) -> WalkState {
        WalkState::Continue
    }
}

impl Sink for () {}

/// Runs the command behind an `-exec` predicate.
///
/// The outcome of the command never affects matching, so there is nothing
/// to return.
pub trait CommandRunner: Send + Sync {
    /// Run `command` with `path` appended as one more argument.
    fn run(&self, command: &OsStr, path: &Path);
}
