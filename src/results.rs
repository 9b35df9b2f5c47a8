use std::path::PathBuf;
use std::time::Duration;

use crate::entry::EntryKind;
use crate::error::WalkError;

/// The output of a completed search.
///
/// `paths` and `errors` are both opt-in and disabled by default, since a
/// [`Sink`](crate::Sink) usually consumes them as they happen. Enable them on
/// the builder: `.collect_paths(true)` and `.collect_errors(true)`.
#[derive(Debug, Default)]
pub struct Results {
    /// Total number of entries that passed every predicate.
    pub matches: usize,

    /// Paths of matched entries, in depth-first pre-order.
    /// Only populated if `.collect_paths(true)` was set on the builder.
    pub paths: Vec<PathBuf>,

    /// Scan statistics.
    pub stats: ScanStats,

    /// Per-entry errors, in the order they were reported.
    /// Only populated if `.collect_errors(true)` was set on the builder.
    pub errors: Vec<WalkError>,

    /// The sink returned [`WalkState::Quit`](crate::WalkState::Quit) and the
    /// walk stopped early.
    pub quit: bool,
}

/// Statistics for a completed scan.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ScanStats {
    /// Regular files visited (matched or not).
    pub files: usize,

    /// Directories visited, the root included if it is one.
    pub dirs: usize,

    /// Everything else visited: symlinks, devices, pipes, sockets.
    pub other: usize,

    /// Entries that could not be stat'ed, opened or listed.
    pub failures: usize,

    /// Wall-clock time from opening the root to the end of the walk.
    pub duration: Duration,

    /// Entries visited per second. Equals
    /// `(files + dirs + other) / duration.as_secs_f64()`, clamped to 0 on
    /// zero-duration runs.
    pub entries_per_sec: usize,
}

impl ScanStats {
    /// Total entries visited.
    pub fn entries(&self) -> usize {
        self.files + self.dirs + self.other
    }

    pub(crate) fn count(&mut self, kind: EntryKind) {
        match kind {
            EntryKind::Dir  => self.dirs += 1,
            EntryKind::File => self.files += 1,
            _               => self.other += 1,
        }
    }

    /// Record the duration and compute `entries_per_sec`.
    pub(crate) fn finish(&mut self, duration: Duration) {
        self.duration = duration;
        self.entries_per_sec = if duration.as_secs_f64() > 0.0 {
            (self.entries() as f64 / duration.as_secs_f64()) as usize
        } else {
            0
        };
    }
}
