use std::path::PathBuf;
use std::sync::Arc;

use crate::engine::{run, EngineOptions, WalkConfig};
use crate::error::FindError;
use crate::listing::Listing;
use crate::predicate::{Predicate, PredicateSet, ShellRunner};
use crate::results::Results;
use crate::traits::{CommandRunner, Sink};

// ---------------------------------------------------------------------------
// SearchBuilder
// ---------------------------------------------------------------------------

/// Entry point for configuring and executing a search.
///
/// Created via [`dirfind::search()`](crate::search). Configure with chained
/// builder methods, then call [`run()`](SearchBuilder::run) or
/// [`run_with()`](SearchBuilder::run_with) to execute.
///
/// # Example
///
/// ```rust,no_run
/// use dirfind::Predicate;
///
/// let results = dirfind::search("/var/log")
///     .predicate(Predicate::Name("syslog".into()))
///     .max_depth(2)
///     .collect_paths(true)
///     .run()?;
/// # Ok::<(), dirfind::FindError>(())
/// ```
pub struct SearchBuilder {
    root:           PathBuf,
    predicates:     Vec<Predicate>,
    runner:         Option<Arc<dyn CommandRunner>>,
    listing:        Listing,
    max_depth:      Option<usize>,
    collect_paths:  bool,
    collect_errors: bool,
}

impl SearchBuilder {
    pub(crate) fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root:           root.into(),
            predicates:     Vec::new(),
            runner:         None,
            listing:        Listing::default(),
            max_depth:      None,
            collect_paths:  false,
            collect_errors: false,
        }
    }

    // ── Predicates ────────────────────────────────────────────────────────

    /// Add one predicate. Entries are reported only if every predicate holds.
    pub fn predicate(mut self, p: Predicate) -> Self {
        self.predicates.push(p);
        self
    }

    /// Add several predicates, in order.
    pub fn predicates(mut self, ps: impl IntoIterator<Item = Predicate>) -> Self {
        self.predicates.extend(ps);
        self
    }

    /// Set how `-exec` commands are run.
    ///
    /// Defaults to [`ShellRunner`].
    pub fn runner(mut self, r: impl CommandRunner + 'static) -> Self {
        self.runner = Some(Arc::new(r));
        self
    }

    // ── Options ───────────────────────────────────────────────────────────

    /// How directory children are enumerated. [`Listing::Raw`] by default.
    pub fn listing(mut self, l: Listing) -> Self {
        self.listing = l;
        self
    }

    /// Maximum traversal depth. `0` means the root only, `1` means one
    /// level of children, and so on. Unlimited by default.
    pub fn max_depth(mut self, d: usize) -> Self {
        self.max_depth = Some(d);
        self
    }

    /// Collect matched paths into [`Results::paths`].
    pub fn collect_paths(mut self, yes: bool) -> Self {
        self.collect_paths = yes;
        self
    }

    /// Collect per-entry errors into [`Results::errors`].
    pub fn collect_errors(mut self, yes: bool) -> Self {
        self.collect_errors = yes;
        self
    }

    // ── Execute ───────────────────────────────────────────────────────────

    /// Execute the search, keeping output only in the returned [`Results`].
    ///
    /// # Errors
    ///
    /// Returns `Err` if the root cannot be opened. Per-entry failures are
    /// counted in [`ScanStats::failures`](crate::ScanStats::failures) and,
    /// with `.collect_errors(true)`, stored in [`Results::errors`].
    pub fn run(self) -> Result<Results, FindError> {
        self.run_with(&mut ())
    }

    /// Execute the search, streaming matches and errors into `sink` as they
    /// happen.
    ///
    /// # Errors
    ///
    /// Same as [`run()`](SearchBuilder::run).
    pub fn run_with<S: Sink + ?Sized>(self, sink: &mut S) -> Result<Results, FindError> {
        let runner: Arc<dyn CommandRunner> = match self.runner {
            Some(r) => r,
            None    => Arc::new(ShellRunner),
        };
        let matcher = PredicateSet::new(self.predicates, runner);

        let opts = EngineOptions {
            config: WalkConfig {
                listing:   self.listing,
                max_depth: self.max_depth,
            },
            matcher:        &matcher,
            collect_paths:  self.collect_paths,
            collect_errors: self.collect_errors,
        };

        run(&self.root, opts, sink)
    }
}
