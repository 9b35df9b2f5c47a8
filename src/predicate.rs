use std::ffi::{OsStr, OsString};
use std::os::unix::ffi::OsStrExt;
use std::path::Path;
use std::process::Command;
use std::sync::Arc;

use crate::entry::Entry;
use crate::error::FindError;
use crate::traits::{CommandRunner, Matcher};

// ---------------------------------------------------------------------------
// Predicate
// ---------------------------------------------------------------------------

/// One test from the command-line expression.
///
/// Each variant carries the configuration captured when the expression was
/// parsed and is evaluated against every visited entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// `-inum N`: inode number equals `N`.
    Inum(u64),

    /// `-name S`: the entry's own name equals `S`, byte for byte.
    Name(OsString),

    /// `-size [+-=]N`: byte size compared against `N`.
    Size(SizeTest),

    /// `-nlinks N`: hard-link count equals `N`.
    Nlinks(u64),

    /// `-exec CMD`: run `CMD <path>` for every entry. Always true.
    Exec(OsString),
}

impl Predicate {
    /// Build a predicate from a flag and its value.
    ///
    /// # Errors
    ///
    /// [`FindError::UnknownFlag`] for a flag outside the recognised set and
    /// [`FindError::InvalidNumber`] when a numeric value does not parse.
    pub fn parse(flag: &OsStr, value: &OsStr) -> Result<Self, FindError> {
        let flag = flag
            .to_str()
            .ok_or_else(|| FindError::UnknownFlag(flag.to_string_lossy().into_owned()))?;

        match flag {
            "-inum"   => parse_number("-inum", value).map(Self::Inum),
            "-name"   => Ok(Self::Name(value.to_os_string())),
            "-size"   => value
                .to_str()
                .and_then(SizeTest::parse)
                .map(Self::Size)
                .ok_or_else(|| invalid_number("-size", value)),
            "-nlinks" => parse_number("-nlinks", value).map(Self::Nlinks),
            "-exec"   => Ok(Self::Exec(value.to_os_string())),
            other     => Err(FindError::UnknownFlag(other.to_string())),
        }
    }

    /// Whether evaluating this predicate does something observable besides
    /// returning a verdict. Such predicates must run for every entry.
    pub fn has_side_effects(&self) -> bool {
        matches!(self, Self::Exec(_))
    }

    /// Test `entry`. `-exec` runs its command through `runner`.
    pub fn evaluate(&self, entry: &Entry<'_>, runner: &dyn CommandRunner) -> bool {
        let meta = &entry.metadata;
        match self {
            Self::Inum(ino)    => meta.ino == *ino,
            Self::Name(name)   => entry.name.as_bytes() == name.as_bytes(),
            Self::Size(test)   => test.matches(meta.size),
            Self::Nlinks(n)    => meta.nlink == *n,
            Self::Exec(cmd)    => {
                runner.run(cmd, entry.path);
                true
            }
        }
    }
}

fn parse_number(flag: &'static str, value: &OsStr) -> Result<u64, FindError> {
    value
        .to_str()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| invalid_number(flag, value))
}

fn invalid_number(flag: &'static str, value: &OsStr) -> FindError {
    FindError::InvalidNumber {
        flag,
        value: value.to_string_lossy().into_owned(),
    }
}

// ---------------------------------------------------------------------------
// Size
// ---------------------------------------------------------------------------

/// How a size is compared against the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeCmp {
    /// Strictly greater than.
    Greater,
    /// Strictly less than.
    Less,
    /// Exactly equal.
    Equal,
}

/// A parsed `-size` argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeTest {
    pub cmp:   SizeCmp,
    pub bytes: i64,
}

impl SizeTest {
    /// Parse `[+-=]N`.
    ///
    /// The first character selects the comparison: `-` is less-than, `=` is
    /// equality, and anything else, a leading digit included, is
    /// greater-than. When the first character is a digit the whole argument
    /// is the number; otherwise the number starts after it.
    pub fn parse(arg: &str) -> Option<Self> {
        let first = arg.chars().next()?;
        let (cmp, digits) = if first.is_ascii_digit() {
            (SizeCmp::Greater, arg)
        } else {
            let cmp = match first {
                '-' => SizeCmp::Less,
                '=' => SizeCmp::Equal,
                _   => SizeCmp::Greater,
            };
            (cmp, &arg[first.len_utf8()..])
        };

        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        Some(Self {
            cmp,
            bytes: digits.parse().ok()?,
        })
    }

    pub fn matches(&self, size: i64) -> bool {
        match self.cmp {
            SizeCmp::Greater => size > self.bytes,
            SizeCmp::Less    => size < self.bytes,
            SizeCmp::Equal   => size == self.bytes,
        }
    }
}

// ---------------------------------------------------------------------------
// Expression
// ---------------------------------------------------------------------------

/// Turn the `flag value` pairs that follow the root argument into
/// predicates, in order.
///
/// # Errors
///
/// Fails on an odd number of arguments, an unknown flag, or a bad number.
/// All of these are fatal: nothing is walked.
pub fn parse_expression<S: AsRef<OsStr>>(args: &[S]) -> Result<Vec<Predicate>, FindError> {
    if args.len() % 2 != 0 {
        return Err(FindError::OddArgumentCount);
    }

    args.chunks_exact(2)
        .map(|pair| Predicate::parse(pair[0].as_ref(), pair[1].as_ref()))
        .collect()
}

// ---------------------------------------------------------------------------
// PredicateSet
// ---------------------------------------------------------------------------

/// The conjunction of all configured predicates.
///
/// An empty set matches everything.
pub struct PredicateSet {
    predicates: Vec<Predicate>,
    runner:     Arc<dyn CommandRunner>,
}

impl PredicateSet {
    pub fn new(predicates: Vec<Predicate>, runner: Arc<dyn CommandRunner>) -> Self {
        Self { predicates, runner }
    }

    /// AND of every predicate over `entry`.
    ///
    /// This is an accumulator fold, not `&&`: once the verdict is false the
    /// remaining side-effect-free predicates are skipped, but predicates with
    /// side effects (`-exec`) still run for every entry.
    pub fn evaluate_all(&self, entry: &Entry<'_>) -> bool {
        self.predicates.iter().fold(true, |acc, p| {
            if acc || p.has_side_effects() {
                acc & p.evaluate(entry, self.runner.as_ref())
            } else {
                false
            }
        })
    }
}

impl Matcher for PredicateSet {
    fn is_match(&self, entry: &Entry<'_>) -> bool {
        self.evaluate_all(entry)
    }
}

// ---------------------------------------------------------------------------
// ShellRunner
// ---------------------------------------------------------------------------

/// Runs `-exec` commands through `/bin/sh -c "<command> <path>"`.
///
/// The path is appended after a single space without any quoting, so the
/// shell sees it exactly as the filesystem spells it. Exit status and spawn
/// failures are logged at debug level and otherwise ignored.
pub struct ShellRunner;

impl CommandRunner for ShellRunner {
    fn run(&self, command: &OsStr, path: &Path) {
        let mut line = command.to_os_string();
        line.push(" ");
        line.push(path.as_os_str());

        match Command::new("/bin/sh").arg("-c").arg(&line).status() {
            Ok(status) if !status.success() => {
                tracing::debug!(command = ?line, %status, "exec command failed");
            }
            Ok(_) => {}
            Err(err) => {
                tracing::debug!(command = ?line, error = %err, "exec command could not be spawned");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::entry::{EntryKind, Metadata};

    #[derive(Default)]
    struct Recorder(Mutex<Vec<(OsString, std::path::PathBuf)>>);

    impl CommandRunner for Recorder {
        fn run(&self, command: &OsStr, path: &Path) {
            self.0.lock().unwrap().push((command.to_os_string(), path.to_path_buf()));
        }
    }

    fn entry<'a>(name: &'a str, path: &'a str, size: i64) -> Entry<'a> {
        Entry {
            path:  Path::new(path),
            name:  OsStr::new(name),
            depth: 1,
            metadata: Metadata {
                ino:   42,
                size,
                nlink: 1,
                kind:  EntryKind::File,
            },
        }
    }

    fn args(list: &[&str]) -> Vec<OsString> {
        list.iter().map(OsString::from).collect()
    }

    #[test]
    fn size_leading_operator_selects_comparison() {
        let gt = SizeTest::parse("+100").unwrap();
        let lt = SizeTest::parse("-100").unwrap();
        let eq = SizeTest::parse("=100").unwrap();

        assert_eq!(gt, SizeTest { cmp: SizeCmp::Greater, bytes: 100 });
        assert_eq!(lt, SizeTest { cmp: SizeCmp::Less, bytes: 100 });
        assert_eq!(eq, SizeTest { cmp: SizeCmp::Equal, bytes: 100 });

        assert!(gt.matches(101) && !gt.matches(100));
        assert!(lt.matches(99) && !lt.matches(100));
        assert!(eq.matches(100) && !eq.matches(101));
    }

    #[test]
    fn size_other_leading_character_means_greater() {
        assert_eq!(
            SizeTest::parse("x100"),
            Some(SizeTest { cmp: SizeCmp::Greater, bytes: 100 })
        );
    }

    #[test]
    fn size_bare_number_uses_whole_argument() {
        let test = SizeTest::parse("100").unwrap();
        assert_eq!(test.bytes, 100);
        assert_eq!(test.cmp, SizeCmp::Greater);
    }

    #[test]
    fn size_rejects_missing_or_bad_digits() {
        assert_eq!(SizeTest::parse(""), None);
        assert_eq!(SizeTest::parse("+"), None);
        assert_eq!(SizeTest::parse("+1k"), None);
        assert_eq!(SizeTest::parse("--5"), None);
    }

    #[test]
    fn parse_expression_builds_predicates_in_order() {
        let preds = parse_expression(&args(&["-name", "a", "-inum", "7", "-nlinks", "2"])).unwrap();
        assert_eq!(
            preds,
            vec![
                Predicate::Name("a".into()),
                Predicate::Inum(7),
                Predicate::Nlinks(2),
            ]
        );
    }

    #[test]
    fn parse_expression_rejects_odd_count() {
        let err = parse_expression(&args(&["-name"])).unwrap_err();
        assert!(matches!(err, FindError::OddArgumentCount));
        assert!(err.is_config());
    }

    #[test]
    fn parse_expression_rejects_unknown_flag() {
        let err = parse_expression(&args(&["-type", "f"])).unwrap_err();
        assert!(matches!(err, FindError::UnknownFlag(ref f) if f == "-type"));
    }

    #[test]
    fn unparseable_inode_is_fatal() {
        let err = parse_expression(&args(&["-inum", "12abc"])).unwrap_err();
        assert!(matches!(err, FindError::InvalidNumber { flag: "-inum", .. }));
    }

    #[test]
    fn name_compares_whole_name() {
        let runner = Recorder::default();
        let pred = Predicate::Name("a".into());
        assert!(pred.evaluate(&entry("a", "root/a", 0), &runner));
        assert!(!pred.evaluate(&entry("ab", "root/ab", 0), &runner));
        assert!(!Predicate::Name("*".into()).evaluate(&entry("a", "root/a", 0), &runner));
    }

    #[test]
    fn exec_runs_even_when_an_earlier_predicate_fails() {
        let runner = Arc::new(Recorder::default());
        let set = PredicateSet::new(
            vec![
                Predicate::Name("nope".into()),
                Predicate::Exec("echo".into()),
                Predicate::Inum(42),
            ],
            runner.clone(),
        );

        assert!(!set.evaluate_all(&entry("a", "root/a", 0)));

        let calls = runner.0.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], (OsString::from("echo"), "root/a".into()));
    }

    #[test]
    fn exec_never_vetoes_a_match() {
        let runner = Arc::new(Recorder::default());
        let set = PredicateSet::new(
            vec![Predicate::Exec("true".into()), Predicate::Size(SizeTest::parse("+10").unwrap())],
            runner,
        );

        assert!(set.evaluate_all(&entry("a", "root/a", 11)));
        assert!(!set.evaluate_all(&entry("a", "root/a", 10)));
    }

    #[test]
    fn empty_set_matches_everything() {
        let set = PredicateSet::new(Vec::new(), Arc::new(Recorder::default()));
        assert!(set.evaluate_all(&entry("anything", "root/anything", 0)));
    }
}
