use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors that stop a search before any traversal happens.
#[derive(Error, Debug)]
pub enum FindError {
    // Config
    #[error("invalid argument count: flags and values must come in pairs")]
    OddArgumentCount,

    #[error("invalid argument: {0}")]
    UnknownFlag(String),

    #[error("invalid number for {flag}: {value:?}")]
    InvalidNumber {
        flag:  &'static str,
        value: String,
    },

    // Root
    #[error("could not open directory: {}: {source}", path.display())]
    RootOpen {
        path: PathBuf,
        source: io::Error,
    },
}

impl FindError {
    /// Whether this is a configuration error, i.e. one that should be
    /// followed by usage text.
    pub fn is_config(&self) -> bool {
        !matches!(self, Self::RootOpen { .. })
    }
}

/// A recoverable error for a single entry.
///
/// The walk reports it once and carries on with the next sibling; only the
/// failing entry's own subtree is skipped.
#[derive(Error, Debug)]
pub enum WalkError {
    #[error("cannot stat: {}: {source}", path.display())]
    Stat {
        path: PathBuf,
        source: io::Error,
    },

    #[error("cannot open: {}: {source}", path.display())]
    Open {
        path: PathBuf,
        source: io::Error,
    },

    #[error("cannot list directory: {}: {source}", path.display())]
    ReadDir {
        path: PathBuf,
        source: io::Error,
    },
}

impl WalkError {
    /// The path this error occurred at.
    pub fn path(&self) -> &Path {
        match self {
            Self::Stat { path, .. }
            | Self::Open { path, .. }
            | Self::ReadDir { path, .. } => path,
        }
    }

    /// The underlying I/O error.
    pub fn io_error(&self) -> &io::Error {
        match self {
            Self::Stat { source, .. }
            | Self::Open { source, .. }
            | Self::ReadDir { source, .. } => source,
        }
    }
}
