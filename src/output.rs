use std::io::{self, Stderr, Stdout, Write};
use std::os::unix::ffi::OsStrExt;

use crate::entry::Entry;
use crate::error::WalkError;
use crate::traits::{Sink, WalkState};

/// Writes matched paths to one stream and error lines to another.
///
/// Paths go out as raw bytes, one per line, in the order they arrive.
/// Errors are formatted as `<context>: <path>: <error>`. The first
/// write failure on the match stream quits the walk and is returned by
/// [`finish`](ConsoleSink::finish); error-stream failures are ignored.
pub struct ConsoleSink<O: Write, E: Write> {
    out:    O,
    err:    E,
    failed: Option<io::Error>,
}

impl ConsoleSink<Stdout, Stderr> {
    /// Sink over the process's stdout and stderr.
    pub fn stdio() -> Self {
        Self::new(io::stdout(), io::stderr())
    }
}

impl<O: Write, E: Write> ConsoleSink<O, E> {
    pub fn new(out: O, err: E) -> Self {
        Self { out, err, failed: None }
    }

    /// Flush the match stream and surface the first write error, if any.
    pub fn finish(mut self) -> io::Result<(O, E)> {
        if let Some(err) = self.failed.take() {
            return Err(err);
        }
        self.out.flush()?;
        Ok((self.out, self.err))
    }
}

impl<O: Write, E: Write> Sink for ConsoleSink<O, E> {
    fn matched(&mut self, entry: &Entry<'_>) -> WalkState {
        if self.failed.is_some() {
            return WalkState::Quit;
        }
        let res = self
            .out
            .write_all(entry.path.as_os_str().as_bytes())
            .and_then(|()| self.out.write_all(b"\n"));
        match res {
            Ok(()) => WalkState::Continue,
            Err(err) => {
                self.failed = Some(err);
                WalkState::Quit
            }
        }
    }

    fn error(&mut self, error: &WalkError) -> WalkState {
        let _ = writeln!(self.err, "{error}");
        WalkState::Continue
    }
}

#[cfg(test)]
mod tests {
    use std::ffi::OsStr;
    use std::path::{Path, PathBuf};

    use super::*;
    use crate::entry::{EntryKind, Metadata};

    #[test]
    fn writes_one_path_per_line_and_formats_errors() {
        let mut sink = ConsoleSink::new(Vec::new(), Vec::new());
        let meta = Metadata { ino: 1, size: 0, nlink: 1, kind: EntryKind::File };

        for path in ["root", "root/a"] {
            let path = Path::new(path);
            let state = sink.matched(&Entry {
                path,
                name: OsStr::new("x"),
                depth: 0,
                metadata: meta,
            });
            assert_eq!(state, WalkState::Continue);
        }
        let state = sink.error(&WalkError::Open {
            path:   PathBuf::from("root/d"),
            source: io::Error::from_raw_os_error(13),
        });
        assert_eq!(state, WalkState::Continue);

        let (out, err) = sink.finish().unwrap();
        assert_eq!(out, b"root\nroot/a\n");

        let err = String::from_utf8(err).unwrap();
        assert!(err.starts_with("cannot open: root/d: "), "{err}");
        assert_eq!(err.lines().count(), 1);
    }

    #[test]
    fn write_failure_quits_and_is_remembered() {
        struct Broken;
        impl Write for Broken {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Err(io::Error::from(io::ErrorKind::BrokenPipe))
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let mut sink = ConsoleSink::new(Broken, Vec::new());
        let meta = Metadata { ino: 1, size: 0, nlink: 1, kind: EntryKind::File };
        let entry = Entry {
            path: Path::new("a"),
            name: OsStr::new("a"),
            depth: 0,
            metadata: meta,
        };
        assert_eq!(sink.matched(&entry), WalkState::Quit);
        assert_eq!(sink.matched(&entry), WalkState::Quit);

        let err = sink.finish().err().unwrap();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
