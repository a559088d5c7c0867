//! Error types for the consolidation pipeline

use std::io;
use std::path::PathBuf;

/// Errors surfaced by the consolidation pipeline.
///
/// None of these are retried internally; callers decide whether to report
/// and abort.
#[derive(Debug)]
pub enum Error {
    /// Reading or writing a file or directory failed
    Io { path: PathBuf, source: io::Error },
    /// A statement matched a top-level pattern but its payload could not
    /// be extracted
    Recognize { kind: &'static str, sql: String },
    /// The input directory contained no usable migration pairs
    NoMigrations { dir: PathBuf },
    /// The dependency graph is not a DAG
    Cycle { remaining: usize },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io { path, source } => write!(f, "{}: {}", path.display(), source),
            Error::Recognize { kind, sql } => write!(f, "invalid {} statement: {}", kind, sql),
            Error::NoMigrations { dir } => {
                write!(f, "no migration files found in {}", dir.display())
            }
            Error::Cycle { remaining } => {
                write!(
                    f,
                    "circular dependency detected ({} objects could not be ordered)",
                    remaining
                )
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}
