use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building or reading the partitioned indexes.
///
/// A missing shard or cache file is never an error; those surface as `None`.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error in {what}: {source}")]
    Parse {
        what: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("malformed front matter: {0}")]
    FrontMatter(#[from] serde_yaml::Error),

    #[error("multiple index files in {dir}: {candidates:?}")]
    AmbiguousIndex { dir: PathBuf, candidates: Vec<String> },

    #[error("no extractor registered for '{0}'")]
    UnsupportedCategory(String),

    #[error("reference marker must be 1, got {0}")]
    InvalidPresence(u64),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io { path: path.into(), source }
    }

    pub(crate) fn parse(what: impl Into<String>, source: serde_json::Error) -> Self {
        Error::Parse { what: what.into(), source }
    }
}
