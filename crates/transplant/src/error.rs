use std::path::PathBuf;

use thiserror::Error;

/// The six-item error taxonomy the serializer/deserializer state machines can
/// raise. Every variant is fatal to the current run: there is no retry and no
/// partial-failure recovery (see the crate-level docs).
#[derive(Debug, Error)]
pub enum TransplantError {
    /// Invalid flag combination or missing argument.
    #[error("argument error: {0}")]
    Argument(String),

    /// `PathBuffer::init`/`push`/`pop` violated one of their invariants.
    #[error("path buffer error: {0}")]
    PathBuffer(String),

    /// Short read during a header, a magic-byte mismatch, an unknown type
    /// code, or a size/depth field inconsistent with the record's position.
    #[error("framing error: {0}")]
    Framing(String),

    /// A record of the wrong type appeared at a given point in the stream
    /// (e.g. `FILE_DATA` where a `DIRECTORY_ENTRY` was required).
    #[error("structural error: {0}")]
    Structural(String),

    /// A `stat`/`opendir`/`mkdir`/`chmod`/`open` call failed, an entry was
    /// neither a file nor a directory, or a target existed without clobber.
    #[error("filesystem error at {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Short read/write on a record payload, or a file's length didn't match
    /// its declared byte count.
    #[error("i/o error: {0}")]
    Io(String),
}

impl TransplantError {
    pub fn fs(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TransplantError::Filesystem {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, TransplantError>;
