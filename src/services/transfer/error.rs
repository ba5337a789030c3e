use std::io;
use thiserror::Error;

/// Which sink operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactOp {
    Create,
    Open,
    Stat,
    Seek,
    Write,
    Flush,
}

impl std::fmt::Display for ArtifactOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let op = match self {
            ArtifactOp::Create => "create",
            ArtifactOp::Open => "open",
            ArtifactOp::Stat => "stat",
            ArtifactOp::Seek => "seek",
            ArtifactOp::Write => "write",
            ArtifactOp::Flush => "flush",
        };
        f.write_str(op)
    }
}

#[derive(Error, Debug)]
pub enum TransferError {
    #[error("Invalid file name {name:?}: {reason}")]
    PathResolution { name: String, reason: String },

    #[error("Artifact {op} failed: {source}")]
    ArtifactIo {
        op: ArtifactOp,
        #[source]
        source: io::Error,
    },

    #[error("Upload stream failed after {copied} bytes: {source}")]
    SourceIo {
        copied: u64,
        #[source]
        source: io::Error,
    },

    #[error("Stored size {current} exceeds declared total {declared} for {name:?}")]
    SizeMismatch {
        name: String,
        current: u64,
        declared: u64,
    },

    #[error("Upload stopped at {persisted} of {declared} bytes")]
    Incomplete { persisted: u64, declared: u64 },

    #[error("Upload offset {provided} does not match stored size {expected}")]
    OffsetMismatch { expected: u64, provided: u64 },

    #[error("Declared size {declared} exceeds the limit of {max} bytes")]
    TooLarge { declared: u64, max: u64 },
}

impl TransferError {
    pub(crate) fn artifact(op: ArtifactOp) -> impl FnOnce(io::Error) -> Self {
        move |source| TransferError::ArtifactIo { op, source }
    }
}
