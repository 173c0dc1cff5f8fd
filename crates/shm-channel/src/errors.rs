use std::io;
use thiserror::Error;

/// Failures while obtaining or mapping a named shared memory segment.
///
/// Construction errors are surfaced once; nothing is retried internally.
#[derive(Error, Debug)]
pub enum ShmError {
    #[error("Failed to create shared memory '{name}': {source}")]
    CreationFailed {
        name: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to map shared memory '{name}': {source}")]
    MappingFailed {
        name: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to open shared memory '{name}': {source}")]
    OpenFailed {
        name: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to resize shared memory '{name}' to {size} bytes: {source}")]
    TruncateFailed {
        name: String,
        size: usize,
        #[source]
        source: io::Error,
    },

    #[error("Invalid shared memory name '{name}': {reason}")]
    InvalidName { name: String, reason: &'static str },

    #[error("Ring buffer error: {0}")]
    Ring(#[from] RingError),
}

/// Discriminant of a [`ShmError`], for callers that only branch on the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    CreationFailed,
    MappingFailed,
    OpenFailed,
    TruncateFailed,
    InvalidName,
    InvalidRing,
}

impl ShmError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ShmError::CreationFailed { .. } => ErrorKind::CreationFailed,
            ShmError::MappingFailed { .. } => ErrorKind::MappingFailed,
            ShmError::OpenFailed { .. } => ErrorKind::OpenFailed,
            ShmError::TruncateFailed { .. } => ErrorKind::TruncateFailed,
            ShmError::InvalidName { .. } => ErrorKind::InvalidName,
            ShmError::Ring(_) => ErrorKind::InvalidRing,
        }
    }
}

/// A memory span that cannot host a ring.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RingError {
    #[error("Span is a null pointer")]
    NullSpan,

    #[error("Span of {len} bytes cannot hold the ring header")]
    SpanTooSmall { len: usize },

    #[error("Span base address is not {align}-byte aligned")]
    Misaligned { align: usize },

    #[error("Invalid ring capacity {capacity} for a {len}-byte span")]
    InvalidCapacity { capacity: u32, len: usize },
}
