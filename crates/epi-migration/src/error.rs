use std::path::PathBuf;

use epi_core::EpiError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("migration file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error(
        "migration file {} is {actual} bytes but metadata implies {expected}",
        path.display()
    )]
    SizeMismatch {
        path:     PathBuf,
        expected: u64,
        actual:   u64,
    },

    #[error("cannot parse migration metadata {}: {message}", path.display())]
    MetadataParse { path: PathBuf, message: String },

    #[error(
        "IdReference mismatch in {}: file has '{actual}', demographics have '{expected}'",
        path.display()
    )]
    IdReferenceMismatch {
        path:     PathBuf,
        expected: String,
        actual:   String,
    },

    #[error("malformed NodeOffsets in {}: {message}", path.display())]
    OffsetsMalformed { path: PathBuf, message: String },

    #[error("migration from node {from} targets unknown node id {to}")]
    UnknownDestination { from: u32, to: u32 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<MigrationError> for EpiError {
    fn from(e: MigrationError) -> Self {
        match e {
            MigrationError::Io(io) => EpiError::Io(io),
            other => EpiError::Config(other.to_string()),
        }
    }
}

pub type MigrationResult<T> = Result<T, MigrationError>;
