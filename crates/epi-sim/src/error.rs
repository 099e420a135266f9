use epi_core::{EpiError, Suid};
use epi_exchange::ExchangeError;
use epi_migration::MigrationError;
use epi_report::ReportError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("simulation configuration error: {0}")]
    Config(String),

    /// A node claimed by two ranks.  Inconsistent partitioning is fatal —
    /// silently picking a winner would route migrants into the void.
    #[error("node {suid} claimed by rank {existing_rank} and rank {new_rank}")]
    DuplicateNodeRank {
        suid:          Suid,
        existing_rank: usize,
        new_rank:      usize,
    },

    /// A migrating individual targets a node no rank owns.
    #[error("migration destination {destination} is not in the node-rank map")]
    UnknownDestination { destination: Suid },

    #[error("integrity violation: {0}")]
    Integrity(String),

    #[error(transparent)]
    Exchange(#[from] ExchangeError),

    #[error(transparent)]
    Migration(#[from] MigrationError),

    #[error(transparent)]
    Report(#[from] ReportError),
}

impl From<SimError> for EpiError {
    fn from(e: SimError) -> Self {
        match e {
            SimError::Config(msg) => EpiError::Config(msg),
            SimError::Migration(m) => m.into(),
            SimError::Report(r) => r.into(),
            other => EpiError::Integrity(other.to_string()),
        }
    }
}

pub type SimResult<T> = Result<T, SimError>;
