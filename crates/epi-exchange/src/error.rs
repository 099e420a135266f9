use epi_core::EpiError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExchangeError {
    /// Serialization or deserialization failed mid-exchange.  Fatal: partial
    /// delivery would corrupt population conservation.
    #[error("exchange codec failure: {0}")]
    Codec(String),

    /// A peer rank hung up (its process died or its hub handle was dropped).
    #[error("rank {peer} disconnected during exchange")]
    Disconnected { peer: usize },

    /// The caller supplied per-rank buffers for the wrong number of ranks.
    #[error("expected {expected} per-rank buffers, got {got}")]
    RankCountMismatch { expected: usize, got: usize },
}

impl From<ExchangeError> for EpiError {
    fn from(e: ExchangeError) -> Self {
        EpiError::Integrity(e.to_string())
    }
}

pub type ExchangeResult<T> = Result<T, ExchangeError>;
