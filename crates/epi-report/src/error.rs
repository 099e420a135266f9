use epi_core::EpiError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ReportError> for EpiError {
    fn from(e: ReportError) -> Self {
        match e {
            ReportError::Io(io) => EpiError::Io(io),
            other => EpiError::Config(other.to_string()),
        }
    }
}

pub type ReportResult<T> = Result<T, ReportError>;
