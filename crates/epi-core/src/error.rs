//! Framework error type.
//!
//! Sub-crates define their own error enums and convert them into `EpiError`
//! via `From` impls where they cross crate boundaries.  The variants mirror
//! the failure taxonomy the simulation enforces: configuration and I/O
//! problems are fatal at load time, integrity and interface violations are
//! fatal whenever they surface, and expected edge conditions (an isolated
//! node, a zero migration rate) are not errors at all — they are logged and
//! treated as valid states.

use thiserror::Error;

/// The top-level error type for `epi-core` and a common base for sub-crates.
#[derive(Debug, Error)]
pub enum EpiError {
    /// Bad, missing, or inconsistent parameters.  Fatal at startup.
    #[error("configuration error: {0}")]
    Config(String),

    /// A "should never happen" consistency violation (duplicate rank-map
    /// key, malformed enum value, conservation breach).  Fatal; never
    /// recovered from.
    #[error("integrity violation: {0}")]
    Integrity(String),

    /// A capability was requested from an object that does not provide it.
    /// A programming-contract violation, fatal.
    #[error("interface not supported: {0}")]
    Interface(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shorthand result type for all `epi-*` crates.
pub type EpiResult<T> = Result<T, EpiError>;
