//! Errors a caller can recover from.
//!
//! Cancellation is an outcome, not an error, and partition invariant
//! violations panic instead of showing up here.

use thiserror::Error;

use crate::request::MIN_SIZE;

#[derive(Debug, Error)]
pub enum SieveError {
    #[error("sieve size {input:?} is not a whole number")]
    InvalidSize { input: String },

    #[error("sieve size {size} is below the minimum of {min}", min = MIN_SIZE)]
    SizeTooSmall { size: u64 },

    #[error("sieve size {size} is too large for this platform")]
    SizeTooLarge { size: u64 },

    #[error("not enough memory for a {bytes}-byte sieve buffer (size {size})")]
    OutOfMemory {
        size: u64,
        bytes: u64,
        #[source]
        source: std::collections::TryReserveError,
    },

    #[error("parallelism {input:?} must be a whole number of at least 1")]
    InvalidParallelism { input: String },

    #[error("failed to start sieve worker pool")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl SieveError {
    /// Input was malformed. Resource failures while setting up a run are not.
    pub fn is_validation(&self) -> bool {
        !matches!(self, SieveError::ThreadPool(_) | SieveError::OutOfMemory { .. })
    }
}

pub type Result<T, E = SieveError> = std::result::Result<T, E>;
