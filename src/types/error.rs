//! Error taxonomy

use thiserror::Error;

/// Configuration problems detectable from purely local inputs.
///
/// Every worker checks these against the same worker count and grid size, so
/// all workers reach the same verdict without communicating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A run needs at least one worker
    #[error("worker count must be at least 1")]
    NoWorkers,
    /// Grid side length must be positive
    #[error("grid size must be at least 1")]
    EmptyGrid,
    /// Block decomposition arranges workers in a square
    #[error("block decomposition needs a perfect square worker count, got {0}")]
    NotPerfectSquare(usize),
    /// Tiles must all have the same shape
    #[error("grid size {n} does not divide evenly into {cuts} cuts")]
    IndivisibleGrid {
        /// requested grid side length
        n: usize,
        /// number of cuts along the offending dimension
        cuts: usize,
    },
}

/// Failures inside the exchange and reduction transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CommError {
    /// A peer's endpoint vanished mid-run
    #[error("worker {0} disconnected")]
    Disconnected(usize),
    /// A peer broadcast a cancellation before failing
    #[error("run cancelled by worker {0}")]
    Cancelled(usize),
    /// A message length disagreed with the receiver's buffer
    #[error("message from worker {from} carried {got} values, expected {expected}")]
    SizeMismatch {
        /// sending worker
        from: usize,
        /// values received
        got: usize,
        /// values the receiver was prepared for
        expected: usize,
    },
}

/// Anything that can end a run without a solution
#[derive(Debug, Error)]
pub enum Error {
    /// Bad run parameters, detected before any iteration
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Transport failure during the iteration loop or assembly
    #[error(transparent)]
    Comm(#[from] CommError),
    /// The iteration cap was reached before the error fell below precision
    #[error("no convergence after {0} iterations")]
    Diverged(usize),
    /// A worker thread panicked
    #[error("worker {0} panicked")]
    WorkerPanic(usize),
    /// The output artifact could not be written
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
