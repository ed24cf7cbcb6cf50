//! The message-passing seam between workers

use crate::types::{CommError, RealScalar};

/// Distinguishes messages in flight between the same pair of workers.
///
/// Halo tags name the direction the payload travels in, so a worker receiving
/// into its top ghost row waits for a [`MessageTag::RowDown`] from its `up`
/// neighbor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageTag {
    /// An interior row travelling towards the `up` neighbor
    RowUp,
    /// An interior row travelling towards the `down` neighbor
    RowDown,
    /// A packed interior column travelling towards the `left` neighbor
    ColLeft,
    /// A packed interior column travelling towards the `right` neighbor
    ColRight,
    /// An interior tile en route to the collector
    Gather,
}

/// Point-to-point and collective operations one worker needs for a run.
///
/// Implementations exist for an in-process channel mesh
/// ([`crate::comm::ThreadComm`]) and for MPI ranks
/// ([`crate::comm::MpiComm`], behind the `mpi` feature); the protocol layers
/// above are written against this trait only, so the two transports are
/// interchangeable.
pub trait Communicator<T: RealScalar> {
    /// This worker's 0-based id
    fn rank(&self) -> usize;

    /// Total number of workers
    fn size(&self) -> usize;

    /// Deliver `data` to `peer`.
    ///
    /// May block until the matching receive is posted; callers order their
    /// sends and receives so that paired deliveries cannot deadlock.
    fn send(&mut self, peer: usize, tag: MessageTag, data: &[T]) -> Result<(), CommError>;

    /// Block until the matching message from `peer` arrives and fill `buf`
    /// with it exactly.
    fn recv(&mut self, peer: usize, tag: MessageTag, buf: &mut [T]) -> Result<(), CommError>;

    /// Combine every worker's `local` into one sum.
    ///
    /// Barrier-like: no worker returns before all have contributed. The
    /// summation order is fixed, so every worker returns a bit-identical
    /// value.
    fn reduce_sum(&mut self, local: f64) -> Result<f64, CommError>;

    /// Collect `data` from every worker at worker 0.
    ///
    /// Returns `Some` of the per-worker payloads indexed by rank on worker 0,
    /// `None` everywhere else.
    fn gather(&mut self, data: &[T]) -> Result<Option<Vec<Vec<T>>>, CommError>;

    /// Broadcast a cancellation so peers blocked in [`Communicator::recv`] or
    /// a collective fail with [`CommError::Cancelled`] instead of waiting on
    /// a worker that is about to vanish.
    fn cancel(&mut self);
}
