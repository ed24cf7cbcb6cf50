//! Jacobi convergence engine

use crate::halo;
use crate::tile::Tile;
use crate::topology::Topology;
use crate::traits::Communicator;
use crate::types::{CommError, Error, RealScalar};

/// Tunable parameters of a run
#[derive(Debug, Clone, Copy)]
pub struct SolverConfig<T: RealScalar> {
    /// Side length of the global grid
    pub n: usize,
    /// Convergence threshold on the global error
    pub precision: f64,
    /// Value held fixed on the domain boundary
    pub boundary: T,
    /// Initial interior value for a given worker id
    pub seed: fn(usize) -> T,
    /// Give up with [`Error::Diverged`] after this many iterations
    pub max_iterations: Option<usize>,
}

fn seed_with_worker_id<T: RealScalar>(rank: usize) -> T {
    T::from(rank).unwrap()
}

impl<T: RealScalar> SolverConfig<T> {
    /// Reference-problem defaults: precision `1e-2`, boundary `-1`, interior
    /// seeded with the owning worker's id, no iteration cap.
    pub fn new(n: usize) -> Self {
        Self {
            n,
            precision: 1.0e-2,
            boundary: -T::one(),
            seed: seed_with_worker_id::<T>,
            max_iterations: None,
        }
    }
}

/// Scalar outcome of one completed iteration, identical on every worker
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IterationState {
    /// Count of completed sweeps
    pub iteration: usize,
    /// Square root of the cross-worker sum of squared update deltas
    pub global_error: f64,
}

/// Where the convergence loop stands after a combine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The global error is still at or above the precision threshold
    Iterating,
    /// The global error fell below the precision threshold; terminal
    Converged,
}

/// One Jacobi sweep over the tile interior.
///
/// Every interior cell becomes the 4-point average of its neighbors' values
/// from the previous iteration; new values are staged in `scratch` and only
/// committed after the whole interior is computed, so a sweep never reads an
/// already-updated neighbor. Returns the local sum of squared update deltas,
/// accumulated in `f64` regardless of the tile scalar.
pub fn sweep<T: RealScalar>(tile: &mut Tile<T>, scratch: &mut [T]) -> f64 {
    let rows = tile.interior_rows();
    let cols = tile.interior_cols();
    debug_assert_eq!(scratch.len(), rows * cols);
    let quarter = T::from(0.25).unwrap();

    let mut local_error_sum = 0.0;
    for i in 1..=rows {
        for j in 1..=cols {
            let fresh = quarter
                * (tile.get(i - 1, j) + tile.get(i + 1, j) + tile.get(i, j - 1)
                    + tile.get(i, j + 1));
            let delta = (fresh - tile.get(i, j)).to_f64().unwrap();
            local_error_sum += delta * delta;
            scratch[(i - 1) * cols + (j - 1)] = fresh;
        }
    }
    for i in 1..=rows {
        for j in 1..=cols {
            tile.set(i, j, scratch[(i - 1) * cols + (j - 1)]);
        }
    }
    local_error_sum
}

/// Combine local error sums into the shared global error and decide whether
/// to keep iterating.
///
/// The reduction is barrier-like and order-fixed, so every worker receives
/// the identical error and reaches the identical decision.
pub fn combine_and_decide<T: RealScalar, C: Communicator<T>>(
    comm: &mut C,
    local_error_sum: f64,
    precision: f64,
) -> Result<(f64, Status), CommError> {
    let global_error = comm.reduce_sum(local_error_sum)?.sqrt();
    let status = if global_error < precision {
        Status::Converged
    } else {
        Status::Iterating
    };
    Ok((global_error, status))
}

/// Drive one worker's tile to convergence.
///
/// Performs an initial halo exchange (ghosts next to live neighbors still
/// hold seed values from initialization), then loops sweep → exchange →
/// combine until every worker has seen the global error drop below the
/// configured precision. All workers leave the loop after the same
/// iteration; `on_iteration` is invoked once per completed iteration with
/// the state every worker agreed on.
pub fn relax<T: RealScalar, C: Communicator<T>>(
    tile: &mut Tile<T>,
    topology: &Topology,
    comm: &mut C,
    config: &SolverConfig<T>,
    mut on_iteration: impl FnMut(&IterationState),
) -> Result<IterationState, Error> {
    let mut scratch = vec![T::zero(); tile.interior_rows() * tile.interior_cols()];
    halo::exchange(tile, topology, comm)?;

    let mut state = IterationState {
        iteration: 0,
        global_error: f64::INFINITY,
    };
    loop {
        if let Some(cap) = config.max_iterations {
            if state.iteration >= cap {
                return Err(Error::Diverged(cap));
            }
        }
        let local_error_sum = sweep(tile, &mut scratch);
        halo::exchange(tile, topology, comm)?;
        let (global_error, status) = combine_and_decide(comm, local_error_sum, config.precision)?;
        state = IterationState {
            iteration: state.iteration + 1,
            global_error,
        };
        on_iteration(&state);
        if status == Status::Converged {
            return Ok(state);
        }
    }
}
