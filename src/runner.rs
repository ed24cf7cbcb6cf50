//! Thread-per-worker execution of a full run

use crate::assembly::{self, GlobalGrid};
use crate::comm::ThreadComm;
use crate::solver::{self, IterationState, SolverConfig};
use crate::tile::Tile;
use crate::topology::{Decomposition, Topology};
use crate::traits::Communicator;
use crate::types::{CommError, Error, RealScalar};
use std::thread;
use std::time::{Duration, Instant};

/// Min/max/average wall-clock time across workers
#[derive(Debug, Clone, Copy)]
pub struct TimingReport {
    /// Fastest worker
    pub min: Duration,
    /// Slowest worker
    pub max: Duration,
    /// Mean across workers
    pub avg: Duration,
}

/// Outcome of a successful threaded run
#[derive(Debug)]
pub struct RunReport<T: RealScalar> {
    /// The assembled solution
    pub grid: GlobalGrid<T>,
    /// Converged iteration state, identical on every worker
    pub state: IterationState,
    /// Wall-clock spread across workers
    pub timing: TimingReport,
}

/// One worker's full pipeline: placement, tile initialization, relaxation,
/// assembly.
///
/// Returns the assembled grid on the collector and `None` elsewhere. Shared
/// by the threaded runner and the MPI binary, which differ only in the
/// transport they pass in.
pub fn run_worker<T, C, F>(
    config: &SolverConfig<T>,
    decomposition: Decomposition,
    comm: &mut C,
    on_iteration: F,
) -> Result<(Option<GlobalGrid<T>>, IterationState), Error>
where
    T: RealScalar,
    C: Communicator<T>,
    F: FnMut(&IterationState),
{
    let topology = Topology::new(comm.rank(), comm.size(), decomposition)?;
    let (rows, cols) = topology.tile_shape(config.n)?;
    let mut tile = Tile::seeded(rows, cols, (config.seed)(topology.rank()), config.boundary);
    let state = solver::relax(&mut tile, &topology, comm, config, on_iteration)?;
    let grid = assembly::assemble(&tile, &topology, comm, config.n)?;
    Ok((grid, state))
}

fn worker_main<T, C, F>(
    config: &SolverConfig<T>,
    decomposition: Decomposition,
    mut comm: C,
    on_iteration: F,
) -> Result<(Option<GlobalGrid<T>>, IterationState, Duration), Error>
where
    T: RealScalar,
    C: Communicator<T>,
    F: FnMut(&IterationState),
{
    let started = Instant::now();
    match run_worker(config, decomposition, &mut comm, on_iteration) {
        Ok((grid, state)) => Ok((grid, state, started.elapsed())),
        Err(e) => {
            // unblock peers stuck in an exchange or collective with us
            comm.cancel();
            Err(e)
        }
    }
}

/// Solve the configured problem with `workers` OS threads, one per tile.
///
/// Worker 0 runs on the calling thread, so `on_iteration` observes every
/// agreed iteration state without any synchronization; the remaining workers
/// are spawned and joined here. Fails without spawning if the configuration
/// is invalid.
pub fn solve<T, F>(
    config: &SolverConfig<T>,
    decomposition: Decomposition,
    workers: usize,
    mut on_iteration: F,
) -> Result<RunReport<T>, Error>
where
    T: RealScalar,
    F: FnMut(&IterationState),
{
    // every worker would reach this same verdict from the same local inputs
    Topology::new(0, workers, decomposition)?.tile_shape(config.n)?;

    let mut comms = ThreadComm::<T>::mesh(workers).into_iter();
    let comm0 = comms.next().expect("at least one worker");

    let mut handles = Vec::new();
    for comm in comms {
        let config = *config;
        handles.push(thread::spawn(move || {
            worker_main(&config, decomposition, comm, |_| {})
        }));
    }
    let root = worker_main(config, decomposition, comm0, &mut on_iteration);

    let mut outcomes = vec![root];
    for (peer, handle) in handles.into_iter().enumerate() {
        outcomes.push(match handle.join() {
            Ok(outcome) => outcome,
            Err(_) => Err(Error::WorkerPanic(peer + 1)),
        });
    }

    let mut grid = None;
    let mut state = None;
    let mut durations = Vec::with_capacity(workers);
    let mut failure: Option<Error> = None;
    for outcome in outcomes {
        match outcome {
            Ok((worker_grid, worker_state, elapsed)) => {
                if let Some(worker_grid) = worker_grid {
                    grid = Some(worker_grid);
                    state = Some(worker_state);
                }
                durations.push(elapsed);
            }
            Err(e) => {
                // keep the root cause over the cancellations it triggered
                let cancellation = matches!(e, Error::Comm(CommError::Cancelled(_)));
                match &failure {
                    None => failure = Some(e),
                    Some(Error::Comm(CommError::Cancelled(_))) if !cancellation => {
                        failure = Some(e)
                    }
                    _ => {}
                }
            }
        }
    }
    if let Some(failure) = failure {
        return Err(failure);
    }

    let timing = TimingReport {
        min: durations.iter().copied().min().unwrap_or_default(),
        max: durations.iter().copied().max().unwrap_or_default(),
        avg: durations.iter().sum::<Duration>() / workers as u32,
    };
    Ok(RunReport {
        grid: grid.expect("collector produced no grid"),
        state: state.expect("collector produced no state"),
        timing,
    })
}
