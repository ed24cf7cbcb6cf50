//! MPI driver: Jacobi relaxation of the Laplace problem, one worker per rank

use clap::Parser;
use halogrid::comm::MpiComm;
use halogrid::runner::run_worker;
use halogrid::traits::Communicator;
use halogrid::{write_grid, Decomposition, Error, SolverConfig};
use mpi::collective::SystemOperation;
use mpi::traits::{Communicator as MpiCommunicator, CommunicatorCollectives};
use std::path::PathBuf;
use std::process::ExitCode;

/// Solve the discrete Laplace problem on an N x N grid; run one worker per
/// MPI rank, e.g. `mpirun -n 4 laplace_mpi -n 12`
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Side length of the square grid
    #[arg(short = 'n', long, default_value_t = 12)]
    size: usize,

    /// Split the grid into square blocks instead of horizontal strips
    /// (requires a perfect square rank count)
    #[arg(long)]
    block: bool,

    /// Convergence threshold on the global error
    #[arg(short, long, default_value_t = 1.0e-2)]
    precision: f64,

    /// Value held fixed on the domain boundary
    #[arg(short, long, default_value_t = -1.0, allow_negative_numbers = true)]
    boundary: f64,

    /// Give up after this many iterations
    #[arg(long)]
    max_iterations: Option<usize>,

    /// Where to write the solved grid (written by rank 0 only)
    #[arg(short, long, default_value = "result_laplace.txt")]
    output: PathBuf,

    /// Print the global error after every iteration
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let universe = mpi::initialize().unwrap();
    let mut comm = MpiComm::new(universe.world());
    let rank = comm.world().rank() as usize;

    let decomposition = if cli.block {
        Decomposition::Block
    } else {
        Decomposition::Strip
    };
    let mut config = SolverConfig::<f64>::new(cli.size);
    config.precision = cli.precision;
    config.boundary = cli.boundary;
    config.max_iterations = cli.max_iterations;

    let start = mpi::time();
    let verbose = cli.verbose;
    let (grid, state) = match run_worker(&config, decomposition, &mut comm, |state| {
        if verbose && rank == 0 {
            println!(
                "Iteration {} - error = {:e}",
                state.iteration, state.global_error
            );
        }
    }) {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("[{rank}] error: {e}");
            if !matches!(e, Error::Config(_)) {
                // configuration errors fail uniformly on every rank before
                // any communication; anything later may leave peers blocked
                // in a receive, so take the world down
                <MpiComm as Communicator<f64>>::cancel(&mut comm);
            }
            return ExitCode::FAILURE;
        }
    };
    let elapsed = mpi::time() - start;

    let (mut min_t, mut max_t, mut sum_t) = (0.0f64, 0.0f64, 0.0f64);
    let world = comm.world();
    world.all_reduce_into(&elapsed, &mut min_t, SystemOperation::min());
    world.all_reduce_into(&elapsed, &mut max_t, SystemOperation::max());
    world.all_reduce_into(&elapsed, &mut sum_t, SystemOperation::sum());

    if let Some(grid) = grid {
        println!(
            "Converged after {} iterations, error = {:e}",
            state.iteration, state.global_error
        );
        println!(
            "Min: {min_t:.6}s  Max: {max_t:.6}s  Avg: {:.6}s",
            sum_t / world.size() as f64
        );
        if let Err(e) = write_grid(&grid, &cli.output) {
            eprintln!("error: cannot write {}: {e}", cli.output.display());
            return ExitCode::FAILURE;
        }
        println!("Result written to {}", cli.output.display());
    }
    ExitCode::SUCCESS
}
