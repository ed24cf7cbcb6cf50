//! Threaded driver: Jacobi relaxation of the Laplace problem

use clap::Parser;
use halogrid::{solve, write_grid, Decomposition, SolverConfig};
use std::path::PathBuf;
use std::process::ExitCode;

/// Solve the discrete Laplace problem on an N x N grid with a fixed set of
/// worker threads
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Side length of the square grid
    #[arg(short = 'n', long, default_value_t = 12)]
    size: usize,

    /// Number of workers, one tile and one thread each
    #[arg(short, long, default_value_t = 4)]
    workers: usize,

    /// Split the grid into square blocks instead of horizontal strips
    /// (requires a perfect square worker count)
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

    /// Where to write the solved grid
    #[arg(short, long, default_value = "result_laplace.txt")]
    output: PathBuf,

    /// Print the global error after every iteration
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let decomposition = if cli.block {
        Decomposition::Block
    } else {
        Decomposition::Strip
    };
    let mut config = SolverConfig::<f64>::new(cli.size);
    config.precision = cli.precision;
    config.boundary = cli.boundary;
    config.max_iterations = cli.max_iterations;

    let report = match solve(&config, decomposition, cli.workers, |state| {
        if cli.verbose {
            println!(
                "Iteration {} - error = {:e}",
                state.iteration, state.global_error
            );
        }
    }) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    println!(
        "Converged after {} iterations, error = {:e}",
        report.state.iteration, report.state.global_error
    );
    println!(
        "Min: {:?}  Max: {:?}  Avg: {:?}",
        report.timing.min, report.timing.max, report.timing.avg
    );

    if let Err(e) = write_grid(&report.grid, &cli.output) {
        eprintln!("error: cannot write {}: {e}", cli.output.display());
        return ExitCode::FAILURE;
    }
    println!("Result written to {}", cli.output.display());
    ExitCode::SUCCESS
}
