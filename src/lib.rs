//! Domain-decomposed Jacobi relaxation on a square grid.
//!
//! The global `n` by `n` domain is split between a fixed set of workers,
//! either as horizontal strips or as a square arrangement of blocks. Each
//! worker owns one tile plus a one-cell ghost border, refreshed once per
//! iteration by a halo exchange with its topological neighbors; convergence
//! is decided from a globally-reduced error so every worker stops after the
//! same sweep, and the converged tiles are reassembled at worker 0.
//!
//! Workers communicate through the narrow [`traits::Communicator`] seam,
//! with an in-process channel transport for threads and, behind the `mpi`
//! feature, a transport over real MPI ranks.
#![cfg_attr(feature = "strict", deny(warnings))]
#![warn(missing_docs)]

pub mod assembly;
pub mod comm;
pub mod halo;
mod io;
pub mod runner;
pub mod solver;
pub mod tile;
pub mod topology;
pub mod traits;
pub mod types;

pub use assembly::GlobalGrid;
#[cfg(feature = "mpi")]
pub use comm::MpiComm;
pub use comm::ThreadComm;
pub use io::{write_grid, write_grid_to};
pub use runner::{solve, RunReport, TimingReport};
pub use solver::{IterationState, SolverConfig, Status};
pub use tile::Tile;
pub use topology::{Decomposition, Topology};
pub use types::Error;
