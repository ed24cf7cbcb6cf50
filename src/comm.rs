//! Worker-to-worker transports

#[cfg(feature = "mpi")]
pub mod mpi;
pub mod threaded;

#[cfg(feature = "mpi")]
pub use self::mpi::MpiComm;
pub use threaded::ThreadComm;
