//! Trait definitions

mod comm;
pub use comm::{Communicator, MessageTag};
