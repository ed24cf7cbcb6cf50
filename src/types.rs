//! Types

mod error;
pub use error::{CommError, ConfigError, Error};

use num::Float;
use std::fmt::{Debug, Display};
use std::iter::Sum;

/// Scalar types that grid values can be stored as
pub trait RealScalar: Float + Debug + Display + Sum + Send + Sync + 'static {}

impl RealScalar for f32 {}
impl RealScalar for f64 {}
