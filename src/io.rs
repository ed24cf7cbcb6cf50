//! Output artifacts

use crate::assembly::GlobalGrid;
use crate::types::RealScalar;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Write the assembled grid as text: one row per line, space-separated
/// values with six decimals, bottom row of the physical domain first.
///
/// This is the run's only persisted artifact; it is written by the collector
/// after convergence, and never on a failed run.
pub fn write_grid<T: RealScalar>(
    grid: &GlobalGrid<T>,
    path: impl AsRef<Path>,
) -> std::io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    write_grid_to(grid, &mut out)
}

/// Write the grid in the text format of [`write_grid`] to any writer
pub fn write_grid_to<T: RealScalar, W: Write>(
    grid: &GlobalGrid<T>,
    out: &mut W,
) -> std::io::Result<()> {
    for row in grid.rows() {
        for value in row {
            write!(out, "{value:.6} ")?;
        }
        writeln!(out)?;
    }
    Ok(())
}

#[cfg(feature = "serde")]
impl<T: RealScalar + serde::Serialize> GlobalGrid<T> {
    /// Serialize the grid to a RON string
    pub fn to_ron_string(&self) -> String {
        ron::to_string(self).unwrap()
    }
}

#[cfg(feature = "serde")]
impl<T: RealScalar + serde::de::DeserializeOwned> GlobalGrid<T> {
    /// Recreate a grid from its RON representation
    pub fn from_ron_string(s: &str) -> Self {
        ron::from_str(s).unwrap()
    }
}
