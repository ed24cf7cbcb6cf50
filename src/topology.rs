//! Worker topology and domain decomposition

use crate::types::ConfigError;

/// How the global grid is split between workers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Decomposition {
    /// Horizontal bands, one per worker
    Strip,
    /// A square arrangement of rectangular tiles, one per worker
    Block,
}

/// Immutable placement of one worker within the decomposed domain.
///
/// Row indices grow downwards in storage order, so the `up` neighbor of a
/// worker always has a smaller id. Created once at startup and never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Topology {
    rank: usize,
    size: usize,
    row_cuts: usize,
    col_cuts: usize,
    up: Option<usize>,
    down: Option<usize>,
    left: Option<usize>,
    right: Option<usize>,
}

impl Topology {
    /// Place worker `rank` out of `size` under the given decomposition.
    ///
    /// Fails if `size` is zero, or if `size` is not a perfect square under
    /// block decomposition.
    pub fn new(rank: usize, size: usize, decomposition: Decomposition) -> Result<Self, ConfigError> {
        if size == 0 {
            return Err(ConfigError::NoWorkers);
        }
        assert!(rank < size, "worker id {rank} out of range for {size} workers");
        let (row_cuts, col_cuts) = match decomposition {
            Decomposition::Strip => (size, 1),
            Decomposition::Block => {
                let cuts = (size as f64).sqrt().round() as usize;
                if cuts * cuts != size {
                    return Err(ConfigError::NotPerfectSquare(size));
                }
                (cuts, cuts)
            }
        };
        let (row, col) = (rank / col_cuts, rank % col_cuts);
        Ok(Self {
            rank,
            size,
            row_cuts,
            col_cuts,
            up: (row > 0).then(|| rank - col_cuts),
            down: (row + 1 < row_cuts).then(|| rank + col_cuts),
            left: (col > 0).then(|| rank - 1),
            right: (col + 1 < col_cuts).then(|| rank + 1),
        })
    }

    /// This worker's 0-based id
    pub fn rank(&self) -> usize {
        self.rank
    }
    /// Total number of workers
    pub fn size(&self) -> usize {
        self.size
    }
    /// Number of horizontal cuts through the global grid
    pub fn row_cuts(&self) -> usize {
        self.row_cuts
    }
    /// Number of vertical cuts through the global grid
    pub fn col_cuts(&self) -> usize {
        self.col_cuts
    }
    /// Position of this worker's tile as a (row, column) pair of cut indices
    pub fn position(&self) -> (usize, usize) {
        (self.rank / self.col_cuts, self.rank % self.col_cuts)
    }
    /// Neighbor owning the tile above, if this worker is not in the top row
    pub fn up(&self) -> Option<usize> {
        self.up
    }
    /// Neighbor owning the tile below, if this worker is not in the bottom row
    pub fn down(&self) -> Option<usize> {
        self.down
    }
    /// Neighbor owning the tile to the left, if any
    pub fn left(&self) -> Option<usize> {
        self.left
    }
    /// Neighbor owning the tile to the right, if any
    pub fn right(&self) -> Option<usize> {
        self.right
    }
    /// Whether this worker collects the assembled result
    pub fn is_collector(&self) -> bool {
        self.rank == 0
    }

    /// Interior shape `(rows, cols)` of every tile for an `n` by `n` grid.
    ///
    /// Fails if `n` is zero or does not divide evenly along either cut
    /// dimension, so that all workers can reject a bad configuration from
    /// local knowledge alone.
    pub fn tile_shape(&self, n: usize) -> Result<(usize, usize), ConfigError> {
        if n == 0 {
            return Err(ConfigError::EmptyGrid);
        }
        if n % self.row_cuts != 0 {
            return Err(ConfigError::IndivisibleGrid {
                n,
                cuts: self.row_cuts,
            });
        }
        if n % self.col_cuts != 0 {
            return Err(ConfigError::IndivisibleGrid {
                n,
                cuts: self.col_cuts,
            });
        }
        Ok((n / self.row_cuts, n / self.col_cuts))
    }
}
