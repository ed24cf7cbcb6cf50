//! Result assembly at the collector

use crate::tile::Tile;
use crate::topology::Topology;
use crate::traits::Communicator;
use crate::types::{CommError, RealScalar};

/// The reassembled global solution.
///
/// Storage is row-major in the internal orientation, where row index 0 is
/// the tile row of worker 0. The export orientation of the domain is the
/// reverse: increasing row index means increasing height, so the
/// numerically-last stored row comes out first. [`GlobalGrid::rows`] and
/// [`GlobalGrid::value`] both speak the export orientation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GlobalGrid<T: RealScalar> {
    n: usize,
    data: Vec<T>,
}

impl<T: RealScalar> GlobalGrid<T> {
    pub(crate) fn from_storage(n: usize, data: Vec<T>) -> Self {
        assert_eq!(data.len(), n * n);
        Self { n, data }
    }

    /// Side length of the grid
    pub fn n(&self) -> usize {
        self.n
    }

    /// Rows in export order, bottom row of the physical domain first
    pub fn rows(&self) -> impl Iterator<Item = &[T]> {
        self.data.chunks(self.n).rev()
    }

    /// Value at `(row, col)` in export orientation, so row 0 is the bottom
    /// of the physical domain
    pub fn value(&self, row: usize, col: usize) -> T {
        assert!(row < self.n && col < self.n);
        self.data[(self.n - 1 - row) * self.n + col]
    }
}

/// Collect every worker's interior at worker 0 and reassemble the global
/// grid in topological order.
///
/// Returns `Ok(None)` on every worker except the collector. Strip tiles
/// stack top-to-bottom by worker id; block tiles land at the rectangle
/// addressed by their (row cut, column cut) position, which reduces to the
/// strip layout when there is a single column cut.
pub fn assemble<T: RealScalar, C: Communicator<T>>(
    tile: &Tile<T>,
    topology: &Topology,
    comm: &mut C,
    n: usize,
) -> Result<Option<GlobalGrid<T>>, CommError> {
    let blocks = match comm.gather(&tile.interior())? {
        Some(blocks) => blocks,
        None => return Ok(None),
    };
    reorder(&blocks, topology, n).map(Some)
}

fn reorder<T: RealScalar>(
    blocks: &[Vec<T>],
    topology: &Topology,
    n: usize,
) -> Result<GlobalGrid<T>, CommError> {
    let rows = n / topology.row_cuts();
    let cols = n / topology.col_cuts();
    let mut data = vec![T::zero(); n * n];
    for (worker, block) in blocks.iter().enumerate() {
        if block.len() != rows * cols {
            return Err(CommError::SizeMismatch {
                from: worker,
                got: block.len(),
                expected: rows * cols,
            });
        }
        let (row_cut, col_cut) = (
            worker / topology.col_cuts(),
            worker % topology.col_cuts(),
        );
        for (i, tile_row) in block.chunks(cols).enumerate() {
            let start = (row_cut * rows + i) * n + col_cut * cols;
            data[start..start + cols].copy_from_slice(tile_row);
        }
    }
    Ok(GlobalGrid::from_storage(n, data))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::topology::Decomposition;

    #[test]
    fn test_reorder_strip() {
        // 4x4 grid, two strips: worker 0 owns the two top stored rows
        let topology = Topology::new(0, 2, Decomposition::Strip).unwrap();
        let blocks = vec![vec![0.0; 8], vec![1.0; 8]];
        let grid = reorder(&blocks, &topology, 4).unwrap();

        // export order flips the strips: worker 1's rows come out first
        let rows: Vec<_> = grid.rows().collect();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0], &[1.0; 4]);
        assert_eq!(rows[1], &[1.0; 4]);
        assert_eq!(rows[2], &[0.0; 4]);
        assert_eq!(rows[3], &[0.0; 4]);
        assert_eq!(grid.value(0, 0), 1.0);
        assert_eq!(grid.value(3, 3), 0.0);
    }

    #[test]
    fn test_reorder_block() {
        // 4x4 grid in 2x2 blocks, each block filled with its worker id
        let topology = Topology::new(0, 4, Decomposition::Block).unwrap();
        let blocks: Vec<Vec<f64>> = (0..4).map(|w| vec![w as f64; 4]).collect();
        let grid = reorder(&blocks, &topology, 4).unwrap();

        // stored top-left quadrant is worker 0, which exports at the top,
        // i.e. at large export row indices
        assert_eq!(grid.value(3, 0), 0.0);
        assert_eq!(grid.value(3, 3), 1.0);
        assert_eq!(grid.value(0, 0), 2.0);
        assert_eq!(grid.value(0, 3), 3.0);
    }

    #[test]
    fn test_reorder_rejects_bad_block() {
        let topology = Topology::new(0, 2, Decomposition::Strip).unwrap();
        let blocks = vec![vec![0.0; 8], vec![1.0; 7]];
        assert_eq!(
            reorder(&blocks, &topology, 4).unwrap_err(),
            CommError::SizeMismatch {
                from: 1,
                got: 7,
                expected: 8
            }
        );
    }
}
