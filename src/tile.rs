//! Worker-local grid tile with a one-cell ghost border

use crate::types::RealScalar;
use itertools::izip;

/// The rectangular buffer one worker owns.
///
/// One flat allocation of `(rows + 2) * (cols + 2)` values: the inner
/// `rows * cols` region is the interior this worker updates, the outer ring is
/// ghost storage that is either refreshed by halo exchange (next to a live
/// neighbor) or pinned at the boundary value (on a domain edge). Indexing is
/// in padded coordinates, so `(0, 0)` is the top-left ghost corner and
/// `(1, 1)` the first interior cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Tile<T: RealScalar> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

impl<T: RealScalar> Tile<T> {
    /// Allocate a tile with `rows * cols` interior cells, all values `fill`
    pub fn new(rows: usize, cols: usize, fill: T) -> Self {
        assert!(rows > 0 && cols > 0, "tile must have a non-empty interior");
        Self {
            rows,
            cols,
            data: vec![fill; (rows + 2) * (cols + 2)],
        }
    }

    /// Allocate a tile with the interior set to `seed` and the whole ghost
    /// ring set to `boundary`.
    ///
    /// Ghost cells next to live neighbors hold `boundary` only until the
    /// first halo exchange; domain-edge ghosts keep it for the whole run.
    pub fn seeded(rows: usize, cols: usize, seed: T, boundary: T) -> Self {
        let mut tile = Self::new(rows, cols, boundary);
        for i in 1..=rows {
            for j in 1..=cols {
                tile.set(i, j, seed);
            }
        }
        tile
    }

    /// Number of interior rows
    pub fn interior_rows(&self) -> usize {
        self.rows
    }
    /// Number of interior columns
    pub fn interior_cols(&self) -> usize {
        self.cols
    }

    fn index(&self, i: usize, j: usize) -> usize {
        assert!(
            i < self.rows + 2 && j < self.cols + 2,
            "cell ({i}, {j}) out of bounds for a {}x{} tile",
            self.rows,
            self.cols
        );
        i * (self.cols + 2) + j
    }

    /// Value at padded coordinates `(i, j)`
    pub fn get(&self, i: usize, j: usize) -> T {
        self.data[self.index(i, j)]
    }

    /// Overwrite the value at padded coordinates `(i, j)`
    pub fn set(&mut self, i: usize, j: usize, value: T) {
        let index = self.index(i, j);
        self.data[index] = value;
    }

    /// The first interior row, the values a worker sends to its `up` neighbor
    pub fn first_interior_row(&self) -> &[T] {
        let start = self.index(1, 1);
        &self.data[start..start + self.cols]
    }

    /// The last interior row, the values a worker sends to its `down` neighbor
    pub fn last_interior_row(&self) -> &[T] {
        let start = self.index(self.rows, 1);
        &self.data[start..start + self.cols]
    }

    /// Packed copy of the first interior column, for the `left` neighbor.
    ///
    /// Column values are strided by the padded row length, so they are
    /// gathered into a contiguous buffer before transfer.
    pub fn first_interior_col(&self) -> Vec<T> {
        (1..=self.rows).map(|i| self.get(i, 1)).collect()
    }

    /// Packed copy of the last interior column, for the `right` neighbor
    pub fn last_interior_col(&self) -> Vec<T> {
        (1..=self.rows).map(|i| self.get(i, self.cols)).collect()
    }

    /// Refresh the top ghost row. Corner ghosts are not touched.
    pub fn fill_top_ghost_row(&mut self, values: &[T]) {
        assert_eq!(values.len(), self.cols);
        let start = self.index(0, 1);
        self.data[start..start + self.cols].copy_from_slice(values);
    }

    /// Refresh the bottom ghost row. Corner ghosts are not touched.
    pub fn fill_bottom_ghost_row(&mut self, values: &[T]) {
        assert_eq!(values.len(), self.cols);
        let start = self.index(self.rows + 1, 1);
        self.data[start..start + self.cols].copy_from_slice(values);
    }

    /// Refresh the left ghost column. Corner ghosts are not touched.
    pub fn fill_left_ghost_col(&mut self, values: &[T]) {
        assert_eq!(values.len(), self.rows);
        for (i, value) in izip!(1..=self.rows, values) {
            self.set(i, 0, *value);
        }
    }

    /// Refresh the right ghost column. Corner ghosts are not touched.
    pub fn fill_right_ghost_col(&mut self, values: &[T]) {
        assert_eq!(values.len(), self.rows);
        for (i, value) in izip!(1..=self.rows, values) {
            self.set(i, self.cols + 1, *value);
        }
    }

    /// Row-major copy of the interior, the worker's contribution to assembly
    pub fn interior(&self) -> Vec<T> {
        let mut out = Vec::with_capacity(self.rows * self.cols);
        for i in 1..=self.rows {
            let start = self.index(i, 1);
            out.extend_from_slice(&self.data[start..start + self.cols]);
        }
        out
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn counting_tile(rows: usize, cols: usize) -> Tile<f64> {
        // interior cell (i, j) holds 10 * i + j in padded coordinates
        let mut tile = Tile::seeded(rows, cols, 0.0, -1.0);
        for i in 1..=rows {
            for j in 1..=cols {
                tile.set(i, j, (10 * i + j) as f64);
            }
        }
        tile
    }

    #[test]
    fn test_seeded_layout() {
        let tile = Tile::seeded(2, 3, 7.0, -1.0);
        for i in 0..4 {
            for j in 0..5 {
                let ghost = i == 0 || i == 3 || j == 0 || j == 4;
                assert_eq!(tile.get(i, j), if ghost { -1.0 } else { 7.0 });
            }
        }
    }

    #[test]
    fn test_row_accessors() {
        let tile = counting_tile(3, 4);
        assert_eq!(tile.first_interior_row(), &[11.0, 12.0, 13.0, 14.0]);
        assert_eq!(tile.last_interior_row(), &[31.0, 32.0, 33.0, 34.0]);
    }

    #[test]
    fn test_col_packing() {
        let tile = counting_tile(3, 4);
        assert_eq!(tile.first_interior_col(), vec![11.0, 21.0, 31.0]);
        assert_eq!(tile.last_interior_col(), vec![14.0, 24.0, 34.0]);
    }

    #[test]
    fn test_ghost_fills_spare_corners() {
        let mut tile = Tile::seeded(2, 2, 0.0, -1.0);
        tile.fill_top_ghost_row(&[5.0, 6.0]);
        tile.fill_bottom_ghost_row(&[7.0, 8.0]);
        tile.fill_left_ghost_col(&[1.5, 2.5]);
        tile.fill_right_ghost_col(&[3.5, 4.5]);

        assert_eq!(tile.get(0, 1), 5.0);
        assert_eq!(tile.get(0, 2), 6.0);
        assert_eq!(tile.get(3, 1), 7.0);
        assert_eq!(tile.get(1, 0), 1.5);
        assert_eq!(tile.get(2, 3), 4.5);
        // all four corners keep the boundary value
        assert_eq!(tile.get(0, 0), -1.0);
        assert_eq!(tile.get(0, 3), -1.0);
        assert_eq!(tile.get(3, 0), -1.0);
        assert_eq!(tile.get(3, 3), -1.0);
    }

    #[test]
    fn test_interior_copy() {
        let tile = counting_tile(2, 2);
        assert_eq!(tile.interior(), vec![11.0, 12.0, 21.0, 22.0]);
    }

    #[test]
    #[should_panic]
    fn test_out_of_bounds() {
        let tile = Tile::seeded(2, 2, 0.0, -1.0);
        tile.get(4, 0);
    }
}
