//! Halo exchange between neighboring workers

use crate::tile::Tile;
use crate::topology::Topology;
use crate::traits::{Communicator, MessageTag};
use crate::types::{CommError, RealScalar};

/// Refresh every ghost cell that borders a live neighbor.
///
/// Runs the row phase, then (when the decomposition cuts columns) the column
/// phase; both phases complete before this returns, so the next sweep never
/// observes a partially refreshed border. Domain-edge ghosts are never
/// written and keep the boundary value they were initialized with.
///
/// Corner ghosts are excluded from the column transfers: they are only
/// refreshed indirectly, one iteration late, by the row phase. The 4-point stencil never reads a diagonal neighbor, so this
/// staleness does not affect the computed values.
///
/// Within each phase, workers at an even cut index send before they receive
/// while their (necessarily odd) neighbors receive before they send, so
/// paired blocking deliveries cannot deadlock.
pub fn exchange<T: RealScalar, C: Communicator<T>>(
    tile: &mut Tile<T>,
    topology: &Topology,
    comm: &mut C,
) -> Result<(), CommError> {
    let (row, col) = topology.position();
    if row % 2 == 0 {
        send_rows(tile, topology, comm)?;
        recv_rows(tile, topology, comm)?;
    } else {
        recv_rows(tile, topology, comm)?;
        send_rows(tile, topology, comm)?;
    }
    if topology.col_cuts() > 1 {
        if col % 2 == 0 {
            send_cols(tile, topology, comm)?;
            recv_cols(tile, topology, comm)?;
        } else {
            recv_cols(tile, topology, comm)?;
            send_cols(tile, topology, comm)?;
        }
    }
    Ok(())
}

fn send_rows<T: RealScalar, C: Communicator<T>>(
    tile: &Tile<T>,
    topology: &Topology,
    comm: &mut C,
) -> Result<(), CommError> {
    if let Some(up) = topology.up() {
        comm.send(up, MessageTag::RowUp, tile.first_interior_row())?;
    }
    if let Some(down) = topology.down() {
        comm.send(down, MessageTag::RowDown, tile.last_interior_row())?;
    }
    Ok(())
}

fn recv_rows<T: RealScalar, C: Communicator<T>>(
    tile: &mut Tile<T>,
    topology: &Topology,
    comm: &mut C,
) -> Result<(), CommError> {
    let mut buf = vec![T::zero(); tile.interior_cols()];
    if let Some(up) = topology.up() {
        comm.recv(up, MessageTag::RowDown, &mut buf)?;
        tile.fill_top_ghost_row(&buf);
    }
    if let Some(down) = topology.down() {
        comm.recv(down, MessageTag::RowUp, &mut buf)?;
        tile.fill_bottom_ghost_row(&buf);
    }
    Ok(())
}

fn send_cols<T: RealScalar, C: Communicator<T>>(
    tile: &Tile<T>,
    topology: &Topology,
    comm: &mut C,
) -> Result<(), CommError> {
    if let Some(left) = topology.left() {
        comm.send(left, MessageTag::ColLeft, &tile.first_interior_col())?;
    }
    if let Some(right) = topology.right() {
        comm.send(right, MessageTag::ColRight, &tile.last_interior_col())?;
    }
    Ok(())
}

fn recv_cols<T: RealScalar, C: Communicator<T>>(
    tile: &mut Tile<T>,
    topology: &Topology,
    comm: &mut C,
) -> Result<(), CommError> {
    let mut buf = vec![T::zero(); tile.interior_rows()];
    if let Some(left) = topology.left() {
        comm.recv(left, MessageTag::ColRight, &mut buf)?;
        tile.fill_left_ghost_col(&buf);
    }
    if let Some(right) = topology.right() {
        comm.recv(right, MessageTag::ColLeft, &mut buf)?;
        tile.fill_right_ghost_col(&buf);
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::comm::ThreadComm;
    use crate::topology::Decomposition;
    use std::thread;

    fn exchange_all(
        decomposition: Decomposition,
        tiles: Vec<Tile<f64>>,
    ) -> Vec<Tile<f64>> {
        let size = tiles.len();
        let comms = ThreadComm::mesh(size);
        let handles: Vec<_> = comms
            .into_iter()
            .zip(tiles)
            .enumerate()
            .map(|(rank, (mut comm, mut tile))| {
                thread::spawn(move || {
                    let topology = Topology::new(rank, size, decomposition).unwrap();
                    exchange(&mut tile, &topology, &mut comm).unwrap();
                    tile
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    }

    #[test]
    fn test_strip_exchange() {
        let tiles = (0..3)
            .map(|rank| Tile::seeded(2, 4, rank as f64 + 5.0, -1.0))
            .collect();
        let tiles = exchange_all(Decomposition::Strip, tiles);

        // middle worker sees both neighbors' border rows
        assert_eq!(tiles[1].get(0, 1), 5.0);
        assert_eq!(tiles[1].get(3, 4), 7.0);
        // top and bottom workers keep the boundary value on their domain edge
        assert_eq!(tiles[0].get(0, 2), -1.0);
        assert_eq!(tiles[0].get(3, 2), 6.0);
        assert_eq!(tiles[2].get(3, 2), -1.0);
        assert_eq!(tiles[2].get(0, 2), 6.0);
        // no column neighbors in strip mode
        for tile in &tiles {
            assert_eq!(tile.get(1, 0), -1.0);
            assert_eq!(tile.get(2, 5), -1.0);
        }
    }

    #[test]
    fn test_block_exchange() {
        let tiles = (0..4)
            .map(|rank| Tile::seeded(2, 2, rank as f64, -1.0))
            .collect();
        let tiles = exchange_all(Decomposition::Block, tiles);

        // worker 0 sits at (0, 0): live neighbors below (2) and right (1)
        assert_eq!(tiles[0].get(3, 1), 2.0);
        assert_eq!(tiles[0].get(3, 2), 2.0);
        assert_eq!(tiles[0].get(1, 3), 1.0);
        assert_eq!(tiles[0].get(2, 3), 1.0);
        assert_eq!(tiles[0].get(0, 1), -1.0);
        assert_eq!(tiles[0].get(1, 0), -1.0);

        // worker 3 sits at (1, 1): live neighbors above (1) and left (2)
        assert_eq!(tiles[3].get(0, 1), 1.0);
        assert_eq!(tiles[3].get(1, 0), 2.0);
        assert_eq!(tiles[3].get(3, 1), -1.0);
        assert_eq!(tiles[3].get(2, 3), -1.0);
    }

    #[test]
    fn test_corner_ghosts_left_alone() {
        let tiles = (0..4)
            .map(|rank| Tile::seeded(2, 2, rank as f64, -1.0))
            .collect();
        let tiles = exchange_all(Decomposition::Block, tiles);

        // every corner ghost still holds its initial value after one exchange
        for tile in &tiles {
            assert_eq!(tile.get(0, 0), -1.0);
            assert_eq!(tile.get(0, 3), -1.0);
            assert_eq!(tile.get(3, 0), -1.0);
            assert_eq!(tile.get(3, 3), -1.0);
        }
    }
}
