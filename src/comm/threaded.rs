//! In-process transport: one worker per OS thread over a channel mesh

use crate::traits::{Communicator, MessageTag};
use crate::types::{CommError, RealScalar};
use std::collections::{HashMap, VecDeque};
use std::sync::mpsc::{channel, Receiver, Sender};

enum Packet<T> {
    Data {
        from: usize,
        tag: MessageTag,
        values: Vec<T>,
    },
    Scalar {
        from: usize,
        value: f64,
    },
    Cancel {
        from: usize,
    },
}

/// One worker's endpoint in a fully-connected channel mesh.
///
/// Every endpoint holds a sender to each peer and a single inbox. Messages
/// from different peers interleave in the inbox, so arrivals that do not
/// match the receive currently being waited on are parked in a pending map
/// keyed by `(peer, tag)` and replayed later.
///
/// Collectives are built from the same tagged point-to-point machinery:
/// worker 0 sums contributions in rank order and sends every worker the one
/// combined value, so all workers observe a bit-identical result.
pub struct ThreadComm<T: RealScalar> {
    rank: usize,
    peers: Vec<Option<Sender<Packet<T>>>>,
    inbox: Receiver<Packet<T>>,
    pending: HashMap<(usize, MessageTag), VecDeque<Vec<T>>>,
    pending_scalars: HashMap<usize, VecDeque<f64>>,
    cancelled: Option<usize>,
}

impl<T: RealScalar> ThreadComm<T> {
    /// Create a connected mesh of `size` endpoints, one per worker, indexed
    /// by rank. Each endpoint is moved onto its worker's thread.
    pub fn mesh(size: usize) -> Vec<Self> {
        let (senders, inboxes): (Vec<_>, Vec<_>) = (0..size).map(|_| channel()).unzip();
        inboxes
            .into_iter()
            .enumerate()
            .map(|(rank, inbox)| {
                let peers = senders
                    .iter()
                    .enumerate()
                    .map(|(peer, sender)| (peer != rank).then(|| sender.clone()))
                    .collect();
                Self {
                    rank,
                    peers,
                    inbox,
                    pending: HashMap::new(),
                    pending_scalars: HashMap::new(),
                    cancelled: None,
                }
            })
            .collect()
    }

    fn poisoned(&self) -> Result<(), CommError> {
        match self.cancelled {
            Some(from) => Err(CommError::Cancelled(from)),
            None => Ok(()),
        }
    }

    fn sender(&self, peer: usize) -> &Sender<Packet<T>> {
        self.peers[peer]
            .as_ref()
            .expect("workers do not message themselves")
    }

    /// Drain one packet from the inbox into the pending maps.
    fn pump(&mut self, waiting_on: usize) -> Result<(), CommError> {
        match self.inbox.recv() {
            Ok(Packet::Data { from, tag, values }) => {
                self.pending.entry((from, tag)).or_default().push_back(values);
                Ok(())
            }
            Ok(Packet::Scalar { from, value }) => {
                self.pending_scalars.entry(from).or_default().push_back(value);
                Ok(())
            }
            Ok(Packet::Cancel { from }) => {
                self.cancelled = Some(from);
                Err(CommError::Cancelled(from))
            }
            Err(_) => Err(CommError::Disconnected(waiting_on)),
        }
    }

    fn recv_values(&mut self, peer: usize, tag: MessageTag) -> Result<Vec<T>, CommError> {
        self.poisoned()?;
        loop {
            if let Some(values) = self
                .pending
                .get_mut(&(peer, tag))
                .and_then(VecDeque::pop_front)
            {
                return Ok(values);
            }
            self.pump(peer)?;
        }
    }

    fn recv_scalar(&mut self, peer: usize) -> Result<f64, CommError> {
        self.poisoned()?;
        loop {
            if let Some(value) = self
                .pending_scalars
                .get_mut(&peer)
                .and_then(VecDeque::pop_front)
            {
                return Ok(value);
            }
            self.pump(peer)?;
        }
    }

    fn send_scalar(&mut self, peer: usize, value: f64) -> Result<(), CommError> {
        self.poisoned()?;
        self.sender(peer)
            .send(Packet::Scalar {
                from: self.rank,
                value,
            })
            .map_err(|_| CommError::Disconnected(peer))
    }
}

impl<T: RealScalar> Communicator<T> for ThreadComm<T> {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.peers.len()
    }

    fn send(&mut self, peer: usize, tag: MessageTag, data: &[T]) -> Result<(), CommError> {
        self.poisoned()?;
        self.sender(peer)
            .send(Packet::Data {
                from: self.rank,
                tag,
                values: data.to_vec(),
            })
            .map_err(|_| CommError::Disconnected(peer))
    }

    fn recv(&mut self, peer: usize, tag: MessageTag, buf: &mut [T]) -> Result<(), CommError> {
        let values = self.recv_values(peer, tag)?;
        if values.len() != buf.len() {
            return Err(CommError::SizeMismatch {
                from: peer,
                got: values.len(),
                expected: buf.len(),
            });
        }
        buf.copy_from_slice(&values);
        Ok(())
    }

    fn reduce_sum(&mut self, local: f64) -> Result<f64, CommError> {
        self.poisoned()?;
        if self.rank == 0 {
            let mut total = local;
            for peer in 1..self.size() {
                total += self.recv_scalar(peer)?;
            }
            for peer in 1..self.size() {
                self.send_scalar(peer, total)?;
            }
            Ok(total)
        } else {
            self.send_scalar(0, local)?;
            self.recv_scalar(0)
        }
    }

    fn gather(&mut self, data: &[T]) -> Result<Option<Vec<Vec<T>>>, CommError> {
        self.poisoned()?;
        if self.rank == 0 {
            let mut blocks = Vec::with_capacity(self.size());
            blocks.push(data.to_vec());
            for peer in 1..self.size() {
                blocks.push(self.recv_values(peer, MessageTag::Gather)?);
            }
            Ok(Some(blocks))
        } else {
            self.send(0, MessageTag::Gather, data)?;
            Ok(None)
        }
    }

    fn cancel(&mut self) {
        for peer in 0..self.peers.len() {
            if peer != self.rank {
                let _ = self.sender(peer).send(Packet::Cancel { from: self.rank });
            }
        }
        self.cancelled = Some(self.rank);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::thread;

    #[test]
    fn test_out_of_order_tags() {
        let mut comms = ThreadComm::<f64>::mesh(2);
        let mut c1 = comms.pop().unwrap();
        let mut c0 = comms.pop().unwrap();

        let sender = thread::spawn(move || {
            c1.send(0, MessageTag::RowDown, &[1.0, 2.0]).unwrap();
            c1.send(0, MessageTag::RowUp, &[3.0, 4.0]).unwrap();
        });

        // receive in the opposite order the peer sent
        let mut buf = [0.0; 2];
        c0.recv(1, MessageTag::RowUp, &mut buf).unwrap();
        assert_eq!(buf, [3.0, 4.0]);
        c0.recv(1, MessageTag::RowDown, &mut buf).unwrap();
        assert_eq!(buf, [1.0, 2.0]);
        sender.join().unwrap();
    }

    #[test]
    fn test_reduce_sum_identical_everywhere() {
        let comms = ThreadComm::<f64>::mesh(4);
        let handles: Vec<_> = comms
            .into_iter()
            .enumerate()
            .map(|(rank, mut comm)| {
                thread::spawn(move || comm.reduce_sum((rank + 1) as f64).unwrap())
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), 10.0);
        }
    }

    #[test]
    fn test_gather_orders_by_rank() {
        let comms = ThreadComm::<f64>::mesh(3);
        let handles: Vec<_> = comms
            .into_iter()
            .enumerate()
            .map(|(rank, mut comm)| {
                thread::spawn(move || comm.gather(&[rank as f64, 10.0 * rank as f64]).unwrap())
            })
            .collect();
        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.join().unwrap());
        }
        assert_eq!(
            results[0],
            Some(vec![
                vec![0.0, 0.0],
                vec![1.0, 10.0],
                vec![2.0, 20.0]
            ])
        );
        assert_eq!(results[1], None);
        assert_eq!(results[2], None);
    }

    #[test]
    fn test_cancel_unblocks_blocked_receive() {
        let mut comms = ThreadComm::<f64>::mesh(2);
        let mut c1 = comms.pop().unwrap();
        let mut c0 = comms.pop().unwrap();

        let blocked = thread::spawn(move || {
            let mut buf = [0.0; 4];
            c0.recv(1, MessageTag::RowUp, &mut buf)
        });
        c1.cancel();
        assert_eq!(blocked.join().unwrap(), Err(CommError::Cancelled(1)));
        // the cancelling endpoint is poisoned too
        assert_eq!(c1.reduce_sum(1.0), Err(CommError::Cancelled(1)));
    }

    #[test]
    fn test_length_mismatch_is_detected() {
        let mut comms = ThreadComm::<f64>::mesh(2);
        let mut c1 = comms.pop().unwrap();
        let mut c0 = comms.pop().unwrap();

        c1.send(0, MessageTag::Gather, &[1.0, 2.0, 3.0]).unwrap();
        let mut buf = [0.0; 2];
        assert_eq!(
            c0.recv(1, MessageTag::Gather, &mut buf),
            Err(CommError::SizeMismatch {
                from: 1,
                got: 3,
                expected: 2
            })
        );
    }

    #[test]
    fn test_single_worker_collectives_are_local() {
        let mut comm = ThreadComm::<f64>::mesh(1).pop().unwrap();
        assert_eq!(comm.reduce_sum(2.5).unwrap(), 2.5);
        assert_eq!(comm.gather(&[7.0]).unwrap(), Some(vec![vec![7.0]]));
    }

    #[test]
    fn test_dropped_peer_is_reported() {
        let mut comms = ThreadComm::<f64>::mesh(2);
        drop(comms.pop().unwrap());
        let mut c0 = comms.pop().unwrap();
        let mut buf = [0.0; 1];
        assert_eq!(
            c0.recv(1, MessageTag::RowUp, &mut buf),
            Err(CommError::Disconnected(1))
        );
    }
}
