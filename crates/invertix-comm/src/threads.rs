//! In-process transport: P rank handles backed by threads and channels.
//!
//! [`ThreadWorld::create`] builds one [`ThreadComm`] handle per rank; the
//! caller moves each handle into its own worker thread. Point-to-point and
//! broadcast traffic travel over dedicated per-ordered-pair mpsc channels
//! (one set for each), so collectives never interleave with scatter/gather
//! messages and delivery stays FIFO per sender. The barrier is a shared
//! `std::sync::Barrier` sized to the group.
//!
//! A rank that exits early drops its channel endpoints; any peer blocked on
//! a receive from it then observes [`CommError::Disconnected`] rather than
//! hanging.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Barrier};

use crate::communicator::{CommError, Communicator};

/// Factory for an in-process group of communicator handles.
pub struct ThreadWorld;

impl ThreadWorld {
    /// Create `size` connected rank handles.
    ///
    /// The handle at index `r` reports `rank() == r`. Handles are meant to
    /// be moved into worker threads; they are `Send` but deliberately not
    /// `Clone` — exactly one thread of control per rank.
    ///
    /// # Panics
    /// Panics if `size` is zero.
    pub fn create(size: usize) -> Vec<ThreadComm> {
        assert!(size > 0, "process group must have at least one rank");

        let barrier = Arc::new(Barrier::new(size));

        // tx[s][d] sends from rank s to rank d; rx[d][s] is the matching
        // receiving end. No channel from a rank to itself.
        let mut p2p_tx: Vec<Vec<Option<Sender<Vec<f64>>>>> = empty_grid(size);
        let mut p2p_rx: Vec<Vec<Option<Receiver<Vec<f64>>>>> = empty_grid(size);
        let mut bcast_tx: Vec<Vec<Option<Sender<Vec<f64>>>>> = empty_grid(size);
        let mut bcast_rx: Vec<Vec<Option<Receiver<Vec<f64>>>>> = empty_grid(size);

        for src in 0..size {
            for dest in 0..size {
                if src == dest {
                    continue;
                }
                let (tx, rx) = mpsc::channel();
                p2p_tx[src][dest] = Some(tx);
                p2p_rx[dest][src] = Some(rx);

                let (tx, rx) = mpsc::channel();
                bcast_tx[src][dest] = Some(tx);
                bcast_rx[dest][src] = Some(rx);
            }
        }

        log::debug!("created in-process world of {} ranks", size);

        let mut comms = Vec::with_capacity(size);
        for (rank, (((p2p_tx, p2p_rx), bcast_tx), bcast_rx)) in p2p_tx
            .into_iter()
            .zip(p2p_rx)
            .zip(bcast_tx)
            .zip(bcast_rx)
            .enumerate()
        {
            comms.push(ThreadComm {
                rank,
                size,
                barrier: Arc::clone(&barrier),
                p2p_tx,
                p2p_rx,
                bcast_tx,
                bcast_rx,
            });
        }
        comms
    }
}

fn empty_grid<T>(size: usize) -> Vec<Vec<Option<T>>> {
    (0..size)
        .map(|_| (0..size).map(|_| None).collect())
        .collect()
}

/// One rank's endpoint into an in-process group.
pub struct ThreadComm {
    rank: usize,
    size: usize,
    barrier: Arc<Barrier>,
    /// Outgoing point-to-point channels, indexed by destination rank.
    p2p_tx: Vec<Option<Sender<Vec<f64>>>>,
    /// Incoming point-to-point channels, indexed by source rank.
    p2p_rx: Vec<Option<Receiver<Vec<f64>>>>,
    /// Outgoing broadcast channels, indexed by destination rank.
    bcast_tx: Vec<Option<Sender<Vec<f64>>>>,
    /// Incoming broadcast channels, indexed by originating rank.
    bcast_rx: Vec<Option<Receiver<Vec<f64>>>>,
}

impl ThreadComm {
    fn check_peer(&self, peer: usize) -> Result<(), CommError> {
        if peer >= self.size || peer == self.rank {
            return Err(CommError::InvalidRank(peer));
        }
        Ok(())
    }
}

impl Communicator for ThreadComm {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn broadcast(&self, buf: &mut [f64], root: usize) -> Result<(), CommError> {
        if root >= self.size {
            return Err(CommError::InvalidRank(root));
        }
        if self.rank == root {
            for dest in 0..self.size {
                if dest == self.rank {
                    continue;
                }
                let tx = self.bcast_tx[dest]
                    .as_ref()
                    .ok_or(CommError::InvalidRank(dest))?;
                tx.send(buf.to_vec())
                    .map_err(|_| CommError::Disconnected(dest))?;
            }
        } else {
            let rx = self.bcast_rx[root]
                .as_ref()
                .ok_or(CommError::InvalidRank(root))?;
            let msg = rx.recv().map_err(|_| CommError::Disconnected(root))?;
            if msg.len() != buf.len() {
                return Err(CommError::SizeMismatch {
                    expected: buf.len(),
                    actual: msg.len(),
                });
            }
            buf.copy_from_slice(&msg);
        }
        Ok(())
    }

    fn barrier(&self) -> Result<(), CommError> {
        // A failing rank bails out of the step before reaching its barrier,
        // so its peers are still blocked on the broadcast receive (where the
        // hangup is detected) and never strand a partial barrier.
        self.barrier.wait();
        Ok(())
    }

    fn send(&self, buf: &[f64], dest: usize) -> Result<(), CommError> {
        self.check_peer(dest)?;
        let tx = self.p2p_tx[dest]
            .as_ref()
            .ok_or(CommError::InvalidRank(dest))?;
        tx.send(buf.to_vec())
            .map_err(|_| CommError::Disconnected(dest))
    }

    fn recv(&self, buf: &mut [f64], source: usize) -> Result<(), CommError> {
        self.check_peer(source)?;
        let rx = self.p2p_rx[source]
            .as_ref()
            .ok_or(CommError::InvalidRank(source))?;
        let msg = rx.recv().map_err(|_| CommError::Disconnected(source))?;
        if msg.len() != buf.len() {
            return Err(CommError::SizeMismatch {
                expected: buf.len(),
                actual: msg.len(),
            });
        }
        buf.copy_from_slice(&msg);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    fn spawn_ranks<F, T>(size: usize, f: F) -> Vec<T>
    where
        F: Fn(ThreadComm) -> T + Send + Sync + 'static + Clone,
        T: Send + 'static,
    {
        let handles: Vec<_> = ThreadWorld::create(size)
            .into_iter()
            .map(|comm| {
                let f = f.clone();
                thread::spawn(move || f(comm))
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    }

    #[test]
    fn test_broadcast_delivers_root_buffer() {
        let results = spawn_ranks(4, |comm| {
            let mut buf = if comm.rank() == 2 {
                vec![1.0, 2.0, 3.0]
            } else {
                vec![0.0; 3]
            };
            comm.broadcast(&mut buf, 2).unwrap();
            buf
        });
        for buf in results {
            assert_eq!(buf, vec![1.0, 2.0, 3.0]);
        }
    }

    #[test]
    fn test_barrier_releases_only_when_all_arrive() {
        let arrived = Arc::new(AtomicUsize::new(0));
        let handles: Vec<_> = ThreadWorld::create(3)
            .into_iter()
            .map(|comm| {
                let arrived = Arc::clone(&arrived);
                thread::spawn(move || {
                    // Stagger arrivals so a premature release would be seen.
                    thread::sleep(std::time::Duration::from_millis(
                        10 * comm.rank() as u64,
                    ));
                    arrived.fetch_add(1, Ordering::SeqCst);
                    comm.barrier().unwrap();
                    arrived.load(Ordering::SeqCst)
                })
            })
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), 3);
        }
    }

    #[test]
    fn test_point_to_point_preserves_sender_order() {
        let results = spawn_ranks(2, |comm| {
            if comm.rank() == 0 {
                for v in 0..10 {
                    comm.send(&[v as f64], 1).unwrap();
                }
                Vec::new()
            } else {
                let mut seen = Vec::new();
                let mut buf = [0.0];
                for _ in 0..10 {
                    comm.recv(&mut buf, 0).unwrap();
                    seen.push(buf[0]);
                }
                seen
            }
        });
        assert_eq!(results[1], (0..10).map(f64::from).collect::<Vec<_>>());
    }

    #[test]
    fn test_recv_size_mismatch_is_an_error() {
        let results = spawn_ranks(2, |comm| {
            if comm.rank() == 0 {
                comm.send(&[1.0, 2.0, 3.0], 1).unwrap();
                true
            } else {
                let mut buf = [0.0; 2];
                matches!(
                    comm.recv(&mut buf, 0),
                    Err(CommError::SizeMismatch {
                        expected: 2,
                        actual: 3
                    })
                )
            }
        });
        assert!(results[1]);
    }

    #[test]
    fn test_dropped_peer_surfaces_as_disconnected() {
        let results = spawn_ranks(2, |comm| {
            if comm.rank() == 0 {
                // Exit without sending; rank 1's receive must not hang.
                true
            } else {
                let mut buf = [0.0];
                matches!(comm.recv(&mut buf, 0), Err(CommError::Disconnected(0)))
            }
        });
        assert!(results[1]);
    }

    #[test]
    fn test_invalid_peer_rejected() {
        let comms = ThreadWorld::create(2);
        assert!(matches!(
            comms[0].send(&[0.0], 5),
            Err(CommError::InvalidRank(5))
        ));
        assert!(matches!(
            comms[0].send(&[0.0], 0),
            Err(CommError::InvalidRank(0))
        ));
    }
}
