//! End-to-end distributed inversion across in-process rank threads.

use std::thread;

use approx::assert_abs_diff_eq;
use invertix_comm::{CommError, Communicator, ThreadWorld};
use invertix_core::elimination::EliminationError;
use invertix_core::InversionEngine;
use ndarray::{array, Array2};

/// Run a full inversion with `workers` rank threads, returning the result
/// observed on the coordinating rank.
fn invert_with_workers(
    matrix: &Array2<f64>,
    workers: usize,
) -> Result<Array2<f64>, EliminationError> {
    let engine = InversionEngine::default();
    let mut handles = Vec::with_capacity(workers);
    for comm in ThreadWorld::create(workers) {
        let input = (comm.rank() == 0).then(|| matrix.clone());
        handles.push(thread::spawn(move || {
            engine.invert(&comm, input.as_ref())
        }));
    }

    let mut assembled = None;
    let mut root_cause = None;
    let mut comm_failure = None;
    for handle in handles {
        match handle.join().expect("rank thread panicked") {
            Ok(Some(m)) => assembled = Some(m),
            Ok(None) => {}
            // Ranks that lose a failed peer report Disconnected; keep the
            // root cause in preference to its echoes.
            Err(e @ EliminationError::Comm(_)) => comm_failure = Some(e),
            Err(e) => root_cause = Some(e),
        }
    }
    if let Some(e) = root_cause.or(comm_failure) {
        return Err(e);
    }
    Ok(assembled.expect("coordinator produced no result"))
}

fn max_abs_diff(a: &Array2<f64>, b: &Array2<f64>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).abs())
        .fold(0.0, f64::max)
}

/// A diagonally dominant test matrix: guaranteed nonzero pivots without
/// any pivot search.
fn dominant_matrix(n: usize) -> Array2<f64> {
    Array2::from_shape_fn((n, n), |(i, j)| {
        if i == j {
            n as f64 + 1.0 + i as f64
        } else {
            1.0 / (1.0 + (i as f64 - j as f64).abs())
        }
    })
}

#[test]
fn test_product_with_inverse_is_identity_for_any_worker_count() {
    let n = 6;
    let m = dominant_matrix(n);
    for workers in 1..=n {
        let inverse = invert_with_workers(&m, workers).unwrap();
        let residual = max_abs_diff(&m.dot(&inverse), &Array2::eye(n));
        assert!(
            residual < 1e-10,
            "workers={}: ||M*R - I|| = {:.3e}",
            workers,
            residual
        );
    }
}

#[test]
fn test_result_is_invariant_to_worker_count() {
    let m = dominant_matrix(7);
    let serial = invert_with_workers(&m, 1).unwrap();
    let parallel = invert_with_workers(&m, 4).unwrap();
    assert_abs_diff_eq!(serial, parallel, epsilon = 1e-12);
}

#[test]
fn test_identity_in_identity_out_across_two_workers() {
    let identity = Array2::eye(3);
    let inverse = invert_with_workers(&identity, 2).unwrap();
    assert_eq!(inverse, identity);
}

#[test]
fn test_concrete_2x2() {
    let inverse = invert_with_workers(&array![[4.0, 7.0], [2.0, 6.0]], 1).unwrap();
    assert_abs_diff_eq!(inverse, array![[0.6, -0.7], [-0.2, 0.4]], epsilon = 1e-12);
}

#[test]
fn test_singular_matrix_fails_on_every_worker_count() {
    let singular = array![[1.0, 2.0, 3.0], [2.0, 4.0, 6.0], [1.0, 0.0, 1.0]];
    for workers in 1..=3 {
        let err = invert_with_workers(&singular, workers).unwrap_err();
        assert!(
            matches!(err, EliminationError::SingularMatrix { .. }),
            "workers={}: expected SingularMatrix, got {:?}",
            workers,
            err
        );
    }
}

#[test]
fn test_uneven_blocks_three_workers_four_rows() {
    let m = dominant_matrix(4);
    let inverse = invert_with_workers(&m, 3).unwrap();
    let residual = max_abs_diff(&m.dot(&inverse), &Array2::eye(4));
    assert!(residual < 1e-10, "||M*R - I|| = {:.3e}", residual);
}

// ── Broadcast accounting ────────────────────────────────────────────────

/// Wrapper that counts broadcast traffic without altering it.
struct CountingComm<C: Communicator> {
    inner: C,
    participated: std::cell::Cell<usize>,
    originated: std::cell::Cell<usize>,
}

impl<C: Communicator> CountingComm<C> {
    fn new(inner: C) -> Self {
        Self {
            inner,
            participated: std::cell::Cell::new(0),
            originated: std::cell::Cell::new(0),
        }
    }
}

impl<C: Communicator> Communicator for CountingComm<C> {
    fn rank(&self) -> usize {
        self.inner.rank()
    }
    fn size(&self) -> usize {
        self.inner.size()
    }
    fn broadcast(&self, buf: &mut [f64], root: usize) -> Result<(), CommError> {
        self.participated.set(self.participated.get() + 1);
        if root == self.inner.rank() {
            self.originated.set(self.originated.get() + 1);
        }
        self.inner.broadcast(buf, root)
    }
    fn barrier(&self) -> Result<(), CommError> {
        self.inner.barrier()
    }
    fn send(&self, buf: &[f64], dest: usize) -> Result<(), CommError> {
        self.inner.send(buf, dest)
    }
    fn recv(&self, buf: &mut [f64], source: usize) -> Result<(), CommError> {
        self.inner.recv(buf, source)
    }
}

#[test]
fn test_one_broadcast_per_column_per_phase() {
    // 3x3 identity over 2 workers: N forward + N backward pivot broadcasts,
    // each originated by the single rank owning that column, plus the one
    // order announcement from the coordinator.
    let n = 3;
    let workers = 2;
    let identity = Array2::<f64>::eye(n);

    let mut handles = Vec::new();
    for comm in ThreadWorld::create(workers) {
        let input = (comm.rank() == 0).then(|| identity.clone());
        handles.push(thread::spawn(move || {
            let comm = CountingComm::new(comm);
            let engine = InversionEngine::default();
            let result = engine.invert(&comm, input.as_ref()).unwrap();
            (
                comm.rank(),
                comm.participated.get(),
                comm.originated.get(),
                result,
            )
        }));
    }

    let owned_columns = |rank: usize| (0..n).filter(|c| c % workers == rank).count();
    for handle in handles {
        let (rank, participated, originated, result) = handle.join().unwrap();
        // Every rank observes all 2N pivot broadcasts and the order
        // announcement.
        assert_eq!(participated, 2 * n + 1, "rank {}", rank);
        let expected_origin = 2 * owned_columns(rank) + usize::from(rank == 0);
        assert_eq!(originated, expected_origin, "rank {}", rank);
        if rank == 0 {
            assert_eq!(result.unwrap(), identity);
        } else {
            assert!(result.is_none());
        }
    }
}
