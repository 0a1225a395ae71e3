//! Inversion runner: spawns the rank threads and drives the engine.

use std::path::Path;
use std::thread;
use std::time::Instant;

use anyhow::{Context, Result};
use ndarray::Array2;

use invertix_comm::{Communicator, LocalComm, ThreadWorld};
use invertix_core::elimination::EliminationError;
use invertix_core::{format, InversionEngine};

/// Read a matrix file and invert it with the given worker count.
pub fn invert_file(input: &Path, workers: usize, tolerance: f64) -> Result<Array2<f64>> {
    let matrix = format::read_matrix(input)
        .with_context(|| format!("reading matrix from {}", input.display()))?;
    let n = matrix.nrows();
    println!("Matrix: {} (order {})", input.display(), n);

    // More ranks than rows just leaves the extra ranks idle; cap them.
    let workers = workers.clamp(1, n.max(1));
    println!("Workers: {}", workers);

    let started = Instant::now();
    let inverse = invert_matrix(&matrix, workers, tolerance)?;
    println!("Inverted in {:.2?}", started.elapsed());
    Ok(inverse)
}

/// Invert an in-memory matrix across `workers` in-process ranks.
pub fn invert_matrix(
    matrix: &Array2<f64>,
    workers: usize,
    tolerance: f64,
) -> Result<Array2<f64>> {
    let engine = InversionEngine { tolerance };

    if workers == 1 {
        let inverse = engine
            .invert(&LocalComm::new(), Some(matrix))?
            .expect("single rank is the coordinator");
        return Ok(inverse);
    }

    let mut handles = Vec::with_capacity(workers);
    for comm in ThreadWorld::create(workers) {
        let rank = comm.rank();
        let input = (rank == 0).then(|| matrix.clone());
        let handle = thread::Builder::new()
            .name(format!("rank-{rank}"))
            .spawn(move || engine.invert(&comm, input.as_ref()))
            .with_context(|| format!("spawning rank {rank}"))?;
        handles.push(handle);
    }

    let mut assembled = None;
    let mut failure: Option<EliminationError> = None;
    for (rank, handle) in handles.into_iter().enumerate() {
        match handle.join() {
            Ok(Ok(result)) => {
                if let Some(m) = result {
                    assembled = Some(m);
                }
            }
            Ok(Err(e)) => {
                // A rank that dies drops its channels and its peers then
                // report lost contact; keep the root cause, not the echoes.
                let is_echo = matches!(e, EliminationError::Comm(_));
                log::debug!("rank {rank} failed: {e}");
                match &failure {
                    None => failure = Some(e),
                    Some(EliminationError::Comm(_)) if !is_echo => failure = Some(e),
                    _ => {}
                }
            }
            Err(_) => anyhow::bail!("worker rank {rank} panicked"),
        }
    }

    if let Some(e) = failure {
        return Err(e.into());
    }
    assembled.context("coordinating rank produced no result")
}

/// Write the inverse to its output file.
pub fn write_output(path: &Path, inverse: &Array2<f64>) -> Result<()> {
    format::write_matrix(path, inverse)
        .with_context(|| format!("writing inverse to {}", path.display()))?;
    println!("Inverse written to: {}", path.display());
    Ok(())
}
