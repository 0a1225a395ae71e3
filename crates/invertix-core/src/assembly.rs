//! Input scatter and result gather on the coordinating rank.
//!
//! Scatter walks the global rows in order, keeping the coordinator's own
//! rows and sending each remaining row to its owner point-to-point. Because
//! delivery is FIFO per sender, a rank's rows arrive already in ascending
//! slot order. Gather is the inverse: each rank ships its finished
//! identity-half block back in one transfer, and the coordinator places
//! rank `r`'s slot `s` at global row `r + s·P`.

use invertix_comm::Communicator;
use ndarray::{Array2, ArrayView1};

use crate::context::{ProcessContext, COORDINATOR};
use crate::distribution::{block_size, global_row, local_slot, owner};
use crate::elimination::{EliminationError, LocalRows};

/// Distribute the rows of `input` to their owning ranks. Only the
/// coordinator supplies `input`; every rank returns its own coefficient
/// block, shape `(block_size, n)`.
pub fn scatter<C: Communicator>(
    ctx: &ProcessContext,
    comm: &C,
    n: usize,
    input: Option<&Array2<f64>>,
) -> Result<Array2<f64>, EliminationError> {
    let mine = block_size(ctx.rank, ctx.size, n);
    let mut local = Array2::zeros((mine, n));

    if ctx.is_coordinator() {
        let full = input.ok_or_else(|| {
            EliminationError::InvalidInput("the coordinating rank must supply the matrix".into())
        })?;
        if full.nrows() != n || full.ncols() != n {
            return Err(EliminationError::InvalidInput(format!(
                "matrix is {}x{}, expected {}x{}",
                full.nrows(),
                full.ncols(),
                n,
                n
            )));
        }
        for row in 0..n {
            let dest = owner(row, ctx.size);
            if dest == ctx.rank {
                local.row_mut(local_slot(row, ctx.size)).assign(&full.row(row));
            } else {
                comm.send(&full.row(row).to_vec(), dest)?;
            }
        }
        log::debug!("scattered {} rows across {} ranks", n, ctx.size);
    } else {
        let mut row_buf = vec![0.0; n];
        for slot in 0..mine {
            comm.recv(&mut row_buf, COORDINATOR)?;
            local
                .row_mut(slot)
                .assign(&ArrayView1::from(&row_buf[..]));
        }
    }

    Ok(local)
}

/// Collect every rank's finished rows into the global inverse, in original
/// row order. Consumes the local block; returns the assembled matrix on
/// the coordinator and `None` elsewhere. One transfer per non-coordinating
/// rank; no partial or streaming output.
pub fn gather<C: Communicator>(
    ctx: &ProcessContext,
    comm: &C,
    rows: LocalRows,
) -> Result<Option<Array2<f64>>, EliminationError> {
    let n = rows.order();
    let mine = rows.num_rows();
    let inverse = rows.into_inverse();

    if !ctx.is_coordinator() {
        let buf: Vec<f64> = inverse.iter().copied().collect();
        comm.send(&buf, COORDINATOR)?;
        return Ok(None);
    }

    let mut out = Array2::zeros((n, n));
    for slot in 0..mine {
        out.row_mut(global_row(ctx.rank, slot, ctx.size))
            .assign(&inverse.row(slot));
    }
    for rank in 1..ctx.size {
        let theirs = block_size(rank, ctx.size, n);
        let mut buf = vec![0.0; theirs * n];
        comm.recv(&mut buf, rank)?;
        for slot in 0..theirs {
            out.row_mut(global_row(rank, slot, ctx.size))
                .assign(&ArrayView1::from(&buf[slot * n..(slot + 1) * n]));
        }
    }
    log::debug!("assembled {}x{} inverse from {} ranks", n, n, ctx.size);
    Ok(Some(out))
}
