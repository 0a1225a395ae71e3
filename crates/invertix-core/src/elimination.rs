//! The elimination coordinator: forward and backward sweeps over the
//! augmented matrix.
//!
//! Each rank holds its owned rows as an augmented block — the coefficient
//! rows paired with the matching slice of the identity matrix — and both
//! halves receive identical row operations, so that when the coefficient
//! half has been reduced to identity rows the identity half holds the
//! corresponding rows of the inverse.
//!
//! One elimination step, identical in shape for both sweeps:
//!
//! 1. The owner of the pivot row normalizes it (forward sweep only; after
//!    the forward sweep every diagonal entry is already 1).
//! 2. The owner broadcasts the pivot row, both halves packed into a single
//!    buffer, so each column costs exactly one broadcast per phase.
//! 3. Every rank eliminates the pivot column from its not-yet-finalized
//!    local rows.
//! 4. All ranks synchronize on a barrier before the next column, because
//!    the next column's broadcast may originate from a different rank and
//!    must not read partially updated state.
//!
//! The pivot is whatever sits on the diagonal of the owner's current row.
//! There is no pivot search and no row interchange index: a zero (or
//! sub-tolerance) pivot aborts the whole run as singular, even for
//! matrices that a pivoting method could invert.

use invertix_comm::{CommError, Communicator};
use ndarray::{Array2, ArrayView1};
use thiserror::Error;

use crate::context::ProcessContext;
use crate::distribution::{block_size, global_row, local_slot, owner};

/// Errors from the distributed elimination kernel.
///
/// Every variant is fatal: a failure at column `c` invalidates all
/// partially updated state, so there is no recovery and no partial result.
#[derive(Debug, Error)]
pub enum EliminationError {
    #[error("matrix is singular at column {column}: pivot {pivot:.3e} is within tolerance of zero")]
    SingularMatrix { column: usize, pivot: f64 },

    #[error("communication failure: {0}")]
    Comm(#[from] CommError),

    #[error("local block is {rows}x{cols} but rank {rank} of {size} owns {expected} rows of an order-{cols} matrix")]
    ShapeMismatch {
        rows: usize,
        cols: usize,
        rank: usize,
        size: usize,
        expected: usize,
    },

    #[error("invalid input matrix: {0}")]
    InvalidInput(String),
}

/// A rank's augmented block: its owned coefficient rows and the paired
/// identity-half rows, each of shape `(block_size, n)`, indexed by local
/// slot. Mutated in place through both sweeps and consumed once by the
/// gather.
#[derive(Debug, Clone)]
pub struct LocalRows {
    pub(crate) coeff: Array2<f64>,
    pub(crate) inverse: Array2<f64>,
}

impl LocalRows {
    /// Build the augmented block from the coefficient rows this rank
    /// received at scatter time. The identity half is seeded with a 1 at
    /// each row's global column.
    pub fn new(ctx: &ProcessContext, coeff: Array2<f64>) -> Result<Self, EliminationError> {
        let n = coeff.ncols();
        let expected = block_size(ctx.rank, ctx.size, n);
        if coeff.nrows() != expected {
            return Err(EliminationError::ShapeMismatch {
                rows: coeff.nrows(),
                cols: n,
                rank: ctx.rank,
                size: ctx.size,
                expected,
            });
        }

        let mut inverse = Array2::zeros((expected, n));
        for slot in 0..expected {
            inverse[[slot, global_row(ctx.rank, slot, ctx.size)]] = 1.0;
        }
        Ok(Self { coeff, inverse })
    }

    /// Matrix order N.
    pub fn order(&self) -> usize {
        self.coeff.ncols()
    }

    /// Number of local rows (this rank's block size).
    pub fn num_rows(&self) -> usize {
        self.coeff.nrows()
    }

    /// Consume the block, yielding the identity-half rows. Only meaningful
    /// after both sweeps have completed.
    pub fn into_inverse(self) -> Array2<f64> {
        self.inverse
    }
}

/// Sweep direction; the two phases of the algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sweep {
    /// Columns ascending; eliminates below the pivot, producing an
    /// upper-triangular coefficient matrix.
    Forward,
    /// Columns descending; eliminates above the pivot, producing the fully
    /// diagonal (identity) coefficient matrix.
    Backward,
}

/// The transient payload of one elimination step: the normalized pivot row
/// and its paired identity-half row, viewed inside the single packed
/// broadcast buffer.
struct PivotRow<'a> {
    coeff: ArrayView1<'a, f64>,
    inverse: ArrayView1<'a, f64>,
}

impl<'a> PivotRow<'a> {
    fn unpack(buf: &'a [f64], n: usize) -> Self {
        let (coeff, inverse) = buf.split_at(n);
        Self {
            coeff: ArrayView1::from(coeff),
            inverse: ArrayView1::from(inverse),
        }
    }
}

/// Per-rank state machine driving the two sweeps.
///
/// Holds no row data itself; it mutates a [`LocalRows`] block in place,
/// issuing the collective operations in the globally agreed column order.
pub struct Eliminator<'a, C: Communicator> {
    ctx: ProcessContext,
    comm: &'a C,
    tolerance: f64,
}

impl<'a, C: Communicator> Eliminator<'a, C> {
    pub fn new(ctx: ProcessContext, comm: &'a C, tolerance: f64) -> Self {
        Self {
            ctx,
            comm,
            tolerance,
        }
    }

    /// Run both sweeps to completion. On success the coefficient half of
    /// `rows` is a slice of the identity matrix and the identity half holds
    /// this rank's rows of the inverse.
    pub fn run(&self, rows: &mut LocalRows) -> Result<(), EliminationError> {
        let n = rows.order();

        // `finalized` counts this rank's own retired rows. During the
        // forward sweep the active rows are `finalized..`, during the
        // backward sweep the count runs down from the top and the active
        // rows are `..finalized`.
        let mut finalized = 0;
        for column in 0..n {
            self.run_step(column, rows, Sweep::Forward, &mut finalized)?;
        }
        log::debug!("rank {}: forward sweep complete", self.ctx.rank);

        let mut finalized = rows.num_rows();
        for column in (0..n).rev() {
            self.run_step(column, rows, Sweep::Backward, &mut finalized)?;
        }
        log::debug!("rank {}: backward sweep complete", self.ctx.rank);

        Ok(())
    }

    /// One elimination step: normalize-and-broadcast on the owning rank,
    /// receive elsewhere, eliminate locally, barrier.
    fn run_step(
        &self,
        column: usize,
        rows: &mut LocalRows,
        sweep: Sweep,
        finalized: &mut usize,
    ) -> Result<(), EliminationError> {
        let n = rows.order();
        let root = owner(column, self.ctx.size);

        let mut buf = vec![0.0; 2 * n];
        if self.ctx.rank == root {
            let slot = local_slot(column, self.ctx.size);
            if sweep == Sweep::Forward {
                let pivot = rows.coeff[[slot, column]];
                if pivot.abs() <= self.tolerance {
                    return Err(EliminationError::SingularMatrix { column, pivot });
                }
                rows.coeff.row_mut(slot).mapv_inplace(|x| x / pivot);
                rows.inverse.row_mut(slot).mapv_inplace(|x| x / pivot);
            }
            buf[..n]
                .copy_from_slice(rows.coeff.row(slot).to_slice().expect("row is contiguous"));
            buf[n..]
                .copy_from_slice(rows.inverse.row(slot).to_slice().expect("row is contiguous"));
            self.comm.broadcast(&mut buf, root)?;

            // The pivot row is finalized for this phase; exclude it from
            // the updates below and from every later step of the phase.
            match sweep {
                Sweep::Forward => *finalized += 1,
                Sweep::Backward => *finalized -= 1,
            }
        } else {
            self.comm.broadcast(&mut buf, root)?;
        }

        let pivot = PivotRow::unpack(&buf, n);
        let active = match sweep {
            Sweep::Forward => *finalized..rows.num_rows(),
            Sweep::Backward => 0..*finalized,
        };
        for i in active {
            let factor = rows.coeff[[i, column]];
            rows.coeff.row_mut(i).scaled_add(-factor, &pivot.coeff);
            rows.inverse.row_mut(i).scaled_add(-factor, &pivot.inverse);
        }

        self.comm.barrier()?;
        Ok(())
    }
}
