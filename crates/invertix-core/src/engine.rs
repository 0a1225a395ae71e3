//! One-call entry point: scatter, eliminate, gather.

use invertix_comm::Communicator;
use ndarray::Array2;

use crate::assembly;
use crate::context::ProcessContext;
use crate::elimination::{EliminationError, Eliminator, LocalRows};

/// Pivots with absolute value at or below this are treated as zero.
pub const DEFAULT_TOLERANCE: f64 = 1e-12;

/// Configuration for a distributed inversion run.
///
/// Every rank of the group calls [`InversionEngine::invert`] with its own
/// communicator handle; the call is collective and all ranks must use the
/// same engine settings. The coordinating rank passes the input matrix and
/// receives the assembled inverse; every other rank passes `None` and
/// receives `None`.
#[derive(Debug, Clone, Copy)]
pub struct InversionEngine {
    /// Singularity threshold for pivot values.
    pub tolerance: f64,
}

impl Default for InversionEngine {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

impl InversionEngine {
    /// Invert `input` across the process group behind `comm`.
    ///
    /// The matrix order is broadcast from the coordinator first, so only
    /// the coordinating rank needs to know it up front. Any failure —
    /// singular pivot, shape error, lost peer — aborts the whole run with
    /// no partial result.
    pub fn invert<C: Communicator>(
        &self,
        comm: &C,
        input: Option<&Array2<f64>>,
    ) -> Result<Option<Array2<f64>>, EliminationError> {
        let ctx = ProcessContext::from_comm(comm);

        let n = match (ctx.is_coordinator(), input) {
            (true, Some(m)) => {
                if m.nrows() != m.ncols() {
                    return Err(EliminationError::InvalidInput(format!(
                        "matrix is {}x{}, expected square",
                        m.nrows(),
                        m.ncols()
                    )));
                }
                m.nrows()
            }
            (true, None) => {
                return Err(EliminationError::InvalidInput(
                    "the coordinating rank must supply the matrix".into(),
                ))
            }
            (false, _) => 0,
        };

        let mut order_buf = [n as f64];
        comm.broadcast(&mut order_buf, crate::context::COORDINATOR)?;
        let n = order_buf[0] as usize;
        log::debug!("rank {}/{}: inverting order-{} matrix", ctx.rank, ctx.size, n);

        let coeff = assembly::scatter(&ctx, comm, n, input)?;
        let mut rows = LocalRows::new(&ctx, coeff)?;
        Eliminator::new(ctx, comm, self.tolerance).run(&mut rows)?;
        assembly::gather(&ctx, comm, rows)
    }
}
