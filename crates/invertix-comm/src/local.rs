//! Degenerate single-rank transport.

use crate::communicator::{CommError, Communicator};

/// A process group of one.
///
/// Every collective completes immediately and point-to-point messaging has
/// no valid peer. Useful both as the `P = 1` execution path and as the
/// simplest communicator for kernel unit tests.
#[derive(Debug, Default)]
pub struct LocalComm;

impl LocalComm {
    pub fn new() -> Self {
        Self
    }
}

impl Communicator for LocalComm {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn broadcast(&self, _buf: &mut [f64], root: usize) -> Result<(), CommError> {
        if root != 0 {
            return Err(CommError::InvalidRank(root));
        }
        Ok(())
    }

    fn barrier(&self) -> Result<(), CommError> {
        Ok(())
    }

    fn send(&self, _buf: &[f64], dest: usize) -> Result<(), CommError> {
        Err(CommError::InvalidRank(dest))
    }

    fn recv(&self, _buf: &mut [f64], source: usize) -> Result<(), CommError> {
        Err(CommError::InvalidRank(source))
    }
}
