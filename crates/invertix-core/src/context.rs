//! Per-rank identity, passed explicitly rather than read from globals.

use invertix_comm::Communicator;

/// Rank 0 coordinates input scatter and result gather.
pub const COORDINATOR: usize = 0;

/// The identity a rank carries through a run: its stable rank in
/// `[0, size)` and the group size. Fixed for the run's lifetime; this is
/// the only identity information the kernel requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessContext {
    pub rank: usize,
    pub size: usize,
}

impl ProcessContext {
    /// # Panics
    /// Panics if `rank` is outside the group or the group is empty.
    pub fn new(rank: usize, size: usize) -> Self {
        assert!(size > 0, "process group must have at least one rank");
        assert!(rank < size, "rank {} outside group of size {}", rank, size);
        Self { rank, size }
    }

    /// Derive the context from a communicator handle.
    pub fn from_comm<C: Communicator>(comm: &C) -> Self {
        Self::new(comm.rank(), comm.size())
    }

    /// Whether this rank coordinates scatter and gather.
    pub fn is_coordinator(&self) -> bool {
        self.rank == COORDINATOR
    }
}
