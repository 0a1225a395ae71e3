//! Communicator trait and transport errors.
//!
//! The [`Communicator`] trait abstracts over message transports so that the
//! elimination kernel in `invertix-core` remains transport-agnostic. Every
//! rank in a run holds exactly one communicator handle, fixed for the run's
//! lifetime, carrying its identity (`rank`) and the group size.

use thiserror::Error;

/// Errors originating from the message transport.
///
/// All of these are fatal to the run: the lock-step elimination protocol has
/// no way to make forward progress without every participant.
#[derive(Debug, Error)]
pub enum CommError {
    #[error("rank {0} is not a valid peer for this operation")]
    InvalidRank(usize),

    #[error("message size mismatch: expected {expected} values, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("lost contact with rank {0}")]
    Disconnected(usize),
}

/// Abstraction over the message-passing substrate.
///
/// The kernel uses exactly three blocking primitives: broadcast-from-owner,
/// barrier, and point-to-point send/receive. Implementations must deliver
/// messages reliably and in order per sender; the kernel performs no retry
/// and no deduplication on top.
pub trait Communicator: Send {
    /// This rank's stable identity, in `[0, size)`.
    fn rank(&self) -> usize;

    /// Number of ranks in the group.
    fn size(&self) -> usize;

    /// Collective broadcast: every rank ends up with `root`'s buffer
    /// contents. On the root, `buf` is the source; on every other rank it
    /// is overwritten in place. All ranks must call this with the same
    /// root and the same buffer length.
    fn broadcast(&self, buf: &mut [f64], root: usize) -> Result<(), CommError>;

    /// Collective barrier: blocks until every rank in the group has called
    /// it.
    fn barrier(&self) -> Result<(), CommError>;

    /// Blocking point-to-point send to `dest`.
    fn send(&self, buf: &[f64], dest: usize) -> Result<(), CommError>;

    /// Blocking point-to-point receive from `source`, filling `buf`.
    /// The incoming message must match `buf` in length exactly.
    fn recv(&self, buf: &mut [f64], source: usize) -> Result<(), CommError>;
}
