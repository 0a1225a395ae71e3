//! Cyclic row distribution across the process group.
//!
//! Global row `i` belongs to rank `i mod P` and sits at local slot
//! `i div P`, so rank `r` owns rows `r, r + P, r + 2P, …` in ascending
//! order:
//!
//! ```text
//! global row | owner rank
//! -----------+-----------
//!     0      |     0
//!    ...     |    ...
//!   P - 1    |   P - 1
//!     P      |     0
//!   P + 1    |     1
//! ```
//!
//! Because consecutive pivot columns belong to consecutive ranks, every
//! rank retires one of its local rows roughly every P elimination steps and
//! no rank runs out of active rows before the others.
//!
//! All four maps are pure and total; ownership is decided once at scatter
//! time and never changes during a run.

/// Rank owning global row `row`.
pub fn owner(row: usize, size: usize) -> usize {
    row % size
}

/// Local slot at which the owning rank stores global row `row`.
///
/// Slots are dense and ascend with the global row id: slot 0 holds the
/// smallest row id the rank owns.
pub fn local_slot(row: usize, size: usize) -> usize {
    row / size
}

/// Inverse of the ownership mapping: the global row stored by `rank` at
/// `slot`.
pub fn global_row(rank: usize, slot: usize, size: usize) -> usize {
    rank + slot * size
}

/// Number of rows of an order-`n` matrix owned by `rank`: the count of
/// `rank, rank + size, rank + 2·size, …` below `n`.
pub fn block_size(rank: usize, size: usize, n: usize) -> usize {
    (n + size - rank - 1) / size
}
