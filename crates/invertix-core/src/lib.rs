//! # Invertix Core
//!
//! Distributed dense-matrix inversion by Gauss-Jordan elimination. A group
//! of P cooperating ranks jointly inverts an N×N matrix of `f64`: rows are
//! partitioned cyclically so every elimination step keeps all ranks equally
//! busy, each step's pivot row is broadcast by its single owner, and a
//! barrier gates the advance to the next column.
//!
//! All cross-rank coordination goes through the
//! [`Communicator`](invertix_comm::Communicator) trait from `invertix-comm`;
//! within a rank there is exactly one thread of control and no shared state.
//!
//! ## Modules
//!
//! - [`distribution`] — Cyclic row-ownership mapping (pure functions).
//! - [`context`] — Per-rank identity passed explicitly into the kernel.
//! - [`elimination`] — The forward/backward elimination coordinator.
//! - [`assembly`] — Input scatter and result gather on the coordinating rank.
//! - [`engine`] — One-call entry point tying the stages together.
//! - [`format`] — Plain-text matrix file format.

pub mod assembly;
pub mod context;
pub mod distribution;
pub mod elimination;
pub mod engine;
pub mod format;

pub use context::ProcessContext;
pub use elimination::{EliminationError, LocalRows};
pub use engine::InversionEngine;
