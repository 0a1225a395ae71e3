//! # Invertix Comm
//!
//! Message-passing substrate for the Invertix distributed inversion kernel.
//! This crate provides a [`Communicator`](communicator::Communicator) trait
//! that isolates the numerical code from the transport carrying messages
//! between ranks.
//!
//! ## Available transports
//!
//! | Transport | Type | Status |
//! |-----------|------|--------|
//! | Single rank | [`LocalComm`] | Implemented |
//! | In-process threads | [`ThreadWorld`] / [`ThreadComm`] | Implemented |
//!
//! The kernel only ever uses three primitives: broadcast-from-owner,
//! barrier, and blocking point-to-point send/receive. Both transports
//! guarantee reliable, per-sender-ordered delivery; neither retries nor
//! deduplicates.

pub mod communicator;
pub mod local;
pub mod threads;

pub use communicator::{CommError, Communicator};
pub use local::LocalComm;
pub use threads::{ThreadComm, ThreadWorld};
