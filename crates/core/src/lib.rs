//! Face recognition pipeline: per-frame filtering stages feeding an
//! embedding comparison against a bounded cache of recently seen faces.
//!
//! The stage chain is held as an immutable configuration snapshot and can be
//! replaced at runtime without disturbing a frame already in flight.

pub mod pipeline;
pub mod recognition;
pub mod shared;
