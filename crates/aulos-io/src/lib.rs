#![forbid(unsafe_code)]

//! # Aulos I/O Bridge
//!
//! Bridge between seekable byte streams and codec engines that expect to own
//! their I/O. The engine side of the contract is a small closed set of
//! capability traits rather than raw callbacks:
//!
//! - [`InputBridge`]: read-at-offset + size, for decode sessions.
//! - [`OutputBridge`]: write-at-offset + size + resize, for encode sessions.
//!
//! Two polymorphic variants implement them over the std stream traits:
//! [`StreamInput`] (any `Read + Seek`) and [`StreamOutput`] (any
//! `Write + Seek`).
//!
//! On top of the traits sit the engine-facing adapters: [`BridgeSource`]
//! presents an `InputBridge` to the decode engine as a
//! `symphonia::core::io::MediaSource`, and [`BridgeSink`] presents an
//! `OutputBridge` to the encode engine as a plain `Write + Seek`.
//!
//! ## Offset contract (normative)
//!
//! Offsets are absolute byte positions in the logical file, not deltas. The
//! engine does not guarantee sequential access, so the bridge repositions the
//! underlying stream before every operation. A reposition is elided when the
//! cached stream position already matches the requested offset.
//!
//! ## Size contract (normative)
//!
//! For read sessions, size is the input stream's total length. For write
//! sessions, size is a running bytes-written counter: the authoritative
//! value the engine is told, not the true sink length. `set_size` only ever
//! grows: a larger target appends zero bytes, a smaller one is a no-op.

pub mod input;
pub mod output;

pub use input::{BridgeSource, InputBridge, StreamInput};
pub use output::{BridgeSink, OutputBridge, StreamOutput};
