#![forbid(unsafe_code)]

//! # Aulos Codec
//!
//! Decode and encode audio containers through external codec engines,
//! exposed as a uniform streaming sample-reader/writer pair.
//!
//! The engines own their I/O: the decode engine (symphonia) pulls bytes
//! through the `aulos-io` stream bridge, the encode engine (hound) pushes
//! bytes through it. This crate negotiates formats with the engines and runs
//! the chunked transfer loops; it implements no bitstream itself.
//!
//! ## Components
//!
//! - [`caps`]: which extensions are decodable, which container types are
//!   encodable, and the format-registry entry point.
//! - [`format`]: sample format descriptors, native/source vs. the fixed
//!   client format (32-bit float, non-interleaved, native-endian).
//! - [`reader`]: [`CodecReader`], the pull side. Random access in the
//!   decoded-frame domain, bounded chunking, zero-fill past end of stream.
//! - [`writer`]: [`CodecWriter`], the push side. Fixed RIFF/WAVE 16-bit
//!   destination, sticky failure.
//! - [`traits`]: the streaming contracts collaborators consume.
//!
//! ## Concurrency model
//!
//! Single-threaded, synchronous, blocking. Every session is owned by exactly
//! one reader or writer; re-entrant use from multiple threads must be
//! serialized by the caller.

mod buffers;
pub mod caps;
pub mod error;
pub mod format;
pub mod reader;
pub mod traits;
pub mod writer;

pub use caps::{decodable_extensions, writable_container_types, CodecFormat, FourCc};
pub use error::{CodecError, CodecResult};
pub use format::{Endianness, FormatFlags, SampleFormat};
pub use reader::CodecReader;
pub use traits::{SampleReader, SampleWriter};
pub use writer::CodecWriter;
