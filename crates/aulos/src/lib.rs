#![forbid(unsafe_code)]

//! # Aulos
//!
//! Facade crate providing a unified API for codec-engine-backed audio
//! reading and writing.
//!
//! ## Quick start
//!
//! ```ignore
//! use std::fs::File;
//! use aulos::prelude::*;
//!
//! let mut reader = CodecReader::open(File::open("song.flac")?)?;
//!
//! let frames = 1024.min(reader.total_frames() as usize);
//! let mut left = vec![0.0f32; frames];
//! let mut right = vec![0.0f32; frames];
//! let mut dest = [Some(left.as_mut_slice()), Some(right.as_mut_slice())];
//! reader.read_samples(&mut dest, 0, 0, frames);
//! ```

// ── Re-export sub-crates ────────────────────────────────────────────────

pub mod codec {
    pub use aulos_codec::*;
}

pub mod io {
    pub use aulos_io::*;
}

/// The types most callers need.
pub mod prelude {
    pub use aulos_codec::{
        decodable_extensions, writable_container_types, CodecError, CodecFormat, CodecReader,
        CodecResult, CodecWriter, SampleFormat, SampleReader, SampleWriter,
    };
}
