//! Capability queries and the format-registry entry point.
//!
//! The engines declare what they can open and what they can produce at build
//! time, so both queries are reads of a static registry: infallible, and
//! empty when nothing is registered.

use std::{
    collections::HashMap,
    fmt,
    io::{Read, Seek, Write},
};

use crate::{
    error::CodecResult,
    reader::CodecReader,
    writer::CodecWriter,
};

/// Container extensions the decode engine can open.
const DECODABLE: &[&str] = &[
    "aac", "adts", "caf", "flac", "m4a", "mka", "mkv", "mp1", "mp2", "mp3", "mp4", "oga", "ogg",
    "wav", "webm",
];

/// Container types the encode engine can produce.
const ENCODABLE: &[FourCc] = &[FourCc(*b"WAVE")];

/// Four-character container type code.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct FourCc(pub [u8; 4]);

impl fmt::Display for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            write!(f, "{}", b as char)?;
        }
        Ok(())
    }
}

impl fmt::Debug for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FourCc({self})")
    }
}

/// Extensions the adapter can decode, each prefixed with the separator
/// (".wav"). Empty when no container reader is registered.
pub fn decodable_extensions() -> Vec<String> {
    dotted(DECODABLE)
}

/// Container types the adapter can encode, in registry order. Empty when no
/// container writer is registered.
pub fn writable_container_types() -> Vec<FourCc> {
    ENCODABLE.to_vec()
}

fn dotted(registry: &[&str]) -> Vec<String> {
    registry.iter().map(|ext| format!(".{ext}")).collect()
}

/// Format-registry entry for the adapter.
///
/// A registry collaborator uses this to route file extensions here and to
/// construct sessions without naming the engine types.
#[derive(Debug, Default)]
pub struct CodecFormat;

impl CodecFormat {
    pub fn new() -> Self {
        Self
    }

    pub fn name(&self) -> &'static str {
        "codec engine supported file"
    }

    pub fn extensions(&self) -> Vec<String> {
        decodable_extensions()
    }

    pub fn writable_types(&self) -> Vec<FourCc> {
        writable_container_types()
    }

    /// Empty means unconstrained: the engines accept any rate.
    pub fn possible_sample_rates(&self) -> &'static [u32] {
        &[]
    }

    /// Empty means unconstrained at this surface; see the writer for the
    /// fixed destination depth.
    pub fn possible_bit_depths(&self) -> &'static [u32] {
        &[]
    }

    pub fn can_do_mono(&self) -> bool {
        true
    }

    pub fn can_do_stereo(&self) -> bool {
        true
    }

    /// Open a decode session over a readable, seekable stream.
    pub fn reader_for<R>(&self, source: R) -> CodecResult<CodecReader>
    where
        R: Read + Seek + Send + Sync + 'static,
    {
        CodecReader::open(source)
    }

    /// Open an encode session over a writable, seekable sink.
    pub fn writer_for<W>(
        &self,
        sink: W,
        sample_rate: u32,
        channels: u16,
        bits_per_sample: u16,
        metadata: HashMap<String, String>,
    ) -> CodecResult<CodecWriter<W>>
    where
        W: Write + Seek + Send,
    {
        CodecWriter::create(sink, sample_rate, channels, bits_per_sample, metadata)
    }
}
