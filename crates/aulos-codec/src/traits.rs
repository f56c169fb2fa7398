//! Streaming contracts consumed by playback and recording collaborators.
//!
//! Samples cross these boundaries as 32-bit float, one buffer per channel
//! (the client format), whatever the container holds natively.

/// Uniform streaming source of decoded audio.
pub trait SampleReader {
    fn channels(&self) -> u16;

    fn sample_rate(&self) -> f64;

    /// Total decoded length of the stream, in frames.
    fn total_frames(&self) -> u64;

    /// Bit depth at the client boundary.
    fn bits_per_sample(&self) -> u32;

    fn uses_float_samples(&self) -> bool;

    /// Pull `num_frames` frames starting at `start_frame` into the caller's
    /// per-channel buffers. See [`crate::reader::CodecReader::read_samples`]
    /// for the full contract.
    fn read_samples(
        &mut self,
        dest: &mut [Option<&mut [f32]>],
        dest_offset: usize,
        start_frame: u64,
        num_frames: usize,
    ) -> bool;
}

/// Uniform streaming sink of audio to be encoded.
pub trait SampleWriter {
    fn channels(&self) -> u16;

    fn sample_rate(&self) -> f64;

    /// Push `num_frames` frames from the caller's per-channel slices. See
    /// [`crate::writer::CodecWriter::write`] for the full contract.
    fn write(&mut self, src: &[Option<&[f32]>], num_frames: usize) -> bool;

    /// Finish the container. No writes are accepted afterwards.
    fn finalize(&mut self) -> bool;
}
