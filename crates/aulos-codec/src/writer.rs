//! Streaming sample writer over the encode engine.
//!
//! [`CodecWriter`] owns one writable byte sink and one engine session, and
//! pushes caller-supplied float samples into the engine for encoding. The
//! destination container is fixed: RIFF/WAVE at 16-bit signed integer depth,
//! whatever bit depth the caller asked for. The capability query lists
//! exactly one writable container type accordingly.
//!
//! ## Failure model
//!
//! Write failure is sticky: once the engine or the sink reports an error the
//! session is permanently disabled and every later call returns failure
//! without touching the sink again. There is no retry or partial-success
//! path.

use std::{
    collections::HashMap,
    io::{Seek, Write},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use aulos_io::{BridgeSink, StreamOutput};
use hound::WavWriter;

use crate::{
    error::{CodecError, CodecResult},
    format::SampleFormat,
    traits::SampleWriter,
};

/// Streaming writer over one byte sink and one encode-engine session.
pub struct CodecWriter<W: Write + Seek + Send> {
    /// Taken by `finalize`; `None` afterwards.
    engine: Option<WavWriter<BridgeSink<StreamOutput<W>>>>,
    client: SampleFormat,
    dest: SampleFormat,
    /// Running bytes-written counter, shared with the stream bridge.
    bytes_written: Arc<AtomicU64>,
    /// Accepted at construction; unused by the encoding path.
    metadata: HashMap<String, String>,
    write_failed: bool,
}

impl<W: Write + Seek + Send> CodecWriter<W> {
    /// Open an encode session over a writable, seekable sink.
    ///
    /// `bits_per_sample` is accepted for interface parity and normalized
    /// into the float client pipeline; the destination depth stays 16-bit.
    /// The sink is owned by the writer and closed exactly once, with it.
    pub fn create(
        sink: W,
        sample_rate: u32,
        channels: u16,
        bits_per_sample: u16,
        metadata: HashMap<String, String>,
    ) -> CodecResult<Self> {
        if sample_rate == 0 || channels == 0 {
            return Err(CodecError::InvalidData(format!(
                "unusable destination format: {sample_rate} Hz, {channels} channels"
            )));
        }
        if bits_per_sample != 16 {
            tracing::debug!(
                requested = bits_per_sample,
                "destination depth is fixed at 16-bit"
            );
        }

        let dest = SampleFormat::packed_int16(sample_rate as f64, channels);
        let client = SampleFormat::client_float(sample_rate as f64, channels);

        let output = StreamOutput::new(sink);
        let bytes_written = output.bytes_written_handle();

        let engine = WavWriter::new(BridgeSink::new(output), dest.to_wav_spec())
            .map_err(|e| CodecError::Engine(Box::new(e)))?;

        tracing::debug!(sample_rate, channels, "opened encode session");

        Ok(Self {
            engine: Some(engine),
            client,
            dest,
            bytes_written,
            metadata,
            write_failed: false,
        })
    }

    pub fn channels(&self) -> u16 {
        self.dest.channels
    }

    pub fn sample_rate(&self) -> f64 {
        self.dest.sample_rate
    }

    /// Destination format of the container: 16-bit signed integer, packed.
    pub fn destination_format(&self) -> &SampleFormat {
        &self.dest
    }

    /// Client format at the writer boundary: 32-bit float, planar.
    pub fn client_format(&self) -> &SampleFormat {
        &self.client
    }

    /// The running bytes-written counter: the size the engine has been told
    /// about, not necessarily the true sink length.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written.load(Ordering::Acquire)
    }

    /// Metadata key/value pairs handed in at construction. The encoding path
    /// does not consume them.
    pub fn metadata(&self) -> &HashMap<String, String> {
        &self.metadata
    }

    /// Push `num_frames` frames from the caller's per-channel slices.
    ///
    /// At least one channel must be present; every supplied slice must hold
    /// at least `num_frames` samples. `None` entries and channels beyond the
    /// supplied list encode as silence. The slices are read in place; no
    /// staging copy is made.
    ///
    /// Returns `false` without touching the sink if the session has already
    /// failed; a fresh failure permanently disables the session.
    pub fn write(&mut self, src: &[Option<&[f32]>], num_frames: usize) -> bool {
        if self.write_failed {
            return false;
        }
        if !src.iter().any(|chan| chan.is_some()) {
            return false;
        }
        let Some(engine) = self.engine.as_mut() else {
            return false;
        };

        let channels = self.dest.channels as usize;
        for frame in 0..num_frames {
            for ch in 0..channels {
                let sample = src
                    .get(ch)
                    .and_then(|chan| chan.as_ref())
                    .map(|chan| chan[frame])
                    .unwrap_or(0.0);
                let quantized = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;

                if let Err(e) = engine.write_sample(quantized) {
                    tracing::debug!(frame, channel = ch, error = %e, "engine write failed");
                    self.write_failed = true;
                    return false;
                }
            }
        }

        true
    }

    /// Finish the container: the engine patches its header so the output is
    /// a complete file. No writes are accepted afterwards.
    ///
    /// Dropping the writer without calling this still patches the header,
    /// but swallows any error.
    pub fn finalize(&mut self) -> bool {
        if self.write_failed {
            return false;
        }
        let Some(engine) = self.engine.take() else {
            return false;
        };

        match engine.finalize() {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(error = %e, "finalize failed");
                self.write_failed = true;
                false
            }
        }
    }
}

impl<W: Write + Seek + Send> SampleWriter for CodecWriter<W> {
    fn channels(&self) -> u16 {
        CodecWriter::channels(self)
    }

    fn sample_rate(&self) -> f64 {
        CodecWriter::sample_rate(self)
    }

    fn write(&mut self, src: &[Option<&[f32]>], num_frames: usize) -> bool {
        CodecWriter::write(self, src, num_frames)
    }

    fn finalize(&mut self) -> bool {
        CodecWriter::finalize(self)
    }
}
