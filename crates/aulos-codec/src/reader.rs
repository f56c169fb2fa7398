//! Streaming sample reader over the decode engine.
//!
//! [`CodecReader`] owns one readable byte stream and one engine session, and
//! pulls decoded audio in bounded chunks into caller-supplied per-channel
//! buffers. The caller addresses the stream in the decoded-frame domain;
//! random access is supported, and a seek is only issued to the engine when
//! the requested start disagrees with the current cursor.
//!
//! ## Read guarantee
//!
//! On success every requested destination sample in range is either real
//! decoded data or explicit zero, never uninitialized or stale memory. On
//! failure, chunks transferred before the failing one remain valid in the
//! destination; the rest is left untouched.

use std::io::{Read, Seek};

use aulos_io::{BridgeSource, StreamInput};
use symphonia::core::{
    audio::SampleBuffer,
    codecs::{Decoder, DecoderOptions, CODEC_TYPE_NULL},
    errors::Error as EngineError,
    formats::{FormatOptions, FormatReader, SeekMode, SeekTo},
    io::MediaSourceStream,
    meta::MetadataOptions,
    probe::Hint,
    units::{Time, TimeBase},
};

use crate::{
    buffers::ChannelBlock,
    error::{CodecError, CodecResult},
    format::SampleFormat,
    traits::SampleReader,
};

/// Upper bound on frames transferred per engine call. Bounds the scratch
/// block for arbitrarily large requests.
pub(crate) const MAX_CHUNK_FRAMES: usize = 8192;

/// Decoded samples delivered by the engine but not yet handed to the caller.
///
/// The engine decodes packet-sized runs; the caller asks for exact frame
/// counts. This holds the surplus between the two, interleaved.
#[derive(Default)]
struct Pending {
    samples: Vec<f32>,
    /// Consumed prefix, in samples.
    consumed: usize,
}

impl Pending {
    fn is_empty(&self) -> bool {
        self.consumed >= self.samples.len()
    }

    fn clear(&mut self) {
        self.samples.clear();
        self.consumed = 0;
    }

    fn refill(&mut self, samples: &[f32]) {
        self.samples.clear();
        self.samples.extend_from_slice(samples);
        self.consumed = 0;
    }

    fn frames_left(&self, channels: usize) -> usize {
        (self.samples.len() - self.consumed) / channels
    }

    /// Drop up to `frames` frames. Returns the number dropped.
    fn skip_frames(&mut self, frames: usize, channels: usize) -> usize {
        let take = frames.min(self.frames_left(channels));
        self.consumed += take * channels;
        take
    }

    /// De-interleave up to `max_frames` frames into `block` starting at frame
    /// `at`. Returns the number of frames moved.
    fn drain_into(
        &mut self,
        block: &mut ChannelBlock,
        at: usize,
        max_frames: usize,
        channels: usize,
    ) -> usize {
        let take = max_frames.min(self.frames_left(channels));
        for ch in 0..channels {
            let window = &mut block.channel_mut(ch)[at..at + take];
            for (frame, slot) in window.iter_mut().enumerate() {
                *slot = self.samples[self.consumed + frame * channels + ch];
            }
        }
        self.consumed += take * channels;
        take
    }
}

/// Streaming reader over one byte stream and one decode-engine session.
///
/// Construction runs the whole setup chain (open, probe, track selection,
/// native format query, client format derivation, total length query) and
/// fails as a unit: no partially constructed reader is ever observable.
pub struct CodecReader {
    // Engine session. The decoder is declared before the format reader so
    // the codec state is released before the container handle on drop.
    decoder: Box<dyn Decoder>,
    format: Box<dyn FormatReader>,
    track_id: u32,
    time_base: Option<TimeBase>,

    native: SampleFormat,
    client: SampleFormat,
    total_frames: u64,

    /// Next frame the engine will deliver.
    cursor: u64,

    pending: Pending,
    sample_buf: Option<SampleBuffer<f32>>,
    block: ChannelBlock,
}

impl CodecReader {
    /// Open a decode session over a readable, seekable stream.
    ///
    /// The stream is owned by the reader and closed exactly once, when the
    /// reader is dropped.
    pub fn open<R>(source: R) -> CodecResult<Self>
    where
        R: Read + Seek + Send + Sync + 'static,
    {
        Self::open_inner(source, None)
    }

    /// Like [`CodecReader::open`], with a file extension hint for the probe.
    pub fn open_with_hint<R>(source: R, extension: &str) -> CodecResult<Self>
    where
        R: Read + Seek + Send + Sync + 'static,
    {
        Self::open_inner(source, Some(extension))
    }

    fn open_inner<R>(source: R, extension: Option<&str>) -> CodecResult<Self>
    where
        R: Read + Seek + Send + Sync + 'static,
    {
        let bridge = StreamInput::new(source);
        let mss = MediaSourceStream::new(Box::new(BridgeSource::new(bridge)), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = extension {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| CodecError::Engine(Box::new(e)))?;
        let format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or(CodecError::NoAudioTrack)?;
        let track_id = track.id;
        let params = track.codec_params.clone();

        let native = SampleFormat::from_codec_params(&params)?;
        let total_frames = params.n_frames.ok_or(CodecError::UnknownLength)?;
        let client = SampleFormat::client_float(native.sample_rate, native.channels);

        let decoder = symphonia::default::get_codecs()
            .make(&params, &DecoderOptions::default())
            .map_err(|e| CodecError::Engine(Box::new(e)))?;

        tracing::debug!(
            sample_rate = native.sample_rate,
            channels = native.channels,
            total_frames,
            "opened decode session"
        );

        Ok(Self {
            decoder,
            format,
            track_id,
            time_base: params.time_base,
            native,
            client,
            total_frames,
            cursor: 0,
            pending: Pending::default(),
            sample_buf: None,
            block: ChannelBlock::new(native.channels as usize),
        })
    }

    pub fn channels(&self) -> u16 {
        self.native.channels
    }

    pub fn sample_rate(&self) -> f64 {
        self.native.sample_rate
    }

    /// Total decoded length of the stream, in frames.
    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    /// Bit depth at the client boundary. Always 32: samples cross the
    /// boundary as floats regardless of the container's native depth.
    pub fn bits_per_sample(&self) -> u32 {
        self.client.bits_per_channel
    }

    pub fn uses_float_samples(&self) -> bool {
        self.client.flags.is_float
    }

    /// Native format of the container, as discovered at open.
    pub fn native_format(&self) -> &SampleFormat {
        &self.native
    }

    /// Client format at the reader boundary: 32-bit float, planar.
    pub fn client_format(&self) -> &SampleFormat {
        &self.client
    }

    /// Pull `num_frames` frames starting at `start_frame` into the caller's
    /// per-channel buffers, writing each channel at `dest_offset`.
    ///
    /// Every supplied channel slice must hold at least
    /// `dest_offset + num_frames` samples. `None` entries are skipped;
    /// destination channels beyond the stream's channel count are
    /// zero-filled. A request reaching past the total length decodes the
    /// in-range head and zero-fills the rest.
    ///
    /// Returns `false` if the engine fails to seek or decode; chunks
    /// transferred before the failure remain valid, the rest of the
    /// destination is left untouched.
    pub fn read_samples(
        &mut self,
        dest: &mut [Option<&mut [f32]>],
        dest_offset: usize,
        start_frame: u64,
        num_frames: usize,
    ) -> bool {
        let available = self
            .total_frames
            .saturating_sub(start_frame)
            .min(num_frames as u64) as usize;

        if available < num_frames {
            for channel in dest.iter_mut() {
                if let Some(chan) = channel {
                    chan[dest_offset..dest_offset + num_frames].fill(0.0);
                }
            }
        }

        if available == 0 {
            return true;
        }

        if self.cursor != start_frame {
            if let Err(e) = self.seek_to(start_frame) {
                tracing::debug!(start_frame, error = %e, "seek failed");
                return false;
            }
        }

        let channels = self.native.channels as usize;
        let mut dest_offset = dest_offset;
        let mut remaining = available;

        while remaining > 0 {
            let chunk = remaining.min(MAX_CHUNK_FRAMES);
            if let Err(e) = self.fill_block(chunk) {
                tracing::debug!(frame = self.cursor, error = %e, "engine read failed");
                return false;
            }

            for (i, channel) in dest.iter_mut().enumerate() {
                let Some(chan) = channel else { continue };
                let window = &mut chan[dest_offset..dest_offset + chunk];
                if i < channels {
                    window.copy_from_slice(&self.block.channel(i)[..chunk]);
                } else {
                    window.fill(0.0);
                }
            }

            dest_offset += chunk;
            remaining -= chunk;
            self.cursor += chunk as u64;
        }

        true
    }

    /// Fill the scratch block with `frames` frames from the engine.
    ///
    /// Running out of packets before `frames` is not an error: the block was
    /// zeroed, so the shortfall reads as silence.
    fn fill_block(&mut self, frames: usize) -> CodecResult<usize> {
        self.block.reset(frames);
        let channels = self.native.channels as usize;

        let mut filled = 0;
        while filled < frames {
            if self.pending.is_empty() && self.decode_next_packet()?.is_none() {
                break;
            }
            filled += self
                .pending
                .drain_into(&mut self.block, filled, frames - filled, channels);
        }
        Ok(filled)
    }

    /// Decode packets until one for our track yields samples; refill the
    /// pending buffer from it. Returns `None` at end of stream.
    fn decode_next_packet(&mut self) -> CodecResult<Option<usize>> {
        loop {
            let packet = match self.format.next_packet() {
                Ok(p) => p,
                Err(EngineError::ResetRequired) => {
                    self.decoder.reset();
                    continue;
                }
                Err(EngineError::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    return Ok(None);
                }
                Err(e) => return Err(CodecError::Engine(Box::new(e))),
            };

            if packet.track_id() != self.track_id {
                continue;
            }

            let decoded = match self.decoder.decode(&packet) {
                Ok(d) => d,
                Err(EngineError::DecodeError(_)) => continue,
                Err(EngineError::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    return Ok(None);
                }
                Err(e) => return Err(CodecError::Engine(Box::new(e))),
            };

            let spec = *decoded.spec();
            if spec.channels.count() != self.native.channels as usize {
                return Err(CodecError::InvalidData(format!(
                    "channel count changed mid-stream: {} -> {}",
                    self.native.channels,
                    spec.channels.count()
                )));
            }

            let frames = decoded.frames();
            if frames == 0 {
                continue;
            }

            let needed = decoded.capacity() * spec.channels.count();
            if self
                .sample_buf
                .as_ref()
                .map_or(true, |buf| buf.capacity() < needed)
            {
                self.sample_buf = Some(SampleBuffer::new(decoded.capacity() as u64, spec));
            }
            if let Some(buf) = self.sample_buf.as_mut() {
                buf.copy_interleaved_ref(decoded);
                self.pending.refill(buf.samples());
            }

            return Ok(Some(frames));
        }
    }

    /// Seek the engine to `frame`.
    ///
    /// The engine lands on a packet boundary at or before the target; the
    /// difference is decoded and discarded so the next delivered frame is
    /// exactly `frame`.
    fn seek_to(&mut self, frame: u64) -> CodecResult<()> {
        tracing::trace!(from = self.cursor, to = frame, "seeking decode session");

        // Invalidate the cursor up front: if anything below fails, the next
        // call must not elide its seek.
        self.cursor = u64::MAX;

        let time = Time::from(frame as f64 / self.native.sample_rate);
        let seeked = self
            .format
            .seek(
                SeekMode::Accurate,
                SeekTo::Time {
                    time,
                    track_id: Some(self.track_id),
                },
            )
            .map_err(|e| CodecError::SeekFailed(e.to_string()))?;

        self.decoder.reset();
        self.pending.clear();

        let landed = self.frame_for_timestamp(seeked.actual_ts);
        let mut to_skip = frame.saturating_sub(landed);
        while to_skip > 0 {
            if self.pending.is_empty() && self.decode_next_packet()?.is_none() {
                break;
            }
            let skipped = self
                .pending
                .skip_frames(to_skip as usize, self.native.channels as usize);
            to_skip -= skipped as u64;
        }

        self.cursor = frame;
        Ok(())
    }

    fn frame_for_timestamp(&self, ts: u64) -> u64 {
        match self.time_base {
            Some(tb) => {
                let t = tb.calc_time(ts);
                ((t.seconds as f64 + t.frac) * self.native.sample_rate).round() as u64
            }
            None => ts,
        }
    }
}

impl SampleReader for CodecReader {
    fn channels(&self) -> u16 {
        CodecReader::channels(self)
    }

    fn sample_rate(&self) -> f64 {
        CodecReader::sample_rate(self)
    }

    fn total_frames(&self) -> u64 {
        CodecReader::total_frames(self)
    }

    fn bits_per_sample(&self) -> u32 {
        CodecReader::bits_per_sample(self)
    }

    fn uses_float_samples(&self) -> bool {
        CodecReader::uses_float_samples(self)
    }

    fn read_samples(
        &mut self,
        dest: &mut [Option<&mut [f32]>],
        dest_offset: usize,
        start_frame: u64,
        num_frames: usize,
    ) -> bool {
        CodecReader::read_samples(self, dest, dest_offset, start_frame, num_frames)
    }
}
