#![allow(dead_code)]

//! Shared fixtures for the integration tests: hand-rolled WAV bytes with
//! deterministic per-channel samples, plus instrumented stream fakes.

use std::{
    io::{self, Cursor, Read, Seek, SeekFrom, Write},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

/// Deterministic 16-bit sample for a (frame, channel) position, distinct per
/// channel so channel-mapping mistakes show up.
pub fn sample_value(frame: usize, ch: usize) -> i16 {
    (((frame * 31 + ch * 977) % 2000) as i32 - 1000) as i16
}

/// The f32 the decode engine delivers for [`sample_value`].
pub fn expected_f32(frame: usize, ch: usize) -> f32 {
    sample_value(frame, ch) as f32 / 32768.0
}

/// Minimal valid WAV file (PCM 16-bit) with [`sample_value`] payload.
pub fn test_wav(frames: usize, sample_rate: u32, channels: u16) -> Vec<u8> {
    let bytes_per_sample = 2u32;
    let data_size = frames as u32 * channels as u32 * bytes_per_sample;
    let file_size = 36 + data_size;

    let mut wav = Vec::new();

    // RIFF header
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&file_size.to_le_bytes());
    wav.extend_from_slice(b"WAVE");

    // fmt chunk
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes()); // PCM
    wav.extend_from_slice(&channels.to_le_bytes());
    wav.extend_from_slice(&sample_rate.to_le_bytes());
    let byte_rate = sample_rate * channels as u32 * bytes_per_sample;
    wav.extend_from_slice(&byte_rate.to_le_bytes());
    let block_align = channels * bytes_per_sample as u16;
    wav.extend_from_slice(&block_align.to_le_bytes());
    wav.extend_from_slice(&16u16.to_le_bytes());

    // data chunk
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_size.to_le_bytes());
    for frame in 0..frames {
        for ch in 0..channels as usize {
            wav.extend_from_slice(&sample_value(frame, ch).to_le_bytes());
        }
    }

    wav
}

/// Read+Seek stream counting calls to the position-setter.
pub struct CountingStream {
    inner: Cursor<Vec<u8>>,
    seeks: Arc<AtomicUsize>,
}

impl CountingStream {
    pub fn new(data: Vec<u8>) -> (Self, Arc<AtomicUsize>) {
        let seeks = Arc::new(AtomicUsize::new(0));
        (
            Self {
                inner: Cursor::new(data),
                seeks: Arc::clone(&seeks),
            },
            seeks,
        )
    }
}

impl Read for CountingStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Seek for CountingStream {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.seeks.fetch_add(1, Ordering::AcqRel);
        self.inner.seek(pos)
    }
}

/// Write+Seek sink whose buffer stays reachable after the sink has been
/// moved into a writer, and which can be told to start failing.
#[derive(Clone)]
pub struct SharedSink {
    inner: Arc<Mutex<SharedSinkState>>,
}

struct SharedSinkState {
    cursor: Cursor<Vec<u8>>,
    writes: usize,
    fail_after_bytes: Option<usize>,
    written: usize,
}

impl SharedSink {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(SharedSinkState {
                cursor: Cursor::new(Vec::new()),
                writes: 0,
                fail_after_bytes: None,
                written: 0,
            })),
        }
    }

    pub fn failing_after(budget: usize) -> Self {
        let sink = Self::new();
        sink.inner.lock().unwrap().fail_after_bytes = Some(budget);
        sink
    }

    pub fn data(&self) -> Vec<u8> {
        self.inner.lock().unwrap().cursor.get_ref().clone()
    }

    pub fn write_calls(&self) -> usize {
        self.inner.lock().unwrap().writes
    }
}

impl Write for SharedSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self.inner.lock().unwrap();
        state.writes += 1;
        if let Some(budget) = state.fail_after_bytes {
            if state.written + buf.len() > budget {
                return Err(io::Error::new(io::ErrorKind::Other, "sink full"));
            }
        }
        state.written += buf.len();
        state.cursor.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.lock().unwrap().cursor.flush()
    }
}

impl Seek for SharedSink {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.lock().unwrap().cursor.seek(pos)
    }
}
