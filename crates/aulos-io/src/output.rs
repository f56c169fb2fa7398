//! Write side of the stream bridge.
//!
//! [`StreamOutput`] adapts a `Write + Seek` sink to the engine's
//! write-at-offset contract and keeps the running bytes-written counter;
//! [`BridgeSink`] hands a bridge to the encode engine as a `Write + Seek`.

use std::{
    io::{self, Seek, SeekFrom, Write},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

const ZERO_CHUNK: [u8; 4096] = [0u8; 4096];

/// Write-side capability contract required by the codec engine.
pub trait OutputBridge: Send {
    /// Write `buf` at the absolute byte position `offset`.
    ///
    /// On success the running bytes-written counter grows by `buf.len()`.
    /// On failure nothing is counted and the error is reported as-is.
    fn write_at(&mut self, offset: u64, buf: &[u8]) -> io::Result<usize>;

    /// The running bytes-written counter.
    ///
    /// This is the size the engine is told about, not the true sink length.
    fn size(&self) -> u64;

    /// Grow the logical size to `new_size` by appending zero bytes.
    ///
    /// A target at or below the current counter is a no-op; this operation
    /// never truncates.
    fn set_size(&mut self, new_size: u64) -> io::Result<()>;
}

/// [`OutputBridge`] over any seekable byte sink.
///
/// The bytes-written counter lives behind an `Arc` so the owning session can
/// keep a handle to it after the bridge has been moved into the engine.
pub struct StreamOutput<W> {
    sink: W,
    /// Last known underlying position. `None` after a failed operation.
    pos: Option<u64>,
    bytes_written: Arc<AtomicU64>,
}

impl<W: Write + Seek> StreamOutput<W> {
    pub fn new(sink: W) -> Self {
        Self {
            sink,
            pos: None,
            bytes_written: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Handle onto the bytes-written counter, readable after the bridge has
    /// been handed to the engine.
    pub fn bytes_written_handle(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.bytes_written)
    }

    /// Give the underlying sink back to the caller.
    pub fn into_inner(self) -> W {
        self.sink
    }

    fn reposition(&mut self, offset: u64) -> io::Result<()> {
        if self.pos == Some(offset) {
            return Ok(());
        }
        match self.sink.seek(SeekFrom::Start(offset)) {
            Ok(p) => {
                self.pos = Some(p);
                Ok(())
            }
            Err(e) => {
                self.pos = None;
                Err(e)
            }
        }
    }
}

impl<W> OutputBridge for StreamOutput<W>
where
    W: Write + Seek + Send,
{
    fn write_at(&mut self, offset: u64, buf: &[u8]) -> io::Result<usize> {
        self.reposition(offset)?;

        if let Err(e) = self.sink.write_all(buf) {
            self.pos = None;
            return Err(e);
        }

        self.pos = Some(offset + buf.len() as u64);
        self.bytes_written
            .fetch_add(buf.len() as u64, Ordering::AcqRel);
        Ok(buf.len())
    }

    fn size(&self) -> u64 {
        self.bytes_written.load(Ordering::Acquire)
    }

    fn set_size(&mut self, new_size: u64) -> io::Result<()> {
        let current = self.size();
        if new_size <= current {
            return Ok(());
        }

        let mut gap = new_size - current;
        tracing::trace!(current, new_size, "padding output stream with zeros");

        self.reposition(current)?;
        while gap > 0 {
            let n = gap.min(ZERO_CHUNK.len() as u64) as usize;
            if let Err(e) = self.sink.write_all(&ZERO_CHUNK[..n]) {
                self.pos = None;
                return Err(e);
            }
            self.pos = self.pos.map(|p| p + n as u64);
            self.bytes_written.fetch_add(n as u64, Ordering::AcqRel);
            gap -= n as u64;
        }

        Ok(())
    }
}

/// Presents an [`OutputBridge`] to the encode engine as a `Write + Seek`.
///
/// Keeps a logical cursor and translates the engine's stream writes into
/// absolute-offset bridge calls. Writing after a seek beyond the current
/// counter first grows the logical size through `set_size`, so the gap is
/// explicit zeros on every kind of sink.
pub struct BridgeSink<B> {
    bridge: B,
    pos: u64,
}

impl<B: OutputBridge> BridgeSink<B> {
    pub fn new(bridge: B) -> Self {
        Self { bridge, pos: 0 }
    }

    /// Access the wrapped bridge.
    pub fn bridge(&self) -> &B {
        &self.bridge
    }
}

impl<B: OutputBridge> Write for BridgeSink<B> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        if self.pos > self.bridge.size() {
            self.bridge.set_size(self.pos)?;
        }

        let n = self.bridge.write_at(self.pos, buf)?;
        self.pos += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<B: OutputBridge> Seek for BridgeSink<B> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let new_pos: i128 = match pos {
            SeekFrom::Start(p) => p as i128,
            SeekFrom::Current(delta) => (self.pos as i128).saturating_add(delta as i128),
            SeekFrom::End(delta) => (self.bridge.size() as i128).saturating_add(delta as i128),
        };

        if new_pos < 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek before start of stream",
            ));
        }

        self.pos = new_pos as u64;
        Ok(self.pos)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    /// Cursor wrapper counting writes and seeks, optionally failing after a
    /// byte budget is exhausted.
    struct CountingSink {
        inner: Cursor<Vec<u8>>,
        seeks: usize,
        writes: usize,
        fail_after: Option<usize>,
        written: usize,
    }

    impl CountingSink {
        fn new() -> Self {
            Self {
                inner: Cursor::new(Vec::new()),
                seeks: 0,
                writes: 0,
                fail_after: None,
                written: 0,
            }
        }

        fn failing_after(budget: usize) -> Self {
            let mut sink = Self::new();
            sink.fail_after = Some(budget);
            sink
        }
    }

    impl Write for CountingSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.writes += 1;
            if let Some(budget) = self.fail_after {
                if self.written + buf.len() > budget {
                    return Err(io::Error::new(io::ErrorKind::Other, "sink full"));
                }
            }
            self.written += buf.len();
            self.inner.write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            self.inner.flush()
        }
    }

    impl Seek for CountingSink {
        fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
            self.seeks += 1;
            self.inner.seek(pos)
        }
    }

    #[test]
    fn test_write_at_counts_bytes() {
        let mut out = StreamOutput::new(Cursor::new(Vec::new()));

        assert_eq!(out.write_at(0, b"abcd").unwrap(), 4);
        assert_eq!(out.size(), 4);
        assert_eq!(out.write_at(4, b"ef").unwrap(), 2);
        assert_eq!(out.size(), 6);
        assert_eq!(out.into_inner().into_inner(), b"abcdef");
    }

    #[test]
    fn test_counter_grows_even_for_overwrites() {
        // The counter is what the engine is told, not the sink length; a
        // header patch at offset 0 still counts.
        let mut out = StreamOutput::new(Cursor::new(Vec::new()));

        out.write_at(0, b"abcd").unwrap();
        out.write_at(0, b"AB").unwrap();
        assert_eq!(out.size(), 6);
        assert_eq!(out.into_inner().into_inner(), b"ABcd");
    }

    #[test]
    fn test_write_failure_counts_nothing() {
        let mut out = StreamOutput::new(CountingSink::failing_after(4));

        assert_eq!(out.write_at(0, b"abcd").unwrap(), 4);
        assert!(out.write_at(4, b"ef").is_err());
        assert_eq!(out.size(), 4);
    }

    #[test]
    fn test_set_size_pads_with_zeros() {
        let mut out = StreamOutput::new(Cursor::new(Vec::new()));

        out.write_at(0, b"xy").unwrap();
        out.set_size(7).unwrap();
        assert_eq!(out.size(), 7);
        assert_eq!(out.into_inner().into_inner(), b"xy\0\0\0\0\0");
    }

    #[test]
    fn test_set_size_never_truncates() {
        let mut out = StreamOutput::new(Cursor::new(Vec::new()));

        out.write_at(0, b"abcdef").unwrap();
        out.set_size(3).unwrap();
        assert_eq!(out.size(), 6);
        out.set_size(6).unwrap();
        assert_eq!(out.size(), 6);
        assert_eq!(out.into_inner().into_inner(), b"abcdef");
    }

    #[test]
    fn test_set_size_crosses_chunk_boundary() {
        let mut out = StreamOutput::new(Cursor::new(Vec::new()));

        out.set_size(ZERO_CHUNK.len() as u64 + 100).unwrap();
        assert_eq!(out.size(), ZERO_CHUNK.len() as u64 + 100);
        let data = out.into_inner().into_inner();
        assert_eq!(data.len(), ZERO_CHUNK.len() + 100);
        assert!(data.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_sequential_writes_elide_seeks() {
        let mut out = StreamOutput::new(CountingSink::new());

        out.write_at(0, b"aaaa").unwrap();
        out.write_at(4, b"bbbb").unwrap();
        out.write_at(8, b"cccc").unwrap();

        let sink = out.into_inner();
        assert_eq!(sink.seeks, 1);
        assert_eq!(sink.writes, 3);
    }

    #[test]
    fn test_bytes_written_handle_stays_live() {
        let out = StreamOutput::new(Cursor::new(Vec::new()));
        let handle = out.bytes_written_handle();

        let mut out = out;
        out.write_at(0, b"abcd").unwrap();
        assert_eq!(handle.load(Ordering::Acquire), 4);
    }

    #[test]
    fn test_bridge_sink_sequential_writes() {
        let mut sink = BridgeSink::new(StreamOutput::new(Cursor::new(Vec::new())));

        sink.write_all(b"hello ").unwrap();
        sink.write_all(b"world").unwrap();
        assert_eq!(sink.bridge().size(), 11);
    }

    #[test]
    fn test_bridge_sink_seek_back_and_patch() {
        let mut sink = BridgeSink::new(StreamOutput::new(Cursor::new(Vec::new())));

        sink.write_all(b"????data").unwrap();
        sink.seek(SeekFrom::Start(0)).unwrap();
        sink.write_all(b"head").unwrap();

        let out = sink.bridge();
        // 8 sequential + 4 patched; the counter keeps append-order accounting.
        assert_eq!(out.size(), 12);
    }

    #[test]
    fn test_bridge_sink_forward_seek_pads_gap() {
        let mut sink = BridgeSink::new(StreamOutput::new(Cursor::new(Vec::new())));

        sink.write_all(b"ab").unwrap();
        sink.seek(SeekFrom::Start(6)).unwrap();
        sink.write_all(b"cd").unwrap();

        assert_eq!(sink.bridge().size(), 8);
    }

    #[test]
    fn test_bridge_sink_seek_from_end_uses_counter() {
        let mut sink = BridgeSink::new(StreamOutput::new(Cursor::new(Vec::new())));

        sink.write_all(b"abcdef").unwrap();
        let pos = sink.seek(SeekFrom::End(-2)).unwrap();
        assert_eq!(pos, 4);
    }
}
