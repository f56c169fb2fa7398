//! Read side of the stream bridge.
//!
//! [`StreamInput`] adapts a `Read + Seek` stream to the engine's
//! read-at-offset contract; [`BridgeSource`] hands a bridge to symphonia as a
//! `MediaSource`.

use std::io::{self, Read, Seek, SeekFrom};

use symphonia::core::io::MediaSource;

/// Read-side capability contract required by the codec engine.
///
/// Short reads are signalled only through the returned count being less than
/// requested; a failed underlying operation degrades to a 0-count read. The
/// engine treats running out of bytes as end of data, never as an error.
pub trait InputBridge: Send + Sync {
    /// Read up to `buf.len()` bytes at the absolute byte position `offset`.
    ///
    /// Returns the number of bytes actually read.
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> usize;

    /// Total length of the underlying stream, in bytes.
    fn size(&mut self) -> u64;
}

/// [`InputBridge`] over any seekable byte stream.
///
/// Caches the last known stream position so that sequential `read_at` calls
/// never issue a redundant seek on the underlying stream.
pub struct StreamInput<R> {
    stream: R,
    /// Last known underlying position. `None` after a failed operation.
    pos: Option<u64>,
    /// Probed total length, cached on first query.
    len: Option<u64>,
}

impl<R: Read + Seek> StreamInput<R> {
    pub fn new(stream: R) -> Self {
        Self {
            stream,
            pos: None,
            len: None,
        }
    }

    /// Give the underlying stream back to the caller.
    pub fn into_inner(self) -> R {
        self.stream
    }
}

impl<R> InputBridge for StreamInput<R>
where
    R: Read + Seek + Send + Sync,
{
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> usize {
        if self.pos != Some(offset) {
            match self.stream.seek(SeekFrom::Start(offset)) {
                Ok(p) => self.pos = Some(p),
                Err(_) => {
                    self.pos = None;
                    return 0;
                }
            }
        }

        let mut total = 0;
        while total < buf.len() {
            match self.stream.read(&mut buf[total..]) {
                Ok(0) => break,
                Ok(n) => total += n,
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(_) => break,
            }
        }

        self.pos = Some(offset + total as u64);
        total
    }

    fn size(&mut self) -> u64 {
        if let Some(len) = self.len {
            return len;
        }

        // Probe via seek-to-end. The position cache is updated so the next
        // read_at repositions correctly.
        let len = match self.stream.seek(SeekFrom::End(0)) {
            Ok(end) => end,
            Err(_) => 0,
        };
        self.pos = Some(len);
        self.len = Some(len);
        len
    }
}

/// Presents an [`InputBridge`] to the decode engine as a `MediaSource`.
///
/// Keeps a logical cursor and translates the engine's sequential reads into
/// absolute-offset bridge calls. The stream length is captured once at
/// construction; input sessions are over fixed-length data.
pub struct BridgeSource<B> {
    bridge: B,
    pos: u64,
    len: u64,
}

impl<B: InputBridge> BridgeSource<B> {
    pub fn new(mut bridge: B) -> Self {
        let len = bridge.size();
        Self {
            bridge,
            pos: 0,
            len,
        }
    }
}

impl<B: InputBridge> Read for BridgeSource<B> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        let n = self.bridge.read_at(self.pos, buf);
        self.pos = self.pos.saturating_add(n as u64);
        Ok(n)
    }
}

impl<B: InputBridge> Seek for BridgeSource<B> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let new_pos: i128 = match pos {
            SeekFrom::Start(p) => p as i128,
            SeekFrom::Current(delta) => (self.pos as i128).saturating_add(delta as i128),
            SeekFrom::End(delta) => (self.len as i128).saturating_add(delta as i128),
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

impl<B: InputBridge> MediaSource for BridgeSource<B> {
    fn is_seekable(&self) -> bool {
        true
    }

    fn byte_len(&self) -> Option<u64> {
        Some(self.len)
    }
}
