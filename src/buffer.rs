//! Owned byte buffers with framed stream I/O
//!
//! A [`Buffer`] owns one record's bytes. On a stream, a record is framed as a
//! 4-byte little-endian length prefix followed by exactly that many payload
//! bytes, with no stream-level header or trailer.

use crate::error::{Error, Result};
use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Default cap on a single frame's payload length (64 MiB)
///
/// A length prefix above the cap is rejected before any payload allocation.
pub const MAX_FRAME_LEN: u32 = 64 * 1024 * 1024;

/// An owning, contiguous byte container
///
/// Contents only ever change by whole-buffer replacement: there is no partial
/// in-place mutation after construction. Clones share the ref-counted
/// immutable bytes and never observe a later replacement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Buffer {
    bytes: Bytes,
}

impl Buffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a buffer by copying a byte slice
    pub fn from_slice(data: &[u8]) -> Self {
        Self {
            bytes: Bytes::copy_from_slice(data),
        }
    }

    /// Number of bytes owned
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the buffer holds no bytes
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The owned bytes
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// Replace the contents wholesale with a copy of `data`
    pub fn copy_from(&mut self, data: &[u8]) {
        self.bytes = Bytes::copy_from_slice(data);
    }

    /// Copy all owned bytes into the front of `dst`
    ///
    /// Panics when `dst` is shorter than [`len`](Self::len).
    pub fn copy_to(&self, dst: &mut [u8]) {
        dst[..self.bytes.len()].copy_from_slice(&self.bytes);
    }

    /// Drop the contents
    pub fn clear(&mut self) {
        self.bytes = Bytes::new();
    }

    /// Write the raw bytes to a stream, no framing
    pub async fn write_to<W: AsyncWrite + Unpin>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.bytes).await?;
        Ok(())
    }

    /// Replace the contents with exactly `size` bytes read from a stream
    ///
    /// When the stream ends early the buffer keeps the short prefix that did
    /// arrive and the call returns [`Error::Truncated`], so callers see both
    /// the partial data and the failure.
    pub async fn read_exact_from<R: AsyncRead + Unpin>(
        &mut self,
        reader: &mut R,
        size: usize,
    ) -> Result<()> {
        self.bytes = Bytes::new();
        let mut data = vec![0u8; size];
        let mut filled = 0;
        while filled < size {
            let n = reader.read(&mut data[filled..]).await?;
            if n == 0 {
                data.truncate(filled);
                self.bytes = data.into();
                return Err(Error::Truncated {
                    expected: size,
                    got: filled,
                });
            }
            filled += n;
        }
        self.bytes = data.into();
        Ok(())
    }

    /// Replace the contents with everything remaining on a stream
    ///
    /// Returns the number of bytes read. Every byte is kept verbatim; there is
    /// no whitespace or text interpretation.
    pub async fn read_to_end_from<R: AsyncRead + Unpin>(&mut self, reader: &mut R) -> Result<usize> {
        self.bytes = Bytes::new();
        let mut data = Vec::new();
        let n = reader.read_to_end(&mut data).await?;
        self.bytes = data.into();
        Ok(n)
    }

    /// Read one framed record from a stream
    ///
    /// Returns `Ok(None)` when the stream ends cleanly at a frame boundary.
    /// A partial length prefix or a payload shorter than declared is
    /// [`Error::Truncated`]; a declared length above [`MAX_FRAME_LEN`] is
    /// [`Error::FrameTooLarge`].
    pub async fn read_frame<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Option<Buffer>> {
        Self::read_frame_limited(reader, MAX_FRAME_LEN).await
    }

    /// Read one framed record with a custom payload length cap
    pub async fn read_frame_limited<R: AsyncRead + Unpin>(
        reader: &mut R,
        max: u32,
    ) -> Result<Option<Buffer>> {
        let mut prefix = [0u8; 4];
        let mut filled = 0;
        while filled < prefix.len() {
            let n = reader.read(&mut prefix[filled..]).await?;
            if n == 0 {
                if filled == 0 {
                    return Ok(None);
                }
                return Err(Error::Truncated {
                    expected: prefix.len(),
                    got: filled,
                });
            }
            filled += n;
        }

        let len = u32::from_le_bytes(prefix);
        if len > max {
            return Err(Error::FrameTooLarge {
                len: len as u64,
                max: max as u64,
            });
        }

        let mut buffer = Buffer::new();
        buffer.read_exact_from(reader, len as usize).await?;
        Ok(Some(buffer))
    }

    /// Write the contents as one framed record: length prefix, then payload
    pub async fn write_frame<W: AsyncWrite + Unpin>(&self, writer: &mut W) -> Result<()> {
        let len = u32::try_from(self.bytes.len()).map_err(|_| Error::FrameTooLarge {
            len: self.bytes.len() as u64,
            max: u32::MAX as u64,
        })?;
        writer.write_all(&len.to_le_bytes()).await?;
        writer.write_all(&self.bytes).await?;
        Ok(())
    }
}

impl From<Vec<u8>> for Buffer {
    fn from(data: Vec<u8>) -> Self {
        Self { bytes: data.into() }
    }
}

impl From<Bytes> for Buffer {
    fn from(bytes: Bytes) -> Self {
        Self { bytes }
    }
}

impl AsRef<[u8]> for Buffer {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}
