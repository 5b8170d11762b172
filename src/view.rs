//! Schema-verified root views over record buffers
//!
//! A [`Root`] binds a [`Buffer`] to a schema. The binding is explicit state,
//! never a raw pointer: either the bytes passed structural verification, or
//! they came from this process's own builder, or the view is invalid and
//! refuses typed access.

use crate::buffer::Buffer;
use crate::decode::{decode_record, verify_record};
use crate::error::{Error, Result};
use crate::schema::Schema;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::debug;

/// How a root's bytes were established
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Binding {
    /// No usable bytes: failed verification, failed open, or never bound
    Invalid,
    /// Bytes passed the structural verification walk
    Verified,
    /// Bytes came straight from a [`RecordBuilder`](crate::RecordBuilder);
    /// verification deliberately skipped
    Trusted,
}

/// A typed, read-verified window over one record's bytes
///
/// Nothing is decoded until [`value`](Self::value) is called; binding only
/// runs the structural verification walk. Cloning duplicates the buffer
/// handle and keeps the binding state; verification is deterministic over
/// identical bytes, so the clone's validity is the original's.
#[derive(Debug, Clone)]
pub struct Root {
    schema: Arc<Schema>,
    buffer: Buffer,
    binding: Binding,
}

impl Root {
    /// Bind a buffer and verify it against the schema
    ///
    /// Check [`valid`](Self::valid) for the outcome; binding never fails
    /// loudly on bad bytes, it produces an invalid view.
    pub fn bind(schema: Arc<Schema>, buffer: Buffer) -> Self {
        let mut root = Self::unbound(schema);
        root.set_data(buffer);
        root
    }

    /// Bind builder output without re-running verification
    ///
    /// Restricted to bytes this process just produced; external bytes always
    /// go through [`bind`](Self::bind) or [`read_framed`](Self::read_framed).
    pub(crate) fn bind_trusted(schema: Arc<Schema>, buffer: Buffer) -> Self {
        Self {
            schema,
            buffer,
            binding: Binding::Trusted,
        }
    }

    /// An invalid view with no bytes bound
    pub fn unbound(schema: Arc<Schema>) -> Self {
        Self {
            schema,
            buffer: Buffer::new(),
            binding: Binding::Invalid,
        }
    }

    /// Open a whole file as one unframed record
    ///
    /// Returns an invalid view, never an error, when the file cannot be
    /// read or its bytes fail verification. The file handle is released
    /// before the call returns on every path.
    pub async fn open<P: AsRef<Path>>(schema: Arc<Schema>, path: P) -> Self {
        let path = path.as_ref();
        match tokio::fs::read(path).await {
            Ok(data) => {
                let root = Self::bind(schema, Buffer::from(data));
                if !root.valid() {
                    debug!(path = %path.display(), "file failed record verification");
                }
                root
            }
            Err(err) => {
                debug!(path = %path.display(), %err, "could not read record file");
                Self::unbound(schema)
            }
        }
    }

    /// Whether the view is bound to usable bytes
    pub fn valid(&self) -> bool {
        self.binding != Binding::Invalid
    }

    /// The schema this view verifies and decodes against
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// The bound buffer
    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    /// Decode the bound bytes into a JSON value
    ///
    /// Materialization is lazy: nothing is decoded until asked. Calling this
    /// on an invalid view is [`Error::InvalidRoot`].
    pub fn value(&self) -> Result<Value> {
        if !self.valid() {
            return Err(Error::InvalidRoot);
        }
        decode_record(&self.schema, self.buffer.as_slice())
    }

    /// Rebind to a new buffer, re-running verification
    ///
    /// May flip the view valid or invalid in either direction.
    pub fn set_data(&mut self, buffer: Buffer) {
        self.binding = if verify_record(&self.schema, buffer.as_slice()) {
            Binding::Verified
        } else {
            Binding::Invalid
        };
        self.buffer = buffer;
    }

    /// Read one framed record from a stream and rebind to it
    ///
    /// Returns `Ok(false)` on clean EOF at a frame boundary (the view keeps
    /// its current binding) and `Ok(true)` when a record was read and
    /// verified. A payload that fails verification is [`Error::Verification`];
    /// short frames surface as [`Error::Truncated`]. Any error leaves the
    /// view invalid.
    pub async fn read_framed<R: AsyncRead + Unpin>(&mut self, reader: &mut R) -> Result<bool> {
        let buffer = match Buffer::read_frame(reader).await {
            Ok(Some(buffer)) => buffer,
            Ok(None) => return Ok(false),
            Err(err) => {
                self.buffer = Buffer::new();
                self.binding = Binding::Invalid;
                return Err(err);
            }
        };

        self.set_data(buffer);
        if self.valid() {
            Ok(true)
        } else {
            Err(Error::Verification)
        }
    }

    /// Write the bound record as one framed record
    ///
    /// Precondition: [`valid`](Self::valid). An invalid view is
    /// [`Error::InvalidRoot`] and writes nothing.
    pub async fn write_framed<W: AsyncWrite + Unpin>(&self, writer: &mut W) -> Result<()> {
        if !self.valid() {
            return Err(Error::InvalidRoot);
        }
        self.buffer.write_frame(writer).await
    }
}

/// Decoded-value equality: two roots are equal iff their decoded values are,
/// independent of byte-level differences in the backing buffers.
///
/// Comparing an invalid root is a contract violation and panics; check
/// [`Root::valid`] first.
impl PartialEq for Root {
    fn eq(&self, other: &Self) -> bool {
        assert!(
            self.valid() && other.valid(),
            "comparing a root view that is not bound to verified bytes"
        );
        let lhs = self.value().expect("bound root failed to decode");
        let rhs = other.value().expect("bound root failed to decode");
        lhs == rhs
    }
}
