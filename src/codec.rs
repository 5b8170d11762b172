//! The schema codec boundary
//!
//! Converters talk to the codec through [`RecordCodec`] and never reach into
//! its internals: one text record in, one record buffer out, and back. The
//! crate ships [`JsonCodec`], which treats each text record as one JSON value.

use crate::buffer::Buffer;
use crate::decode::{decode_record, verify_record};
use crate::encode::RecordBuilder;
use crate::error::Result;
use crate::schema::Schema;
use serde_json::Value;
use std::sync::Arc;

/// Single-record translation between text records and record buffers
pub trait RecordCodec {
    /// Parse one text record and encode it into a record buffer
    fn encode(&self, text: &str) -> Result<Buffer>;

    /// Render one record buffer as a text record
    fn decode(&self, buffer: &Buffer) -> Result<String>;

    /// Check that bytes are structurally well-formed for this codec's schema
    fn verify(&self, bytes: &[u8]) -> bool;
}

/// JSON text records against a runtime-loaded schema
///
/// Decoding normalizes: object fields render in schema order, map entries in
/// stored order, `bytes` scalars as lowercase hex, output as compact JSON.
#[derive(Debug, Clone)]
pub struct JsonCodec {
    schema: Arc<Schema>,
    builder: RecordBuilder,
}

impl JsonCodec {
    /// Create a codec for one schema handle
    pub fn new(schema: Arc<Schema>) -> Self {
        Self {
            builder: RecordBuilder::new(schema.clone()),
            schema,
        }
    }

    /// The schema driving this codec
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }
}

impl RecordCodec for JsonCodec {
    fn encode(&self, text: &str) -> Result<Buffer> {
        let value: Value = serde_json::from_str(text)?;
        self.builder.build(&value)
    }

    fn decode(&self, buffer: &Buffer) -> Result<String> {
        let value = decode_record(&self.schema, buffer.as_slice())?;
        Ok(serde_json::to_string(&value)?)
    }

    fn verify(&self, bytes: &[u8]) -> bool {
        verify_record(&self.schema, bytes)
    }
}
