//! Record encoding
//!
//! Translates one validated JSON value into record bytes. Encoding is
//! two-pass: compute the exact size, allocate once, then fill through a
//! position cursor.

use crate::buffer::Buffer;
use crate::error::{Error, Result};
use crate::schema::Schema;
use crate::varint;
use crate::view::Root;
use serde_json::Value;
use std::sync::Arc;

/// Calculate the size needed to encode a value
fn encoded_size(schema: &Schema, value: &Value) -> Result<usize> {
    match (schema, value) {
        (Schema::Bool, Value::Bool(_)) => Ok(1),
        (Schema::Float, _) => Ok(8),

        (Schema::Uint, v) => {
            let n = v
                .as_u64()
                .ok_or_else(|| Error::InvalidData("expected uint".to_string()))?;
            Ok(varint::encoded_len(n))
        }

        (Schema::Int, v) => {
            let n = v
                .as_i64()
                .ok_or_else(|| Error::InvalidData("expected int".to_string()))?;
            let zigzagged = ((n << 1) ^ (n >> 63)) as u64;
            Ok(varint::encoded_len(zigzagged))
        }

        (Schema::String, Value::String(s)) => {
            let len = s.len();
            Ok(varint::encoded_len(len as u64) + len)
        }

        (Schema::Bytes, Value::String(s)) => {
            let len = s.len() / 2;
            Ok(varint::encoded_len(len as u64) + len)
        }

        (Schema::Array(elem_schema), Value::Array(items)) => {
            let mut size = varint::encoded_len(items.len() as u64);
            for item in items {
                size += encoded_size(elem_schema, item)?;
            }
            Ok(size)
        }

        (Schema::Object(fields), Value::Object(obj)) => {
            let mut size = 0;
            for (field_name, field_schema) in fields {
                let field_value = obj
                    .get(field_name)
                    .ok_or_else(|| Error::InvalidData(format!("missing field: {field_name}")))?;
                size += encoded_size(field_schema, field_value)?;
            }
            Ok(size)
        }

        (Schema::Map(value_schema), Value::Object(obj)) => {
            let mut size = varint::encoded_len(obj.len() as u64);
            for (key, v) in obj {
                let key_len = key.len();
                size += varint::encoded_len(key_len as u64) + key_len;
                size += encoded_size(value_schema, v)?;
            }
            Ok(size)
        }

        (Schema::Optional(_), Value::Null) => Ok(1),
        (Schema::Optional(inner), value) => Ok(1 + encoded_size(inner, value)?),

        (Schema::Union(schemas), value) => {
            for (idx, variant) in schemas.iter().enumerate() {
                if variant.validate(value).is_ok() {
                    let value_size = encoded_size(variant, value)?;
                    return Ok(varint::encoded_len(idx as u64) + value_size);
                }
            }
            Err(Error::InvalidData(
                "value does not match any schema in union".to_string(),
            ))
        }

        _ => Err(Error::InvalidData(
            "schema and value type mismatch".to_string(),
        )),
    }
}

/// Write a value into a buffer according to the schema
fn write_value(schema: &Schema, value: &Value, buf: &mut [u8], pos: &mut usize) -> Result<()> {
    match (schema, value) {
        (Schema::Bool, Value::Bool(b)) => {
            buf[*pos] = u8::from(*b);
            *pos += 1;
            Ok(())
        }

        (Schema::Uint, v) => {
            let n = v
                .as_u64()
                .ok_or_else(|| Error::InvalidData("expected uint".to_string()))?;
            *pos = varint::write(n, buf, *pos);
            Ok(())
        }

        (Schema::Int, v) => {
            let n = v
                .as_i64()
                .ok_or_else(|| Error::InvalidData("expected int".to_string()))?;
            let zigzagged = ((n << 1) ^ (n >> 63)) as u64;
            *pos = varint::write(zigzagged, buf, *pos);
            Ok(())
        }

        (Schema::Float, v) => {
            let n = v
                .as_f64()
                .ok_or_else(|| Error::InvalidData("expected float".to_string()))?;
            buf[*pos..*pos + 8].copy_from_slice(&n.to_le_bytes());
            *pos += 8;
            Ok(())
        }

        (Schema::String, Value::String(s)) => {
            let bytes = s.as_bytes();
            *pos = varint::write(bytes.len() as u64, buf, *pos);
            buf[*pos..*pos + bytes.len()].copy_from_slice(bytes);
            *pos += bytes.len();
            Ok(())
        }

        (Schema::Bytes, Value::String(s)) => {
            let bytes = hex::decode(s)
                .map_err(|e| Error::InvalidData(format!("expected hex bytes: {e}")))?;
            *pos = varint::write(bytes.len() as u64, buf, *pos);
            buf[*pos..*pos + bytes.len()].copy_from_slice(&bytes);
            *pos += bytes.len();
            Ok(())
        }

        (Schema::Array(elem_schema), Value::Array(items)) => {
            *pos = varint::write(items.len() as u64, buf, *pos);
            for item in items {
                write_value(elem_schema, item, buf, pos)?;
            }
            Ok(())
        }

        (Schema::Object(fields), Value::Object(obj)) => {
            for (field_name, field_schema) in fields {
                let field_value = obj
                    .get(field_name)
                    .ok_or_else(|| Error::InvalidData(format!("missing field: {field_name}")))?;
                write_value(field_schema, field_value, buf, pos)?;
            }
            Ok(())
        }

        (Schema::Map(value_schema), Value::Object(obj)) => {
            *pos = varint::write(obj.len() as u64, buf, *pos);
            for (key, v) in obj {
                let key_bytes = key.as_bytes();
                *pos = varint::write(key_bytes.len() as u64, buf, *pos);
                buf[*pos..*pos + key_bytes.len()].copy_from_slice(key_bytes);
                *pos += key_bytes.len();
                write_value(value_schema, v, buf, pos)?;
            }
            Ok(())
        }

        (Schema::Optional(_), Value::Null) => {
            buf[*pos] = 0;
            *pos += 1;
            Ok(())
        }

        (Schema::Optional(inner), value) => {
            buf[*pos] = 1;
            *pos += 1;
            write_value(inner, value, buf, pos)
        }

        (Schema::Union(schemas), value) => {
            for (idx, variant) in schemas.iter().enumerate() {
                if variant.validate(value).is_ok() {
                    *pos = varint::write(idx as u64, buf, *pos);
                    return write_value(variant, value, buf, pos);
                }
            }
            Err(Error::InvalidData(
                "value does not match any schema in union".to_string(),
            ))
        }

        _ => Err(Error::InvalidData(
            "schema and value type mismatch".to_string(),
        )),
    }
}

/// Builds record buffers from JSON values against one schema
///
/// The builder is the one producer of bytes that may be bound to a
/// [`Root`] without re-verification: everything it emits has already been
/// validated against the schema it encodes with.
#[derive(Debug, Clone)]
pub struct RecordBuilder {
    schema: Arc<Schema>,
}

impl RecordBuilder {
    /// Create a builder for one schema
    pub fn new(schema: Arc<Schema>) -> Self {
        Self { schema }
    }

    /// The schema this builder encodes with
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Validate a value and encode it into a record buffer
    pub fn build(&self, value: &Value) -> Result<Buffer> {
        self.schema.validate(value)?;

        let size = encoded_size(&self.schema, value)?;
        let mut buf = vec![0u8; size];
        let mut pos = 0;
        write_value(&self.schema, value, &mut buf, &mut pos)?;
        debug_assert_eq!(pos, size);

        Ok(Buffer::from(buf))
    }

    /// Encode a value and bind the result as an already-trusted root view
    ///
    /// The only path that skips structural verification; it never sees bytes
    /// this process did not just produce.
    pub fn finish_root(&self, value: &Value) -> Result<Root> {
        let buffer = self.build(value)?;
        Ok(Root::bind_trusted(self.schema.clone(), buffer))
    }
}
