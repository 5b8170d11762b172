//! Record decoding and structural verification
//!
//! Decoding materializes a JSON value from record bytes. Verification walks
//! the same layout without building anything: it only proves that every
//! length stays in range, every flag and union index is in domain, strings
//! are UTF-8, and the walk consumes the record exactly.

use crate::cursor::Cursor;
use crate::error::{Error, Result};
use crate::schema::Schema;
use crate::varint;
use serde_json::{Map, Number, Value};

/// Read an element or entry count; a count can never exceed the bytes left
fn checked_count(cur: &mut Cursor<'_>) -> Result<usize> {
    let count = varint::read(cur)?;
    if count > cur.remaining() as u64 {
        return Err(Error::InvalidData(format!(
            "count {count} exceeds remaining record bytes"
        )));
    }
    Ok(count as usize)
}

fn read_string(cur: &mut Cursor<'_>) -> Result<String> {
    let len = varint::read(cur)? as usize;
    let bytes = cur.read_bytes(len)?;
    String::from_utf8(bytes.to_vec())
        .map_err(|e| Error::InvalidData(format!("invalid UTF-8: {e}")))
}

/// Read a value according to the schema
fn read_value(schema: &Schema, cur: &mut Cursor<'_>) -> Result<Value> {
    match schema {
        Schema::Bool => match cur.read_u8()? {
            0 => Ok(Value::Bool(false)),
            1 => Ok(Value::Bool(true)),
            b => Err(Error::InvalidData(format!("invalid bool value: {b}"))),
        },

        Schema::Uint => {
            let n = varint::read(cur)?;
            Ok(Value::Number(Number::from(n)))
        }

        Schema::Int => {
            let zigzagged = varint::read(cur)?;
            let n = ((zigzagged >> 1) as i64) ^ (-((zigzagged & 1) as i64));
            Ok(Value::Number(Number::from(n)))
        }

        Schema::Float => {
            let n = f64::from_le_bytes(cur.read_array()?);
            let number = Number::from_f64(n)
                .ok_or_else(|| Error::InvalidData("non-finite float".to_string()))?;
            Ok(Value::Number(number))
        }

        Schema::String => Ok(Value::String(read_string(cur)?)),

        Schema::Bytes => {
            let len = varint::read(cur)? as usize;
            let bytes = cur.read_bytes(len)?;
            Ok(Value::String(hex::encode(bytes)))
        }

        Schema::Array(elem_schema) => {
            let len = checked_count(cur)?;
            let mut items = Vec::new();
            for _ in 0..len {
                items.push(read_value(elem_schema, cur)?);
            }
            Ok(Value::Array(items))
        }

        Schema::Object(fields) => {
            let mut obj = Map::new();
            for (field_name, field_schema) in fields {
                let value = read_value(field_schema, cur)?;
                obj.insert(field_name.clone(), value);
            }
            Ok(Value::Object(obj))
        }

        Schema::Map(value_schema) => {
            let len = checked_count(cur)?;
            let mut obj = Map::new();
            for _ in 0..len {
                let key = read_string(cur)?;
                let value = read_value(value_schema, cur)?;
                obj.insert(key, value);
            }
            Ok(Value::Object(obj))
        }

        Schema::Optional(inner) => match cur.read_u8()? {
            0 => Ok(Value::Null),
            1 => read_value(inner, cur),
            b => Err(Error::InvalidData(format!("invalid optional flag: {b}"))),
        },

        Schema::Union(schemas) => {
            let index = varint::read(cur)? as usize;
            let variant = schemas
                .get(index)
                .ok_or_else(|| Error::InvalidData(format!("invalid union index: {index}")))?;
            read_value(variant, cur)
        }
    }
}

/// Decode one complete record into a JSON value
///
/// The record must be consumed exactly; trailing bytes are an error.
pub fn decode_record(schema: &Schema, bytes: &[u8]) -> Result<Value> {
    let mut cur = Cursor::new(bytes);
    let value = read_value(schema, &mut cur)?;
    if cur.remaining() != 0 {
        return Err(Error::InvalidData(format!(
            "{} trailing bytes after record",
            cur.remaining()
        )));
    }
    Ok(value)
}

/// Walk one value's layout without materializing it
fn walk(schema: &Schema, cur: &mut Cursor<'_>) -> Result<()> {
    match schema {
        Schema::Bool => match cur.read_u8()? {
            0 | 1 => Ok(()),
            b => Err(Error::InvalidData(format!("invalid bool value: {b}"))),
        },

        Schema::Uint | Schema::Int => {
            varint::read(cur)?;
            Ok(())
        }

        Schema::Float => cur.skip(8),

        Schema::String => {
            let len = varint::read(cur)? as usize;
            let bytes = cur.read_bytes(len)?;
            std::str::from_utf8(bytes)
                .map_err(|e| Error::InvalidData(format!("invalid UTF-8: {e}")))?;
            Ok(())
        }

        Schema::Bytes => {
            let len = varint::read(cur)? as usize;
            cur.skip(len)
        }

        Schema::Array(elem_schema) => {
            let len = checked_count(cur)?;
            for _ in 0..len {
                walk(elem_schema, cur)?;
            }
            Ok(())
        }

        Schema::Object(fields) => {
            for (_, field_schema) in fields {
                walk(field_schema, cur)?;
            }
            Ok(())
        }

        Schema::Map(value_schema) => {
            let len = checked_count(cur)?;
            for _ in 0..len {
                let key_len = varint::read(cur)? as usize;
                let key = cur.read_bytes(key_len)?;
                std::str::from_utf8(key)
                    .map_err(|e| Error::InvalidData(format!("invalid UTF-8 in key: {e}")))?;
                walk(value_schema, cur)?;
            }
            Ok(())
        }

        Schema::Optional(inner) => match cur.read_u8()? {
            0 => Ok(()),
            1 => walk(inner, cur),
            b => Err(Error::InvalidData(format!("invalid optional flag: {b}"))),
        },

        Schema::Union(schemas) => {
            let index = varint::read(cur)? as usize;
            let variant = schemas
                .get(index)
                .ok_or_else(|| Error::InvalidData(format!("invalid union index: {index}")))?;
            walk(variant, cur)
        }
    }
}

/// Check that record bytes are structurally well-formed for a schema
///
/// Pass/fail only; verification never allocates for payload data and never
/// builds values. A record with trailing bytes fails.
pub fn verify_record(schema: &Schema, bytes: &[u8]) -> bool {
    let mut cur = Cursor::new(bytes);
    match walk(schema, &mut cur) {
        Ok(()) => cur.remaining() == 0,
        Err(_) => false,
    }
}
