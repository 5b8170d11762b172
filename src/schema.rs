//! Schema definitions for recordwire
//!
//! A schema is loaded once per run and shared read-only across every record
//! conversion. Schema files are JSON documents:
//!
//! - scalar types as strings: `"bool"`, `"uint"`, `"int"`, `"float"`,
//!   `"string"`, `"bytes"`
//! - `{"array": <schema>}`
//! - `{"object": {"field": <schema>, ...}}`
//! - `{"map": <value schema>}` (string-keyed, dynamic)
//! - `{"optional": <schema>}`
//! - `{"union": [<schema>, ...]}`

use crate::error::{Error, Result};
use serde_json::Value;
use std::path::Path;

/// Schema type that defines how records are encoded and decoded
#[derive(Debug, Clone, PartialEq)]
pub enum Schema {
    /// Boolean schema
    Bool,
    /// Unsigned integer schema
    Uint,
    /// Signed integer schema
    Int,
    /// Floating point schema
    Float,
    /// String schema
    String,
    /// Byte array schema (hex string in text records)
    Bytes,
    /// Array schema with element type
    Array(Box<Schema>),
    /// Object schema with named fields, sorted by name
    Object(Vec<(String, Schema)>),
    /// String-keyed map schema with dynamic keys
    Map(Box<Schema>),
    /// Optional schema: the value or null
    Optional(Box<Schema>),
    /// Union of multiple schemas
    Union(Vec<Schema>),
}

impl Schema {
    /// Create a boolean schema
    pub fn boolean() -> Self {
        Schema::Bool
    }

    /// Create a uint schema
    pub fn uint() -> Self {
        Schema::Uint
    }

    /// Create an int schema
    pub fn int() -> Self {
        Schema::Int
    }

    /// Create a float schema
    pub fn float() -> Self {
        Schema::Float
    }

    /// Create a string schema
    pub fn string() -> Self {
        Schema::String
    }

    /// Create a bytes schema
    pub fn bytes() -> Self {
        Schema::Bytes
    }

    /// Create an array schema
    pub fn array(element_schema: Schema) -> Self {
        Schema::Array(Box::new(element_schema))
    }

    /// Create an object schema
    pub fn object(mut fields: Vec<(String, Schema)>) -> Self {
        // Sort fields by name so the wire order is independent of input order
        fields.sort_by(|a, b| a.0.cmp(&b.0));
        Schema::Object(fields)
    }

    /// Create a map schema
    pub fn map(value_schema: Schema) -> Self {
        Schema::Map(Box::new(value_schema))
    }

    /// Create an optional schema
    pub fn optional(inner: Schema) -> Self {
        Schema::Optional(Box::new(inner))
    }

    /// Create a union schema
    pub fn union(schemas: Vec<Schema>) -> Self {
        Schema::Union(schemas)
    }

    /// Parse a schema definition from JSON text
    pub fn parse(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| Error::Schema(format!("schema file is not valid JSON: {e}")))?;
        Self::from_value(&value)
    }

    /// Load and parse a schema definition file
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = tokio::fs::read_to_string(path).await?;
        Self::parse(&text)
    }

    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::String(name) => match name.as_str() {
                "bool" => Ok(Schema::Bool),
                "uint" => Ok(Schema::Uint),
                "int" => Ok(Schema::Int),
                "float" => Ok(Schema::Float),
                "string" => Ok(Schema::String),
                "bytes" => Ok(Schema::Bytes),
                other => Err(Error::Schema(format!("unknown scalar type: {other:?}"))),
            },
            Value::Object(map) => {
                let mut entries = map.iter();
                let (kind, body) = match (entries.next(), entries.next()) {
                    (Some(entry), None) => entry,
                    _ => {
                        return Err(Error::Schema(
                            "composite schema must have exactly one key".to_string(),
                        ))
                    }
                };
                match kind.as_str() {
                    "array" => Ok(Schema::array(Self::from_value(body)?)),
                    "object" => {
                        let fields = body.as_object().ok_or_else(|| {
                            Error::Schema("object fields must be a JSON object".to_string())
                        })?;
                        let mut parsed = Vec::with_capacity(fields.len());
                        for (name, field) in fields {
                            parsed.push((name.clone(), Self::from_value(field)?));
                        }
                        Ok(Schema::object(parsed))
                    }
                    "map" => Ok(Schema::map(Self::from_value(body)?)),
                    "optional" => Ok(Schema::optional(Self::from_value(body)?)),
                    "union" => {
                        let variants = body.as_array().ok_or_else(|| {
                            Error::Schema("union variants must be a JSON array".to_string())
                        })?;
                        if variants.is_empty() {
                            return Err(Error::Schema(
                                "union must have at least one variant".to_string(),
                            ));
                        }
                        let parsed = variants
                            .iter()
                            .map(Self::from_value)
                            .collect::<Result<Vec<_>>>()?;
                        Ok(Schema::union(parsed))
                    }
                    other => Err(Error::Schema(format!("unknown composite type: {other:?}"))),
                }
            }
            other => Err(Error::Schema(format!(
                "schema must be a type name or a composite object, got: {other}"
            ))),
        }
    }

    /// Validate that a JSON value matches this schema
    pub fn validate(&self, value: &Value) -> Result<()> {
        match (self, value) {
            (Schema::Bool, Value::Bool(_)) => Ok(()),
            (Schema::Bool, _) => Err(Error::InvalidData("expected bool".to_string())),

            (Schema::Uint, v) if v.as_u64().is_some() => Ok(()),
            (Schema::Uint, _) => Err(Error::InvalidData("expected uint".to_string())),

            (Schema::Int, v) if v.as_i64().is_some() => Ok(()),
            (Schema::Int, _) => Err(Error::InvalidData("expected int".to_string())),

            (Schema::Float, v) if v.as_f64().is_some() => Ok(()),
            (Schema::Float, _) => Err(Error::InvalidData("expected float".to_string())),

            (Schema::String, Value::String(_)) => Ok(()),
            (Schema::String, _) => Err(Error::InvalidData("expected string".to_string())),

            (Schema::Bytes, Value::String(s)) => {
                hex::decode(s)
                    .map(|_| ())
                    .map_err(|e| Error::InvalidData(format!("expected hex bytes: {e}")))
            }
            (Schema::Bytes, _) => Err(Error::InvalidData("expected hex string".to_string())),

            (Schema::Array(elem_schema), Value::Array(items)) => {
                for item in items {
                    elem_schema.validate(item)?;
                }
                Ok(())
            }
            (Schema::Array(_), _) => Err(Error::InvalidData("expected array".to_string())),

            (Schema::Object(fields), Value::Object(obj)) => {
                for (field_name, field_schema) in fields {
                    let field_value = obj.get(field_name).ok_or_else(|| {
                        Error::InvalidData(format!("missing field: {field_name}"))
                    })?;
                    field_schema.validate(field_value)?;
                }
                Ok(())
            }
            (Schema::Object(_), _) => Err(Error::InvalidData("expected object".to_string())),

            (Schema::Map(value_schema), Value::Object(obj)) => {
                for (_, v) in obj {
                    value_schema.validate(v)?;
                }
                Ok(())
            }
            (Schema::Map(_), _) => Err(Error::InvalidData("expected map".to_string())),

            (Schema::Optional(_), Value::Null) => Ok(()),
            (Schema::Optional(inner), value) => inner.validate(value),

            (Schema::Union(schemas), value) => {
                for schema in schemas {
                    if schema.validate(value).is_ok() {
                        return Ok(());
                    }
                }
                Err(Error::InvalidData(
                    "value does not match any schema in union".to_string(),
                ))
            }
        }
    }
}
