//! # Recordwire
//!
//! A toolkit for moving schema-typed binary records between byte streams and
//! JSONL text, with a verified view over each record's bytes.
//!
//! On a stream, every record is framed as a 4-byte little-endian length
//! prefix followed by the payload. The two converters translate whole streams
//! record by record and abort on the first record that fails; one record is
//! resident at a time, so memory stays bounded by the largest record rather
//! than the stream length.
//!
//! ## Example
//!
//! ```rust
//! use recordwire::{frames_to_jsonl, jsonl_to_frames, JsonCodec, Schema};
//! use std::sync::Arc;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> recordwire::Result<()> {
//!     let schema = Arc::new(Schema::parse(r#"{"object": {"name": "string"}}"#)?);
//!     let codec = JsonCodec::new(schema);
//!
//!     let jsonl = "{\"name\":\"ada\"}\n{\"name\":\"lin\"}\n";
//!     let mut framed = Vec::new();
//!     jsonl_to_frames(&codec, jsonl.as_bytes(), &mut framed).await?;
//!
//!     let mut back = Vec::new();
//!     frames_to_jsonl(&codec, &framed[..], &mut back).await?;
//!     assert_eq!(back, jsonl.as_bytes());
//!     Ok(())
//! }
//! ```

mod buffer;
mod codec;
mod convert;
mod cursor;
mod decode;
mod encode;
mod error;
mod schema;
mod varint;
mod view;

pub use buffer::{Buffer, MAX_FRAME_LEN};
pub use codec::{JsonCodec, RecordCodec};
pub use convert::{frame_stream, frames_to_jsonl, jsonl_to_frames};
pub use encode::RecordBuilder;
pub use error::{Error, Result};
pub use schema::Schema;
pub use view::Root;
