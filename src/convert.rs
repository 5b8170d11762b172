//! Streaming converters between JSONL text and framed binary records
//!
//! Both pipelines are single-pass and single-record-buffered: one record is
//! read, translated, written, then dropped before the next is touched, so
//! memory is bounded by the largest single record no matter how long the
//! stream runs. The first failed record aborts the run; records already
//! written stay written.

use crate::buffer::Buffer;
use crate::codec::RecordCodec;
use crate::error::Result;
use async_stream::try_stream;
use futures::stream::TryStreamExt;
use futures::Stream;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt};
use tracing::{debug, trace};

/// All framed records on a stream, as a `Stream` of buffers
///
/// Ends on clean EOF at a frame boundary; truncated or oversized frames yield
/// the error once and end the stream.
pub fn frame_stream<R>(mut reader: R) -> impl Stream<Item = Result<Buffer>>
where
    R: AsyncRead + Unpin,
{
    try_stream! {
        while let Some(buffer) = Buffer::read_frame(&mut reader).await? {
            yield buffer;
        }
    }
}

/// Convert a JSONL text stream into a framed binary record stream
///
/// Reads one line per record, encodes it through the codec, and writes the
/// result as one frame. A record that fails to encode aborts the conversion;
/// frames already written stay written. Returns the number of records
/// converted on clean EOF.
pub async fn jsonl_to_frames<C, R, W>(codec: &C, mut input: R, mut output: W) -> Result<u64>
where
    C: RecordCodec,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut line = String::new();
    let mut count = 0u64;
    loop {
        line.clear();
        if input.read_line(&mut line).await? == 0 {
            break;
        }
        let record = trim_newline(&line);
        let buffer = codec.encode(record)?;
        buffer.write_frame(&mut output).await?;
        output.flush().await?;
        count += 1;
        trace!(record = count, bytes = buffer.len(), "framed record");
    }
    debug!(records = count, "jsonl to frames complete");
    Ok(count)
}

/// Convert a framed binary record stream into a JSONL text stream
///
/// Reads one frame per record, decodes it through the codec, and writes the
/// text followed by a newline. EOF at a frame boundary ends the run cleanly;
/// a truncated frame or an undecodable record aborts it after the preceding
/// records were emitted. Returns the number of records converted.
pub async fn frames_to_jsonl<C, R, W>(codec: &C, input: R, mut output: W) -> Result<u64>
where
    C: RecordCodec,
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let frames = frame_stream(input);
    tokio::pin!(frames);

    let mut count = 0u64;
    while let Some(buffer) = frames.try_next().await? {
        let text = codec.decode(&buffer)?;
        output.write_all(text.as_bytes()).await?;
        output.write_all(b"\n").await?;
        output.flush().await?;
        count += 1;
        trace!(record = count, bytes = buffer.len(), "rendered record");
    }
    debug!(records = count, "frames to jsonl complete");
    Ok(count)
}

fn trim_newline(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::JsonCodec;
    use crate::error::Error;
    use crate::schema::Schema;
    use std::sync::Arc;

    fn codec() -> JsonCodec {
        JsonCodec::new(Arc::new(Schema::string()))
    }

    #[tokio::test]
    async fn test_jsonl_to_frames_counts_records() {
        let input = b"\"a\"\n\"b\"\n".as_slice();
        let mut output = Vec::new();
        let count = jsonl_to_frames(&codec(), input, &mut output).await.unwrap();
        assert_eq!(count, 2);

        // Two frames, each: u32 length 2 + [1, byte]
        let mut reader = &output[..];
        let first = Buffer::read_frame(&mut reader).await.unwrap().unwrap();
        assert_eq!(first.as_slice(), &[1, b'a']);
        let second = Buffer::read_frame(&mut reader).await.unwrap().unwrap();
        assert_eq!(second.as_slice(), &[1, b'b']);
        assert!(Buffer::read_frame(&mut reader).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_last_line_without_newline_still_converts() {
        let input = b"\"a\"\n\"b\"".as_slice();
        let mut output = Vec::new();
        let count = jsonl_to_frames(&codec(), input, &mut output).await.unwrap();
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn test_crlf_line_endings() {
        let input = b"\"a\"\r\n\"b\"\r\n".as_slice();
        let mut output = Vec::new();
        let count = jsonl_to_frames(&codec(), input, &mut output).await.unwrap();
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn test_bad_record_aborts_but_keeps_prior_output() {
        let input = b"\"a\"\nnot json\n\"c\"\n".as_slice();
        let mut output = Vec::new();
        let err = jsonl_to_frames(&codec(), input, &mut output).await.unwrap_err();
        assert!(matches!(err, Error::Json(_)));

        // The first record's frame was committed before the failure
        let mut reader = &output[..];
        let first = Buffer::read_frame(&mut reader).await.unwrap().unwrap();
        assert_eq!(first.as_slice(), &[1, b'a']);
        assert!(Buffer::read_frame(&mut reader).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_frames_to_jsonl() {
        let codec = codec();
        let mut frames = Vec::new();
        for text in ["\"x\"", "\"y\""] {
            let buffer = codec.encode(text).unwrap();
            buffer.write_frame(&mut frames).await.unwrap();
        }

        let mut output = Vec::new();
        let count = frames_to_jsonl(&codec, &frames[..], &mut output).await.unwrap();
        assert_eq!(count, 2);
        assert_eq!(output, b"\"x\"\n\"y\"\n");
    }

    #[tokio::test]
    async fn test_frame_stream_yields_all_frames() {
        let mut stream_bytes = Vec::new();
        for payload in [b"one".as_slice(), b"two", b"three"] {
            Buffer::from_slice(payload)
                .write_frame(&mut stream_bytes)
                .await
                .unwrap();
        }

        let frames: Vec<Buffer> = frame_stream(&stream_bytes[..])
            .try_collect()
            .await
            .unwrap();
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[2].as_slice(), b"three");
    }

    #[tokio::test]
    async fn test_frame_stream_surfaces_truncation() {
        let mut stream_bytes = Vec::new();
        Buffer::from_slice(b"ok")
            .write_frame(&mut stream_bytes)
            .await
            .unwrap();
        stream_bytes.extend_from_slice(&9u32.to_le_bytes());
        stream_bytes.extend_from_slice(b"short");

        let frames = frame_stream(&stream_bytes[..]);
        tokio::pin!(frames);
        assert!(frames.try_next().await.unwrap().is_some());
        assert!(matches!(
            frames.try_next().await,
            Err(Error::Truncated { expected: 9, got: 5 })
        ));
    }
}
