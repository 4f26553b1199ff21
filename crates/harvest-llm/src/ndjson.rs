//! # NDJSON line parser
//!
//! The generate endpoint streams newline-delimited JSON objects. This
//! module splits the raw byte stream into lines:
//! - Buffers incoming bytes and splits on `\n` (tolerating `\r\n`)
//! - Skips empty and invalid-UTF-8 lines
//! - Flushes a trailing unterminated line when the stream ends
//! - Propagates transport read errors to the caller, so a mid-stream
//!   reset fails the whole request instead of silently truncating it
//!
//! JSON parsing of each line is left to the caller: a line that fails
//! to parse is the caller's decision to skip, a read error is not.

use bytes::{Bytes, BytesMut};
use futures::Stream;
use tokio_stream::StreamExt;

/// Split a byte stream into NDJSON lines.
///
/// Yields `Ok(line)` for each non-empty line and `Err` for transport
/// read failures, after which the stream ends.
pub fn parse_ndjson_lines<S>(
    byte_stream: S,
) -> impl Stream<Item = Result<String, reqwest::Error>> + Send
where
    S: Stream<Item = Result<Bytes, reqwest::Error>> + Send + Unpin + 'static,
{
    futures::stream::unfold(
        (byte_stream, BytesMut::with_capacity(8192), false),
        move |(mut stream, mut buffer, done)| async move {
            if done {
                return None;
            }

            loop {
                // Check buffer for a complete line (\n)
                if let Some(newline_pos) = buffer.iter().position(|&b| b == b'\n') {
                    let mut line_bytes = buffer.split_to(newline_pos + 1);
                    line_bytes.truncate(line_bytes.len() - 1);
                    if line_bytes.last() == Some(&b'\r') {
                        line_bytes.truncate(line_bytes.len() - 1);
                    }

                    let line = match std::str::from_utf8(&line_bytes) {
                        Ok(s) => s.trim(),
                        Err(_) => continue, // skip invalid UTF-8 lines
                    };
                    if line.is_empty() {
                        continue;
                    }
                    return Some((Ok(line.to_string()), (stream, buffer, false)));
                }

                match stream.next().await {
                    Some(Ok(chunk)) => {
                        buffer.extend_from_slice(&chunk);
                    }
                    Some(Err(e)) => {
                        return Some((Err(e), (stream, buffer, true)));
                    }
                    None => {
                        // Stream ended — flush an unterminated final line.
                        if !buffer.is_empty() {
                            if let Ok(s) = std::str::from_utf8(&buffer) {
                                let line = s.trim().to_string();
                                buffer.clear();
                                if !line.is_empty() {
                                    return Some((Ok(line), (stream, buffer, true)));
                                }
                            }
                        }
                        return None;
                    }
                }
            }
        },
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn byte_stream(
        chunks: Vec<&'static [u8]>,
    ) -> impl Stream<Item = Result<Bytes, reqwest::Error>> + Send + Unpin + 'static {
        futures::stream::iter(
            chunks
                .into_iter()
                .map(|c| Ok(Bytes::from_static(c)))
                .collect::<Vec<_>>(),
        )
    }

    async fn collect_lines(chunks: Vec<&'static [u8]>) -> Vec<String> {
        let mut stream = std::pin::pin!(parse_ndjson_lines(byte_stream(chunks)));
        let mut lines = Vec::new();
        while let Some(line) = stream.next().await {
            lines.push(line.unwrap());
        }
        lines
    }

    #[tokio::test]
    async fn splits_single_chunk_into_lines() {
        let lines = collect_lines(vec![b"{\"a\":1}\n{\"b\":2}\n"]).await;
        assert_eq!(lines, vec![r#"{"a":1}"#, r#"{"b":2}"#]);
    }

    #[tokio::test]
    async fn reassembles_lines_split_across_chunks() {
        let lines = collect_lines(vec![b"{\"resp", b"onse\":\"a\"}\n{\"done\"", b":true}\n"]).await;
        assert_eq!(lines, vec![r#"{"response":"a"}"#, r#"{"done":true}"#]);
    }

    #[tokio::test]
    async fn flushes_unterminated_final_line() {
        let lines = collect_lines(vec![b"{\"a\":1}\n{\"b\":2}"]).await;
        assert_eq!(lines, vec![r#"{"a":1}"#, r#"{"b":2}"#]);
    }

    #[tokio::test]
    async fn skips_empty_lines_and_crlf() {
        let lines = collect_lines(vec![b"{\"a\":1}\r\n\r\n\n{\"b\":2}\n"]).await;
        assert_eq!(lines, vec![r#"{"a":1}"#, r#"{"b":2}"#]);
    }

    #[tokio::test]
    async fn skips_invalid_utf8_lines() {
        let lines = collect_lines(vec![b"{\"a\":1}\n\xff\xfe\n{\"b\":2}\n"]).await;
        assert_eq!(lines, vec![r#"{"a":1}"#, r#"{"b":2}"#]);
    }

    #[tokio::test]
    async fn empty_stream_yields_nothing() {
        let lines = collect_lines(vec![]).await;
        assert!(lines.is_empty());
    }
}
