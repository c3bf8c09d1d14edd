//! Byte stream to line stream adapter.

use std::pin::Pin;

use futures_util::{Stream, StreamExt, TryStreamExt};
use tokio_util::codec::{FramedRead, LinesCodec, LinesCodecError};
use tokio_util::io::StreamReader;

use crate::error::LlmError;

/// Boxed stream of text lines read from an HTTP body.
pub type LineStream = Pin<Box<dyn Stream<Item = Result<String, LlmError>> + Send>>;

/// Split a byte stream into lines.
///
/// Lines may span chunk boundaries; `\n` and `\r\n` terminators are removed
/// and a trailing line without terminator is still yielded when the body ends.
pub fn body_lines<S, B, E>(byte_stream: S) -> LineStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: bytes::Buf + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    let reader = StreamReader::new(
        byte_stream.map_err(|e| std::io::Error::other(format!("body read failed: {e}"))),
    );
    let lines = FramedRead::new(reader, LinesCodec::new()).map(|item| {
        item.map_err(|e| match e {
            LinesCodecError::Io(io) => LlmError::StreamError(io.to_string()),
            other => LlmError::StreamError(other.to_string()),
        })
    });
    Box::pin(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    async fn collect(chunks: Vec<&'static [u8]>) -> Vec<Result<String, LlmError>> {
        let stream = futures_util::stream::iter(
            chunks
                .into_iter()
                .map(|c| Ok::<_, std::io::Error>(Bytes::from_static(c))),
        );
        body_lines(stream).collect().await
    }

    #[tokio::test]
    async fn joins_lines_split_across_chunks() {
        let out = collect(vec![b"data: {\"a\"", b":1}\r\n\r\ndata: [DO", b"NE]\n"]).await;
        let lines: Vec<String> = out.into_iter().map(|l| l.unwrap()).collect();
        assert_eq!(lines, vec!["data: {\"a\":1}", "", "data: [DONE]"]);
    }

    #[tokio::test]
    async fn yields_unterminated_last_line() {
        let out = collect(vec![b": keep-alive\n", b"data: tail"]).await;
        let lines: Vec<String> = out.into_iter().map(|l| l.unwrap()).collect();
        assert_eq!(lines, vec![": keep-alive", "data: tail"]);
    }

    #[tokio::test]
    async fn keeps_multibyte_characters_split_between_chunks() {
        // "é" is 0xC3 0xA9
        let out = collect(vec![b"data: caf\xC3", b"\xA9\n"]).await;
        assert_eq!(out[0].as_ref().unwrap(), "data: café");
    }

    #[tokio::test]
    async fn surfaces_transport_errors() {
        let stream = futures_util::stream::iter(vec![
            Ok(Bytes::from_static(b"data: x\n")),
            Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset")),
        ]);
        let out: Vec<_> = body_lines(stream).collect().await;
        assert_eq!(out[0].as_ref().unwrap(), "data: x");
        assert!(matches!(out[1], Err(LlmError::StreamError(_))));
    }
}
