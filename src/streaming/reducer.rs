//! Reduction of a streaming chat completion into a single answer.
//!
//! The body of a `stream: true` request to `/chat/completions` is a sequence
//! of lines. Only lines carrying the `data: ` prefix matter:
//!
//! ```text
//! data: {"choices":[{"delta":{"content":"Hel"}}]}
//! data: {"choices":[{"delta":{"content":"lo"}}]}
//! data: {"usage":{"total_tokens":5}}
//! data: [DONE]
//! ```
//!
//! reduces to `Reduction { content: "Hello", usage: Some({"total_tokens": 5}) }`.
//! Payloads that are not valid JSON are dropped without reporting.

use std::fmt;

use futures_util::{Stream, StreamExt};
use serde::Serialize;
use serde_json::Value;

use crate::error::LlmError;
use crate::types::Usage;

/// Prefix of every SSE line that carries a payload.
pub const DATA_PREFIX: &str = "data: ";

/// Payload signalling the normal end of the stream.
pub const DONE_MARKER: &str = "[DONE]";

/// Aggregated answer of one streaming completion.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Reduction {
    /// Concatenation of every `choices[0].delta.content` fragment, in arrival order
    pub content: String,
    /// Last non-null `usage` object seen before termination
    pub usage: Option<Usage>,
}

impl Reduction {
    /// True when no content and no usage were received.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty() && self.usage.is_none()
    }
}

/// What the caller should do after a line has been fed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOutcome {
    /// Keep reading.
    Continue,
    /// The terminator was seen; stop reading.
    Done,
}

/// Callback receiving each content fragment as it is appended.
pub type DeltaSink = Box<dyn FnMut(&str) + Send>;

/// Line-by-line reducer for OpenAI-compatible streaming responses.
///
/// The reducer owns its accumulator; once `[DONE]` has been fed every further
/// line is ignored.
#[derive(Default)]
pub struct StreamingChatReducer {
    result: Reduction,
    done: bool,
    sink: Option<DeltaSink>,
}

impl fmt::Debug for StreamingChatReducer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamingChatReducer")
            .field("result", &self.result)
            .field("done", &self.done)
            .field("sink", &self.sink.is_some())
            .finish()
    }
}

impl StreamingChatReducer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reducer that also forwards every appended fragment to `sink`.
    pub fn with_delta_sink(sink: impl FnMut(&str) + Send + 'static) -> Self {
        Self {
            sink: Some(Box::new(sink)),
            ..Self::default()
        }
    }

    /// Apply one line of the response body.
    pub fn feed_line(&mut self, line: &str) -> LineOutcome {
        if self.done {
            return LineOutcome::Done;
        }
        if line.trim().is_empty() {
            return LineOutcome::Continue;
        }
        let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
            return LineOutcome::Continue;
        };
        if payload == DONE_MARKER {
            self.done = true;
            return LineOutcome::Done;
        }

        match serde_json::from_str::<Value>(payload) {
            Ok(chunk) => self.apply_chunk(&chunk),
            Err(e) => {
                tracing::trace!(target: "llmcall::stream", error = %e, "dropping malformed chunk");
            }
        }
        LineOutcome::Continue
    }

    fn apply_chunk(&mut self, chunk: &Value) {
        if let Some(fragment) = chunk
            .pointer("/choices/0/delta/content")
            .and_then(Value::as_str)
        {
            if let Some(sink) = self.sink.as_mut() {
                sink(fragment);
            }
            self.result.content.push_str(fragment);
        }

        match chunk.get("usage") {
            Some(Value::Object(usage)) => self.result.usage = Some(usage.clone()),
            Some(Value::Null) | None => {}
            Some(other) => {
                tracing::trace!(target: "llmcall::stream", usage = %other, "ignoring non-object usage");
            }
        }
    }

    /// Whether the terminator has been seen.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Result accumulated so far.
    pub fn current(&self) -> &Reduction {
        &self.result
    }

    pub fn finish(self) -> Reduction {
        self.result
    }

    /// Feed lines until `[DONE]` or the end of the input.
    ///
    /// Lines after the terminator are not pulled from the iterator.
    pub fn reduce_lines<I, S>(mut self, lines: I) -> Reduction
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for line in lines {
            if self.feed_line(line.as_ref()) == LineOutcome::Done {
                break;
            }
        }
        self.finish()
    }

    /// Feed lines from an async stream until `[DONE]` or the end of the stream.
    ///
    /// A read error ends consumption and is returned; nothing after the
    /// terminator is polled.
    pub async fn reduce_stream<S>(mut self, mut lines: S) -> Result<Reduction, LlmError>
    where
        S: Stream<Item = Result<String, LlmError>> + Unpin,
    {
        while let Some(line) = lines.next().await {
            if self.feed_line(&line?) == LineOutcome::Done {
                break;
            }
        }
        Ok(self.finish())
    }
}

/// Reduce a complete sequence of lines without a delta sink.
pub fn reduce_lines<I, S>(lines: I) -> Reduction
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    StreamingChatReducer::new().reduce_lines(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    fn delta(content: &str) -> String {
        format!(
            "data: {}",
            json!({"choices": [{"index": 0, "delta": {"content": content}}]})
        )
    }

    #[test]
    fn concatenates_fragments_and_keeps_usage() {
        let lines = [
            r#"data: {"choices":[{"delta":{"content":"Hel"}}]}"#,
            r#"data: {"choices":[{"delta":{"content":"lo"}}]}"#,
            r#"data: {"usage":{"total_tokens":5}}"#,
            "data: [DONE]",
        ];
        let out = reduce_lines(lines);
        assert_eq!(out.content, "Hello");
        assert_eq!(
            Value::Object(out.usage.unwrap()),
            json!({"total_tokens": 5})
        );
    }

    #[test]
    fn garbage_and_invalid_json_contribute_nothing() {
        let out = reduce_lines(["garbage", "data: not-json", "data: [DONE]"]);
        assert_eq!(out, Reduction::default());
        assert!(out.is_empty());
    }

    #[test]
    fn usage_absent_when_never_reported() {
        let out = reduce_lines([delta("a"), delta("b"), "data: [DONE]".to_string()]);
        assert_eq!(out.content, "ab");
        assert!(out.usage.is_none());
    }

    #[test]
    fn last_usage_wins_and_null_does_not_clear_it() {
        let out = reduce_lines([
            r#"data: {"choices":[],"usage":{"total_tokens":1}}"#,
            r#"data: {"choices":[{"delta":{"content":"x"}}],"usage":{"total_tokens":7,"prompt_tokens":2}}"#,
            r#"data: {"choices":[{"delta":{}}],"usage":null}"#,
            "data: [DONE]",
        ]);
        let usage = out.usage.unwrap();
        assert_eq!(usage["total_tokens"], 7);
        assert_eq!(usage["prompt_tokens"], 2);
    }

    #[test]
    fn null_and_missing_content_are_skipped() {
        let out = reduce_lines([
            r#"data: {"choices":[{"delta":{"role":"assistant","content":null}}]}"#,
            r#"data: {"choices":[{"delta":{"content":"ok"}}]}"#,
            r#"data: {"choices":[{"delta":{},"finish_reason":"stop"}]}"#,
        ]);
        assert_eq!(out.content, "ok");
    }

    #[test]
    fn fragments_are_appended_verbatim() {
        let out = reduce_lines([delta("  leading"), delta("\n"), delta("trailing  ")]);
        assert_eq!(out.content, "  leading\ntrailing  ");
    }

    #[test]
    fn non_object_usage_keeps_previous_object() {
        let out = reduce_lines([
            r#"data: {"usage":{"total_tokens":4}}"#,
            r#"data: {"usage":"n/a"}"#,
            r#"data: {"usage":12}"#,
            "data: [DONE]",
        ]);
        assert_eq!(out.usage.unwrap()["total_tokens"], 4);

        let out = reduce_lines([r#"data: {"usage":[1,2]}"#, "data: [DONE]"]);
        assert!(out.usage.is_none());
    }

    #[test]
    fn ignores_blank_comment_and_unprefixed_lines() {
        let out = reduce_lines([
            "",
            "   ",
            ": OPENROUTER PROCESSING",
            "event: message",
            r#"data:{"choices":[{"delta":{"content":"no-space"}}]}"#,
            delta("kept").as_str(),
        ]);
        assert_eq!(out.content, "kept");
    }

    #[test]
    fn stops_pulling_lines_after_done() {
        let lines = vec![
            delta("first"),
            "data: [DONE]".to_string(),
            delta("after"),
            r#"data: {"usage":{"total_tokens":99}}"#.to_string(),
        ];
        let mut iter = lines.into_iter();
        let out = StreamingChatReducer::new().reduce_lines(iter.by_ref());
        assert_eq!(out.content, "first");
        assert!(out.usage.is_none());
        assert_eq!(iter.count(), 2);
    }

    #[test]
    fn feed_after_done_is_ignored() {
        let mut reducer = StreamingChatReducer::new();
        assert_eq!(reducer.feed_line(&delta("a")), LineOutcome::Continue);
        assert_eq!(reducer.feed_line("data: [DONE]"), LineOutcome::Done);
        assert!(reducer.is_done());
        assert_eq!(reducer.feed_line(&delta("b")), LineOutcome::Done);
        assert_eq!(reducer.current().content, "a");
    }

    #[test]
    fn stream_end_without_terminator_finalizes() {
        let out = reduce_lines([delta("par"), delta("tial")]);
        assert_eq!(out.content, "partial");
    }

    #[test]
    fn delta_sink_sees_every_fragment() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink_seen = seen.clone();
        let reducer = StreamingChatReducer::with_delta_sink(move |frag| {
            sink_seen.lock().unwrap().push(frag.to_string());
        });
        let out = reducer.reduce_lines([delta("a"), "data: nope".to_string(), delta("b")]);
        assert_eq!(out.content, "ab");
        assert_eq!(*seen.lock().unwrap(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn reduce_stream_stops_at_done() {
        let items: Vec<Result<String, LlmError>> = vec![
            Ok(delta("x")),
            Ok("data: [DONE]".to_string()),
            Err(LlmError::StreamError("must not be polled".into())),
        ];
        let out = StreamingChatReducer::new()
            .reduce_stream(futures_util::stream::iter(items))
            .await
            .unwrap();
        assert_eq!(out.content, "x");
    }

    #[tokio::test]
    async fn reduce_stream_propagates_read_errors() {
        let items: Vec<Result<String, LlmError>> = vec![
            Ok(delta("x")),
            Err(LlmError::StreamError("connection reset".into())),
        ];
        let err = StreamingChatReducer::new()
            .reduce_stream(futures_util::stream::iter(items))
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::StreamError(_)));
    }
}
