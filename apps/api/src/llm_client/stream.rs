//! Server-sent event decoding for streamed chat completions.
//!
//! The provider sends one `data:` event per completion chunk and finishes with
//! `data: [DONE]`. [`SseDecoder`] turns raw byte chunks into event payloads;
//! [`FragmentStream`] turns payloads into text fragments.

#[cfg(test)]
use std::collections::VecDeque;

use bytes::Bytes;
use serde::Deserialize;
use thiserror::Error;

use super::LlmError;

const DONE_SENTINEL: &str = "[DONE]";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StreamError {
    #[error("event payload is not valid UTF-8")]
    InvalidUtf8,
}

/// Incremental decoder for a `text/event-stream` body.
///
/// Only `data` fields are surfaced. Comment lines and other fields are
/// skipped, and both LF and CRLF line endings are accepted.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buf: Vec<u8>,
    data_lines: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Returns the payload of the next complete event, or `None` when more
    /// bytes are needed.
    pub fn next_event(&mut self) -> Result<Option<String>, StreamError> {
        while let Some(eol) = self.buf.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.buf.drain(..=eol).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }

            if line.is_empty() {
                if self.data_lines.is_empty() {
                    continue;
                }
                return Ok(Some(self.take_data()));
            }

            let line = String::from_utf8(line).map_err(|_| StreamError::InvalidUtf8)?;
            if line.starts_with(':') {
                continue;
            }

            let (field, value) = match line.split_once(':') {
                Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
                None => (line.as_str(), ""),
            };
            if field == "data" {
                self.data_lines.push(value.to_string());
            }
        }

        Ok(None)
    }

    /// Flushes an event left unterminated when the body ended.
    pub fn finish(&mut self) -> Result<Option<String>, StreamError> {
        if !self.buf.is_empty() {
            self.buf.push(b'\n');
            if let Some(event) = self.next_event()? {
                return Ok(Some(event));
            }
        }
        if self.data_lines.is_empty() {
            return Ok(None);
        }
        Ok(Some(self.take_data()))
    }

    fn take_data(&mut self) -> String {
        let data = self.data_lines.join("\n");
        self.data_lines.clear();
        data
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChunk {
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    delta: Delta,
}

#[derive(Debug, Deserialize)]
struct Delta {
    content: Option<String>,
}

enum ChunkEvent {
    Fragment(String),
    Skip,
    Done,
}

fn parse_event(data: &str) -> Result<ChunkEvent, LlmError> {
    if data.trim() == DONE_SENTINEL {
        return Ok(ChunkEvent::Done);
    }
    let chunk: ChatCompletionChunk = serde_json::from_str(data)?;
    let fragment = chunk
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.delta.content)
        .filter(|s| !s.is_empty());
    Ok(fragment.map_or(ChunkEvent::Skip, ChunkEvent::Fragment))
}

enum ChunkSource {
    Response(reqwest::Response),
    #[cfg(test)]
    Buffered(VecDeque<Bytes>),
}

impl ChunkSource {
    async fn next_chunk(&mut self) -> Result<Option<Bytes>, LlmError> {
        match self {
            ChunkSource::Response(response) => Ok(response.chunk().await?),
            #[cfg(test)]
            ChunkSource::Buffered(chunks) => Ok(chunks.pop_front()),
        }
    }
}

/// Pull-based sequence of reply fragments, in the order the provider sent them.
pub struct FragmentStream {
    source: ChunkSource,
    decoder: SseDecoder,
    finished: bool,
}

impl FragmentStream {
    pub fn from_response(response: reqwest::Response) -> Self {
        Self::new(ChunkSource::Response(response))
    }

    #[cfg(test)]
    fn from_chunks(chunks: &[&'static str]) -> Self {
        Self::new(ChunkSource::Buffered(
            chunks
                .iter()
                .map(|c| Bytes::from_static(c.as_bytes()))
                .collect(),
        ))
    }

    fn new(source: ChunkSource) -> Self {
        Self {
            source,
            decoder: SseDecoder::new(),
            finished: false,
        }
    }

    /// Next non-empty fragment, or `None` once the stream is over.
    pub async fn next_fragment(&mut self) -> Result<Option<String>, LlmError> {
        while !self.finished {
            if let Some(data) = self.decoder.next_event()? {
                if let Some(fragment) = self.handle_event(&data)? {
                    return Ok(Some(fragment));
                }
                continue;
            }

            match self.source.next_chunk().await? {
                Some(bytes) => self.decoder.push(&bytes),
                None => {
                    self.finished = true;
                    if let Some(data) = self.decoder.finish()? {
                        return self.handle_event(&data);
                    }
                }
            }
        }
        Ok(None)
    }

    fn handle_event(&mut self, data: &str) -> Result<Option<String>, LlmError> {
        match parse_event(data)? {
            ChunkEvent::Fragment(fragment) => Ok(Some(fragment)),
            ChunkEvent::Skip => Ok(None),
            ChunkEvent::Done => {
                self.finished = true;
                Ok(None)
            }
        }
    }

    /// Drains the stream and concatenates every fragment.
    pub async fn collect_text(mut self) -> Result<String, LlmError> {
        let mut text = String::new();
        while let Some(fragment) = self.next_fragment().await? {
            text.push_str(&fragment);
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decoder_yields_events_in_order() {
        let mut decoder = SseDecoder::new();
        decoder.push(b"data: hello\n\ndata: bye\n\n");
        assert_eq!(decoder.next_event().unwrap().as_deref(), Some("hello"));
        assert_eq!(decoder.next_event().unwrap().as_deref(), Some("bye"));
        assert_eq!(decoder.next_event().unwrap(), None);
    }

    #[test]
    fn test_decoder_handles_split_chunks_and_crlf() {
        let mut decoder = SseDecoder::new();
        decoder.push(b"data:");
        assert_eq!(decoder.next_event().unwrap(), None);
        decoder.push(b" hel");
        decoder.push(b"lo\r\n");
        assert_eq!(decoder.next_event().unwrap(), None);
        decoder.push(b"\r\n");
        assert_eq!(decoder.next_event().unwrap().as_deref(), Some("hello"));
    }

    #[test]
    fn test_decoder_skips_comments_and_other_fields() {
        let mut decoder = SseDecoder::new();
        decoder.push(b": ping\n\nevent: message\nid: 7\ndata: payload\n\n");
        assert_eq!(decoder.next_event().unwrap().as_deref(), Some("payload"));
    }

    #[test]
    fn test_decoder_joins_multiline_data() {
        let mut decoder = SseDecoder::new();
        decoder.push(b"data: first\ndata: second\n\n");
        assert_eq!(decoder.next_event().unwrap().as_deref(), Some("first\nsecond"));
    }

    #[test]
    fn test_decoder_keeps_multibyte_text_split_across_chunks() {
        let text = "data: ✅ done\n\n".as_bytes();
        let mut decoder = SseDecoder::new();
        decoder.push(&text[..7]);
        decoder.push(&text[7..]);
        assert_eq!(decoder.next_event().unwrap().as_deref(), Some("✅ done"));
    }

    #[test]
    fn test_decoder_finish_flushes_unterminated_event() {
        let mut decoder = SseDecoder::new();
        decoder.push(b"data: tail");
        assert_eq!(decoder.next_event().unwrap(), None);
        assert_eq!(decoder.finish().unwrap().as_deref(), Some("tail"));
        assert_eq!(decoder.finish().unwrap(), None);
    }

    #[test]
    fn test_decoder_rejects_invalid_utf8() {
        let mut decoder = SseDecoder::new();
        decoder.push(b"data: \xff\xfe\n\n");
        assert_eq!(decoder.next_event(), Err(StreamError::InvalidUtf8));
    }

    #[tokio::test]
    async fn test_fragments_are_concatenated_losslessly() {
        let stream = FragmentStream::from_chunks(&[
            "data: {\"choices\":[{\"delta\":{\"content\":\"### ✅ What\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"'s Good\\n\"}}]}\n",
            "\ndata: {\"choices\":[{\"delta\":{}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"- clear\"}}]}\n\ndata: [DONE]\n\n",
        ]);
        let text = stream.collect_text().await.unwrap();
        assert_eq!(text, "### ✅ What's Good\n- clear");
    }

    #[tokio::test]
    async fn test_nothing_is_read_after_done() {
        let stream = FragmentStream::from_chunks(&[
            "data: {\"choices\":[{\"delta\":{\"content\":\"a\"}}]}\n\ndata: [DONE]\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"b\"}}]}\n\n",
        ]);
        assert_eq!(stream.collect_text().await.unwrap(), "a");
    }

    #[tokio::test]
    async fn test_stream_without_done_ends_at_body_end() {
        let stream = FragmentStream::from_chunks(&[
            "data: {\"choices\":[{\"delta\":{\"content\":\"x\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"y\"}}]}",
        ]);
        assert_eq!(stream.collect_text().await.unwrap(), "xy");
    }

    #[tokio::test]
    async fn test_malformed_chunk_is_an_error() {
        let stream = FragmentStream::from_chunks(&["data: {not json}\n\n"]);
        assert!(matches!(
            stream.collect_text().await,
            Err(LlmError::Parse(_))
        ));
    }
}
