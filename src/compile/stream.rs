//! Incremental decoding of the compile response body.
//!
//! Network chunks split lines (and multi-byte characters) arbitrarily. The
//! [`LineBuffer`] carries the unterminated tail across reads; since `\n`
//! never occurs inside a UTF-8 sequence, every completed line is whole text.

use super::protocol::{parse_event_line, CompileEvent, DownloadInfo};
use crate::error::{Result, SheeetError};

/// Carry-over buffer that turns byte chunks into complete lines.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

fn decode_line(mut bytes: Vec<u8>) -> Result<String> {
    if bytes.last() == Some(&b'\r') {
        bytes.pop();
    }
    String::from_utf8(bytes).map_err(|e| SheeetError::Stream(format!("invalid UTF-8: {e}")))
}

impl LineBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return every line it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Result<String>> {
        self.pending.extend_from_slice(chunk);
        let mut lines = Vec::new();
        while let Some(end) = self.pending.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.pending.drain(..=end).collect();
            line.pop();
            lines.push(decode_line(line));
        }
        lines
    }

    /// Take the unterminated tail at end of stream, if any.
    pub fn finish(&mut self) -> Option<Result<String>> {
        if self.pending.is_empty() {
            return None;
        }
        Some(decode_line(std::mem::take(&mut self.pending)))
    }

    /// Bytes waiting for their newline.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

/// What the client should do for one decoded line.
#[derive(Debug)]
pub enum StreamStep {
    /// Prepend to the log panel.
    Log(String),
    /// Terminal failure reported by the service.
    Failed(String),
    /// Terminal success: load the artifact.
    Ready(DownloadInfo),
    /// Well-formed event of unknown shape; logged, not fatal.
    Violation(String),
    /// Line that could not be decoded; surfaced, not fatal.
    Malformed(SheeetError),
}

/// Dispatch state for one compile response.
///
/// After a terminal event every further byte is ignored.
#[derive(Debug, Default)]
pub struct CompileSession {
    lines: LineBuffer,
    terminated: bool,
}

impl CompileSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Feed one network chunk.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<StreamStep> {
        if self.terminated {
            return Vec::new();
        }
        let lines = self.lines.push(chunk);
        self.dispatch(lines)
    }

    /// Flush the trailing unterminated line at end of stream.
    pub fn finish(&mut self) -> Vec<StreamStep> {
        if self.terminated {
            return Vec::new();
        }
        let tail = self.lines.finish().into_iter().collect();
        self.dispatch(tail)
    }

    fn dispatch(&mut self, lines: Vec<Result<String>>) -> Vec<StreamStep> {
        let mut steps = Vec::new();
        for line in lines {
            let event = match line.and_then(|line| parse_event_line(&line)) {
                Ok(Some(event)) => event,
                Ok(None) => continue,
                Err(err) => {
                    steps.push(StreamStep::Malformed(err));
                    continue;
                }
            };
            let step = match event {
                CompileEvent::Stdout(text) | CompileEvent::Stderr(text) | CompileEvent::Log(text) => {
                    StreamStep::Log(text)
                }
                CompileEvent::Unrecognized(raw) => StreamStep::Violation(raw),
                CompileEvent::Error(message) => StreamStep::Failed(message),
                CompileEvent::DownloadInfo(info) => StreamStep::Ready(info),
            };
            let terminal = matches!(step, StreamStep::Failed(_) | StreamStep::Ready(_));
            steps.push(step);
            if terminal {
                self.terminated = true;
                break;
            }
        }
        steps
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;

    fn logs(steps: &[StreamStep]) -> Vec<&str> {
        steps
            .iter()
            .filter_map(|s| match s {
                StreamStep::Log(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_line_buffer_carries_partial_line() {
        let mut buffer = LineBuffer::new();
        assert!(buffer.push(b"abc").is_empty());
        assert_eq!(buffer.pending_len(), 3);
        let lines: Vec<String> = buffer.push(b"def\r\nxy\n").into_iter().map(Result::unwrap).collect();
        assert_eq!(lines, vec!["abcdef", "xy"]);
        assert_eq!(buffer.pending_len(), 0);
        assert!(buffer.finish().is_none());
    }

    #[test]
    fn test_line_buffer_split_multibyte_char() {
        let text = "é\n".as_bytes();
        let mut buffer = LineBuffer::new();
        assert!(buffer.push(&text[..1]).is_empty());
        let lines = buffer.push(&text[1..]);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].as_ref().unwrap(), "é");
    }

    #[test]
    fn test_invalid_utf8_is_malformed() {
        let mut session = CompileSession::new();
        let steps = session.feed(b"\xff\xfe\n{\"log\":\"ok\"}\n");
        assert!(matches!(steps[0], StreamStep::Malformed(SheeetError::Stream(_))));
        assert_eq!(logs(&steps), vec!["ok"]);
    }

    #[test]
    fn test_download_info_split_across_chunks() {
        let mut session = CompileSession::new();
        let first = session.feed(b"{\"log\":\"building\"}\n{\"download");
        assert_eq!(logs(&first), vec!["building"]);
        assert_eq!(first.len(), 1);

        let second = session.feed(
            b"_info\":{\"js_download_url\":\"/a.js\",\"wasm_download_url\":\"/a.wasm\",\"workspace_id\":\"w\"}}\n",
        );
        assert_eq!(second.len(), 1);
        match &second[0] {
            StreamStep::Ready(info) => {
                assert_eq!(info.js_download_url, "/a.js");
                assert_eq!(info.wasm_download_url, "/a.wasm");
                assert_eq!(info.workspace_id, "w");
            }
            other => panic!("expected Ready, got {other:?}"),
        }
        assert!(session.is_terminated());
    }

    #[test]
    fn test_error_stops_processing() {
        let mut session = CompileSession::new();
        let steps = session.feed(b"data: {\"stderr_line\":\"e1\"}\ndata: {\"error\":\"failed\"}\ndata: {\"log\":\"late\"}\n");
        assert_eq!(steps.len(), 2);
        assert!(matches!(&steps[1], StreamStep::Failed(m) if m == "failed"));
        assert!(session.feed(b"{\"log\":\"later\"}\n").is_empty());
        assert!(session.finish().is_empty());
    }

    #[test]
    fn test_violation_and_malformed_are_not_fatal() {
        let mut session = CompileSession::new();
        let steps = session.feed(b"{\"unknown\":1}\nnot json\n\n{\"stdout_line\":\"still here\"}\n");
        assert_eq!(steps.len(), 3);
        assert!(matches!(&steps[0], StreamStep::Violation(raw) if raw == "{\"unknown\":1}"));
        assert!(matches!(steps[1], StreamStep::Malformed(_)));
        assert_eq!(logs(&steps), vec!["still here"]);
        assert!(!session.is_terminated());
    }

    #[test]
    fn test_finish_parses_unterminated_tail() {
        let mut session = CompileSession::new();
        assert!(session.feed(b"{\"log\":\"tail\"}").is_empty());
        let steps = session.finish();
        assert_eq!(logs(&steps), vec!["tail"]);
    }

    #[test]
    fn test_log_order_preserved() {
        let mut session = CompileSession::new();
        let mut all = Vec::new();
        for chunk in [&b"{\"log\":\"1\"}\n{\"lo"[..], b"g\":\"2\"}\n{\"stdout_line\":\"3\"}", b"\n"] {
            all.extend(session.feed(chunk));
        }
        assert_eq!(logs(&all), vec!["1", "2", "3"]);
    }
}
