//! Wire types for `PUT {base}/compile`.
//!
//! The response body is a sequence of newline-terminated JSON objects, each
//! optionally framed with a `data: ` prefix. Every object carries exactly one
//! of `stdout_line`, `stderr_line`, `log`, `error` or `download_info`.

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use crate::error::{Result, SheeetError};

/// Optional framing in front of each event line.
pub const DATA_PREFIX: &str = "data: ";

/// Request body: the two editor buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CompileRequest<'a> {
    pub lib_rs: &'a str,
    pub cargo_toml: &'a str,
}

/// Where to fetch the compiled artifact from, relative to the API base URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadInfo {
    pub js_download_url: String,
    pub wasm_download_url: String,
    pub workspace_id: String,
}

/// One decoded stream event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileEvent {
    Stdout(String),
    Stderr(String),
    Log(String),
    /// Terminal failure.
    Error(String),
    /// Terminal success.
    DownloadInfo(DownloadInfo),
    /// A well-formed object with none of the known fields. Holds the line.
    Unrecognized(String),
}

impl CompileEvent {
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Error(_) | Self::DownloadInfo(_))
    }
}

#[derive(Deserialize)]
struct RawEvent {
    stdout_line: Option<String>,
    stderr_line: Option<String>,
    log: Option<String>,
    error: Option<String>,
    download_info: Option<DownloadInfo>,
}

/// Strip the optional `data: ` framing.
#[must_use]
pub fn strip_data_prefix(line: &str) -> &str {
    line.strip_prefix(DATA_PREFIX).unwrap_or(line)
}

/// Decode one complete line. Blank lines yield `Ok(None)`.
///
/// # Errors
/// Returns [`SheeetError::Stream`] if the line is not valid JSON or a known
/// field has the wrong shape.
pub fn parse_event_line(line: &str) -> Result<Option<CompileEvent>> {
    let payload = strip_data_prefix(line.trim_end_matches('\r'));
    if payload.trim().is_empty() {
        return Ok(None);
    }

    let value: serde_json::Value = serde_json::from_str(payload)
        .map_err(|e| SheeetError::Stream(format!("{e}: {payload}")))?;
    if !value.is_object() {
        return Ok(Some(CompileEvent::Unrecognized(payload.to_string())));
    }
    let raw: RawEvent = serde_json::from_value(value)
        .map_err(|e| SheeetError::Stream(format!("{e}: {payload}")))?;

    let event = if let Some(line) = raw.stdout_line {
        CompileEvent::Stdout(line)
    } else if let Some(line) = raw.stderr_line {
        CompileEvent::Stderr(line)
    } else if let Some(line) = raw.log {
        CompileEvent::Log(line)
    } else if let Some(message) = raw.error {
        CompileEvent::Error(message)
    } else if let Some(info) = raw.download_info {
        CompileEvent::DownloadInfo(info)
    } else {
        CompileEvent::Unrecognized(payload.to_string())
    };
    Ok(Some(event))
}

/// `{base}/compile`, with the remembered workspace when there is one.
///
/// The base may be relative (`/api`), so only the query value is encoded,
/// `application/x-www-form-urlencoded` style.
#[must_use]
pub fn compile_url(base: &str, workspace_id: Option<&str>) -> String {
    let base = base.trim_end_matches('/');
    match workspace_id {
        Some(id) if !id.is_empty() => {
            let id: String = form_urlencoded::byte_serialize(id.as_bytes()).collect();
            format!("{base}/compile?workspace_id={id}")
        }
        _ => format!("{base}/compile"),
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
    use test_case::test_case;

    #[test_case(r#"{"stdout_line":"Compiling"}"#, CompileEvent::Stdout("Compiling".into()))]
    #[test_case(r#"data: {"stderr_line":"warning"}"#, CompileEvent::Stderr("warning".into()))]
    #[test_case(r#"data: {"log":"building"}"#, CompileEvent::Log("building".into()))]
    #[test_case(r#"{"error":"exit status 101"}"#, CompileEvent::Error("exit status 101".into()))]
    #[test_case(r#"{"progress":42}"#, CompileEvent::Unrecognized(r#"{"progress":42}"#.into()))]
    #[test_case("data: [1,2]", CompileEvent::Unrecognized("[1,2]".into()))]
    fn test_parse_event(line: &str, expected: CompileEvent) {
        assert_eq!(parse_event_line(line).unwrap(), Some(expected));
    }

    #[test]
    fn test_parse_download_info() {
        let line = r#"data: {"download_info":{"js_download_url":"/download/ws1/lib.js","wasm_download_url":"/download/ws1/lib_bg.wasm","workspace_id":"ws1"}}"#;
        let event = parse_event_line(line).unwrap().unwrap();
        assert!(event.is_terminal());
        assert_eq!(
            event,
            CompileEvent::DownloadInfo(DownloadInfo {
                js_download_url: "/download/ws1/lib.js".into(),
                wasm_download_url: "/download/ws1/lib_bg.wasm".into(),
                workspace_id: "ws1".into(),
            })
        );
    }

    #[test]
    fn test_blank_lines_skipped() {
        assert_eq!(parse_event_line("").unwrap(), None);
        assert_eq!(parse_event_line("\r").unwrap(), None);
        assert_eq!(parse_event_line("data: ").unwrap(), None);
    }

    #[test]
    fn test_malformed_lines() {
        assert!(matches!(parse_event_line("{\"log\":"), Err(SheeetError::Stream(_))));
        assert!(matches!(
            parse_event_line(r#"{"download_info":{"workspace_id":"x"}}"#),
            Err(SheeetError::Stream(_))
        ));
        assert!(matches!(parse_event_line(r#"{"log":7}"#), Err(SheeetError::Stream(_))));
    }

    #[test]
    fn test_compile_url() {
        assert_eq!(compile_url("http://localhost:8080/api", None), "http://localhost:8080/api/compile");
        assert_eq!(compile_url("/api/", Some("")), "/api/compile");
        assert_eq!(
            compile_url("/api", Some("ab12-x y")),
            "/api/compile?workspace_id=ab12-x+y"
        );
        assert_eq!(
            compile_url("/api", Some("a&b=c/d")),
            "/api/compile?workspace_id=a%26b%3Dc%2Fd"
        );
    }

    #[test]
    fn test_request_body() {
        let body = serde_json::to_string(&CompileRequest {
            lib_rs: "fn f() {}",
            cargo_toml: "[package]",
        })
        .unwrap();
        assert_eq!(body, r#"{"lib_rs":"fn f() {}","cargo_toml":"[package]"}"#);
    }
}
