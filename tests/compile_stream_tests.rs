//! Tests for decoding a whole compile response as the browser receives it.
//!
//! Each body is replayed through [`CompileSession`] in chunks of several
//! sizes; the decoded steps must not depend on where the network split it.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]

use sheeet_ui::compile::{
    compile_url, CompileRequest, CompileSession, DownloadInfo, StreamStep,
};
use sheeet_ui::error::SheeetError;
use test_case::test_case;

const SUCCESS_BODY: &str = concat!(
    "data: {\"log\":\"Resolving dependencies\"}\n",
    "{\"stdout_line\":\"   Compiling user v0.1.0\"}\r\n",
    "\n",
    "data: {\"stderr_line\":\"warning: unused variable: `x`\"}\n",
    "{\"download_info\":{\"js_download_url\":\"/download/ws-1/user.js\",",
    "\"wasm_download_url\":\"/download/ws-1/user_bg.wasm\",\"workspace_id\":\"ws-1\"}}\n",
    "{\"log\":\"after the end\"}\n",
);

const FAILURE_BODY: &str = concat!(
    "{\"stdout_line\":\"   Compiling user v0.1.0\"}\n",
    "{\"stderr_line\":\"error[E0425]: cannot find value `y`\"}\n",
    "{\"error\":\"build failed\"}\n",
);

/// Replay `body` in `chunk`-byte reads and collect every step.
fn replay(body: &str, chunk: usize) -> (Vec<StreamStep>, CompileSession) {
    let mut session = CompileSession::new();
    let mut steps = Vec::new();
    for piece in body.as_bytes().chunks(chunk) {
        steps.extend(session.feed(piece));
    }
    steps.extend(session.finish());
    (steps, session)
}

fn describe(steps: &[StreamStep]) -> Vec<String> {
    steps
        .iter()
        .map(|step| match step {
            StreamStep::Log(line) => format!("log {line}"),
            StreamStep::Failed(message) => format!("failed {message}"),
            StreamStep::Ready(info) => format!("ready {}", info.workspace_id),
            StreamStep::Violation(raw) => format!("unknown {raw}"),
            StreamStep::Malformed(err) => format!("malformed {err}"),
        })
        .collect()
}

#[test_case(1 ; "byte by byte")]
#[test_case(7 ; "small reads")]
#[test_case(64 ; "medium reads")]
#[test_case(4096 ; "single read")]
fn test_success_body_any_chunking(chunk: usize) {
    let (steps, session) = replay(SUCCESS_BODY, chunk);
    assert!(session.is_terminated());
    assert_eq!(
        describe(&steps),
        vec![
            "log Resolving dependencies",
            "log    Compiling user v0.1.0",
            "log warning: unused variable: `x`",
            "ready ws-1",
        ]
    );
    match steps.last() {
        Some(StreamStep::Ready(info)) => assert_eq!(
            *info,
            DownloadInfo {
                js_download_url: "/download/ws-1/user.js".into(),
                wasm_download_url: "/download/ws-1/user_bg.wasm".into(),
                workspace_id: "ws-1".into(),
            }
        ),
        other => panic!("expected ready, got {other:?}"),
    }
}

#[test_case(1 ; "byte by byte")]
#[test_case(4096 ; "single read")]
fn test_failure_body_stops_at_error(chunk: usize) {
    let (steps, session) = replay(FAILURE_BODY, chunk);
    assert!(session.is_terminated());
    assert_eq!(
        describe(&steps),
        vec![
            "log    Compiling user v0.1.0",
            "log error[E0425]: cannot find value `y`",
            "failed build failed",
        ]
    );
}

#[test]
fn test_download_info_split_mid_key() {
    let split = SUCCESS_BODY.find("download_info").unwrap() + 4;
    let (head, tail) = SUCCESS_BODY.split_at(split);

    let mut session = CompileSession::new();
    let first = session.feed(head.as_bytes());
    assert_eq!(first.len(), 3);
    assert!(!session.is_terminated());

    let second = session.feed(tail.as_bytes());
    assert_eq!(describe(&second), vec!["ready ws-1"]);
    assert!(session.finish().is_empty());
}

#[test]
fn test_unterminated_final_line_is_parsed() {
    let body = "{\"log\":\"one\"}\n{\"error\":\"no newline\"}";
    let (steps, session) = replay(body, 5);
    assert_eq!(describe(&steps), vec!["log one", "failed no newline"]);
    assert!(session.is_terminated());
}

#[test]
fn test_stream_without_result_is_not_terminated() {
    let (steps, session) = replay("{\"log\":\"one\"}\n{\"progress\":1}\n", 3);
    assert!(!session.is_terminated());
    assert_eq!(
        describe(&steps),
        vec!["log one", "unknown {\"progress\":1}"]
    );
}

#[test]
fn test_garbage_line_does_not_end_session() {
    let (steps, session) = replay("not json\n{\"error\":\"boom\"}\n", 4096);
    assert!(matches!(steps[0], StreamStep::Malformed(SheeetError::Stream(_))));
    assert!(matches!(&steps[1], StreamStep::Failed(m) if m == "boom"));
    assert!(session.is_terminated());
}

#[test]
fn test_request_body_fields() {
    let body = serde_json::to_value(CompileRequest {
        lib_rs: "pub fn f() {}",
        cargo_toml: "[package]",
    })
    .unwrap();
    assert_eq!(
        body,
        serde_json::json!({"lib_rs": "pub fn f() {}", "cargo_toml": "[package]"})
    );
}

#[test_case("/api", None, "/api/compile")]
#[test_case("http://localhost:8080/api/", Some("ws-1"), "http://localhost:8080/api/compile?workspace_id=ws-1")]
#[test_case("/api", Some(""), "/api/compile")]
#[test_case("/api", Some("a b&c"), "/api/compile?workspace_id=a+b%26c")]
fn test_compile_url(base: &str, workspace: Option<&str>, expected: &str) {
    assert_eq!(compile_url(base, workspace), expected);
}
