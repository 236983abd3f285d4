//! CLI tool for sheeet-ui - replays a captured compile response
//!
//! Feeds a saved newline-delimited JSON body through the same decoder the
//! browser uses and prints what the client would do with each line.
//!
//! Usage:
//!   sheeet_replay <response.ndjson>               # Replay in one chunk
//!   sheeet_replay <response.ndjson> --chunk 16    # Replay in 16-byte reads

#![allow(clippy::exit)]

use std::env;
use std::fs;
use std::io::{self, Write};

use sheeet_ui::compile::{CompileSession, StreamStep};

fn usage() -> ! {
    eprintln!("Usage: sheeet_replay <response.ndjson> [--chunk BYTES]");
    std::process::exit(1);
}

fn print_step(out: &mut impl Write, step: &StreamStep) -> io::Result<()> {
    match step {
        StreamStep::Log(line) => writeln!(out, "log      {line}"),
        StreamStep::Failed(message) => writeln!(out, "FAILED   {message}"),
        StreamStep::Ready(info) => writeln!(
            out,
            "READY    workspace={} js={} wasm={}",
            info.workspace_id, info.js_download_url, info.wasm_download_url
        ),
        StreamStep::Violation(raw) => writeln!(out, "unknown  {raw}"),
        StreamStep::Malformed(err) => writeln!(out, "bad line {err}"),
    }
}

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();
    let Some(input_path) = args.first() else {
        usage();
    };
    let chunk_size = match (args.get(1).map(String::as_str), args.get(2)) {
        (None, _) => None,
        (Some("--chunk"), Some(n)) => match n.parse::<usize>() {
            Ok(n) if n > 0 => Some(n),
            _ => usage(),
        },
        _ => usage(),
    };

    let data = match fs::read(input_path) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Error reading {input_path}: {e}");
            std::process::exit(1);
        }
    };

    let mut session = CompileSession::new();
    let mut steps = Vec::new();
    match chunk_size {
        Some(size) => {
            for chunk in data.chunks(size) {
                steps.extend(session.feed(chunk));
            }
        }
        None => steps.extend(session.feed(&data)),
    }
    steps.extend(session.finish());

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for step in &steps {
        if let Err(e) = print_step(&mut out, step) {
            eprintln!("Error writing output: {e}");
            std::process::exit(1);
        }
    }

    if !session.is_terminated() {
        eprintln!("stream ended without a result");
        std::process::exit(2);
    }
    if steps.iter().any(|s| matches!(s, StreamStep::Failed(_))) {
        std::process::exit(3);
    }
}
