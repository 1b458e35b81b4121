// src/console.rs

//! Terminal side of the CLI: confirmation prompts and event rendering.

use std::future::Future;
use std::io::{self, BufRead, Write};
use std::pin::Pin;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::warn;

use crate::exec::{ConfirmDecision, ConfirmReason, ConfirmRequest, ExecutionEvent, ExecutionRef};

/// Asks on stderr and reads the answer from stdin. Anything but `y`/`yes`
/// declines.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalConfirm;

impl ConfirmDecision for TerminalConfirm {
    fn confirm(&self, request: ConfirmRequest) -> Pin<Box<dyn Future<Output = bool> + Send + '_>> {
        Box::pin(async move {
            let question = confirm_question(&request);
            match tokio::task::spawn_blocking(move || ask(&question)).await {
                Ok(Ok(answer)) => answer,
                Ok(Err(err)) => {
                    warn!(command = %request.command_id, error = %err, "reading confirmation failed");
                    false
                }
                Err(err) => {
                    warn!(command = %request.command_id, error = %err, "confirmation task failed");
                    false
                }
            }
        })
    }
}

fn confirm_question(request: &ConfirmRequest) -> String {
    match request.reason {
        ConfirmReason::Dangerous(what) => format!(
            "{} looks dangerous ({what}):\n  {}\nRun it anyway?",
            request.label, request.command
        ),
        ConfirmReason::Requested => {
            format!("Run {}?\n  {}\n", request.label, request.command)
        }
    }
}

fn ask(question: &str) -> io::Result<bool> {
    let mut stderr = io::stderr().lock();
    write!(stderr, "{question} [y/N] ")?;
    stderr.flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(is_yes(&line))
}

pub(crate) fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

#[derive(Serialize)]
struct JsonLine<'a> {
    #[serde(flatten)]
    execution: &'a ExecutionRef,
    #[serde(flatten)]
    event: &'a ExecutionEvent,
}

/// Write one event as a JSON line on stdout.
pub fn print_json(execution: &ExecutionRef, event: &ExecutionEvent) -> Result<()> {
    let line = serde_json::to_string(&JsonLine { execution, event })
        .context("serializing execution event")?;
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{line}").context("writing to stdout")?;
    Ok(())
}

/// Human rendering: output goes through untouched, everything else is a
/// tagged line on stderr.
pub fn print_human(execution: &ExecutionRef, event: &ExecutionEvent) -> Result<()> {
    let tag = &execution.command_id;
    match event {
        ExecutionEvent::Stdout { data } => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(data).context("writing to stdout")?;
            stdout.flush().context("flushing stdout")?;
        }
        ExecutionEvent::Stderr { data } => {
            let mut stderr = io::stderr().lock();
            stderr.write_all(data).context("writing to stderr")?;
            stderr.flush().context("flushing stderr")?;
        }
        ExecutionEvent::Prompt { kind, text } => {
            eprintln!("[{tag}] waiting for {kind}: {text}");
        }
        ExecutionEvent::Timeout => eprintln!("[{tag}] timed out"),
        ExecutionEvent::Closed { exit_code, signal } => match (exit_code, signal) {
            (Some(code), _) => eprintln!("[{tag}] exited with code {code}"),
            (None, Some(sig)) => eprintln!("[{tag}] killed by signal {sig}"),
            (None, None) => eprintln!("[{tag}] closed"),
        },
        ExecutionEvent::Notification { title, body, .. } => {
            eprintln!("[{tag}] {title} ({body})");
        }
    }
    Ok(())
}
