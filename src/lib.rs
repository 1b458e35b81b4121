// src/lib.rs

pub mod cli;
pub mod config;
pub mod console;
pub mod deck;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod types;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::cli::{CliArgs, DeckCommand};
use crate::config::load_and_validate;
use crate::console::TerminalConfirm;
use crate::deck::{CommandLookup, ConfigStore, DeckState};
use crate::errors::TermdeckError;
use crate::exec::danger::dangerous_reason;
use crate::exec::{
    shell, AutoConfirm, ChannelSink, ConfirmDecision, ExecutionEngine, ExecutionEvent,
    ExecutionRef, RunOutcome, ShellSettings,
};
use crate::types::NotifyPolicy;

/// High-level entry point used by `main.rs`. Returns the process exit code.
///
/// This wires together:
/// - deck file loading
/// - the execution engine and its event channel
/// - terminal confirmation, stdin forwarding and Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<i32> {
    let config_path = args.config_path();
    let cfg = load_and_validate(&config_path)
        .with_context(|| format!("loading deck file {}", config_path.display()))?;

    let root_dir = config_root_dir(&config_path);
    let deck = Arc::new(DeckState::from_config(&cfg, &root_dir));
    let shell_settings = ShellSettings::from_section(&cfg.shell);

    match args.command {
        DeckCommand::List => {
            print_list(&deck, &shell_settings);
            Ok(0)
        }
        DeckCommand::Run {
            ids,
            yes,
            json,
            policy,
        } => {
            if let Some(policy) = policy {
                deck.set_policy(policy);
            }
            run_commands(deck, shell_settings, &ids, RunOptions { yes, json }).await
        }
    }
}

/// Directory that relative `root_dir`/`cwd` entries are resolved against.
///
/// - If the deck path has a non-empty parent (e.g. "decks/Termdeck.toml"),
///   that directory is used.
/// - A bare filename like "Termdeck.toml" (parent = "") falls back to the
///   current working directory.
fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

/// `list` output: profiles, commands, and how each one would be launched.
fn print_list(deck: &DeckState, shell_settings: &ShellSettings) {
    println!("termdeck");
    println!("  policy = {}", deck.policy());
    println!("  locale = {}", deck.locale());
    println!("  shell  = {}", shell_settings.program);

    for profile in deck.profiles() {
        println!();
        println!("{} [{}] ({} commands)", profile.name, profile.id, profile.commands.len());
        for cmd in &profile.commands {
            let resolved = deck.resolve(&cmd.id).unwrap_or_else(|| cmd.clone());
            let invocation = shell::resolve(&resolved, shell_settings);

            println!("  - {}: {}", resolved.id, resolved.label);
            println!("      run: {} {}", invocation.program, invocation.args.join(" "));
            if let Some(ref cwd) = resolved.cwd {
                println!("      cwd: {}", cwd.display());
            }
            if resolved.timeout_ms > 0 {
                println!("      timeout_ms: {}", resolved.timeout_ms);
            }
            if resolved.notify_on != NotifyPolicy::Off {
                println!("      notify_on: {}", resolved.notify_on);
            }
            if resolved.confirm {
                println!("      confirm: true");
            }
            if let Some(what) = dangerous_reason(&resolved.command) {
                println!("      dangerous: {what}");
            }
        }
    }

    debug!("list complete");
}

#[derive(Debug, Clone, Copy)]
struct RunOptions {
    yes: bool,
    json: bool,
}

async fn run_commands(
    deck: Arc<DeckState>,
    shell_settings: ShellSettings,
    ids: &[String],
    options: RunOptions,
) -> Result<i32> {
    // Unknown ids fail before anything is spawned.
    let mut notify_on = HashMap::new();
    for id in ids {
        let spec = deck
            .resolve(id)
            .ok_or_else(|| TermdeckError::CommandNotFound(id.clone()))?;
        notify_on.insert(id.clone(), spec.notify_on);
    }

    let (sink, mut events) = ChannelSink::new();
    let confirm: Arc<dyn ConfirmDecision> = if options.yes {
        Arc::new(AutoConfirm(true))
    } else {
        Arc::new(TerminalConfirm)
    };
    let engine = ExecutionEngine::new(Arc::clone(&deck))
        .with_sink(Arc::new(sink))
        .with_confirm(confirm)
        .with_shell(shell_settings);

    let mut tracker = RunTracker::default();
    for id in ids {
        match engine.run(id).await? {
            RunOutcome::Started { pid, execution } => {
                info!(execution = %execution, pid = ?pid, "started");
                let policy = notify_on.get(id).copied().unwrap_or_default();
                tracker.started(execution, policy);
            }
            RunOutcome::Busy(scope) => {
                eprintln!("[{id}] busy ({scope} scope); not started");
                tracker.fail(1);
            }
            RunOutcome::Aborted => eprintln!("[{id}] not confirmed; skipped"),
        }
    }

    // Confirmation is done with stdin; from here on it carries input lines.
    let mut input = spawn_stdin_reader();
    let mut input_open = true;
    let mut signals_ok = true;

    while !tracker.is_done() {
        tokio::select! {
            received = events.recv() => {
                let Some((execution, event)) = received else { break };
                if options.json {
                    console::print_json(&execution, &event)?;
                } else {
                    console::print_human(&execution, &event)?;
                }
                tracker.observe(&execution, &event);
            }
            line = input.recv(), if input_open => match line {
                Some(line) => forward_input(&engine, &mut tracker, &line).await,
                None => {
                    debug!("stdin closed; no more input will be forwarded");
                    input_open = false;
                }
            },
            res = tokio::signal::ctrl_c(), if signals_ok => match res {
                Ok(()) => {
                    for id in tracker.live_commands() {
                        let outcome = engine.stop(&id);
                        debug!(command = %id, stopped = outcome.stopped, "ctrl-c stop");
                    }
                }
                Err(e) => {
                    warn!(error = %e, "failed to listen for Ctrl+C");
                    signals_ok = false;
                }
            },
        }
    }

    Ok(tracker.exit_code.unwrap_or(0))
}

async fn forward_input(engine: &ExecutionEngine, tracker: &mut RunTracker, line: &str) {
    let Some(target) = tracker.input_target() else {
        debug!("input line with nothing running; dropped");
        return;
    };
    let outcome = engine.send_input(&target, line).await;
    if outcome.sent {
        tracker.prompting = None;
    } else {
        warn!(command = %target, reason = ?outcome.reason, "input not delivered");
    }
}

fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(16);
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if tx.send(line).await.is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "reading stdin failed");
                    break;
                }
            }
        }
    });
    rx
}

#[derive(Debug)]
struct Pending {
    notify_on: NotifyPolicy,
    timed_out: bool,
}

/// What the `run` subcommand still waits for.
///
/// An execution is done after `Closed`, or after its `Notification` when
/// one is going to follow.
#[derive(Debug, Default)]
struct RunTracker {
    live: HashMap<ExecutionRef, Pending>,
    last_started: Option<String>,
    prompting: Option<String>,
    exit_code: Option<i32>,
}

impl RunTracker {
    fn started(&mut self, execution: ExecutionRef, notify_on: NotifyPolicy) {
        self.last_started = Some(execution.command_id.clone());
        self.live.insert(
            execution,
            Pending {
                notify_on,
                timed_out: false,
            },
        );
    }

    /// Keep the first failing code.
    fn fail(&mut self, code: i32) {
        if self.exit_code.is_none() {
            self.exit_code = Some(code);
        }
    }

    fn observe(&mut self, execution: &ExecutionRef, event: &ExecutionEvent) {
        match event {
            ExecutionEvent::Prompt { .. } => {
                self.prompting = Some(execution.command_id.clone());
            }
            ExecutionEvent::Timeout => {
                if let Some(pending) = self.live.get_mut(execution) {
                    pending.timed_out = true;
                }
            }
            ExecutionEvent::Closed { exit_code, signal } => {
                if self.prompting.as_deref() == Some(execution.command_id.as_str()) {
                    self.prompting = None;
                }
                let Some(pending) = self.live.get(execution) else {
                    return;
                };
                let failed = pending.timed_out || exit_code.is_some_and(|c| c != 0);
                let waits_for_notification = pending.notify_on.should_notify(failed);
                if failed {
                    let code = match exit_code {
                        Some(c) if *c != 0 => *c,
                        _ => signal.map_or(1, |s| 128 + s),
                    };
                    self.fail(code);
                }
                if !waits_for_notification {
                    self.live.remove(execution);
                }
            }
            ExecutionEvent::Notification { .. } => {
                self.live.remove(execution);
            }
            ExecutionEvent::Stdout { .. } | ExecutionEvent::Stderr { .. } => {}
        }
    }

    fn is_done(&self) -> bool {
        self.live.is_empty()
    }

    /// A command waiting at a prompt gets the line; otherwise the last one
    /// started.
    fn input_target(&self) -> Option<String> {
        self.prompting.clone().or_else(|| self.last_started.clone())
    }

    fn live_commands(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.live.keys().map(|e| e.command_id.clone()).collect();
        ids.sort();
        ids.dedup();
        ids
    }
}
