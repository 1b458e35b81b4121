// src/exec/registry.rs

//! Process-wide table of live executions.
//!
//! An entry exists from the moment its process is spawned until the
//! supervisor observes the process exit. The admission check and the
//! insertion happen under one lock, so two concurrent run requests can never
//! both be admitted where the policy allows only one.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tokio::process::ChildStdin;
use tokio::sync::{Mutex as AsyncMutex, mpsc};
use tracing::{debug, warn};

use crate::types::{BusyScope, ConcurrencyPolicy};

use super::events::ExecutionRef;
use super::gate::{self, Admission, RunningSet};
use super::prompt::PromptState;
use super::supervisor::Control;

/// Why input could not be delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum InputRefusal {
    NotRunning,
    NoStdin,
    WriteFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InputOutcome {
    pub sent: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<InputRefusal>,
}

impl InputOutcome {
    pub fn sent() -> Self {
        Self {
            sent: true,
            reason: None,
        }
    }

    pub fn refused(reason: InputRefusal) -> Self {
        Self {
            sent: false,
            reason: Some(reason),
        }
    }
}

/// Shared view of one live execution.
#[derive(Debug)]
pub struct ExecutionHandle {
    execution: ExecutionRef,
    pid: Option<u32>,
    seq: u64,
    started_at: Instant,
    control: mpsc::UnboundedSender<Control>,
    terminating: AtomicBool,
    exited: AtomicBool,
    stdin: AsyncMutex<Option<ChildStdin>>,
    prompt: Arc<PromptState>,
}

impl ExecutionHandle {
    pub(crate) fn new(
        execution: ExecutionRef,
        pid: Option<u32>,
        stdin: Option<ChildStdin>,
        control: mpsc::UnboundedSender<Control>,
        seq: u64,
    ) -> Self {
        Self {
            execution,
            pid,
            seq,
            started_at: Instant::now(),
            control,
            terminating: AtomicBool::new(false),
            exited: AtomicBool::new(false),
            stdin: AsyncMutex::new(stdin),
            prompt: Arc::new(PromptState::default()),
        }
    }

    pub fn execution(&self) -> &ExecutionRef {
        &self.execution
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    pub fn prompt_open(&self) -> bool {
        self.prompt.is_open()
    }

    pub(crate) fn prompt_state(&self) -> Arc<PromptState> {
        Arc::clone(&self.prompt)
    }

    /// Flag the execution as on its way out. `true` only for the first caller.
    pub(crate) fn mark_terminating(&self) -> bool {
        !self.terminating.swap(true, Ordering::AcqRel)
    }

    /// Record that the process has been reaped. The entry lingers until the
    /// output pipes drain, but input is refused from here on.
    pub(crate) fn mark_exited(&self) {
        self.exited.store(true, Ordering::Release);
    }

    pub fn has_exited(&self) -> bool {
        self.exited.load(Ordering::Acquire)
    }

    /// Ask the supervisor to terminate the process. Returns `false` when the
    /// execution is already stopping (stop, timeout or natural exit).
    pub fn request_stop(&self) -> bool {
        if !self.mark_terminating() {
            debug!(execution = %self.execution, "stop ignored; already terminating");
            return false;
        }
        self.control.send(Control::Stop).is_ok()
    }

    /// Write `text` plus a newline to the process and close the open prompt.
    pub async fn send_input(&self, text: &str) -> InputOutcome {
        if self.has_exited() {
            return InputOutcome::refused(InputRefusal::NotRunning);
        }

        let mut stdin = self.stdin.lock().await;
        let Some(pipe) = stdin.as_mut() else {
            return InputOutcome::refused(InputRefusal::NoStdin);
        };

        let mut line = String::with_capacity(text.len() + 1);
        line.push_str(text);
        line.push('\n');

        let written = async {
            pipe.write_all(line.as_bytes()).await?;
            pipe.flush().await
        }
        .await;

        match written {
            Ok(()) => {
                self.prompt.clear();
                debug!(execution = %self.execution, bytes = line.len(), "input delivered");
                InputOutcome::sent()
            }
            Err(e) => {
                warn!(execution = %self.execution, error = %e, "writing input failed");
                InputOutcome::refused(InputRefusal::WriteFailed)
            }
        }
    }

    /// Drop the stdin pipe once the process is gone.
    pub(crate) async fn close_stdin(&self) {
        self.stdin.lock().await.take();
    }
}

#[derive(Debug, Default)]
struct Table {
    by_command: HashMap<String, Vec<Arc<ExecutionHandle>>>,
    total: usize,
}

impl RunningSet for Table {
    fn is_running(&self, command_id: &str) -> bool {
        self.by_command
            .get(command_id)
            .is_some_and(|v| !v.is_empty())
    }

    fn running_total(&self) -> usize {
        self.total
    }
}

/// Result of [`ExecutionRegistry::admit_with`].
#[derive(Debug)]
pub enum Registration<T> {
    Inserted(Arc<ExecutionHandle>, T),
    Busy(BusyScope),
}

#[derive(Debug, Default)]
pub struct ExecutionRegistry {
    table: Mutex<Table>,
    next_seq: AtomicU64,
}

impl ExecutionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Non-reserving admission check.
    pub fn check(&self, policy: ConcurrencyPolicy, command_id: &str) -> Admission {
        gate::admit(policy, &*self.table.lock(), command_id)
    }

    /// Admit and insert as one step.
    ///
    /// `launch` runs with the table locked and only when the gate allows the
    /// run; it must not touch the registry. If it fails nothing is inserted.
    pub fn admit_with<T, E>(
        &self,
        policy: ConcurrencyPolicy,
        command_id: &str,
        launch: impl FnOnce(u64) -> Result<(ExecutionHandle, T), E>,
    ) -> Result<Registration<T>, E> {
        let mut table = self.table.lock();

        if let Admission::Busy(scope) = gate::admit(policy, &*table, command_id) {
            return Ok(Registration::Busy(scope));
        }

        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let (handle, extra) = launch(seq)?;
        let handle = Arc::new(handle);

        table
            .by_command
            .entry(handle.execution.command_id.clone())
            .or_default()
            .push(Arc::clone(&handle));
        table.total += 1;

        Ok(Registration::Inserted(handle, extra))
    }

    /// Remove an execution. Safe to call any number of times; only the first
    /// call for a given execution returns `true`.
    pub fn remove(&self, execution: &ExecutionRef) -> bool {
        let mut table = self.table.lock();

        let Some(entries) = table.by_command.get_mut(&execution.command_id) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|h| h.execution.execution_id != execution.execution_id);
        let removed = before - entries.len();
        if entries.is_empty() {
            table.by_command.remove(&execution.command_id);
        }
        table.total -= removed;

        removed > 0
    }

    /// Signal every live execution of `command_id`. `true` if at least one
    /// was found that was not already stopping.
    pub fn stop(&self, command_id: &str) -> bool {
        let handles: Vec<Arc<ExecutionHandle>> = self
            .table
            .lock()
            .by_command
            .get(command_id)
            .cloned()
            .unwrap_or_default();

        handles
            .iter()
            .fold(false, |any, h| h.request_stop() || any)
    }

    /// Most recently admitted live execution of `command_id`.
    pub fn latest(&self, command_id: &str) -> Option<Arc<ExecutionHandle>> {
        self.table
            .lock()
            .by_command
            .get(command_id)
            .and_then(|v| v.iter().max_by_key(|h| h.seq).cloned())
    }

    pub fn is_running(&self, command_id: &str) -> bool {
        self.table.lock().is_running(command_id)
    }

    pub fn len(&self) -> usize {
        self.table.lock().total
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Removes its execution from the registry when released or dropped,
/// whichever comes first.
#[derive(Debug)]
pub(crate) struct RegistrationGuard {
    registry: Arc<ExecutionRegistry>,
    execution: ExecutionRef,
    released: bool,
}

impl RegistrationGuard {
    pub(crate) fn new(registry: Arc<ExecutionRegistry>, execution: ExecutionRef) -> Self {
        Self {
            registry,
            execution,
            released: false,
        }
    }

    /// Only the first call removes anything.
    pub(crate) fn release(&mut self) -> bool {
        if self.released {
            return false;
        }
        self.released = true;
        self.registry.remove(&self.execution)
    }
}

impl Drop for RegistrationGuard {
    fn drop(&mut self) {
        if !self.released {
            warn!(execution = %self.execution, "supervisor ended without releasing; removing entry");
            self.registry.remove(&self.execution);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle_with(stdin: Option<ChildStdin>, pid: Option<u32>) -> ExecutionHandle {
        let (control, _rx) = mpsc::unbounded_channel();
        ExecutionHandle::new(ExecutionRef::new("build"), pid, stdin, control, 0)
    }

    #[tokio::test]
    async fn missing_stdin_is_reported_until_exit() {
        let handle = handle_with(None, Some(1));
        assert_eq!(
            handle.send_input("y").await,
            InputOutcome::refused(InputRefusal::NoStdin)
        );

        handle.mark_exited();
        assert_eq!(
            handle.send_input("y").await,
            InputOutcome::refused(InputRefusal::NotRunning)
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn input_to_a_reaped_process_is_not_running() -> std::io::Result<()> {
        let mut child = tokio::process::Command::new("/bin/sh")
            .args(["-c", "exit 0"])
            .stdin(std::process::Stdio::piped())
            .spawn()?;
        let stdin = child.stdin.take();
        child.wait().await?;

        // The pipe is still held, as it is while the relays drain.
        let handle = handle_with(stdin, child.id());
        handle.mark_exited();

        assert!(handle.has_exited());
        assert_eq!(
            handle.send_input("y").await,
            InputOutcome::refused(InputRefusal::NotRunning)
        );
        Ok(())
    }
}
