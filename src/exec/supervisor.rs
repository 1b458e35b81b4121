// src/exec/supervisor.rs

//! Lifecycle of one spawned process.
//!
//! `Admitted -> Running -> Completing -> Terminated`, no re-entry.
//!
//! While running, two relay tasks copy stdout/stderr chunks to the sink and
//! through prompt detection. The supervisor task itself waits for one of:
//! - the process exiting (the only way out of `Running`)
//! - the deadline elapsing (`timeout_ms > 0`): emit `Timeout`, terminate
//! - a stop request from the registry: terminate
//! - the kill grace period elapsing after a terminate: force-kill
//!
//! Once the exit is observed the registry entry is released, `Closed` is
//! emitted, then the notification if the command's policy asks for one.

use std::process::ExitStatus;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Child;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until, timeout};
use tracing::{debug, info, warn};

use crate::config::CommandSpec;
use crate::deck::ConfigStore;

use super::events::{ExecutionEvent, ExecutionRef, OutputStream};
use super::notify::{self, RunSummary};
use super::prompt::{self, PromptState};
use super::registry::{ExecutionHandle, RegistrationGuard};
use super::sink::EventSink;

/// How long a terminated process gets before it is force-killed.
pub const TERMINATE_GRACE: Duration = Duration::from_secs(2);

/// How long to wait for the pipes to hit EOF once the process is gone.
/// Backgrounded grandchildren can keep them open indefinitely.
const READER_DRAIN: Duration = Duration::from_millis(500);

const CHUNK_SIZE: usize = 4096;

/// Requests delivered from the registry to a running supervisor.
#[derive(Debug)]
pub(crate) enum Control {
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Admitted,
    Running,
    Completing,
    Terminated,
}

pub(crate) struct ExecutionSupervisor {
    spec: CommandSpec,
    handle: Arc<ExecutionHandle>,
    guard: RegistrationGuard,
    child: Child,
    control_rx: mpsc::UnboundedReceiver<Control>,
    sink: Arc<dyn EventSink>,
    config: Arc<dyn ConfigStore>,
    state: SupervisorState,
}

impl ExecutionSupervisor {
    pub(crate) fn new(
        spec: CommandSpec,
        handle: Arc<ExecutionHandle>,
        guard: RegistrationGuard,
        child: Child,
        control_rx: mpsc::UnboundedReceiver<Control>,
        sink: Arc<dyn EventSink>,
        config: Arc<dyn ConfigStore>,
    ) -> Self {
        Self {
            spec,
            handle,
            guard,
            child,
            control_rx,
            sink,
            config,
            state: SupervisorState::Admitted,
        }
    }

    /// Hand the execution over to a background task.
    pub(crate) fn start(self) -> JoinHandle<()> {
        tokio::spawn(self.supervise())
    }

    fn enter(&mut self, next: SupervisorState) {
        debug!(
            execution = %self.handle.execution(),
            from = ?self.state,
            to = ?next,
            "supervisor state change"
        );
        self.state = next;
    }

    async fn supervise(mut self) {
        let execution = self.handle.execution().clone();
        let deadline = self.spec.timeout().map(|t| Instant::now() + t);
        self.enter(SupervisorState::Running);

        let readers = self.spawn_readers(&execution);

        let mut timed_out = false;
        let mut stopping = false;
        let mut kill_at: Option<Instant> = None;
        let mut control_open = true;

        let status = loop {
            tokio::select! {
                res = self.child.wait() => break res,

                () = sleep_until_opt(deadline), if deadline.is_some() && !timed_out && !stopping => {
                    timed_out = true;
                    warn!(
                        execution = %execution,
                        timeout_ms = self.spec.timeout_ms,
                        "timeout elapsed; terminating process"
                    );
                    self.handle.mark_terminating();
                    self.sink.emit(&execution, ExecutionEvent::Timeout);
                    self.terminate(&execution);
                    kill_at.get_or_insert_with(|| Instant::now() + TERMINATE_GRACE);
                }

                msg = self.control_rx.recv(), if control_open => match msg {
                    Some(Control::Stop) => {
                        info!(execution = %execution, "stop requested; terminating process");
                        stopping = true;
                        self.terminate(&execution);
                        kill_at.get_or_insert_with(|| Instant::now() + TERMINATE_GRACE);
                    }
                    None => control_open = false,
                },

                () = sleep_until_opt(kill_at), if kill_at.is_some() => {
                    warn!(execution = %execution, "process survived terminate; killing");
                    self.force_kill(&execution);
                    kill_at = None;
                }
            }
        };

        self.handle.mark_exited();
        self.enter(SupervisorState::Completing);
        self.handle.mark_terminating();
        self.control_rx.close();
        self.handle.prompt_state().clear();

        let (exit_code, signal) = match status {
            Ok(status) => exit_parts(status),
            Err(e) => {
                warn!(execution = %execution, error = %e, "waiting for process failed");
                (None, None)
            }
        };
        let elapsed = self.handle.elapsed();

        info!(
            execution = %execution,
            exit_code = ?exit_code,
            signal = ?signal,
            timed_out,
            elapsed_ms = elapsed.as_millis() as u64,
            "process exited"
        );

        drain_readers(readers, &execution).await;
        self.handle.close_stdin().await;

        if !self.guard.release() {
            debug!(execution = %execution, "registry entry was already gone");
        }

        self.sink
            .emit(&execution, ExecutionEvent::Closed { exit_code, signal });

        let summary = RunSummary {
            exit_code,
            timed_out,
            elapsed,
        };
        if let Some(n) = notify::compose(&self.spec, &summary, &self.config.locale()) {
            self.sink.emit(
                &execution,
                ExecutionEvent::Notification {
                    title: n.title,
                    body: n.body,
                    failed: n.failed,
                },
            );
        }

        self.enter(SupervisorState::Terminated);
    }

    fn spawn_readers(&mut self, execution: &ExecutionRef) -> Vec<JoinHandle<()>> {
        let mut readers = Vec::with_capacity(2);
        let prompt = self.handle.prompt_state();

        if let Some(stdout) = self.child.stdout.take() {
            readers.push(spawn_relay(
                stdout,
                OutputStream::Stdout,
                execution.clone(),
                Arc::clone(&self.sink),
                Arc::clone(&prompt),
            ));
        }
        if let Some(stderr) = self.child.stderr.take() {
            readers.push(spawn_relay(
                stderr,
                OutputStream::Stderr,
                execution.clone(),
                Arc::clone(&self.sink),
                prompt,
            ));
        }

        readers
    }

    /// Graceful interrupt: SIGTERM to the whole process group on Unix.
    fn terminate(&mut self, execution: &ExecutionRef) {
        #[cfg(unix)]
        if let Some(pgid) = self.process_group() {
            use nix::sys::signal::{Signal, killpg};

            if let Err(e) = killpg(pgid, Signal::SIGTERM) {
                debug!(execution = %execution, error = %e, "SIGTERM to process group failed");
            }
            return;
        }

        if let Err(e) = self.child.start_kill() {
            debug!(execution = %execution, error = %e, "kill failed");
        }
    }

    fn force_kill(&mut self, execution: &ExecutionRef) {
        #[cfg(unix)]
        if let Some(pgid) = self.process_group() {
            use nix::sys::signal::{Signal, killpg};

            if let Err(e) = killpg(pgid, Signal::SIGKILL) {
                debug!(execution = %execution, error = %e, "SIGKILL to process group failed");
            }
        }

        if let Err(e) = self.child.start_kill() {
            debug!(execution = %execution, error = %e, "kill failed");
        }
    }

    /// The child is a session leader, so its group id is its pid.
    #[cfg(unix)]
    fn process_group(&self) -> Option<nix::unistd::Pid> {
        self.handle
            .pid()
            .and_then(|pid| i32::try_from(pid).ok())
            .map(nix::unistd::Pid::from_raw)
    }
}

fn spawn_relay<R>(
    mut reader: R,
    stream: OutputStream,
    execution: ExecutionRef,
    sink: Arc<dyn EventSink>,
    prompt: Arc<PromptState>,
) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = vec![0u8; CHUNK_SIZE];

        loop {
            let n = match reader.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) => {
                    debug!(execution = %execution, %stream, error = %e, "read failed; relay ending");
                    break;
                }
            };

            let chunk = buf[..n].to_vec();
            let text = String::from_utf8_lossy(&chunk).into_owned();
            sink.emit(&execution, stream.event(chunk));

            if let Some(found) = prompt::scan(&text, prompt.is_open()) {
                if prompt.try_open() {
                    debug!(execution = %execution, kind = ?found.kind, "prompt detected");
                    sink.emit(
                        &execution,
                        ExecutionEvent::Prompt {
                            kind: found.kind,
                            text: found.text,
                        },
                    );
                }
            }
        }

        debug!(execution = %execution, %stream, "relay ended");
    })
}

/// Wait for both relays so every output event precedes `Closed`.
async fn drain_readers(readers: Vec<JoinHandle<()>>, execution: &ExecutionRef) {
    for mut reader in readers {
        match timeout(READER_DRAIN, &mut reader).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => debug!(execution = %execution, error = %e, "relay task failed"),
            Err(_) => {
                debug!(execution = %execution, "pipe still open after exit; abandoning relay");
                reader.abort();
                let _ = reader.await;
            }
        }
    }
}

async fn sleep_until_opt(at: Option<Instant>) {
    match at {
        Some(at) => sleep_until(at).await,
        None => std::future::pending().await,
    }
}

fn exit_parts(status: ExitStatus) -> (Option<i32>, Option<i32>) {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        (status.code(), status.signal())
    }
    #[cfg(not(unix))]
    {
        (status.code(), None)
    }
}
