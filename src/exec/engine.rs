// src/exec/engine.rs

//! Caller-facing operations: `run`, `stop`, `send_input`.
//!
//! `run` returns as soon as the process is spawned (or refused). Everything
//! that happens afterwards reaches the caller through the [`EventSink`].

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::deck::{CommandLookup, ConfigStore};
use crate::errors::{Result, TermdeckError};
use crate::types::BusyScope;

use super::confirm::{AutoConfirm, ConfirmDecision, ConfirmRequest};
use super::events::ExecutionRef;
use super::gate::Admission;
use super::registry::{
    ExecutionHandle, ExecutionRegistry, InputOutcome, InputRefusal, Registration,
    RegistrationGuard,
};
use super::shell::{self, ShellSettings};
use super::sink::{EventSink, NullSink};
use super::supervisor::ExecutionSupervisor;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunOutcome {
    Started {
        pid: Option<u32>,
        execution: ExecutionRef,
    },
    Busy(BusyScope),
    /// Confirmation was declined; nothing was spawned.
    Aborted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StopOutcome {
    pub stopped: bool,
}

pub struct ExecutionEngine {
    registry: Arc<ExecutionRegistry>,
    config: Arc<dyn ConfigStore>,
    commands: Arc<dyn CommandLookup>,
    sink: Arc<dyn EventSink>,
    confirm: Arc<dyn ConfirmDecision>,
    shell: ShellSettings,
}

impl ExecutionEngine {
    /// Engine over a store that answers both policy and command lookups.
    ///
    /// Defaults:
    /// - events go to a [`NullSink`]
    /// - confirmations are declined
    /// - the shell is resolved from the environment
    pub fn new<S>(store: Arc<S>) -> Self
    where
        S: ConfigStore + CommandLookup + 'static,
    {
        Self {
            registry: Arc::new(ExecutionRegistry::new()),
            config: store.clone(),
            commands: store,
            sink: Arc::new(NullSink),
            confirm: Arc::new(AutoConfirm(false)),
            shell: ShellSettings::default(),
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_confirm(mut self, confirm: Arc<dyn ConfirmDecision>) -> Self {
        self.confirm = confirm;
        self
    }

    pub fn with_shell(mut self, shell: ShellSettings) -> Self {
        self.shell = shell;
        self
    }

    /// Share one registry between several engines.
    pub fn with_registry(mut self, registry: Arc<ExecutionRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn registry(&self) -> &Arc<ExecutionRegistry> {
        &self.registry
    }

    /// Admit and spawn `command_id`.
    ///
    /// Errors only for an unknown command or a spawn failure; busy and
    /// declined runs are ordinary outcomes.
    pub async fn run(&self, command_id: &str) -> Result<RunOutcome> {
        let spec = self
            .commands
            .resolve(command_id)
            .ok_or_else(|| TermdeckError::CommandNotFound(command_id.to_string()))?;

        // Refuse early so nobody is asked to confirm a run that cannot start.
        if let Admission::Busy(scope) = self.registry.check(self.config.policy(), &spec.id) {
            info!(command = %spec.id, %scope, "run refused; busy");
            return Ok(RunOutcome::Busy(scope));
        }

        if let Some(request) = ConfirmRequest::for_spec(&spec) {
            debug!(command = %spec.id, reason = ?request.reason, "asking for confirmation");
            if !self.confirm.confirm(request).await {
                info!(command = %spec.id, "run declined");
                return Ok(RunOutcome::Aborted);
            }
        }

        let invocation = shell::resolve(&spec, &self.shell);
        let execution = ExecutionRef::new(&spec.id);
        debug!(
            execution = %execution,
            program = %invocation.program,
            args = ?invocation.args,
            cwd = ?invocation.cwd,
            "spawning"
        );

        // The policy is read again: it may have changed during confirmation.
        let registration = self
            .registry
            .admit_with(self.config.policy(), &spec.id, |seq| {
                let mut child = invocation.to_command().spawn().map_err(|source| {
                    TermdeckError::SpawnFailure {
                        command: spec.id.clone(),
                        source,
                    }
                })?;
                let (control_tx, control_rx) = mpsc::unbounded_channel();
                let handle = ExecutionHandle::new(
                    execution.clone(),
                    child.id(),
                    child.stdin.take(),
                    control_tx,
                    seq,
                );
                Ok::<_, TermdeckError>((handle, (child, control_rx)))
            })?;

        match registration {
            Registration::Busy(scope) => {
                info!(command = %spec.id, %scope, "run refused; busy");
                Ok(RunOutcome::Busy(scope))
            }
            Registration::Inserted(handle, (child, control_rx)) => {
                let pid = handle.pid();
                info!(execution = %execution, pid = ?pid, cmd = %spec.command, "execution started");

                let guard = RegistrationGuard::new(Arc::clone(&self.registry), execution.clone());
                ExecutionSupervisor::new(
                    spec,
                    handle,
                    guard,
                    child,
                    control_rx,
                    Arc::clone(&self.sink),
                    Arc::clone(&self.config),
                )
                .start();

                Ok(RunOutcome::Started { pid, execution })
            }
        }
    }

    /// Fire-and-forget stop. The `Closed` event confirms the termination.
    pub fn stop(&self, command_id: &str) -> StopOutcome {
        let stopped = self.registry.stop(command_id);
        debug!(command = %command_id, stopped, "stop requested");
        StopOutcome { stopped }
    }

    /// Send a line of input to the most recent live execution of `command_id`.
    pub async fn send_input(&self, command_id: &str, text: &str) -> InputOutcome {
        match self.registry.latest(command_id) {
            Some(handle) => handle.send_input(text).await,
            None => InputOutcome::refused(InputRefusal::NotRunning),
        }
    }
}
