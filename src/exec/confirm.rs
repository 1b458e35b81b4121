// src/exec/confirm.rs

//! Yes/no decision taken before a flagged command is spawned.

use std::future::Future;
use std::pin::Pin;

use crate::config::CommandSpec;

use super::danger::dangerous_reason;

/// Why confirmation is being asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmReason {
    /// The command has `confirm = true`.
    Requested,
    /// The command text matched a dangerous-command pattern.
    Dangerous(&'static str),
}

#[derive(Debug, Clone)]
pub struct ConfirmRequest {
    pub command_id: String,
    pub label: String,
    pub command: String,
    pub reason: ConfirmReason,
}

impl ConfirmRequest {
    /// `None` when the command may run without asking.
    pub fn for_spec(spec: &CommandSpec) -> Option<Self> {
        let reason = match dangerous_reason(&spec.command) {
            Some(what) => ConfirmReason::Dangerous(what),
            None if spec.confirm => ConfirmReason::Requested,
            None => return None,
        };
        Some(Self {
            command_id: spec.id.clone(),
            label: spec.label.clone(),
            command: spec.command.clone(),
            reason,
        })
    }
}

/// Injected by the caller; the engine only needs the answer.
pub trait ConfirmDecision: Send + Sync {
    fn confirm(&self, request: ConfirmRequest) -> Pin<Box<dyn Future<Output = bool> + Send + '_>>;
}

/// Fixed answer for every request. `AutoConfirm(false)` declines everything.
#[derive(Debug, Clone, Copy)]
pub struct AutoConfirm(pub bool);

impl ConfirmDecision for AutoConfirm {
    fn confirm(&self, _request: ConfirmRequest) -> Pin<Box<dyn Future<Output = bool> + Send + '_>> {
        let answer = self.0;
        Box::pin(async move { answer })
    }
}
