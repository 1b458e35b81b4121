// src/exec/gate.rs

//! Admission decision for a new execution.
//!
//! The gate itself is pure. Atomicity with respect to concurrent run
//! requests comes from the caller holding the registry lock across
//! `admit` and the insertion that follows (see
//! [`ExecutionRegistry::admit_with`](super::registry::ExecutionRegistry::admit_with)).

use crate::types::{BusyScope, ConcurrencyPolicy};

/// What the gate needs to know about in-flight executions.
pub trait RunningSet {
    /// At least one live execution exists for this command.
    fn is_running(&self, command_id: &str) -> bool;
    /// Live executions across every command.
    fn running_total(&self) -> usize;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allowed,
    Busy(BusyScope),
}

pub fn admit(policy: ConcurrencyPolicy, running: &impl RunningSet, command_id: &str) -> Admission {
    match policy {
        ConcurrencyPolicy::Parallel => Admission::Allowed,
        ConcurrencyPolicy::SinglePerCommand if running.is_running(command_id) => {
            Admission::Busy(BusyScope::Command)
        }
        ConcurrencyPolicy::SinglePerCommand => Admission::Allowed,
        ConcurrencyPolicy::SingleGlobal if running.running_total() > 0 => {
            Admission::Busy(BusyScope::Global)
        }
        ConcurrencyPolicy::SingleGlobal => Admission::Allowed,
    }
}
