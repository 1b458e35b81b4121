// src/exec/mod.rs

//! Command execution core.
//!
//! - [`shell`] decides which interpreter runs a command.
//! - [`gate`] decides whether a run may start under the current policy.
//! - [`registry`] tracks live executions; admission + insertion are atomic.
//! - [`supervisor`] owns one spawned process from spawn to close.
//! - [`prompt`] and [`danger`] hold the heuristic pattern tables.
//! - [`notify`] composes the terminal notification.
//! - [`sink`] and [`confirm`] are the capabilities injected by the caller.
//! - [`engine`] ties it together behind `run` / `stop` / `send_input`.

pub mod confirm;
pub mod danger;
pub mod engine;
pub mod events;
pub mod gate;
pub mod notify;
pub mod prompt;
pub mod registry;
pub mod shell;
pub mod sink;
pub mod supervisor;

pub use confirm::{AutoConfirm, ConfirmDecision, ConfirmReason, ConfirmRequest};
pub use engine::{ExecutionEngine, RunOutcome, StopOutcome};
pub use events::{ExecutionEvent, ExecutionId, ExecutionRef, OutputStream};
pub use gate::{Admission, RunningSet};
pub use registry::{ExecutionHandle, ExecutionRegistry, InputOutcome, InputRefusal};
pub use shell::{Platform, ShellInvocation, ShellSettings};
pub use sink::{ChannelSink, EventSink, NullSink};
pub use supervisor::SupervisorState;
