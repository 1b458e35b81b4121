// src/exec/events.rs

//! Events published for a running execution.
//!
//! Within one execution the order is causal: output and prompt events come
//! before `Closed`, and `Notification` (when emitted at all) comes last.

use std::fmt;

use serde::{Serialize, Serializer};
use uuid::Uuid;

use crate::types::PromptKind;

/// Unique id of one run of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ExecutionId(Uuid);

impl ExecutionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ExecutionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short form is enough to tell runs apart in logs.
        let s = self.0.simple().to_string();
        f.write_str(&s[..8])
    }
}

/// Identifies the execution an event belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ExecutionRef {
    pub command_id: String,
    pub execution_id: ExecutionId,
}

impl ExecutionRef {
    pub fn new(command_id: impl Into<String>) -> Self {
        Self {
            command_id: command_id.into(),
            execution_id: ExecutionId::new(),
        }
    }
}

impl fmt::Display for ExecutionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.command_id, self.execution_id)
    }
}

/// Which pipe a chunk of output came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

impl OutputStream {
    pub fn event(self, data: Vec<u8>) -> ExecutionEvent {
        match self {
            OutputStream::Stdout => ExecutionEvent::Stdout { data },
            OutputStream::Stderr => ExecutionEvent::Stderr { data },
        }
    }
}

impl fmt::Display for OutputStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputStream::Stdout => f.write_str("stdout"),
            OutputStream::Stderr => f.write_str("stderr"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ExecutionEvent {
    Stdout {
        #[serde(serialize_with = "lossy_utf8")]
        data: Vec<u8>,
    },
    Stderr {
        #[serde(serialize_with = "lossy_utf8")]
        data: Vec<u8>,
    },
    Prompt {
        kind: PromptKind,
        text: String,
    },
    Timeout,
    /// The process is gone. `exit_code` is absent when it died from a signal.
    Closed {
        exit_code: Option<i32>,
        signal: Option<i32>,
    },
    Notification {
        title: String,
        body: String,
        failed: bool,
    },
}

impl ExecutionEvent {
    pub fn is_closed(&self) -> bool {
        matches!(self, ExecutionEvent::Closed { .. })
    }
}

fn lossy_utf8<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&String::from_utf8_lossy(data))
}
