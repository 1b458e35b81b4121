// src/exec/sink.rs

//! Where execution events go.
//!
//! The core never knows whether anybody is listening. A sink must accept
//! events with no receiver attached and keep per-execution order.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::trace;

use super::events::{ExecutionEvent, ExecutionRef};

pub trait EventSink: Send + Sync {
    fn emit(&self, execution: &ExecutionRef, event: ExecutionEvent);
}

impl<S: EventSink + ?Sized> EventSink for Arc<S> {
    fn emit(&self, execution: &ExecutionRef, event: ExecutionEvent) {
        (**self).emit(execution, event);
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _execution: &ExecutionRef, _event: ExecutionEvent) {}
}

/// Forwards events over an unbounded channel. Emitting never blocks.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<(ExecutionRef, ExecutionEvent)>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(ExecutionRef, ExecutionEvent)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, execution: &ExecutionRef, event: ExecutionEvent) {
        if self.tx.send((execution.clone(), event)).is_err() {
            trace!(execution = %execution, "event dropped; no listener");
        }
    }
}
