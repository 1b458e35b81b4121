use parking_lot::Mutex;
use tokio::sync::Notify;

use termdeck::exec::{EventSink, ExecutionEvent, ExecutionRef};

/// Sink that keeps every event, in emission order, and lets a test wait
/// until some condition over them holds.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<(ExecutionRef, ExecutionEvent)>>,
    changed: Notify,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<(ExecutionRef, ExecutionEvent)> {
        self.events.lock().clone()
    }

    /// Events of every execution of `command_id`.
    pub fn events_for(&self, command_id: &str) -> Vec<ExecutionEvent> {
        self.events
            .lock()
            .iter()
            .filter(|(e, _)| e.command_id == command_id)
            .map(|(_, ev)| ev.clone())
            .collect()
    }

    /// Events of exactly one execution.
    pub fn events_of(&self, execution: &ExecutionRef) -> Vec<ExecutionEvent> {
        self.events
            .lock()
            .iter()
            .filter(|(e, _)| e == execution)
            .map(|(_, ev)| ev.clone())
            .collect()
    }

    /// Concatenated stdout of `command_id`, lossily decoded.
    pub fn stdout_for(&self, command_id: &str) -> String {
        let bytes: Vec<u8> = self
            .events_for(command_id)
            .into_iter()
            .filter_map(|ev| match ev {
                ExecutionEvent::Stdout { data } => Some(data),
                _ => None,
            })
            .flatten()
            .collect();
        String::from_utf8_lossy(&bytes).into_owned()
    }

    pub fn stderr_for(&self, command_id: &str) -> String {
        let bytes: Vec<u8> = self
            .events_for(command_id)
            .into_iter()
            .filter_map(|ev| match ev {
                ExecutionEvent::Stderr { data } => Some(data),
                _ => None,
            })
            .flatten()
            .collect();
        String::from_utf8_lossy(&bytes).into_owned()
    }

    pub fn count_for(&self, command_id: &str, pred: impl Fn(&ExecutionEvent) -> bool) -> usize {
        self.events_for(command_id).iter().filter(|ev| pred(ev)).count()
    }

    /// Resolve once `pred` holds over the recorded events.
    pub async fn wait_until<F>(&self, mut pred: F)
    where
        F: FnMut(&[(ExecutionRef, ExecutionEvent)]) -> bool,
    {
        loop {
            // Registered before the check, so an emit in between is not lost.
            let changed = self.changed.notified();
            if pred(&self.events.lock()) {
                return;
            }
            changed.await;
        }
    }

    /// Wait for `n` `Closed` events of `command_id`.
    pub async fn wait_closed_count(&self, command_id: &str, n: usize) {
        self.wait_until(|events| {
            events
                .iter()
                .filter(|(e, ev)| e.command_id == command_id && ev.is_closed())
                .count()
                >= n
        })
        .await
    }

    pub async fn wait_closed(&self, command_id: &str) {
        self.wait_closed_count(command_id, 1).await
    }

    pub async fn wait_notification(&self, command_id: &str) {
        self.wait_until(|events| {
            events.iter().any(|(e, ev)| {
                e.command_id == command_id && matches!(ev, ExecutionEvent::Notification { .. })
            })
        })
        .await
    }

    /// Wait until `command_id` produced an event matching `pred`.
    pub async fn wait_event(&self, command_id: &str, pred: impl Fn(&ExecutionEvent) -> bool) {
        self.wait_until(|events| {
            events
                .iter()
                .any(|(e, ev)| e.command_id == command_id && pred(ev))
        })
        .await
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, execution: &ExecutionRef, event: ExecutionEvent) {
        self.events.lock().push((execution.clone(), event));
        self.changed.notify_waiters();
    }
}
