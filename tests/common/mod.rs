#![allow(dead_code)]

use std::sync::Arc;

use termdeck::deck::DeckState;
use termdeck::exec::{ExecutionEngine, ShellSettings};

pub use termdeck_test_utils::builders;
pub use termdeck_test_utils::{init_tracing, with_timeout, RecordingSink};

/// Plain non-interactive `/bin/sh`, so tests don't depend on the user's rc files.
pub fn posix_shell() -> ShellSettings {
    ShellSettings::new("/bin/sh", false)
}

/// Engine over `deck` with a recording sink and `/bin/sh`.
pub fn engine_for(deck: DeckState) -> (ExecutionEngine, Arc<DeckState>, Arc<RecordingSink>) {
    let deck = Arc::new(deck);
    let sink = Arc::new(RecordingSink::new());
    let engine = ExecutionEngine::new(Arc::clone(&deck))
        .with_sink(sink.clone())
        .with_shell(posix_shell());
    (engine, deck, sink)
}
