// src/exec/prompt.rs

//! Best-effort detection of interactive prompts in command output.
//!
//! Detection works on one chunk at a time, exactly as it arrives from the
//! pipe. A prompt split across two reads is missed; lines are not
//! reassembled.

use std::sync::LazyLock;
use std::sync::atomic::{AtomicBool, Ordering};

use regex::Regex;
use tracing::warn;

use crate::types::PromptKind;

/// Ordered pattern table. Earlier rows win, so password rows come first.
/// Every pattern is matched case-insensitively against the chunk with
/// trailing whitespace removed.
pub const PROMPT_PATTERNS: &[(&str, PromptKind)] = &[
    (r"enter\s+password[: ]*$", PromptKind::Password),
    (r"password[: ]*$", PromptKind::Password),
    (r"passphrase[: ]*$", PromptKind::Password),
    (r"enter\s+.+[:?]$", PromptKind::Input),
    (r"continue\?\s*\(y/n\)[: ]*$", PromptKind::Input),
    (r"overwrite file\? \(y/n\)[: ]*$", PromptKind::Input),
];

static COMPILED: LazyLock<Vec<(Regex, PromptKind)>> = LazyLock::new(|| {
    PROMPT_PATTERNS
        .iter()
        .filter_map(|(pattern, kind)| match Regex::new(&format!("(?i){pattern}")) {
            Ok(re) => Some((re, *kind)),
            Err(e) => {
                warn!(pattern, error = %e, "invalid prompt pattern; skipping");
                None
            }
        })
        .collect()
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptMatch {
    pub kind: PromptKind,
    /// The chunk, trailing whitespace removed.
    pub text: String,
}

/// Scan one chunk. Returns nothing while a prompt is already open.
pub fn scan(chunk: &str, prompt_already_open: bool) -> Option<PromptMatch> {
    if prompt_already_open {
        return None;
    }

    let trimmed = chunk.trim_end();
    if trimmed.is_empty() {
        return None;
    }

    COMPILED
        .iter()
        .find(|(re, _)| re.is_match(trimmed))
        .map(|(_, kind)| PromptMatch {
            kind: *kind,
            text: trimmed.to_string(),
        })
}

/// Per-execution "a prompt is outstanding" flag.
///
/// stdout and stderr are relayed by separate tasks, so opening is a
/// compare-and-swap: only one of them can win.
#[derive(Debug, Default)]
pub struct PromptState {
    open: AtomicBool,
}

impl PromptState {
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    /// Returns `true` only for the caller that flipped the flag.
    pub fn try_open(&self) -> bool {
        self.open
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Input was delivered or the process ended.
    pub fn clear(&self) {
        self.open.store(false, Ordering::Release);
    }
}
