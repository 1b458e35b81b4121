// src/exec/danger.rs

//! Commands that always require confirmation before running.

use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

/// `(pattern, description)`; matched case-insensitively anywhere in the
/// command text.
pub const DANGEROUS_PATTERNS: &[(&str, &str)] = &[
    (r"rm\s+-rf\s+/(\s|$)", "recursive delete of the filesystem root"),
    (r"rm\s+-rf\s+\.", "recursive delete of the current directory"),
    (r"git\s+push\s+--force", "forced git push"),
    (r"docker\s+(system|container|image)\s+prune", "docker prune"),
];

static COMPILED: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    DANGEROUS_PATTERNS
        .iter()
        .filter_map(|(pattern, what)| match Regex::new(&format!("(?i){pattern}")) {
            Ok(re) => Some((re, *what)),
            Err(e) => {
                warn!(pattern, error = %e, "invalid dangerous-command pattern; skipping");
                None
            }
        })
        .collect()
});

/// Description of the first matching pattern, if the command looks destructive.
pub fn dangerous_reason(command: &str) -> Option<&'static str> {
    COMPILED
        .iter()
        .find(|(re, _)| re.is_match(command))
        .map(|(_, what)| *what)
}
