use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How many executions may be in flight at the same time.
///
/// - `Parallel`: no restriction.
/// - `SinglePerCommand`: at most one live execution per command id
///   (default, matching how decks have always behaved).
/// - `SingleGlobal`: at most one live execution across every command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConcurrencyPolicy {
    Parallel,
    #[default]
    #[serde(alias = "single-per-button")]
    SinglePerCommand,
    SingleGlobal,
}

impl FromStr for ConcurrencyPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "parallel" => Ok(ConcurrencyPolicy::Parallel),
            "single-per-command" | "single-per-button" => Ok(ConcurrencyPolicy::SinglePerCommand),
            "single-global" => Ok(ConcurrencyPolicy::SingleGlobal),
            other => Err(format!(
                "invalid concurrency_policy: {other} (expected \"parallel\", \"single-per-command\" or \"single-global\")"
            )),
        }
    }
}

impl fmt::Display for ConcurrencyPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConcurrencyPolicy::Parallel => "parallel",
            ConcurrencyPolicy::SinglePerCommand => "single-per-command",
            ConcurrencyPolicy::SingleGlobal => "single-global",
        };
        f.write_str(s)
    }
}

/// When a terminal notification is emitted for a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NotifyPolicy {
    #[default]
    Off,
    #[serde(alias = "fail", alias = "error")]
    OnFailure,
    #[serde(alias = "both")]
    Always,
}

impl NotifyPolicy {
    /// `always`, or `on-failure` when the run failed.
    pub fn should_notify(self, failed: bool) -> bool {
        match self {
            NotifyPolicy::Off => false,
            NotifyPolicy::OnFailure => failed,
            NotifyPolicy::Always => true,
        }
    }
}

impl FromStr for NotifyPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "off" => Ok(NotifyPolicy::Off),
            "on-failure" | "fail" | "error" => Ok(NotifyPolicy::OnFailure),
            "always" | "both" => Ok(NotifyPolicy::Always),
            other => Err(format!(
                "invalid notify_on: {other} (expected \"off\", \"on-failure\" or \"always\")"
            )),
        }
    }
}

impl fmt::Display for NotifyPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotifyPolicy::Off => f.write_str("off"),
            NotifyPolicy::OnFailure => f.write_str("on-failure"),
            NotifyPolicy::Always => f.write_str("always"),
        }
    }
}

/// Which restriction rejected an admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BusyScope {
    Command,
    Global,
}

impl fmt::Display for BusyScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BusyScope::Command => f.write_str("command"),
            BusyScope::Global => f.write_str("global"),
        }
    }
}

/// Kind of interactive prompt spotted in command output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptKind {
    Password,
    Input,
}

impl fmt::Display for PromptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PromptKind::Password => f.write_str("password"),
            PromptKind::Input => f.write_str("input"),
        }
    }
}
