// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::{ConcurrencyPolicy, NotifyPolicy};

/// Top-level deck file as read from TOML, before validation.
///
/// ```toml
/// [config]
/// concurrency_policy = "single-per-command"
/// locale = "en"
///
/// [profile.default]
/// name = "Default"
///
/// [[profile.default.command]]
/// id = "build"
/// label = "Build"
/// command = "cargo build"
/// notify_on = "on-failure"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,

    #[serde(default)]
    pub shell: ShellSection,

    /// Profiles keyed by profile id.
    #[serde(default)]
    pub profile: BTreeMap<String, ProfileConfig>,
}

/// Validated deck file. Only constructible through `TryFrom<RawConfigFile>`
/// (or `new_unchecked` inside the crate).
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub shell: ShellSection,
    pub profile: BTreeMap<String, ProfileConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        config: ConfigSection,
        shell: ShellSection,
        profile: BTreeMap<String, ProfileConfig>,
    ) -> Self {
        Self {
            config,
            shell,
            profile,
        }
    }

    /// Iterate every command of every profile, with its profile id.
    pub fn commands(&self) -> impl Iterator<Item = (&str, &CommandSpec)> {
        self.profile
            .iter()
            .flat_map(|(pid, p)| p.commands.iter().map(move |c| (pid.as_str(), c)))
    }
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    #[serde(default)]
    pub concurrency_policy: ConcurrencyPolicy,

    /// UI locale; selects the language of notification texts.
    #[serde(default = "default_locale")]
    pub locale: String,

    /// Profile whose commands are listed first. Lookups by id search every
    /// profile regardless.
    #[serde(default)]
    pub active_profile: Option<String>,
}

fn default_locale() -> String {
    "en".to_string()
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            concurrency_policy: ConcurrencyPolicy::default(),
            locale: default_locale(),
            active_profile: None,
        }
    }
}

/// `[shell]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ShellSection {
    /// Explicit interpreter. Takes precedence over `TERMDECK_SHELL` / `SHELL`.
    #[serde(default)]
    pub program: Option<String>,

    /// Run POSIX shells with `-i` so rc-file aliases and functions resolve.
    #[serde(default = "default_interactive")]
    pub interactive: bool,
}

fn default_interactive() -> bool {
    true
}

impl Default for ShellSection {
    fn default() -> Self {
        Self {
            program: None,
            interactive: default_interactive(),
        }
    }
}

/// `[profile.<id>]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileConfig {
    #[serde(default)]
    pub name: Option<String>,

    /// Directory commands of this profile run in when they have no `cwd`.
    #[serde(default)]
    pub root_dir: Option<PathBuf>,

    #[serde(default, rename = "command")]
    pub commands: Vec<CommandSpec>,
}

/// One runnable command ("button").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub id: String,
    pub label: String,
    pub command: String,

    #[serde(default)]
    pub cwd: Option<PathBuf>,

    /// Wall-clock limit in milliseconds; `0` means unlimited.
    #[serde(default)]
    pub timeout_ms: u64,

    #[serde(default)]
    pub notify_on: NotifyPolicy,

    /// Always ask before running, even if the command looks harmless.
    #[serde(default)]
    pub confirm: bool,
}

impl CommandSpec {
    pub fn new(id: impl Into<String>, label: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            command: command.into(),
            cwd: None,
            timeout_ms: 0,
            notify_on: NotifyPolicy::Off,
            confirm: false,
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }

    /// Merge a partial update. The identity (`id`) is never touched.
    pub fn apply_patch(&mut self, patch: CommandPatch) {
        let CommandPatch {
            label,
            command,
            cwd,
            timeout_ms,
            notify_on,
            confirm,
        } = patch;

        if let Some(label) = label {
            self.label = label;
        }
        if let Some(command) = command {
            self.command = command;
        }
        if let Some(cwd) = cwd {
            self.cwd = Some(cwd);
        }
        if let Some(timeout_ms) = timeout_ms {
            self.timeout_ms = timeout_ms;
        }
        if let Some(notify_on) = notify_on {
            self.notify_on = notify_on;
        }
        if let Some(confirm) = confirm {
            self.confirm = confirm;
        }
    }
}

/// Partial update for a [`CommandSpec`]; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CommandPatch {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub cwd: Option<PathBuf>,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    #[serde(default)]
    pub notify_on: Option<NotifyPolicy>,
    #[serde(default)]
    pub confirm: Option<bool>,
}
