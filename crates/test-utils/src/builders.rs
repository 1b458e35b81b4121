#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use termdeck::config::{
    CommandSpec, ConfigFile, ConfigSection, ProfileConfig, RawConfigFile, ShellSection,
};
use termdeck::deck::DeckState;
use termdeck::types::{ConcurrencyPolicy, NotifyPolicy};

/// Builder for a deck file, to simplify test setup.
///
/// Commands added with [`DeckConfigBuilder::with_command`] land in the
/// `default` profile.
pub struct DeckConfigBuilder {
    config: RawConfigFile,
}

impl DeckConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                config: ConfigSection::default(),
                shell: ShellSection::default(),
                profile: BTreeMap::new(),
            },
        }
    }

    pub fn policy(mut self, policy: ConcurrencyPolicy) -> Self {
        self.config.config.concurrency_policy = policy;
        self
    }

    pub fn locale(mut self, locale: &str) -> Self {
        self.config.config.locale = locale.to_string();
        self
    }

    pub fn active_profile(mut self, id: &str) -> Self {
        self.config.config.active_profile = Some(id.to_string());
        self
    }

    pub fn shell_program(mut self, program: &str) -> Self {
        self.config.shell.program = Some(program.to_string());
        self
    }

    pub fn with_profile(mut self, id: &str, name: &str, root_dir: Option<&str>) -> Self {
        let profile = self.config.profile.entry(id.to_string()).or_default();
        profile.name = Some(name.to_string());
        profile.root_dir = root_dir.map(PathBuf::from);
        self
    }

    pub fn with_command(self, command: CommandSpec) -> Self {
        self.with_command_in("default", command)
    }

    pub fn with_command_in(mut self, profile_id: &str, command: CommandSpec) -> Self {
        self.config
            .profile
            .entry(profile_id.to_string())
            .or_insert_with(ProfileConfig::default)
            .commands
            .push(command);
        self
    }

    /// The unvalidated file, for tests that exercise validation itself.
    pub fn build_raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }

    /// Validated deck loaded into a [`DeckState`], with relative paths
    /// resolved against `base_dir`.
    pub fn build_deck(self, base_dir: &Path) -> DeckState {
        DeckState::from_config(&self.build(), base_dir)
    }
}

impl Default for DeckConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `CommandSpec`. The label defaults to the id.
pub struct CommandSpecBuilder {
    spec: CommandSpec,
}

impl CommandSpecBuilder {
    pub fn new(id: &str, command: &str) -> Self {
        Self {
            spec: CommandSpec::new(id, id, command),
        }
    }

    pub fn label(mut self, label: &str) -> Self {
        self.spec.label = label.to_string();
        self
    }

    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.spec.cwd = Some(cwd.into());
        self
    }

    pub fn timeout_ms(mut self, ms: u64) -> Self {
        self.spec.timeout_ms = ms;
        self
    }

    pub fn notify_on(mut self, policy: NotifyPolicy) -> Self {
        self.spec.notify_on = policy;
        self
    }

    pub fn confirm(mut self, confirm: bool) -> Self {
        self.spec.confirm = confirm;
        self
    }

    pub fn build(self) -> CommandSpec {
        self.spec
    }
}
