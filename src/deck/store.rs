// src/deck/store.rs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use tracing::{debug, info};

use crate::config::{validate_locale, CommandPatch, CommandSpec, ConfigFile};
use crate::errors::{Result, TermdeckError};
use crate::types::ConcurrencyPolicy;

use super::{CommandLookup, ConfigStore};

/// Read-only view of one profile, for listings.
#[derive(Debug, Clone)]
pub struct ProfileView {
    pub id: String,
    pub name: String,
    pub root_dir: Option<PathBuf>,
    pub commands: Vec<CommandSpec>,
}

#[derive(Debug)]
struct DeckInner {
    policy: ConcurrencyPolicy,
    locale: String,
    active_profile: Option<String>,
    profiles: BTreeMap<String, ProfileView>,
}

/// In-memory deck shared between the CLI and the execution engine.
///
/// Policy and locale may change between runs; a change only affects
/// admissions that happen afterwards.
#[derive(Debug)]
pub struct DeckState {
    inner: RwLock<DeckInner>,
}

impl DeckState {
    /// Build from a validated deck file. Relative `root_dir`/`cwd` entries are
    /// resolved against `base_dir` (normally the deck file's directory).
    pub fn from_config(cfg: &ConfigFile, base_dir: &Path) -> Self {
        let profiles = cfg
            .profile
            .iter()
            .map(|(id, p)| {
                let root_dir = p.root_dir.as_ref().map(|d| base_dir.join(d));
                let commands = p
                    .commands
                    .iter()
                    .cloned()
                    .map(|mut c| {
                        c.cwd = c.cwd.map(|d| base_dir.join(d));
                        c
                    })
                    .collect();
                let view = ProfileView {
                    id: id.clone(),
                    name: p.name.clone().unwrap_or_else(|| id.clone()),
                    root_dir,
                    commands,
                };
                (id.clone(), view)
            })
            .collect();

        Self {
            inner: RwLock::new(DeckInner {
                policy: cfg.config.concurrency_policy,
                locale: cfg.config.locale.clone(),
                active_profile: cfg.config.active_profile.clone(),
                profiles,
            }),
        }
    }

    pub fn set_policy(&self, policy: ConcurrencyPolicy) {
        let mut inner = self.inner.write();
        if inner.policy != policy {
            info!(from = %inner.policy, to = %policy, "concurrency policy changed");
            inner.policy = policy;
        }
    }

    pub fn set_locale(&self, locale: &str) -> Result<()> {
        validate_locale(locale)?;
        self.inner.write().locale = locale.to_string();
        Ok(())
    }

    /// Apply a partial update to a command, keeping its id.
    pub fn update_command(&self, command_id: &str, patch: CommandPatch) -> Result<CommandSpec> {
        let mut inner = self.inner.write();
        let cmd = inner
            .profiles
            .values_mut()
            .flat_map(|p| p.commands.iter_mut())
            .find(|c| c.id == command_id)
            .ok_or_else(|| TermdeckError::CommandNotFound(command_id.to_string()))?;

        cmd.apply_patch(patch);
        debug!(command = %command_id, "command updated");
        Ok(cmd.clone())
    }

    /// All profiles, the active one first.
    pub fn profiles(&self) -> Vec<ProfileView> {
        let inner = self.inner.read();
        let mut views: Vec<ProfileView> = inner.profiles.values().cloned().collect();
        if let Some(active) = &inner.active_profile {
            views.sort_by_key(|v| v.id != *active);
        }
        views
    }
}

impl ConfigStore for DeckState {
    fn policy(&self) -> ConcurrencyPolicy {
        self.inner.read().policy
    }

    fn locale(&self) -> String {
        self.inner.read().locale.clone()
    }
}

impl CommandLookup for DeckState {
    /// The returned snapshot has its working directory filled in from the
    /// profile root when the command has none of its own.
    fn resolve(&self, command_id: &str) -> Option<CommandSpec> {
        let inner = self.inner.read();
        inner.profiles.values().find_map(|p| {
            p.commands.iter().find(|c| c.id == command_id).map(|c| {
                let mut spec = c.clone();
                if spec.cwd.is_none() {
                    spec.cwd = p.root_dir.clone();
                }
                spec
            })
        })
    }
}
