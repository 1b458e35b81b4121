// src/config/validate.rs

use std::collections::HashSet;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, TermdeckError};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::TermdeckError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.config, raw.shell, raw.profile))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_profiles(cfg)?;
    validate_global_config(cfg)?;
    validate_commands(cfg)?;
    Ok(())
}

fn ensure_has_profiles(cfg: &RawConfigFile) -> Result<()> {
    if cfg.profile.is_empty() {
        return Err(TermdeckError::ConfigError(
            "deck must contain at least one [profile.<id>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    validate_locale(&cfg.config.locale)?;

    if let Some(active) = &cfg.config.active_profile {
        if !cfg.profile.contains_key(active) {
            return Err(TermdeckError::ConfigError(format!(
                "[config].active_profile refers to unknown profile '{active}'"
            )));
        }
    }

    Ok(())
}

fn validate_commands(cfg: &RawConfigFile) -> Result<()> {
    let mut seen = HashSet::new();

    for (profile_id, profile) in cfg.profile.iter() {
        for cmd in profile.commands.iter() {
            if cmd.id.trim().is_empty() {
                return Err(TermdeckError::ConfigError(format!(
                    "profile '{profile_id}' has a command with an empty id"
                )));
            }
            if !seen.insert(cmd.id.as_str()) {
                return Err(TermdeckError::ConfigError(format!(
                    "duplicate command id '{}' (in profile '{profile_id}')",
                    cmd.id
                )));
            }
            if cmd.label.trim().is_empty() {
                return Err(TermdeckError::ConfigError(format!(
                    "command '{}' has an empty label",
                    cmd.id
                )));
            }
            if cmd.command.trim().is_empty() {
                return Err(TermdeckError::ConfigError(format!(
                    "command '{}' has an empty command string",
                    cmd.id
                )));
            }
        }
    }

    Ok(())
}

/// Locales are short tags like `en`, `pt` or `pt-BR`.
pub fn validate_locale(locale: &str) -> Result<()> {
    let len = locale.chars().count();
    if !(2..=5).contains(&len) {
        return Err(TermdeckError::ConfigError(format!(
            "invalid locale '{locale}' (expected 2 to 5 characters)"
        )));
    }
    Ok(())
}
