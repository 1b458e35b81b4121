// src/exec/shell.rs

//! Which interpreter runs a command, and how.
//!
//! POSIX: the user's shell with `-i -c <command>`, so aliases and functions
//! from interactive rc files are available. `PS1` is blanked to keep prompt
//! noise out of captured output and `TERMDECK=1` lets rc files detect us.
//!
//! Windows: `%ComSpec% /C <command>`; alias loading is not expected there.

use std::path::PathBuf;
use std::process::Stdio;

use tokio::process::Command;

use crate::config::{CommandSpec, ShellSection};

/// Environment variable that overrides the shell binary.
pub const SHELL_OVERRIDE_ENV: &str = "TERMDECK_SHELL";

/// Environment marker injected into every POSIX command.
pub const SESSION_MARKER_ENV: &str = "TERMDECK";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Posix,
    Windows,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Posix
        }
    }
}

/// Resolved shell settings. Environment lookups happen once, at construction.
#[derive(Debug, Clone)]
pub struct ShellSettings {
    pub program: String,
    pub interactive: bool,
    pub platform: Platform,
}

impl ShellSettings {
    /// Explicit program for this platform, bypassing every lookup.
    pub fn new(program: impl Into<String>, interactive: bool) -> Self {
        Self {
            program: program.into(),
            interactive,
            platform: Platform::current(),
        }
    }

    /// Resolve from the `[shell]` section and the process environment.
    pub fn from_section(section: &ShellSection) -> Self {
        let platform = Platform::current();
        let program = resolve_program(
            platform,
            section.program.as_deref(),
            std::env::var(SHELL_OVERRIDE_ENV).ok().as_deref(),
            std::env::var("SHELL").ok().as_deref(),
            std::env::var("ComSpec").ok().as_deref(),
        );
        Self {
            program,
            interactive: section.interactive,
            platform,
        }
    }
}

impl Default for ShellSettings {
    fn default() -> Self {
        Self::from_section(&ShellSection::default())
    }
}

/// Pick the interpreter binary.
///
/// POSIX order: explicit config, `TERMDECK_SHELL`, `SHELL`, then
/// `/bin/zsh` on macOS and `/bin/bash` elsewhere. Windows always uses the
/// native command interpreter.
pub fn resolve_program(
    platform: Platform,
    configured: Option<&str>,
    override_env: Option<&str>,
    user_shell: Option<&str>,
    comspec: Option<&str>,
) -> String {
    let non_empty = |s: &&str| !s.trim().is_empty();

    match platform {
        Platform::Windows => comspec
            .filter(non_empty)
            .unwrap_or("cmd.exe")
            .to_string(),
        Platform::Posix => configured
            .filter(non_empty)
            .or(override_env.filter(non_empty))
            .or(user_shell.filter(non_empty))
            .unwrap_or(if cfg!(target_os = "macos") {
                "/bin/zsh"
            } else {
                "/bin/bash"
            })
            .to_string(),
    }
}

/// Everything needed to spawn one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellInvocation {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
    pub cwd: Option<PathBuf>,
}

impl ShellInvocation {
    /// Build a Tokio command with all three pipes attached.
    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .envs(self.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(cwd) = &self.cwd {
            cmd.current_dir(cwd);
        }

        // New session: the child leads its own process group and has no
        // controlling terminal. An interactive shell must not reach our tty.
        #[cfg(unix)]
        // SAFETY: setsid is async-signal-safe and touches no parent state.
        unsafe {
            cmd.pre_exec(|| {
                nix::unistd::setsid()
                    .map(|_| ())
                    .map_err(std::io::Error::from)
            });
        }

        cmd
    }
}

/// Resolution never fails; a missing shell surfaces later as a spawn error.
pub fn resolve(spec: &CommandSpec, settings: &ShellSettings) -> ShellInvocation {
    match settings.platform {
        Platform::Posix => {
            let mut args = Vec::with_capacity(3);
            if settings.interactive {
                args.push("-i".to_string());
            }
            args.push("-c".to_string());
            args.push(spec.command.clone());

            ShellInvocation {
                program: settings.program.clone(),
                args,
                env: vec![
                    ("PS1".to_string(), String::new()),
                    (SESSION_MARKER_ENV.to_string(), "1".to_string()),
                ],
                cwd: spec.cwd.clone(),
            }
        }
        Platform::Windows => ShellInvocation {
            program: settings.program.clone(),
            args: vec!["/C".to_string(), spec.command.clone()],
            env: Vec::new(),
            cwd: spec.cwd.clone(),
        },
    }
}
