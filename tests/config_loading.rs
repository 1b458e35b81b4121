mod common;
use crate::common::init_tracing;

use std::error::Error;
use std::fs;
use std::path::PathBuf;

use termdeck::config::{load_and_validate, load_from_path, ConfigFile};
use termdeck::errors::TermdeckError;
use termdeck::types::{ConcurrencyPolicy, NotifyPolicy};

type TestResult = Result<(), Box<dyn Error>>;

fn write_deck(contents: &str) -> Result<(tempfile::TempDir, PathBuf), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("Termdeck.toml");
    fs::write(&path, contents)?;
    Ok((dir, path))
}

fn load(contents: &str) -> Result<ConfigFile, TermdeckError> {
    let (_dir, path) = write_deck(contents).map_err(|e| TermdeckError::ConfigError(e.to_string()))?;
    load_and_validate(&path)
}

const FULL: &str = r#"
[config]
concurrency_policy = "single-global"
locale = "pt-BR"
active_profile = "web"

[shell]
program = "/bin/zsh"
interactive = false

[profile.web]
name = "Web app"
root_dir = "app"

[[profile.web.command]]
id = "dev"
label = "Dev server"
command = "npm run dev"
timeout_ms = 0
notify_on = "fail"

[[profile.web.command]]
id = "deploy"
label = "Deploy"
command = "make deploy"
cwd = "ops"
timeout_ms = 60000
notify_on = "both"
confirm = true

[profile.tools]

[[profile.tools.command]]
id = "fmt"
label = "Format"
command = "cargo fmt"
"#;

#[test]
fn full_deck_loads() -> TestResult {
    init_tracing();

    let (_dir, path) = write_deck(FULL)?;
    let cfg = load_and_validate(&path)?;

    assert_eq!(cfg.config.concurrency_policy, ConcurrencyPolicy::SingleGlobal);
    assert_eq!(cfg.config.locale, "pt-BR");
    assert_eq!(cfg.config.active_profile.as_deref(), Some("web"));
    assert_eq!(cfg.shell.program.as_deref(), Some("/bin/zsh"));
    assert!(!cfg.shell.interactive);

    let web = &cfg.profile["web"];
    assert_eq!(web.name.as_deref(), Some("Web app"));
    assert_eq!(web.commands.len(), 2);

    let dev = &web.commands[0];
    assert_eq!(dev.notify_on, NotifyPolicy::OnFailure);
    assert_eq!(dev.timeout(), None);

    let deploy = &web.commands[1];
    assert_eq!(deploy.notify_on, NotifyPolicy::Always);
    assert_eq!(deploy.timeout_ms, 60_000);
    assert_eq!(deploy.cwd, Some(PathBuf::from("ops")));
    assert!(deploy.confirm);

    let ids: Vec<&str> = cfg.commands().map(|(_, c)| c.id.as_str()).collect();
    assert_eq!(ids.len(), 3);
    assert!(ids.contains(&"fmt"));

    Ok(())
}

#[test]
fn defaults_apply() -> TestResult {
    init_tracing();

    let cfg = load(
        r#"
[profile.default]

[[profile.default.command]]
id = "hi"
label = "Hi"
command = "echo hi"
"#,
    )?;

    assert_eq!(cfg.config.concurrency_policy, ConcurrencyPolicy::SinglePerCommand);
    assert_eq!(cfg.config.locale, "en");
    assert_eq!(cfg.config.active_profile, None);
    assert_eq!(cfg.shell.program, None);
    assert!(cfg.shell.interactive);

    let hi = &cfg.profile["default"].commands[0];
    assert_eq!(hi.notify_on, NotifyPolicy::Off);
    assert_eq!(hi.timeout_ms, 0);
    assert!(!hi.confirm);
    assert_eq!(hi.cwd, None);

    Ok(())
}

#[test]
fn legacy_policy_name_is_accepted() -> TestResult {
    let cfg = load(
        r#"
[config]
concurrency_policy = "single-per-button"

[profile.p]
"#,
    )?;
    assert_eq!(cfg.config.concurrency_policy, ConcurrencyPolicy::SinglePerCommand);
    Ok(())
}

fn expect_config_error(contents: &str, needle: &str) {
    match load(contents) {
        Err(TermdeckError::ConfigError(msg)) => {
            assert!(msg.contains(needle), "unexpected message: {msg}");
        }
        other => panic!("expected ConfigError containing {needle:?}, got {other:?}"),
    }
}

#[test]
fn deck_without_profiles_is_rejected() {
    init_tracing();
    expect_config_error("[config]\nlocale = \"en\"\n", "at least one");
}

#[test]
fn duplicate_ids_across_profiles_are_rejected() {
    expect_config_error(
        r#"
[[profile.a.command]]
id = "build"
label = "Build A"
command = "make"

[[profile.b.command]]
id = "build"
label = "Build B"
command = "make"
"#,
        "duplicate command id 'build'",
    );
}

#[test]
fn empty_label_and_command_are_rejected() {
    expect_config_error(
        r#"
[[profile.a.command]]
id = "x"
label = " "
command = "true"
"#,
        "empty label",
    );
    expect_config_error(
        r#"
[[profile.a.command]]
id = "x"
label = "X"
command = ""
"#,
        "empty command",
    );
}

#[test]
fn bad_locale_is_rejected() {
    expect_config_error(
        r#"
[config]
locale = "e"

[profile.a]
"#,
        "locale",
    );
    expect_config_error(
        r#"
[config]
locale = "english"

[profile.a]
"#,
        "locale",
    );
}

#[test]
fn unknown_active_profile_is_rejected() {
    expect_config_error(
        r#"
[config]
active_profile = "missing"

[profile.a]
"#,
        "unknown profile 'missing'",
    );
}

#[test]
fn unknown_notify_value_is_a_toml_error() -> TestResult {
    let (_dir, path) = write_deck(
        r#"
[[profile.a.command]]
id = "x"
label = "X"
command = "true"
notify_on = "success"
"#,
    )?;
    assert!(matches!(load_from_path(&path), Err(TermdeckError::TomlError(_))));
    Ok(())
}

#[test]
fn missing_file_is_an_io_error() -> TestResult {
    let dir = tempfile::tempdir()?;
    let result = load_and_validate(dir.path().join("nope.toml"));
    assert!(matches!(result, Err(TermdeckError::IoError(_))));
    Ok(())
}
