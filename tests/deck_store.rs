mod common;
use crate::common::builders::{CommandSpecBuilder, DeckConfigBuilder};
use crate::common::init_tracing;

use std::error::Error;
use std::path::{Path, PathBuf};

use termdeck::config::CommandPatch;
use termdeck::deck::{CommandLookup, ConfigStore, DeckState};
use termdeck::errors::TermdeckError;
use termdeck::types::{ConcurrencyPolicy, NotifyPolicy};

type TestResult = Result<(), Box<dyn Error>>;

fn sample_deck(base: &Path) -> DeckState {
    DeckConfigBuilder::new()
        .locale("en")
        .active_profile("web")
        .with_profile("tools", "Tools", None)
        .with_command_in("tools", CommandSpecBuilder::new("fmt", "cargo fmt").build())
        .with_profile("web", "Web", Some("app"))
        .with_command_in("web", CommandSpecBuilder::new("dev", "npm run dev").build())
        .with_command_in(
            "web",
            CommandSpecBuilder::new("deploy", "make deploy")
                .cwd("ops")
                .build(),
        )
        .build_deck(base)
}

#[test]
fn relative_paths_resolve_against_the_deck_directory() {
    init_tracing();

    let deck = sample_deck(Path::new("/srv/project"));

    let dev = deck.resolve("dev").expect("dev");
    assert_eq!(dev.cwd, Some(PathBuf::from("/srv/project/app")));

    let deploy = deck.resolve("deploy").expect("deploy");
    assert_eq!(deploy.cwd, Some(PathBuf::from("/srv/project/ops")));

    // No cwd and no profile root: inherit the process cwd at spawn time.
    let fmt = deck.resolve("fmt").expect("fmt");
    assert_eq!(fmt.cwd, None);
}

#[test]
fn absolute_paths_are_kept() {
    let deck = DeckConfigBuilder::new()
        .with_profile("p", "P", Some("/opt/root"))
        .with_command_in("p", CommandSpecBuilder::new("x", "true").build())
        .build_deck(Path::new("/elsewhere"));

    assert_eq!(
        deck.resolve("x").and_then(|c| c.cwd),
        Some(PathBuf::from("/opt/root"))
    );
}

#[test]
fn unknown_ids_do_not_resolve() {
    let deck = sample_deck(Path::new("/srv"));
    assert!(deck.resolve("nope").is_none());
}

#[test]
fn active_profile_is_listed_first() {
    let deck = sample_deck(Path::new("/srv"));
    let ids: Vec<String> = deck.profiles().into_iter().map(|p| p.id).collect();
    assert_eq!(ids, vec!["web".to_string(), "tools".to_string()]);
}

#[test]
fn policy_and_locale_can_change() -> TestResult {
    let deck = sample_deck(Path::new("/srv"));
    assert_eq!(deck.policy(), ConcurrencyPolicy::SinglePerCommand);

    deck.set_policy(ConcurrencyPolicy::Parallel);
    assert_eq!(deck.policy(), ConcurrencyPolicy::Parallel);

    deck.set_locale("pt")?;
    assert_eq!(deck.locale(), "pt");

    assert!(matches!(
        deck.set_locale("x"),
        Err(TermdeckError::ConfigError(_))
    ));
    assert_eq!(deck.locale(), "pt");

    Ok(())
}

#[test]
fn update_command_applies_patch_but_keeps_id() -> TestResult {
    let deck = sample_deck(Path::new("/srv"));

    let updated = deck.update_command(
        "dev",
        CommandPatch {
            label: Some("Dev server".into()),
            timeout_ms: Some(5_000),
            notify_on: Some(NotifyPolicy::Always),
            ..CommandPatch::default()
        },
    )?;

    assert_eq!(updated.id, "dev");
    assert_eq!(updated.label, "Dev server");
    assert_eq!(updated.command, "npm run dev");
    assert_eq!(updated.timeout_ms, 5_000);
    assert_eq!(updated.notify_on, NotifyPolicy::Always);

    let resolved = deck.resolve("dev").expect("dev");
    assert_eq!(resolved.label, "Dev server");

    Ok(())
}

#[test]
fn updating_an_unknown_command_fails() {
    let deck = sample_deck(Path::new("/srv"));
    let err = deck
        .update_command("ghost", CommandPatch::default())
        .expect_err("should fail");
    assert!(matches!(err, TermdeckError::CommandNotFound(id) if id == "ghost"));
}
