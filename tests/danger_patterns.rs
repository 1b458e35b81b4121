use termdeck::config::CommandSpec;
use termdeck::exec::danger::dangerous_reason;
use termdeck::exec::{ConfirmReason, ConfirmRequest};

#[test]
fn destructive_commands_are_flagged() {
    assert!(dangerous_reason("rm -rf /").is_some());
    assert!(dangerous_reason("sudo rm -rf / --no-preserve-root").is_some());
    assert!(dangerous_reason("rm -rf .").is_some());
    assert!(dangerous_reason("rm -rf ./build").is_some());
    assert!(dangerous_reason("git push --force origin main").is_some());
    assert!(dangerous_reason("GIT PUSH --FORCE").is_some());
    assert!(dangerous_reason("docker system prune -af").is_some());
    assert!(dangerous_reason("docker image prune").is_some());
}

#[test]
fn ordinary_commands_are_not_flagged() {
    assert_eq!(dangerous_reason("cargo build --release"), None);
    assert_eq!(dangerous_reason("rm -rf /tmp/scratch"), None);
    assert_eq!(dangerous_reason("git push origin main"), None);
    assert_eq!(dangerous_reason("docker volume prune"), None);
}

#[test]
fn first_matching_pattern_names_the_reason() {
    assert_eq!(
        dangerous_reason("git push --force"),
        Some("forced git push")
    );
}

#[test]
fn confirm_request_prefers_the_dangerous_reason() {
    let mut spec = CommandSpec::new("push", "Push", "git push --force");
    spec.confirm = true;

    let request = ConfirmRequest::for_spec(&spec).expect("request");
    assert_eq!(request.reason, ConfirmReason::Dangerous("forced git push"));
    assert_eq!(request.command_id, "push");
    assert_eq!(request.label, "Push");
}

#[test]
fn confirm_flag_alone_requests_confirmation() {
    let mut spec = CommandSpec::new("deploy", "Deploy", "make deploy");
    assert!(ConfirmRequest::for_spec(&spec).is_none());

    spec.confirm = true;
    let request = ConfirmRequest::for_spec(&spec).expect("request");
    assert_eq!(request.reason, ConfirmReason::Requested);
}
