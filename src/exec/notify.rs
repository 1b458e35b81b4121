// src/exec/notify.rs

//! Terminal notification for a finished execution.

use std::time::Duration;

use crate::config::CommandSpec;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub failed: bool,
}

/// How an execution ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub exit_code: Option<i32>,
    pub timed_out: bool,
    pub elapsed: Duration,
}

impl RunSummary {
    /// Timed out, or exited with a non-zero code. A signal death on its own
    /// (e.g. after a stop) is not a failure.
    pub fn failed(&self) -> bool {
        self.timed_out || self.exit_code.is_some_and(|c| c != 0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Language {
    En,
    Pt,
}

impl Language {
    fn from_locale(locale: &str) -> Self {
        if locale.to_lowercase().starts_with("pt") {
            Language::Pt
        } else {
            Language::En
        }
    }
}

/// Build the notification for `spec`, or `None` when its policy says to
/// stay quiet.
pub fn compose(spec: &CommandSpec, summary: &RunSummary, locale: &str) -> Option<Notification> {
    let failed = summary.failed();
    if !spec.notify_on.should_notify(failed) {
        return None;
    }

    let lang = Language::from_locale(locale);
    let seconds = format!("{:.1}", summary.elapsed.as_secs_f64());

    let title = match (lang, failed) {
        (Language::En, false) => format!("Done: {}", spec.label),
        (Language::En, true) => format!("Failed: {}", spec.label),
        (Language::Pt, false) => format!("Concluído: {}", spec.label),
        (Language::Pt, true) => format!("Falhou: {}", spec.label),
    };

    let body = if summary.timed_out {
        match lang {
            Language::En => format!("Timeout after {}ms", spec.timeout_ms),
            Language::Pt => format!("Timeout após {}ms", spec.timeout_ms),
        }
    } else if let Some(code) = summary.exit_code.filter(|_| failed) {
        format!("Exit code {code} • {seconds}s")
    } else {
        format!("{seconds}s")
    };

    Some(Notification {
        title,
        body,
        failed,
    })
}
