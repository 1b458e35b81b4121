// src/deck/mod.rs

//! Read side of the profile store, as seen by the execution core.
//!
//! The core only ever asks two things of the store: what the current
//! policy/locale is ([`ConfigStore`]) and what a command id stands for
//! ([`CommandLookup`]). [`DeckState`] is the in-memory implementation built
//! from a validated deck file.

pub mod store;

use crate::config::CommandSpec;
use crate::types::ConcurrencyPolicy;

pub use store::{DeckState, ProfileView};

/// Process-wide settings read at admission / notification time.
pub trait ConfigStore: Send + Sync {
    fn policy(&self) -> ConcurrencyPolicy;
    fn locale(&self) -> String;
}

/// Resolve a command id to an immutable snapshot of its spec.
pub trait CommandLookup: Send + Sync {
    fn resolve(&self, command_id: &str) -> Option<CommandSpec>;
}
