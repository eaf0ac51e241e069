//! Runtime configuration for stepwise.
//!
//! The module exposes the process-wide default [`MatchMode`] used by
//! registries that do not fix their own via
//! [`Steps::with_match_mode`](crate::Steps::with_match_mode).

use std::sync::atomic::{AtomicU8, Ordering};

use stepwise_patterns::MatchMode;

/// Environment variable consulted when no in-process override is set.
pub const MATCH_MODE_ENV: &str = "STEPWISE_MATCH_MODE";

const OVERRIDE_UNSET: u8 = 0;
const OVERRIDE_SEARCH: u8 = 1;
const OVERRIDE_ANCHORED: u8 = 2;

static MATCH_MODE_OVERRIDE: AtomicU8 = AtomicU8::new(OVERRIDE_UNSET);

fn parse_env_mode(value: &str) -> Option<MatchMode> {
    value
        .parse::<MatchMode>()
        .inspect_err(|err| log::warn!("ignoring {MATCH_MODE_ENV}: {err}"))
        .ok()
}

fn env_match_mode() -> Option<MatchMode> {
    std::env::var(MATCH_MODE_ENV)
        .ok()
        .as_deref()
        .and_then(parse_env_mode)
}

fn override_state() -> Option<MatchMode> {
    match MATCH_MODE_OVERRIDE.load(Ordering::Relaxed) {
        OVERRIDE_SEARCH => Some(MatchMode::Search),
        OVERRIDE_ANCHORED => Some(MatchMode::Anchored),
        _ => None,
    }
}

/// Determine how step patterns are matched against phrases.
///
/// An override set with [`set_match_mode`] wins over the environment, which
/// wins over [`MatchMode::Search`].
#[must_use]
pub fn match_mode() -> MatchMode {
    override_state().or_else(env_match_mode).unwrap_or_default()
}

/// Override the default match mode for the current process.
///
/// Only registries created afterwards are affected. Tests may call
/// [`clear_match_mode_override`] to restore environment driven behaviour.
pub fn set_match_mode(mode: MatchMode) {
    let value = match mode {
        MatchMode::Search => OVERRIDE_SEARCH,
        MatchMode::Anchored => OVERRIDE_ANCHORED,
    };
    MATCH_MODE_OVERRIDE.store(value, Ordering::Relaxed);
}

/// Remove any in-process override for the match mode.
pub fn clear_match_mode_override() {
    MATCH_MODE_OVERRIDE.store(OVERRIDE_UNSET, Ordering::Relaxed);
}
