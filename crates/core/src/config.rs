//! Configuration constants and path utilities for ilc.
//!
//! This module resolves the history file location and exposes the names of the
//! environment variables ilc reads and writes.

use std::collections::BTreeMap;

/// Prefix of environment variables carrying input values, in and out.
pub const ENV_INPUT_PREFIX: &str = "ILC_INPUT_";
/// Environment variable overriding the history file path.
pub const ENV_HISTORY_FILE: &str = "ILC_HISTFILE";
/// Environment variable limiting the number of history entries kept per config.
pub const ENV_HISTORY_SIZE: &str = "ILC_HISTSIZE";

/// Default path for the replay history
const DEFAULT_HISTORY_PATH: &str = "~/.ilc_history";
/// History path value that disables history altogether
pub const DISABLED_HISTORY_PATH: &str = "-";

/// Leading marker on the first argument that requests a replay from history.
pub const REPLAY_PREFIX: char = '!';

/// Shell used when no command in the chain defines one
pub const DEFAULT_SHELL: &[&str] = &["/bin/sh"];

/// Snapshot of the process environment, keyed by variable name.
pub type EnvMap = BTreeMap<String, String>;

/// Captures the current process environment.
///
/// Variables whose name or value is not valid unicode are skipped.
#[must_use]
pub fn ambient_environment() -> EnvMap {
    std::env::vars_os()
        .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
        .collect()
}

/// Resolves the history file path.
///
/// A path given on the command line wins over `ILC_HISTFILE`, which wins over the
/// default `~/.ilc_history`. Returns `None` when history is disabled with `-`.
///
/// # Examples
///
/// ```
/// use ilc_core::config::{get_history_path, EnvMap};
///
/// let env = EnvMap::new();
/// let custom = get_history_path(Some("/tmp/history.yml"), &env);
/// assert_eq!(custom.as_deref(), Some("/tmp/history.yml"));
///
/// assert!(get_history_path(Some("-"), &env).is_none());
/// ```
#[must_use]
pub fn get_history_path(history_path_arg: Option<&str>, env: &EnvMap) -> Option<String> {
    let history_path = history_path_arg
        .or_else(|| env.get(ENV_HISTORY_FILE).map(String::as_str))
        .filter(|path| !path.is_empty())
        .unwrap_or(DEFAULT_HISTORY_PATH);

    if history_path == DISABLED_HISTORY_PATH {
        return None;
    }

    Some(shellexpand::tilde(history_path).to_string())
}

/// Resolves the per-config history size limit from an argument or `ILC_HISTSIZE`.
///
/// Unparseable values are ignored, leaving history unlimited.
#[must_use]
pub fn get_history_size(history_size_arg: Option<usize>, env: &EnvMap) -> Option<usize> {
    history_size_arg.or_else(|| {
        env.get(ENV_HISTORY_SIZE)
            .and_then(|size| size.trim().parse::<usize>().ok())
    })
}

/// Key under which history entries for a config file are stored.
///
/// Uses the canonical path when it can be resolved so that `./x.yml` and `x.yml`
/// share history.
#[must_use]
pub fn history_key(config_path: &str) -> String {
    let expanded = shellexpand::tilde(config_path).to_string();

    match std::fs::canonicalize(&expanded) {
        Ok(path) => path.to_string_lossy().to_string(),
        Err(_) => expanded,
    }
}
