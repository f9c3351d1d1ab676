//! Locating `config.toml`.

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};

/// Environment variable naming the config directory directly.
pub const CONFIG_DIR_ENV: &str = "TMDBC_CONFIG_DIR";

/// Config file name inside the config directory.
const CONFIG_FILE: &str = "config.toml";

/// Application directory under the XDG config home.
const APP_DIR: &str = "tmdbc";

/// Resolves the config file path from `--dir` and the process environment.
///
/// # Errors
///
/// Returns an error if no directory can be derived (see [`config_path_from`]).
pub fn resolve_config_path(dir: Option<&PathBuf>) -> Result<PathBuf> {
    config_path_from(dir.map(PathBuf::as_path), |key| std::env::var(key).ok())
}

/// Resolves the config file path, reading variables through `env`.
///
/// First match wins:
/// 1. `dir` (the `--dir` flag)
/// 2. `$TMDBC_CONFIG_DIR`
/// 3. `$XDG_CONFIG_HOME/tmdbc`
/// 4. `$HOME/.config/tmdbc`
///
/// Empty variables are treated as unset.
///
/// # Errors
///
/// Returns an error if none of the above yields a directory.
pub fn config_path_from(
    dir: Option<&Path>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<PathBuf> {
    let var = |key: &str| env(key).filter(|value| !value.is_empty()).map(PathBuf::from);

    let base = if let Some(d) = dir {
        d.to_path_buf()
    } else if let Some(d) = var(CONFIG_DIR_ENV) {
        d
    } else if let Some(xdg) = var("XDG_CONFIG_HOME") {
        xdg.join(APP_DIR)
    } else if let Some(home) = var("HOME") {
        home.join(".config").join(APP_DIR)
    } else {
        bail!("cannot locate config directory: set --dir, {CONFIG_DIR_ENV} or HOME");
    };

    Ok(base.join(CONFIG_FILE))
}
