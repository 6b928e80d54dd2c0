//! Centralized path helpers for the config directory.

use std::path::PathBuf;

use crate::core::app;

/// Project directories from the standard platform locations.
pub fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("io", app::VENDOR, app::NAME)
}

/// Override config dir via env var (tests and sandboxed hosts).
fn config_dir_override() -> Option<PathBuf> {
    std::env::var("GOALDIGGER_CONFIG_DIR")
        .ok()
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
}

/// Config directory (~/.config/goaldigger/). `GOALDIGGER_CONFIG_DIR` takes precedence.
pub fn config_dir() -> Option<PathBuf> {
    if let Some(p) = config_dir_override() {
        return Some(p);
    }
    project_dirs().map(|d| d.config_dir().to_path_buf())
}

/// Path of the user config file (`config.json` inside [`config_dir`]).
pub fn config_file() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.json"))
}
