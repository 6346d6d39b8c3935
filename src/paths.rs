//! Configuration, log and cache locations.

use std::env;
use std::path::{Path, PathBuf};

/// Directory name under the config base.
const APP_DIR: &str = "pacwatch";

/// What: Candidate config directories in priority order.
///
/// Inputs:
/// - `home`: Value of `HOME`, if set
/// - `xdg_config`: Value of `XDG_CONFIG_HOME`, if set
///
/// Output:
/// - `$HOME/.config/pacwatch` first, then `$XDG_CONFIG_HOME/pacwatch`
#[must_use]
pub fn config_dir_candidates(home: Option<&str>, xdg_config: Option<&str>) -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(h) = home.filter(|h| !h.trim().is_empty()) {
        candidates.push(Path::new(h).join(".config").join(APP_DIR));
    }
    if let Some(x) = xdg_config.filter(|x| !x.trim().is_empty()) {
        let dir = Path::new(x).join(APP_DIR);
        if !candidates.contains(&dir) {
            candidates.push(dir);
        }
    }
    candidates
}

/// What: Locate an existing `settings.conf`.
///
/// Output:
/// - First candidate directory holding `settings.conf`, or `None`
#[must_use]
pub fn resolve_settings_config_path() -> Option<PathBuf> {
    let home = env::var("HOME").ok();
    let xdg = env::var("XDG_CONFIG_HOME").ok();
    config_dir_candidates(home.as_deref(), xdg.as_deref())
        .into_iter()
        .map(|d| d.join("settings.conf"))
        .find(|p| p.is_file())
}

/// What: Config directory, created if missing.
///
/// Output:
/// - `$HOME/.config/pacwatch` when it can be created, else the XDG location,
///   else `./pacwatch`
#[must_use]
pub fn config_dir() -> PathBuf {
    let home = env::var("HOME").ok();
    let xdg = env::var("XDG_CONFIG_HOME").ok();
    for dir in config_dir_candidates(home.as_deref(), xdg.as_deref()) {
        if std::fs::create_dir_all(&dir).is_ok() {
            return dir;
        }
    }
    let dir = PathBuf::from(APP_DIR);
    let _ = std::fs::create_dir_all(&dir);
    dir
}

/// Logs directory under the config directory (created if missing).
#[must_use]
pub fn logs_dir() -> PathBuf {
    let dir = config_dir().join("logs");
    let _ = std::fs::create_dir_all(&dir);
    dir
}

/// Cached copy of the last fetched news feed.
#[must_use]
pub fn news_cache_path() -> PathBuf {
    config_dir().join("distro_news.xml")
}
