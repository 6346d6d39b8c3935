//! User settings from `settings.conf`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::dispatch::DispatcherConfig;
use crate::notifier::upgrade::ElevationTool;
use crate::paths;
use crate::util::config::{parse_bool, parse_key_value, skip_comment_or_empty};

/// What: Notifier and query settings.
///
/// Details:
/// - Unknown keys are ignored; malformed values keep their defaults
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    /// Minutes between poll cycles.
    pub poll_interval_minutes: u64,
    /// Quiet period ending a burst of database changes.
    pub fs_debounce_ms: u64,
    /// Installed-package database directory (watched and linked).
    pub pacman_db_path: PathBuf,
    /// AUR RPC base URL.
    pub aur_rpc_url: String,
    /// News RSS feed URL.
    pub news_feed_url: String,
    /// Maximum number of news items shown.
    pub news_items: usize,
    /// Elevation wrapper preference.
    pub elevation_tool: ElevationTool,
    /// Send desktop notifications.
    pub desktop_notifications: bool,
    /// Command that opens the main application.
    pub app_command: String,
    /// Upgrade without asking when updates are found.
    pub auto_upgrade: bool,
}

impl Default for Settings {
    fn default() -> Self {
        let dispatch = DispatcherConfig::default();
        Self {
            poll_interval_minutes: 60,
            fs_debounce_ms: 2000,
            pacman_db_path: PathBuf::from("/var/lib/pacman/local"),
            aur_rpc_url: dispatch.aur_rpc_url,
            news_feed_url: dispatch.news_feed_url,
            news_items: dispatch.news_items,
            elevation_tool: ElevationTool::Auto,
            desktop_notifications: true,
            app_command: "pacsea".to_string(),
            auto_upgrade: false,
        }
    }
}

impl Settings {
    /// What: Load settings from the user's config directory.
    ///
    /// Output:
    /// - Parsed settings, or defaults when no readable file exists
    #[must_use]
    pub fn load() -> Self {
        paths::resolve_settings_config_path()
            .map_or_else(Self::default, |p| Self::load_from(&p))
    }

    /// What: Load settings from `path`, falling back to defaults on read errors.
    #[must_use]
    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(text) => {
                tracing::debug!(path = %path.display(), "loaded settings");
                Self::parse(&text)
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "cannot read settings, using defaults");
                Self::default()
            }
        }
    }

    /// What: Parse `key = value` settings text.
    ///
    /// Inputs:
    /// - `text`: Contents of `settings.conf`
    ///
    /// Output:
    /// - Settings with every recognized, well-formed key applied
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut settings = Self::default();
        for line in text.lines() {
            if skip_comment_or_empty(line) {
                continue;
            }
            let Some((key, value)) = parse_key_value(line) else {
                continue;
            };
            if !settings.apply(&key, &value) {
                tracing::debug!(key = %key, value = %value, "ignored setting");
            }
        }
        settings
    }

    /// Apply one normalized key; `false` when unknown or malformed.
    fn apply(&mut self, key: &str, value: &str) -> bool {
        match key {
            "poll_interval_minutes" => set_parsed(&mut self.poll_interval_minutes, value, |v| *v > 0),
            "fs_debounce_ms" => set_parsed(&mut self.fs_debounce_ms, value, |_| true),
            "news_items" => set_parsed(&mut self.news_items, value, |v| *v > 0),
            "pacman_db_path" if !value.is_empty() => {
                self.pacman_db_path = PathBuf::from(value);
                true
            }
            "aur_rpc_url" if !value.is_empty() => {
                self.aur_rpc_url = value.trim_end_matches('/').to_string();
                true
            }
            "news_feed_url" if !value.is_empty() => {
                self.news_feed_url = value.to_string();
                true
            }
            "app_command" if !value.is_empty() => {
                self.app_command = value.to_string();
                true
            }
            "elevation_tool" => set_some(&mut self.elevation_tool, ElevationTool::parse(value)),
            "desktop_notifications" => set_some(&mut self.desktop_notifications, parse_bool(value)),
            "auto_upgrade" => set_some(&mut self.auto_upgrade, parse_bool(value)),
            _ => false,
        }
    }

    /// Interval between poll cycles.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_minutes.saturating_mul(60))
    }

    /// Quiet period for the database watch.
    #[must_use]
    pub const fn fs_debounce(&self) -> Duration {
        Duration::from_millis(self.fs_debounce_ms)
    }

    /// What: Dispatcher endpoints derived from these settings.
    ///
    /// Inputs:
    /// - `news_cache_path`: Where to keep the last good news feed
    #[must_use]
    pub fn dispatcher_config(&self, news_cache_path: Option<PathBuf>) -> DispatcherConfig {
        DispatcherConfig {
            aur_rpc_url: self.aur_rpc_url.clone(),
            news_feed_url: self.news_feed_url.clone(),
            news_cache_path,
            news_items: self.news_items,
        }
    }
}

/// Parse `value` into `slot` when it parses and passes `valid`.
fn set_parsed<T: std::str::FromStr>(slot: &mut T, value: &str, valid: impl Fn(&T) -> bool) -> bool {
    match value.parse::<T>() {
        Ok(v) if valid(&v) => {
            *slot = v;
            true
        }
        _ => false,
    }
}

/// Store `value` in `slot` when present.
fn set_some<T>(slot: &mut T, value: Option<T>) -> bool {
    match value {
        Some(v) => {
            *slot = v;
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::Settings;
    use crate::notifier::upgrade::ElevationTool;
    use std::path::PathBuf;
    use std::time::Duration;

    #[test]
    /// What: Recognized keys override defaults, junk keeps them
    ///
    /// - Input: Mixed valid, malformed, unknown and commented lines
    /// - Output: Only the valid keys change
    fn settings_parse_applies_valid_keys() {
        let text = "\
# pacwatch settings
poll_interval_minutes = 30
fs-debounce-ms = 500
news_items = zero
elevation_tool = sudo
desktop_notifications = no
auto_upgrade = yes
aur_rpc_url = https://aur.example/rpc/v5/
pacman_db_path = /srv/pacman/local
unknown_key = 1
; comment
";
        let s = Settings::parse(text);
        assert_eq!(s.poll_interval(), Duration::from_secs(30 * 60));
        assert_eq!(s.fs_debounce(), Duration::from_millis(500));
        assert_eq!(s.news_items, 10);
        assert_eq!(s.elevation_tool, ElevationTool::Sudo);
        assert!(!s.desktop_notifications);
        assert!(s.auto_upgrade);
        assert_eq!(s.aur_rpc_url, "https://aur.example/rpc/v5");
        assert_eq!(s.pacman_db_path, PathBuf::from("/srv/pacman/local"));
        assert_eq!(s.app_command, "pacsea");
    }

    #[test]
    /// What: A zero interval is rejected
    fn settings_zero_interval_keeps_default() {
        assert_eq!(Settings::parse("poll_interval_minutes = 0").poll_interval_minutes, 60);
    }

    #[test]
    /// What: Missing files give defaults; existing files are read
    fn settings_load_from_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = Settings::load_from(&dir.path().join("settings.conf"));
        assert_eq!(missing, Settings::default());

        let path = dir.path().join("settings.conf");
        std::fs::write(&path, "app_command = octopi\n").expect("write");
        assert_eq!(Settings::load_from(&path).app_command, "octopi");
    }

    #[test]
    /// What: Dispatcher config carries endpoints and the cache path
    fn settings_dispatcher_config() {
        let s = Settings::default();
        let cfg = s.dispatcher_config(Some(PathBuf::from("/tmp/news.xml")));
        assert_eq!(cfg.news_feed_url, "https://archlinux.org/feeds/news/");
        assert_eq!(cfg.news_cache_path, Some(PathBuf::from("/tmp/news.xml")));
    }
}
