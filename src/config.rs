//! Persisted slideshow settings. The core consumes these; it never writes
//! them back — window geometry and interval edits belong to the UI layers.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Result, ensure};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Settings {
    /// Time each image stays on screen.
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
    /// Windowed-mode drawable width in pixels.
    pub window_width: u32,
    /// Windowed-mode drawable height in pixels.
    pub window_height: u32,
    /// Start in fullscreen mode.
    pub fullscreen: bool,
    /// Maximum number of decoded images the prefetch cache holds.
    pub cache_capacity: usize,
    /// Directory the per-session quarantine log is written to.
    pub quarantine_dir: PathBuf,
}

impl Settings {
    const fn default_interval() -> Duration {
        Duration::from_secs(3)
    }

    const fn default_window_width() -> u32 {
        1024
    }

    const fn default_window_height() -> u32 {
        768
    }

    const fn default_cache_capacity() -> usize {
        5
    }

    /// Load settings from a YAML file. A missing file means defaults; a
    /// present but unreadable or malformed file is an error.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&raw)?)
    }

    /// Validate runtime invariants that cannot be expressed via serde
    /// defaults alone.
    pub fn validated(self) -> Result<Self> {
        ensure!(!self.interval.is_zero(), "interval must be positive");
        ensure!(
            self.window_width > 0 && self.window_height > 0,
            "window dimensions must be positive"
        );
        ensure!(self.cache_capacity > 0, "cache-capacity must be at least 1");
        Ok(self)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            interval: Self::default_interval(),
            window_width: Self::default_window_width(),
            window_height: Self::default_window_height(),
            fullscreen: false,
            cache_capacity: Self::default_cache_capacity(),
            quarantine_dir: PathBuf::from("."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::from_yaml_file(dir.path().join("absent.yaml")).unwrap();
        assert_eq!(settings.interval, Duration::from_secs(3));
        assert_eq!(settings.window_width, 1024);
        assert_eq!(settings.window_height, 768);
        assert!(!settings.fullscreen);
        assert_eq!(settings.cache_capacity, 5);
    }

    #[test]
    fn parses_kebab_case_yaml() {
        let yaml = r"
interval: 5s
window-width: 1920
window-height: 1080
fullscreen: true
cache-capacity: 8
quarantine-dir: /tmp/quarantine
";
        let settings: Settings = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(settings.interval, Duration::from_secs(5));
        assert_eq!(settings.window_width, 1920);
        assert_eq!(settings.window_height, 1080);
        assert!(settings.fullscreen);
        assert_eq!(settings.cache_capacity, 8);
        assert_eq!(settings.quarantine_dir, PathBuf::from("/tmp/quarantine"));
    }

    #[test]
    fn partial_yaml_keeps_defaults_for_the_rest() {
        let settings: Settings = serde_yaml::from_str("interval: 250ms\n").unwrap();
        assert_eq!(settings.interval, Duration::from_millis(250));
        assert_eq!(settings.window_width, 1024);
        assert_eq!(settings.cache_capacity, 5);
    }

    #[test]
    fn validated_rejects_zero_values() {
        let zero_interval = Settings {
            interval: Duration::ZERO,
            ..Settings::default()
        };
        assert!(zero_interval.validated().is_err());

        let zero_capacity = Settings {
            cache_capacity: 0,
            ..Settings::default()
        };
        assert!(zero_capacity.validated().is_err());

        let zero_window = Settings {
            window_width: 0,
            ..Settings::default()
        };
        assert!(zero_window.validated().is_err());

        assert!(Settings::default().validated().is_ok());
    }
}
