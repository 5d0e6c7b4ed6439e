use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::pipeline::scheduler::SchedulerConfig;
use crate::settings::error::SettingsError;

/// Process-level pipeline configuration.
///
/// Style settings live in [`SettingsStore`](crate::settings::SettingsStore);
/// this covers what is fixed for the lifetime of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PipelineConfig {
    pub frame_width: u32,
    pub frame_height: u32,
    /// Host display refresh rate driving the loop.
    pub refresh_hz: u32,
    pub sample_window_ms: u64,
    pub debug_keypoints: bool,
    /// Where style settings are persisted; in memory when unset.
    pub settings_path: Option<PathBuf>,
    pub event_capacity: usize,
    pub no_frame_warn_after_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            frame_width: 1280,
            frame_height: 720,
            refresh_hz: 60,
            sample_window_ms: 1000,
            debug_keypoints: false,
            settings_path: None,
            event_capacity: 64,
            no_frame_warn_after_ms: 5000,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, lookup: &impl Fn(&str) -> Option<String>) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!("ignoring {key}={raw:?}: not a valid value");
            None
        }
    }
}

fn env_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl PipelineConfig {
    /// Read a JSON config file. Missing keys take their defaults.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| SettingsError::Io(e.to_string()))?;
        serde_json::from_str(&contents).map_err(|e| SettingsError::Parse(e.to_string()))
    }

    /// The file named by `TRYON_CONFIG` (or defaults) overlaid with the
    /// other `TRYON_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env) over an arbitrary key/value source.
    /// An unreadable config file is logged and replaced by defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let base = match lookup("TRYON_CONFIG").filter(|p| !p.trim().is_empty()) {
            Some(path) => Self::load(Path::new(path.trim())).unwrap_or_else(|e| {
                tracing::warn!("ignoring config file {path}: {e}");
                Self::default()
            }),
            None => Self::default(),
        };
        base.with_overrides(lookup)
    }

    /// Overlay values from `lookup` (an environment-like key/value source).
    /// Unparsable values are logged and ignored.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(v) = env_parse("TRYON_FRAME_WIDTH", &lookup) {
            self.frame_width = v;
        }
        if let Some(v) = env_parse("TRYON_FRAME_HEIGHT", &lookup) {
            self.frame_height = v;
        }
        if let Some(v) = env_parse("TRYON_REFRESH_HZ", &lookup) {
            self.refresh_hz = v;
        }
        if let Some(raw) = lookup("TRYON_DEBUG_KEYPOINTS") {
            match env_flag(&raw) {
                Some(flag) => self.debug_keypoints = flag,
                None => tracing::warn!("ignoring TRYON_DEBUG_KEYPOINTS={raw:?}: not a flag"),
            }
        }
        if let Some(path) = lookup("TRYON_SETTINGS_PATH").filter(|p| !p.trim().is_empty()) {
            self.settings_path = Some(PathBuf::from(path));
        }
        self
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            debug_keypoints: self.debug_keypoints,
            sample_window: Duration::from_millis(self.sample_window_ms),
            no_frame_warn_after: Duration::from_millis(self.no_frame_warn_after_ms),
            event_capacity: self.event_capacity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let c = PipelineConfig::default();
        assert_eq!((c.frame_width, c.frame_height), (1280, 720));
        assert_eq!(c.refresh_hz, 60);
        assert!(!c.debug_keypoints);
        assert!(c.settings_path.is_none());
    }

    #[test]
    fn overrides_apply_valid_values() {
        let c = PipelineConfig::default().with_overrides(lookup(&[
            ("TRYON_FRAME_WIDTH", "640"),
            ("TRYON_FRAME_HEIGHT", " 480 "),
            ("TRYON_DEBUG_KEYPOINTS", "yes"),
            ("TRYON_SETTINGS_PATH", "/tmp/style.json"),
        ]));
        assert_eq!((c.frame_width, c.frame_height), (640, 480));
        assert!(c.debug_keypoints);
        assert_eq!(c.settings_path, Some(PathBuf::from("/tmp/style.json")));
    }

    #[test]
    fn overrides_ignore_garbage() {
        let c = PipelineConfig::default().with_overrides(lookup(&[
            ("TRYON_REFRESH_HZ", "fast"),
            ("TRYON_DEBUG_KEYPOINTS", "maybe"),
            ("TRYON_SETTINGS_PATH", "  "),
        ]));
        assert_eq!(c, PipelineConfig::default());
    }

    #[test]
    fn load_fills_missing_keys_with_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pipeline.json");
        std::fs::write(&path, r#"{"refreshHz":30,"debugKeypoints":true}"#).unwrap();
        let c = PipelineConfig::load(&path).unwrap();
        assert_eq!(c.refresh_hz, 30);
        assert!(c.debug_keypoints);
        assert_eq!(c.frame_width, 1280);
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = TempDir::new().unwrap();
        let result = PipelineConfig::load(&dir.path().join("absent.json"));
        assert!(matches!(result, Err(SettingsError::Io(_))));
    }

    #[test]
    fn scheduler_config_converts_durations() {
        let c = PipelineConfig {
            sample_window_ms: 250,
            ..Default::default()
        };
        let s = c.scheduler_config();
        assert_eq!(s.sample_window, Duration::from_millis(250));
        assert_eq!(s.no_frame_warn_after, Duration::from_secs(5));
    }

    #[test]
    fn config_file_is_read_then_overridden_by_env() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pipeline.json");
        std::fs::write(&path, r#"{"refreshHz":30,"frameWidth":320}"#).unwrap();
        let path = path.to_string_lossy().into_owned();

        let c = PipelineConfig::from_lookup(lookup(&[
            ("TRYON_CONFIG", path.as_str()),
            ("TRYON_FRAME_WIDTH", "640"),
        ]));
        assert_eq!(c.refresh_hz, 30);
        assert_eq!(c.frame_width, 640);
    }

    #[test]
    fn unreadable_config_file_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.json").to_string_lossy().into_owned();
        let c = PipelineConfig::from_lookup(lookup(&[("TRYON_CONFIG", path.as_str())]));
        assert_eq!(c, PipelineConfig::default());
    }
}
