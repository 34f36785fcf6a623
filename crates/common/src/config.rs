//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{FolioError, FolioResult};

/// Global application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Default motion timing.
    pub motion: MotionConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Default timing for the motion primitives.
///
/// Millisecond fields are signed floats so hand-edited files with negative
/// values still load; consumers pass them through [`crate::sanitize_ms`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Display refresh rate driving animation frames (Hz).
    pub frame_rate_hz: u32,

    /// Viewport width in CSS pixels.
    pub viewport_width: f64,

    /// Viewport height in CSS pixels.
    pub viewport_height: f64,

    /// Per-character reveal delay for typewriter text.
    pub typewriter_speed_ms: f64,

    /// Delay before the first typewriter character.
    pub typewriter_delay_ms: f64,

    /// Cursor blink half-period.
    pub cursor_blink_ms: f64,

    /// Count-up duration for stat counters.
    pub counter_duration_ms: f64,

    /// Scroll offset past which the navigation bar counts as scrolled.
    pub nav_scroll_threshold_px: f64,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "folio_host=trace,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            frame_rate_hz: crate::clock::DEFAULT_FRAME_RATE_HZ,
            viewport_width: 1440.0,
            viewport_height: 900.0,
            typewriter_speed_ms: 50.0,
            typewriter_delay_ms: 0.0,
            cursor_blink_ms: 530.0,
            counter_duration_ms: 2000.0,
            nav_scroll_threshold_px: 50.0,
        }
    }
}

impl MotionConfig {
    /// Reject values no host can be built from. Timing fields are not
    /// checked here; they are sanitized where they are used.
    pub fn validate(&self) -> FolioResult<()> {
        if self.frame_rate_hz == 0 {
            return Err(FolioError::config("frame_rate_hz must be at least 1"));
        }
        for (name, extent) in [
            ("viewport_width", self.viewport_width),
            ("viewport_height", self.viewport_height),
        ] {
            if !extent.is_finite() || extent <= 0.0 {
                return Err(FolioError::config(format!(
                    "{name} must be a positive number, got {extent}"
                )));
            }
        }
        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        Self::load_from(&config_file_path())
    }

    /// Load config from an explicit path, falling back to defaults.
    pub fn load_from(config_path: &std::path::Path) -> Self {
        if config_path.exists() {
            match std::fs::read_to_string(config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Save config to the standard location.
    pub fn save(&self) -> FolioResult<PathBuf> {
        let config_path = config_file_path();
        self.save_to(&config_path)?;
        Ok(config_path)
    }

    /// Save config to an explicit path.
    pub fn save_to(&self, config_path: &std::path::Path) -> FolioResult<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(config_path, json)?;
        Ok(())
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("folio").join("config.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_page_timing() {
        let motion = MotionConfig::default();
        assert_eq!(motion.cursor_blink_ms, 530.0);
        assert_eq!(motion.typewriter_speed_ms, 50.0);
        assert_eq!(motion.nav_scroll_threshold_px, 50.0);
    }

    #[test]
    fn test_validate_rejects_unusable_viewport() {
        assert!(MotionConfig::default().validate().is_ok());

        let config = MotionConfig {
            viewport_width: 0.0,
            ..MotionConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, FolioError::Config { .. }));
        assert!(err.to_string().contains("viewport_width"), "{err}");

        let config = MotionConfig {
            frame_rate_hz: 0,
            ..MotionConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_file_fills_in_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{ "motion": { "frame_rate_hz": 120 } }"#).unwrap();
        assert_eq!(config.motion.frame_rate_hz, 120);
        assert_eq!(config.motion.counter_duration_ms, 2000.0);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = std::env::temp_dir().join("folio_test_config");
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("config.json");

        let mut config = AppConfig::default();
        config.motion.cursor_blink_ms = 400.0;
        config.save_to(&path).unwrap();

        let loaded = AppConfig::load_from(&path);
        assert_eq!(loaded.motion.cursor_blink_ms, 400.0);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_invalid_file_falls_back_to_defaults() {
        let dir = std::env::temp_dir().join("folio_test_config_invalid");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.json");
        std::fs::write(&path, "not json").unwrap();

        let loaded = AppConfig::load_from(&path);
        assert_eq!(loaded.motion, MotionConfig::default());

        std::fs::remove_dir_all(&dir).ok();
    }
}
