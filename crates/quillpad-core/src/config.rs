//! Sketch session configuration.

use crate::color::SerializableColor;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Smallest brush size a stroke is ever drawn with.
pub const MIN_BRUSH_SIZE: f64 = 1.0;

/// Default brush size in backing pixels.
pub const DEFAULT_BRUSH_SIZE: f64 = 3.0;

/// Default chance per move event of requesting an auto-save.
pub const DEFAULT_AUTOSAVE_CHANCE: f64 = 0.1;

/// Default haptic pulse length at stroke begin.
pub const DEFAULT_HAPTIC_DURATION_MS: u32 = 10;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Tool settings read by the session.
///
/// Brush size and color are sampled once when a stroke begins; replacing the
/// configuration mid-stroke only affects later strokes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SketchConfig {
    /// Brush diameter in backing pixels.
    pub brush_size: f64,
    /// Brush color.
    pub brush_color: SerializableColor,
    /// Use device-reported force for pressure and scale line width by it.
    pub enable_pressure_sensitivity: bool,
    /// Treat two or more simultaneous contacts as a multi-touch gesture.
    pub enable_gesture_detection: bool,
    /// Emit a haptic pulse when a stroke begins.
    pub enable_haptics: bool,
    /// Haptic pulse length.
    pub haptic_duration_ms: u32,
    /// Probability in [0, 1] that a single move event requests an auto-save.
    pub autosave_chance: f64,
}

impl Default for SketchConfig {
    fn default() -> Self {
        Self {
            brush_size: DEFAULT_BRUSH_SIZE,
            brush_color: SerializableColor::black(),
            enable_pressure_sensitivity: true,
            enable_gesture_detection: true,
            enable_haptics: true,
            haptic_duration_ms: DEFAULT_HAPTIC_DURATION_MS,
            autosave_chance: DEFAULT_AUTOSAVE_CHANCE,
        }
    }
}

impl SketchConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check values that cannot be sensibly clamped.
    ///
    /// A non-positive brush size is accepted here and clamped when a stroke
    /// begins (see [`SketchConfig::effective_brush_size`]).
    pub fn validate(&self) -> ConfigResult<()> {
        if !self.brush_size.is_finite() {
            return Err(ConfigError::Invalid(format!(
                "brush_size must be finite, got {}",
                self.brush_size
            )));
        }
        if !(0.0..=1.0).contains(&self.autosave_chance) {
            return Err(ConfigError::Invalid(format!(
                "autosave_chance must be within [0, 1], got {}",
                self.autosave_chance
            )));
        }
        if self.brush_size <= 0.0 {
            log::warn!(
                "brush_size {} is not positive; strokes will use {}",
                self.brush_size,
                MIN_BRUSH_SIZE
            );
        }
        Ok(())
    }

    /// Brush size actually used for a new stroke.
    pub fn effective_brush_size(&self) -> f64 {
        if self.brush_size.is_finite() && self.brush_size >= MIN_BRUSH_SIZE {
            self.brush_size
        } else {
            MIN_BRUSH_SIZE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = SketchConfig::from_json(r#"{ "brush_size": 8.0 }"#).unwrap();
        assert!((config.brush_size - 8.0).abs() < f64::EPSILON);
        assert!(config.enable_gesture_detection);
        assert!((config.autosave_chance - DEFAULT_AUTOSAVE_CHANCE).abs() < f64::EPSILON);
    }

    #[test]
    fn test_rejects_bad_autosave_chance() {
        let result = SketchConfig::from_json(r#"{ "autosave_chance": 1.5 }"#);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_brush_size_clamped() {
        let mut config = SketchConfig::new();
        config.brush_size = 0.0;
        assert!(config.validate().is_ok());
        assert!((config.effective_brush_size() - MIN_BRUSH_SIZE).abs() < f64::EPSILON);

        config.brush_size = -4.0;
        assert!((config.effective_brush_size() - MIN_BRUSH_SIZE).abs() < f64::EPSILON);

        config.brush_size = 12.0;
        assert!((config.effective_brush_size() - 12.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "enable_haptics": false }"#).unwrap();

        let config = SketchConfig::load(&path).unwrap();
        assert!(!config.enable_haptics);
    }

    #[test]
    fn test_json_round_trip() {
        let mut config = SketchConfig::new();
        config.brush_color = SerializableColor::new(200, 10, 10, 255);
        let json = config.to_json().unwrap();
        assert_eq!(SketchConfig::from_json(&json).unwrap(), config);
    }
}
