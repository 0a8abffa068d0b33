//! Editor configuration.
//!
//! Every field has a default, so a host only needs to send the values it
//! wants to change: `{"canvasWidth": 1080, "canvasHeight": 1350}`.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use tc_core::geometry::{DEFAULT_HEIGHT, DEFAULT_WIDTH};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    pub canvas_width: f64,
    pub canvas_height: f64,
    /// Maximum number of retained history entries.
    pub history_limit: usize,
    pub duplicate_offset_x: f32,
    pub duplicate_offset_y: f32,
    /// New text boxes are `canvas_width - text_margin` wide.
    pub text_margin: f32,
    /// Uploaded images are shrunk to this fraction of the canvas.
    pub image_fit_ratio: f64,
    pub panel_width: f64,
    pub panel_height: f64,
    pub min_font_size: f32,
    pub font_size_step: f32,
    pub emoji_font_size: f32,
    pub audio_tile_size: f32,
    pub welcome_text: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            canvas_width: DEFAULT_WIDTH,
            canvas_height: DEFAULT_HEIGHT,
            history_limit: 50,
            duplicate_offset_x: 10.0,
            duplicate_offset_y: 10.0,
            text_margin: 100.0,
            image_fit_ratio: 0.8,
            panel_width: 110.0,
            panel_height: 50.0,
            min_font_size: 10.0,
            font_size_step: 2.0,
            emoji_font_size: 100.0,
            audio_tile_size: 100.0,
            welcome_text: "Welcome to Twin Clouds Editor!".into(),
        }
    }
}

impl EditorConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history_limit == 0 {
            return Err(ConfigError::Invalid("historyLimit must be at least 1".into()));
        }
        if !(self.canvas_width > 0.0 && self.canvas_height > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "canvas size {}x{} is not positive",
                self.canvas_width, self.canvas_height
            )));
        }
        if !(self.image_fit_ratio > 0.0 && self.image_fit_ratio <= 1.0) {
            return Err(ConfigError::Invalid("imageFitRatio must be in (0, 1]".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = EditorConfig::from_json(r#"{"canvasWidth": 1080, "canvasHeight": 1350}"#).unwrap();
        assert_eq!(config.canvas_width, 1080.0);
        assert_eq!(config.history_limit, 50);
        assert_eq!(config.welcome_text, "Welcome to Twin Clouds Editor!");
    }

    #[test]
    fn zero_history_is_rejected() {
        let err = EditorConfig::from_json(r#"{"historyLimit": 0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        assert!(EditorConfig::from_json("not json").is_err());
    }
}
