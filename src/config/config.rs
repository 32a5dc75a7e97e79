//! # Configuration Module
//!
//! This module provides configuration structures and validation for the meme generator.
//! It is the common interface between the command line, JSON config files and the
//! library.
//!
//! ## Configuration Parameters
//!
//! | Parameter | Type | Default | Description |
//! |-----------|------|---------|-------------|
//! | `canvas.width` / `canvas.height` | `u32` | 400 / 400 | Drawing surface size |
//! | `caption.font_px` | `f32` | 48 | Caption font size |
//! | `caption.top_baseline` | `f32` | 50 | Top caption baseline (y) |
//! | `caption.bottom_margin` | `f32` | 25 | Bottom caption baseline, measured up from the bottom edge |
//! | `caption.line_width` | `f32` | 2 | Caption outline width |
//! | `font_path` | path | system bold sans-serif | Font file override |
//! | `speech.program` | `String` | `espeak-ng` | Speech synthesizer executable |
//! | `speech.volume_level` | `u8` | 100 | Volume slider level, 0-100 |
//! | `speech.voice` | `usize` | none | Index into the voice list |
//! | `output` | path | `meme.png` | Output PNG |
//!
//! ## Examples
//!
//! ```rust
//! use memegen::config::MemeConfig;
//!
//! let config = MemeConfig::from_json_str(r#"{ "canvas": { "width": 600, "height": 600 } }"#).unwrap();
//! assert_eq!(config.canvas.width, 600);
//! assert_eq!(config.caption.font_px, 48.0);
//! assert!(config.validate().is_ok());
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{MemeError, MemeResult};

/// Canvas dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 400,
            height: 400,
        }
    }
}

impl CanvasConfig {
    pub fn size(&self) -> meme_fit::Size {
        meme_fit::Size {
            w: self.width,
            h: self.height,
        }
    }
}

/// How captions are drawn: bold sans-serif, white fill, black outline, centered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptionStyle {
    pub font_px: f32,
    pub top_baseline: f32,
    pub bottom_margin: f32,
    pub line_width: f32,
    pub fill: [u8; 4],
    pub stroke: [u8; 4],
    pub uppercase: bool,
}

impl Default for CaptionStyle {
    fn default() -> Self {
        Self {
            font_px: 48.0,
            top_baseline: 50.0,
            bottom_margin: 25.0,
            line_width: 2.0,
            fill: [255, 255, 255, 255],
            stroke: [0, 0, 0, 255],
            uppercase: true,
        }
    }
}

impl CaptionStyle {
    /// Baseline of the bottom caption on a canvas of `canvas_height`.
    pub fn bottom_baseline(&self, canvas_height: u32) -> f32 {
        canvas_height as f32 - self.bottom_margin
    }
}

/// Speech synthesizer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    pub program: String,
    pub volume_level: u8,
    pub voice: Option<usize>,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            program: "espeak-ng".to_string(),
            volume_level: 100,
            voice: None,
        }
    }
}

/// Configuration structure for the meme generator.
///
/// Every field has a default so a config file only needs the values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemeConfig {
    pub canvas: CanvasConfig,
    pub caption: CaptionStyle,
    pub font_path: Option<PathBuf>,
    pub speech: SpeechConfig,
    pub output: PathBuf,
}

impl Default for MemeConfig {
    /// Defaults match the page: a 400×400 canvas with 48px captions at y=50 and y=375.
    fn default() -> Self {
        Self {
            canvas: CanvasConfig::default(),
            caption: CaptionStyle::default(),
            font_path: None,
            speech: SpeechConfig::default(),
            output: PathBuf::from("meme.png"),
        }
    }
}

impl MemeConfig {
    pub fn from_json_str(json: &str) -> MemeResult<Self> {
        serde_json::from_str(json).map_err(|e| {
            MemeError::config("config", json.chars().take(40).collect::<String>(), e.to_string())
        })
    }

    /// Load a JSON config file.
    pub fn from_json_file(path: &Path) -> MemeResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| MemeError::io_at("read config", path, e))?;
        serde_json::from_str(&text)
            .map_err(|e| MemeError::config("config", path.display().to_string(), e.to_string()))
    }

    /// Validates the configuration parameters.
    ///
    /// A non-square canvas is accepted but logged: fitting keys on the image aspect
    /// alone, so an image can overhang the canvas. The overhang is cropped and the
    /// image keeps its aspect ratio.
    pub fn validate(&self) -> MemeResult<()> {
        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Err(MemeError::config(
                "canvas",
                format!("{}x{}", self.canvas.width, self.canvas.height),
                "canvas dimensions must be greater than 0",
            ));
        }
        if !(self.caption.font_px > 0.0) {
            return Err(MemeError::config(
                "caption.font_px",
                self.caption.font_px.to_string(),
                "font size must be greater than 0",
            ));
        }
        if self.caption.line_width < 0.0 {
            return Err(MemeError::config(
                "caption.line_width",
                self.caption.line_width.to_string(),
                "line width cannot be negative",
            ));
        }
        if self.speech.volume_level > 100 {
            return Err(MemeError::config(
                "speech.volume_level",
                self.speech.volume_level.to_string(),
                "volume must be between 0 and 100",
            ));
        }
        if self.canvas.width != self.canvas.height {
            warn!(
                width = self.canvas.width,
                height = self.canvas.height,
                "non-square canvas; images that overhang it are cropped"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MemeConfig::default();
        assert_eq!(config.canvas.width, 400);
        assert_eq!(config.canvas.height, 400);
        assert_eq!(config.caption.bottom_baseline(config.canvas.height), 375.0);
        assert_eq!(config.speech.program, "espeak-ng");
        assert_eq!(config.output, PathBuf::from("meme.png"));
    }

    #[test]
    fn test_config_validation() {
        let mut config = MemeConfig::default();
        assert!(config.validate().is_ok());

        config.canvas.width = 0;
        assert!(config.validate().is_err());
        config.canvas.width = 400;

        config.caption.font_px = 0.0;
        assert!(config.validate().is_err());
        config.caption.font_px = 48.0;

        config.speech.volume_level = 101;
        assert!(config.validate().is_err());
        config.speech.volume_level = 100;

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = MemeConfig::from_json_str(
            r#"{ "speech": { "volume_level": 40 }, "caption": { "uppercase": false } }"#,
        )
        .unwrap();
        assert_eq!(config.speech.volume_level, 40);
        assert_eq!(config.speech.program, "espeak-ng");
        assert!(!config.caption.uppercase);
        assert_eq!(config.caption.font_px, 48.0);
    }

    #[test]
    fn test_bad_json_is_config_error() {
        let err = MemeConfig::from_json_str("{ not json").unwrap_err();
        assert_eq!(err.category(), "config");
    }
}
