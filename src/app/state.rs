//! Application state shared by every event handler.
//!
//! One `AppState` is created at startup and lives for the process. Handlers receive it
//! as `&mut AppState` and run to completion one at a time, so nothing here is locked.

use std::path::Path;
use std::sync::Arc;

use image::RgbaImage;
use tracing::info;

use crate::app::controls::{Control, ControlState};
use crate::app::volume::{VolumeIcon, VolumeSlider};
use crate::config::MemeConfig;
use crate::error::MemeResult;
use crate::render::{Canvas, CaptionFont};
use crate::speech::{SpeechSynthesizer, Voice};

/// A decoded image ready to draw.
#[derive(Clone)]
pub struct LoadedImage {
    /// File name, used as the canvas alt text.
    pub name: String,
    pub pixels: RgbaImage,
}

impl std::fmt::Debug for LoadedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedImage")
            .field("name", &self.name)
            .field("width", &self.pixels.width())
            .field("height", &self.pixels.height())
            .finish()
    }
}

impl LoadedImage {
    pub fn new(name: impl Into<String>, pixels: RgbaImage) -> Self {
        Self {
            name: name.into(),
            pixels,
        }
    }

    pub fn is_square(&self) -> bool {
        self.pixels.width() == self.pixels.height()
    }
}

pub struct AppState {
    pub(crate) config: MemeConfig,
    pub(crate) canvas: Canvas,
    pub(crate) image: Option<LoadedImage>,
    pub(crate) controls: ControlState,
    pub(crate) top_text: String,
    pub(crate) bottom_text: String,
    pub(crate) voices: Arc<[Voice]>,
    pub(crate) selected_voice: Option<usize>,
    pub(crate) volume: VolumeSlider,
    pub(crate) speech: Arc<dyn SpeechSynthesizer>,
    pub(crate) font: Option<CaptionFont>,
}

/// Snapshot of what the page would show.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusReport {
    pub controls: ControlState,
    pub enabled: Vec<Control>,
    pub image: Option<String>,
    pub top_text: String,
    pub bottom_text: String,
    pub voices: usize,
    pub selected_voice: Option<String>,
    pub volume_level: u8,
    pub volume_icon: VolumeIcon,
    pub speech_backend: String,
}

impl AppState {
    pub fn new(config: MemeConfig, speech: Arc<dyn SpeechSynthesizer>) -> MemeResult<Self> {
        config.validate()?;
        let volume = VolumeSlider::new(config.speech.volume_level)?;
        let canvas = Canvas::new(config.canvas.size());
        info!(
            width = config.canvas.width,
            height = config.canvas.height,
            speech = speech.name(),
            "app state created"
        );
        Ok(Self {
            selected_voice: config.speech.voice,
            config,
            canvas,
            image: None,
            controls: ControlState::Idle,
            top_text: String::new(),
            bottom_text: String::new(),
            voices: Arc::from(Vec::new()),
            volume,
            speech,
            font: None,
        })
    }

    /// Use `font` for captions instead of loading one on first use.
    pub fn with_font(mut self, font: CaptionFont) -> Self {
        self.font = Some(font);
        self
    }

    pub fn config(&self) -> &MemeConfig {
        &self.config
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn image(&self) -> Option<&LoadedImage> {
        self.image.as_ref()
    }

    pub fn controls(&self) -> ControlState {
        self.controls
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    pub fn selected_voice(&self) -> Option<&Voice> {
        self.selected_voice.and_then(|i| self.voices.get(i))
    }

    pub fn volume(&self) -> &VolumeSlider {
        &self.volume
    }

    pub fn top_text(&self) -> &str {
        &self.top_text
    }

    pub fn bottom_text(&self) -> &str {
        &self.bottom_text
    }

    /// The voice to speak with: the selected one, else the platform default.
    pub fn speaking_voice(&self) -> Option<&Voice> {
        self.selected_voice()
            .or_else(|| self.voices.iter().find(|v| v.is_default))
    }

    pub fn save_png(&self, path: &Path) -> MemeResult<()> {
        self.canvas.save_png(path)
    }

    pub fn status(&self) -> StatusReport {
        StatusReport {
            controls: self.controls,
            enabled: self.controls.enabled_controls(),
            image: self.image.as_ref().map(|i| i.name.clone()),
            top_text: self.top_text.clone(),
            bottom_text: self.bottom_text.clone(),
            voices: self.voices.len(),
            selected_voice: self.selected_voice().map(|v| v.to_string()),
            volume_level: self.volume.level(),
            volume_icon: self.volume.icon(),
            speech_backend: self.speech.name().to_string(),
        }
    }

    /// Take the caption font out for drawing, loading it on first use.
    /// Callers put it back with `self.font = Some(font)`.
    pub(crate) fn take_font(&mut self) -> MemeResult<CaptionFont> {
        match self.font.take() {
            Some(font) => Ok(font),
            None => CaptionFont::load(self.config.font_path.as_deref()),
        }
    }
}
