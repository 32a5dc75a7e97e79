//! Events and their handlers.
//!
//! Every user action is an [`AppEvent`]; [`AppState::dispatch`] routes it to exactly
//! one handler. A handler that fails leaves the state as it was.

use std::path::PathBuf;
use std::sync::Arc;

use meme_fit::{FitRectangle, PixelRect, fit_image_to_canvas};
use tracing::{debug, info, warn};

use crate::app::controls::{Control, ControlEvent};
use crate::app::state::{AppState, LoadedImage};
use crate::app::volume::VolumeIcon;
use crate::error::{MemeError, MemeResult};
use crate::render::canvas::BLACK;
use crate::speech::{SpeechHandle, Utterance, Voice};

#[derive(Debug, Clone)]
pub enum AppEvent {
    /// The user picked a file; decoding it fires `ImageLoaded`.
    FileSelected(PathBuf),
    ImageLoaded(LoadedImage),
    TopTextChanged(String),
    BottomTextChanged(String),
    GenerateClicked,
    ClearClicked,
    ReadTextClicked,
    VoiceSelected(usize),
    VolumeChanged(u8),
    /// The platform's voice list arrived or changed.
    VoicesChanged(Arc<[Voice]>),
}

#[derive(Debug)]
pub enum EventOutcome {
    ImageDrawn { fit: FitRectangle, pixels: PixelRect },
    Generated,
    Cleared,
    Speaking(SpeechHandle),
    VoiceSelected(Voice),
    VolumeSet(VolumeIcon),
    VoicesUpdated(usize),
    TextUpdated,
}

impl AppState {
    pub fn dispatch(&mut self, event: AppEvent) -> MemeResult<EventOutcome> {
        debug!(?event, state = %self.controls, "dispatch");
        match event {
            AppEvent::FileSelected(path) => self.on_file_selected(path),
            AppEvent::ImageLoaded(image) => self.on_image_loaded(image),
            AppEvent::TopTextChanged(text) => {
                self.top_text = text;
                Ok(EventOutcome::TextUpdated)
            }
            AppEvent::BottomTextChanged(text) => {
                self.bottom_text = text;
                Ok(EventOutcome::TextUpdated)
            }
            AppEvent::GenerateClicked => self.on_generate(),
            AppEvent::ClearClicked => self.on_clear(),
            AppEvent::ReadTextClicked => self.on_read_text(),
            AppEvent::VoiceSelected(index) => self.on_voice_selected(index),
            AppEvent::VolumeChanged(level) => {
                Ok(EventOutcome::VolumeSet(self.volume.set_level(level)?))
            }
            AppEvent::VoicesChanged(voices) => Ok(self.on_voices_changed(voices)),
        }
    }

    fn on_file_selected(&mut self, path: PathBuf) -> MemeResult<EventOutcome> {
        let decoded = image::open(&path)
            .map_err(|e| MemeError::image_load(Some(path.clone()), e.to_string()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        info!(image = %name, width = decoded.width(), height = decoded.height(), "decoded image");
        self.dispatch(AppEvent::ImageLoaded(LoadedImage::new(name, decoded.into_rgba8())))
    }

    fn on_image_loaded(&mut self, image: LoadedImage) -> MemeResult<EventOutcome> {
        let size = self.canvas.size();
        let fit = fit_image_to_canvas(
            size.w as f64,
            size.h as f64,
            image.pixels.width() as f64,
            image.pixels.height() as f64,
        );
        // Scale before touching the canvas so a failure leaves the old picture up.
        let (pixels, scaled) = self.canvas.scale_to_fit(&image.pixels, &fit)?;

        self.canvas.clear();
        if !image.is_square() {
            self.canvas.fill_rect(0, 0, size.w, size.h, BLACK);
        }
        self.canvas.blit(&scaled, pixels);
        debug!(?fit, "image fitted");
        self.image = Some(image);
        Ok(EventOutcome::ImageDrawn { fit, pixels })
    }

    fn on_generate(&mut self) -> MemeResult<EventOutcome> {
        let next = self.controls.transition(ControlEvent::GenerateClicked)?;

        let style = self.config.caption.clone();
        let (top, bottom) = if style.uppercase {
            (self.top_text.to_uppercase(), self.bottom_text.to_uppercase())
        } else {
            (self.top_text.clone(), self.bottom_text.clone())
        };

        if !(top.trim().is_empty() && bottom.trim().is_empty()) {
            let font = self.take_font()?;
            let center_x = self.canvas.width() as f32 / 2.0;
            let top_y = style.top_baseline;
            let bottom_y = style.bottom_baseline(self.canvas.height());

            self.canvas.fill_text(&font, &top, center_x, top_y, &style);
            self.canvas.fill_text(&font, &bottom, center_x, bottom_y, &style);
            if style.line_width > 0.0 {
                self.canvas.stroke_text(&font, &top, center_x, top_y, &style);
                self.canvas.stroke_text(&font, &bottom, center_x, bottom_y, &style);
            }
            debug!(font = font.source(), "captions drawn");
            self.font = Some(font);
        }

        self.controls = next;
        info!(top = %top, bottom = %bottom, "generated meme");
        Ok(EventOutcome::Generated)
    }

    fn on_clear(&mut self) -> MemeResult<EventOutcome> {
        self.controls = self.controls.transition(ControlEvent::ClearClicked)?;
        self.canvas.clear();
        Ok(EventOutcome::Cleared)
    }

    fn on_read_text(&mut self) -> MemeResult<EventOutcome> {
        self.controls.require(Control::ReadText)?;

        let text = [self.top_text.trim(), self.bottom_text.trim()]
            .into_iter()
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if text.is_empty() {
            debug!("no caption text to read");
            return Ok(EventOutcome::Speaking(SpeechHandle::Silent));
        }

        let utterance = Utterance {
            text,
            voice: self.speaking_voice().map(|v| v.identifier.clone()),
            volume: self.volume.volume(),
        };
        Ok(EventOutcome::Speaking(self.speech.speak(&utterance)?))
    }

    fn on_voice_selected(&mut self, index: usize) -> MemeResult<EventOutcome> {
        self.controls.require(Control::VoiceSelect)?;
        let voice = self.voices.get(index).cloned().ok_or_else(|| {
            MemeError::validation(
                "voice",
                format!("must be below {}", self.voices.len()),
                index.to_string(),
            )
        })?;
        self.selected_voice = Some(index);
        Ok(EventOutcome::VoiceSelected(voice))
    }

    fn on_voices_changed(&mut self, voices: Arc<[Voice]>) -> EventOutcome {
        if let Some(i) = self.selected_voice.filter(|i| *i >= voices.len()) {
            warn!(index = i, available = voices.len(), "selected voice no longer available");
            self.selected_voice = None;
        }
        self.voices = voices;
        EventOutcome::VoicesUpdated(self.voices.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::controls::ControlState;
    use crate::config::MemeConfig;
    use crate::render::CaptionFont;
    use crate::speech::NoSpeech;
    use image::{Rgba, RgbaImage};

    fn state() -> AppState {
        AppState::new(MemeConfig::default(), Arc::new(NoSpeech)).unwrap()
    }

    fn voice(lang: &str, is_default: bool) -> Voice {
        Voice {
            name: lang.to_string(),
            lang: lang.to_string(),
            identifier: lang.to_string(),
            is_default,
        }
    }

    #[test]
    fn portrait_image_gets_side_bars() {
        let mut app = state();
        let img = LoadedImage::new(
            "tall.png",
            RgbaImage::from_pixel(100, 200, Rgba([255, 0, 0, 255])),
        );
        let outcome = app.dispatch(AppEvent::ImageLoaded(img)).unwrap();
        match outcome {
            EventOutcome::ImageDrawn { fit, pixels } => {
                assert_eq!(fit.width, 200.0);
                assert_eq!(fit.start_x, 100.0);
                assert_eq!(pixels, PixelRect { x: 100, y: 0, w: 200, h: 400 });
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(app.canvas().pixel(10, 200), BLACK);
        assert_eq!(app.canvas().pixel(390, 200), BLACK);
        assert_eq!(app.image().unwrap().name, "tall.png");
    }

    #[test]
    fn square_image_has_no_bars() {
        let mut app = state();
        let img =
            LoadedImage::new("sq.png", RgbaImage::from_pixel(150, 150, Rgba([0, 0, 255, 255])));
        app.dispatch(AppEvent::ImageLoaded(img)).unwrap();
        let corner = app.canvas().pixel(0, 0);
        assert!(corner[2] >= 254 && corner[0] <= 1, "{:?}", corner);
    }

    #[test]
    fn generate_draws_with_supplied_font() {
        let Ok(font) = CaptionFont::system_bold_sans() else {
            eprintln!("skipping: no system sans-serif font");
            return;
        };
        let mut app = state().with_font(font);
        app.dispatch(AppEvent::TopTextChanged("hello".into())).unwrap();
        app.dispatch(AppEvent::GenerateClicked).unwrap();
        assert!(app.canvas().pixels().pixels().any(|p| p.0 == [255, 255, 255, 255]));
        assert!(app.canvas().pixels().pixels().any(|p| p.0 == BLACK));
    }

    #[test]
    fn font_failure_leaves_state_idle() {
        let mut config = MemeConfig::default();
        config.font_path = Some(PathBuf::from("/no/such/font.ttf"));
        let mut app = AppState::new(config, Arc::new(NoSpeech)).unwrap();
        app.dispatch(AppEvent::TopTextChanged("hello".into())).unwrap();
        assert!(app.dispatch(AppEvent::GenerateClicked).is_err());
        assert_eq!(app.controls(), ControlState::Idle);
    }

    #[test]
    fn wide_image_on_short_canvas_keeps_aspect() {
        let mut config = MemeConfig::default();
        config.canvas.height = 200;
        let mut app = AppState::new(config, Arc::new(NoSpeech)).unwrap();
        let img = LoadedImage::new("w.png", RgbaImage::from_pixel(300, 200, Rgba([5, 5, 5, 255])));
        match app.dispatch(AppEvent::ImageLoaded(img)).unwrap() {
            EventOutcome::ImageDrawn { fit, pixels } => {
                assert!((fit.width / fit.height - 1.5).abs() < 1e-9);
                assert_eq!(pixels, PixelRect { x: 0, y: 0, w: 400, h: 200 });
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn generate_then_clear_cycles_controls() {
        let mut app = state();
        app.dispatch(AppEvent::GenerateClicked).unwrap();
        assert_eq!(app.controls(), ControlState::Generated);
        assert!(app.dispatch(AppEvent::GenerateClicked).is_err());
        app.dispatch(AppEvent::ClearClicked).unwrap();
        assert_eq!(app.controls(), ControlState::Idle);
        assert!(app.dispatch(AppEvent::ClearClicked).is_err());
    }

    #[test]
    fn clear_wipes_canvas() {
        let mut app = state();
        let img =
            LoadedImage::new("wide.png", RgbaImage::from_pixel(20, 10, Rgba([9, 9, 9, 255])));
        app.dispatch(AppEvent::ImageLoaded(img)).unwrap();
        app.dispatch(AppEvent::GenerateClicked).unwrap();
        app.dispatch(AppEvent::ClearClicked).unwrap();
        assert!(app.canvas().pixels().pixels().all(|p| p.0 == [0, 0, 0, 0]));
    }

    #[test]
    fn read_text_requires_generated() {
        let mut app = state();
        app.dispatch(AppEvent::TopTextChanged("hi".into())).unwrap();
        assert!(app.dispatch(AppEvent::ReadTextClicked).is_err());
    }

    #[test]
    fn voice_selection_is_gated_and_bounded() {
        let mut app = state();
        app.dispatch(AppEvent::VoicesChanged(vec![voice("en", true), voice("fr", false)].into()))
            .unwrap();
        assert!(app.dispatch(AppEvent::VoiceSelected(1)).is_err());

        app.dispatch(AppEvent::GenerateClicked).unwrap();
        assert!(app.dispatch(AppEvent::VoiceSelected(5)).is_err());
        assert_eq!(app.speaking_voice().unwrap().lang, "en");

        app.dispatch(AppEvent::VoiceSelected(1)).unwrap();
        assert_eq!(app.speaking_voice().unwrap().lang, "fr");
    }

    #[test]
    fn shrinking_voice_list_drops_selection() {
        let mut app = state();
        app.dispatch(AppEvent::VoicesChanged(vec![voice("en", true), voice("fr", false)].into()))
            .unwrap();
        app.dispatch(AppEvent::GenerateClicked).unwrap();
        app.dispatch(AppEvent::VoiceSelected(1)).unwrap();
        app.dispatch(AppEvent::VoicesChanged(vec![voice("en", true)].into()))
            .unwrap();
        assert!(app.selected_voice().is_none());
    }

    #[test]
    fn volume_updates_icon() {
        let mut app = state();
        match app.dispatch(AppEvent::VolumeChanged(0)).unwrap() {
            EventOutcome::VolumeSet(icon) => assert_eq!(icon, VolumeIcon::Muted),
            other => panic!("unexpected {:?}", other),
        }
        assert!(app.dispatch(AppEvent::VolumeChanged(150)).is_err());
        assert_eq!(app.volume().level(), 0);
    }

    #[test]
    fn missing_file_is_image_load_error() {
        let mut app = state();
        let err = app
            .dispatch(AppEvent::FileSelected(PathBuf::from("/no/such/meme.png")))
            .unwrap_err();
        assert_eq!(err.category(), "image_load");
        assert!(app.image().is_none());
    }
}
