//! # Meme Generator Library
//!
//! Draws a user-chosen image onto a fixed-size canvas with aspect-preserving fit and
//! black letterbox bars, writes top and bottom captions in the classic meme style, and
//! can read the captions aloud through the platform's speech synthesizer.
//!
//! ## Architecture
//!
//! - `meme_fit` (workspace crate): the fit calculator and the CPU image scaler
//! - `render`: the RGBA canvas and caption text rasterization
//! - `speech`: speech backends and the asynchronously loaded voice catalog
//! - `app`: explicit application state, events and the control state machine
//! - `config`: JSON configuration with defaults and validation
//! - `session`: a line-driven interactive loop over the event model
//!
//! ## Example
//!
//! ```rust,no_run
//! use memegen::{generate_meme, MemeOptions};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let report = generate_meme(MemeOptions {
//!     image: "cat.jpg".into(),
//!     top: "one does not simply".to_string(),
//!     bottom: "write a meme generator".to_string(),
//!     ..MemeOptions::default()
//! })
//! .await?;
//! println!("wrote {}", report.output.display());
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

pub mod app;
pub mod config;
pub mod error;
pub mod render;
pub mod session;
pub mod speech;

/// Re-export error types for convenience
pub use error::{HasRecoverySuggestion, HasSeverity, MemeError, MemeResult, Recoverable};

/// Re-export the fit geometry
pub use meme_fit::{CanvasPreset, FitRectangle, PixelRect, Size, fit_image_to_canvas};

use app::{AppEvent, AppState, EventOutcome};
use config::MemeConfig;
use speech::{NoSpeech, SpeechHandle, SpeechSynthesizer, VoiceCatalog, detect_synthesizer};

/// Everything needed to produce one meme without interaction.
#[derive(Debug, Clone, Default)]
pub struct MemeOptions {
    pub image: PathBuf,
    pub top: String,
    pub bottom: String,
    pub config: MemeConfig,
    /// Read the captions aloud after generating.
    pub speak: bool,
}

/// What [`generate_meme`] produced.
#[derive(Debug, Clone)]
pub struct MemeReport {
    pub output: PathBuf,
    pub fit: FitRectangle,
    pub pixels: PixelRect,
    /// The voice the captions were read with, if they were read and one was available.
    pub spoken_with: Option<String>,
    pub spoken: bool,
}

/// Load an image, caption it, save the PNG and optionally read the captions aloud.
///
/// Runs the same events the interactive page would: choose file, type captions,
/// click Generate, then Read Text. Speech problems are logged and never fail the call.
pub async fn generate_meme(options: MemeOptions) -> Result<MemeReport> {
    let synth: Arc<dyn SpeechSynthesizer> = if options.speak {
        detect_synthesizer(&options.config.speech.program)
    } else {
        Arc::new(NoSpeech)
    };
    let catalog = VoiceCatalog::load(synth.clone());
    let output = options.config.output.clone();

    let mut app = AppState::new(options.config, synth)?;
    let (fit, pixels) = match app.dispatch(AppEvent::FileSelected(options.image.clone()))? {
        EventOutcome::ImageDrawn { fit, pixels } => (fit, pixels),
        other => anyhow::bail!("unexpected outcome while loading image: {:?}", other),
    };
    app.dispatch(AppEvent::TopTextChanged(options.top))?;
    app.dispatch(AppEvent::BottomTextChanged(options.bottom))?;
    app.dispatch(AppEvent::GenerateClicked)?;
    app.save_png(&output)
        .with_context(|| format!("saving meme to {}", output.display()))?;
    info!(output = %output.display(), "meme saved");

    let mut report = MemeReport {
        output,
        fit,
        pixels,
        spoken_with: None,
        spoken: false,
    };
    if !options.speak {
        return Ok(report);
    }

    let voices = match catalog.ready().await {
        Ok(voices) => voices,
        Err(e) => {
            warn!(error = %e, "no voices; speaking with the engine default");
            Arc::from(Vec::new())
        }
    };
    app.dispatch(AppEvent::VoicesChanged(voices))?;
    report.spoken_with = app.speaking_voice().map(|v| v.to_string());

    match app.dispatch(AppEvent::ReadTextClicked) {
        Ok(EventOutcome::Speaking(handle)) => {
            report.spoken = !matches!(handle, SpeechHandle::Silent);
            let finished = tokio::task::spawn_blocking(move || handle.wait())
                .await
                .context("speech task panicked")?;
            if let Err(e) = finished {
                warn!(error = %e, "reading captions failed");
                report.spoken = false;
            }
        }
        Ok(other) => warn!(?other, "unexpected outcome from read text"),
        Err(e) => warn!(error = %e, "could not read captions"),
    }
    Ok(report)
}
