//! # Speech Synthesis
//!
//! Reading captions aloud is delegated to the platform's speech engine behind the
//! [`SpeechSynthesizer`] trait. Platforms without one get [`NoSpeech`], which has no
//! voices and treats speaking as a no-op; missing speech support is never an error.
//!
//! Voice enumeration can be slow, so [`VoiceCatalog`] loads voices off the event
//! loop and announces them through a watch channel instead of waiting a fixed delay.

use std::fmt;
use std::process::Child;
use std::sync::Arc;

use tracing::{info, warn};

use crate::error::{MemeError, MemeResult};

pub mod catalog;
pub mod espeak;

pub use catalog::{VoiceCatalog, VoiceListState};
pub use espeak::EspeakSynthesizer;

/// A selectable text-to-speech persona.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voice {
    pub name: String,
    pub lang: String,
    /// Backend-specific handle passed back when speaking.
    pub identifier: String,
    pub is_default: bool,
}

impl fmt::Display for Voice {
    /// `"English (America) (en-us)"`, with `" -- DEFAULT"` appended for the default voice.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.lang)?;
        if self.is_default {
            write!(f, " -- DEFAULT")?;
        }
        Ok(())
    }
}

/// Text to speak with the chosen voice and volume.
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    pub voice: Option<String>,
    /// 0.0 (silent) to 1.0 (full)
    pub volume: f32,
}

/// A started utterance.
#[derive(Debug)]
pub enum SpeechHandle {
    Spawned { backend: String, child: Child },
    Silent,
}

impl SpeechHandle {
    /// Block until the utterance has finished.
    pub fn wait(self) -> MemeResult<()> {
        match self {
            SpeechHandle::Spawned { backend, mut child } => {
                let status = child
                    .wait()
                    .map_err(|e| MemeError::io("wait for speech", e))?;
                if status.success() {
                    Ok(())
                } else {
                    Err(MemeError::speech(backend, format!("exited with status: {}", status)))
                }
            }
            SpeechHandle::Silent => Ok(()),
        }
    }
}

/// Platform text-to-speech capability.
pub trait SpeechSynthesizer: Send + Sync {
    /// Backend name for logs and errors.
    fn name(&self) -> &str;

    /// Enumerate available voices. May block.
    fn list_voices(&self) -> MemeResult<Vec<Voice>>;

    /// Start speaking and return without waiting for the audio to finish.
    fn speak(&self, utterance: &Utterance) -> MemeResult<SpeechHandle>;
}

/// Stand-in for platforms without speech synthesis.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSpeech;

impl SpeechSynthesizer for NoSpeech {
    fn name(&self) -> &str {
        "none"
    }

    fn list_voices(&self) -> MemeResult<Vec<Voice>> {
        Ok(Vec::new())
    }

    fn speak(&self, utterance: &Utterance) -> MemeResult<SpeechHandle> {
        info!(chars = utterance.text.len(), "speech unsupported; not reading captions");
        Ok(SpeechHandle::Silent)
    }
}

/// Use `program` when it runs, otherwise fall back to [`NoSpeech`].
pub fn detect_synthesizer(program: &str) -> Arc<dyn SpeechSynthesizer> {
    let espeak = EspeakSynthesizer::new(program);
    if espeak.probe() {
        info!(program, "speech synthesis available");
        Arc::new(espeak)
    } else {
        warn!(program, "speech synthesizer not found; read-aloud disabled");
        Arc::new(NoSpeech)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn voice_display_marks_default() {
        let mut voice = Voice {
            name: "English (America)".to_string(),
            lang: "en-us".to_string(),
            identifier: "en-us".to_string(),
            is_default: false,
        };
        assert_eq!(voice.to_string(), "English (America) (en-us)");
        voice.is_default = true;
        assert_eq!(voice.to_string(), "English (America) (en-us) -- DEFAULT");
    }

    #[test]
    fn no_speech_is_silent() {
        let synth = NoSpeech;
        assert!(synth.list_voices().unwrap().is_empty());
        let handle = synth
            .speak(&Utterance {
                text: "HELLO".to_string(),
                voice: None,
                volume: 1.0,
            })
            .unwrap();
        assert!(matches!(handle, SpeechHandle::Silent));
        assert!(handle.wait().is_ok());
    }

    #[test]
    fn missing_program_falls_back() {
        let synth = detect_synthesizer("definitely-not-a-speech-engine-7f3a");
        assert_eq!(synth.name(), "none");
    }
}
