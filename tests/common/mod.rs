//! Common test utilities for the meme generator integration tests
//!
//! Image fixtures written to temp dirs and a speech synthesizer that records what it
//! was asked to say instead of making sound.

#![allow(dead_code)]

/// Image files on disk
pub mod fixtures {
    use std::path::{Path, PathBuf};

    use image::{Rgba, RgbaImage};

    /// Write a solid-color PNG of `w`×`h` into `dir` and return its path.
    pub fn solid_png(dir: &Path, name: &str, w: u32, h: u32, color: [u8; 4]) -> PathBuf {
        let path = dir.join(name);
        RgbaImage::from_pixel(w, h, Rgba(color))
            .save(&path)
            .expect("write fixture image");
        path
    }

    pub fn load_rgba(path: &Path) -> RgbaImage {
        image::open(path).expect("decode output").into_rgba8()
    }

    /// Channel-wise comparison allowing resampling error.
    pub fn close_to(actual: [u8; 4], expected: [u8; 4], tolerance: u8) -> bool {
        actual
            .iter()
            .zip(expected.iter())
            .all(|(a, e)| a.abs_diff(*e) <= tolerance)
    }
}

/// Speech synthesizer test doubles
pub mod mock_speech {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use memegen::MemeResult;
    use memegen::speech::{SpeechHandle, SpeechSynthesizer, Utterance, Voice};

    /// Records every utterance and reports a fixed voice list.
    #[derive(Clone, Default)]
    pub struct RecordingSynth {
        pub voices: Vec<Voice>,
        pub spoken: Arc<Mutex<Vec<Utterance>>>,
        /// How long `list_voices` blocks, like a real engine enumerating voices.
        pub list_delay: Duration,
    }

    impl RecordingSynth {
        pub fn with_voices(voices: Vec<Voice>) -> Self {
            Self {
                voices,
                ..Self::default()
            }
        }

        pub fn spoken(&self) -> Vec<Utterance> {
            self.spoken.lock().unwrap().clone()
        }
    }

    impl SpeechSynthesizer for RecordingSynth {
        fn name(&self) -> &str {
            "recording"
        }

        fn list_voices(&self) -> MemeResult<Vec<Voice>> {
            std::thread::sleep(self.list_delay);
            Ok(self.voices.clone())
        }

        fn speak(&self, utterance: &Utterance) -> MemeResult<SpeechHandle> {
            self.spoken.lock().unwrap().push(utterance.clone());
            Ok(SpeechHandle::Silent)
        }
    }

    pub fn voice(name: &str, lang: &str, is_default: bool) -> Voice {
        Voice {
            name: name.to_string(),
            lang: lang.to_string(),
            identifier: lang.to_string(),
            is_default,
        }
    }
}
