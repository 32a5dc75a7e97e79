//! `espeak-ng` subprocess backend.
//!
//! Voices come from `espeak-ng --voices`; utterances are piped on stdin so caption
//! text is never parsed as a command-line flag.

use std::io::Write;
use std::process::{Child, Command, Stdio};

use tracing::{debug, info, warn};

use crate::error::{MemeError, MemeResult};
use crate::speech::{SpeechHandle, SpeechSynthesizer, Utterance, Voice};

/// espeak-ng's own default language.
const DEFAULT_LANGUAGE: &str = "en";

#[derive(Debug, Clone)]
pub struct EspeakSynthesizer {
    program: String,
}

impl EspeakSynthesizer {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// True when the program starts and reports a version.
    pub fn probe(&self) -> bool {
        Command::new(&self.program)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }
}

/// Map a 0.0-1.0 volume to espeak amplitude (0-100, where 100 is its normal level).
pub fn amplitude_for(volume: f32) -> u32 {
    (volume.clamp(0.0, 1.0) * 100.0).round() as u32
}

/// Parse the table printed by `espeak-ng --voices`.
///
/// ```text
/// Pty Language       Age/Gender VoiceName          File                 Other Languages
///  5  af              --/M      Afrikaans          gmw/af
///  5  en-us           --/M      English_(America)  gmw/en-US            (en 10)
/// ```
pub fn parse_voice_list(output: &str) -> Vec<Voice> {
    output
        .lines()
        .filter(|line| !line.trim_start().starts_with("Pty"))
        .filter_map(|line| {
            let mut cols = line.split_whitespace();
            let _priority = cols.next()?;
            let lang = cols.next()?;
            let _age_gender = cols.next()?;
            let name = cols.next()?;
            Some(Voice {
                name: name.replace('_', " "),
                lang: lang.to_string(),
                identifier: lang.to_string(),
                is_default: lang == DEFAULT_LANGUAGE,
            })
        })
        .collect()
}

impl SpeechSynthesizer for EspeakSynthesizer {
    fn name(&self) -> &str {
        &self.program
    }

    fn list_voices(&self) -> MemeResult<Vec<Voice>> {
        let output = Command::new(&self.program)
            .arg("--voices")
            .output()
            .map_err(|e| MemeError::speech(&self.program, format!("failed to start: {}", e)))?;
        if !output.status.success() {
            return Err(MemeError::speech(
                &self.program,
                format!("--voices exited with status: {}", output.status),
            ));
        }
        let voices = parse_voice_list(&String::from_utf8_lossy(&output.stdout));
        debug!(count = voices.len(), "enumerated voices");
        Ok(voices)
    }

    fn speak(&self, utterance: &Utterance) -> MemeResult<SpeechHandle> {
        let mut cmd = Command::new(&self.program);
        cmd.arg("-a").arg(amplitude_for(utterance.volume).to_string());
        if let Some(voice) = &utterance.voice {
            cmd.arg("-v").arg(voice);
        }
        let mut child = cmd
            .arg("--stdin")
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| MemeError::speech(&self.program, format!("failed to start: {}", e)))?;

        feed_stdin(&mut child, &utterance.text)?;

        info!(
            voice = utterance.voice.as_deref().unwrap_or("default"),
            volume = utterance.volume,
            "speaking captions"
        );
        Ok(SpeechHandle::Spawned {
            backend: self.program.clone(),
            child,
        })
    }
}

/// Write `text` to the child's stdin and close it. On failure the child is killed and
/// reaped before the error is returned.
fn feed_stdin(child: &mut Child, text: &str) -> MemeResult<()> {
    let Some(mut stdin) = child.stdin.take() else {
        return Ok(());
    };
    let written = stdin.write_all(text.as_bytes());
    drop(stdin);
    if let Err(e) = written {
        if let Err(kill_err) = child.kill() {
            warn!(error = %kill_err, "could not stop speech process");
        }
        let _ = child.wait();
        return Err(MemeError::io("write utterance", e));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Pty Language       Age/Gender VoiceName          File                 Other Languages
 5  af              --/M      Afrikaans          gmw/af
 5  en              --/M      English_(Great_Britain) gmw/en          (en 2)
 2  en-us           --/M      English_(America)  gmw/en-US            (en 3)
";

    #[test]
    fn parses_voice_table() {
        let voices = parse_voice_list(SAMPLE);
        assert_eq!(voices.len(), 3);
        assert_eq!(voices[0].name, "Afrikaans");
        assert_eq!(voices[0].lang, "af");
        assert_eq!(voices[1].name, "English (Great Britain)");
        assert!(voices[1].is_default);
        assert_eq!(voices[2].identifier, "en-us");
        assert!(!voices[2].is_default);
    }

    #[test]
    fn ignores_blank_and_short_lines() {
        assert!(parse_voice_list("\n   \n5 xx\n").is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn failed_write_reaps_the_child() {
        // closes its stdin straight away, then lingers
        let mut child = Command::new("sh")
            .arg("-c")
            .arg("exec 0<&-; sleep 30")
            .stdin(Stdio::piped())
            .spawn()
            .unwrap();
        let text = "x".repeat(1 << 20);
        let started = std::time::Instant::now();

        let err = feed_stdin(&mut child, &text).unwrap_err();
        assert_eq!(err.category(), "io");
        assert!(child.try_wait().unwrap().is_some(), "child still running");
        assert!(started.elapsed() < std::time::Duration::from_secs(20));
    }

    #[test]
    fn amplitude_is_clamped() {
        assert_eq!(amplitude_for(1.0), 100);
        assert_eq!(amplitude_for(0.42), 42);
        assert_eq!(amplitude_for(2.0), 100);
        assert_eq!(amplitude_for(-1.0), 0);
    }
}
