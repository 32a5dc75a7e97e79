//! # Interactive Session
//!
//! A line-driven stand-in for the page: each stdin line is one user action, parsed
//! into a [`Command`] and dispatched to [`AppState`] as an [`AppEvent`].
//!
//! ```text
//! load cat.jpg
//! top one does not simply
//! bottom write a meme generator
//! generate
//! save meme.png
//! read
//! quit
//! ```
//!
//! The voice catalog loads in the background. Its updates are forwarded as
//! `VoicesChanged` before the next command runs, and the loop also wakes on them so the
//! user sees when voices arrive. Errors are printed and the loop keeps going.

use std::path::PathBuf;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::app::{AppEvent, AppState, EventOutcome, StatusReport};
use crate::error::{HasRecoverySuggestion, MemeError, MemeResult, classify};
use crate::speech::{SpeechHandle, VoiceCatalog, VoiceListState};

pub const HELP: &str = "\
commands:
  load <path>      choose an image
  top <text>       set the top caption
  bottom <text>    set the bottom caption
  generate         draw the captions
  clear            wipe the canvas
  read             read the captions aloud
  voices           list voices
  voice <n>        select voice n
  volume <0-100>   set the volume slider
  save <path>      write the canvas as PNG
  status           show the current state
  help             show this text
  quit             leave the session";

/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Load(PathBuf),
    Top(String),
    Bottom(String),
    Generate,
    Clear,
    Read,
    Voices,
    Voice(usize),
    Volume(u8),
    Save(PathBuf),
    Status,
    Help,
    Quit,
    /// Blank line
    Nothing,
}

impl Command {
    pub fn parse(line: &str) -> MemeResult<Self> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let cmd = match word.to_ascii_lowercase().as_str() {
            "" => Command::Nothing,
            "load" => Command::Load(PathBuf::from(required(word, rest)?)),
            "top" => Command::Top(rest.to_string()),
            "bottom" => Command::Bottom(rest.to_string()),
            "generate" => Command::Generate,
            "clear" => Command::Clear,
            "read" => Command::Read,
            "voices" => Command::Voices,
            "voice" => Command::Voice(required(word, rest)?.parse()?),
            "volume" => Command::Volume(required(word, rest)?.parse()?),
            "save" => Command::Save(PathBuf::from(required(word, rest)?)),
            "status" => Command::Status,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => {
                return Err(MemeError::validation(
                    "command",
                    "type 'help' for the list of commands",
                    other,
                ));
            }
        };
        Ok(cmd)
    }
}

fn required<'a>(command: &str, arg: &'a str) -> MemeResult<&'a str> {
    if arg.is_empty() {
        Err(MemeError::validation(command, "needs an argument", ""))
    } else {
        Ok(arg)
    }
}

/// What the loop should do after a command.
#[derive(Debug)]
pub enum Reply {
    Message(String),
    Speaking(SpeechHandle),
    Quit,
}

pub struct Session {
    app: AppState,
    voices: watch::Receiver<VoiceListState>,
}

impl Session {
    pub fn new(app: AppState, catalog: &VoiceCatalog) -> Self {
        let mut session = Self {
            app,
            voices: catalog.subscribe(),
        };
        // A catalog that was ready before we subscribed never signals a change.
        session.forward_voice_update();
        session
    }

    pub fn app(&self) -> &AppState {
        &self.app
    }

    /// Forward the latest voice list to the app if it has not been seen yet.
    /// Returns the number of voices forwarded.
    pub fn sync_voices(&mut self) -> Option<usize> {
        let changed = match self.voices.has_changed() {
            Ok(changed) => changed,
            // The loader drops its sender right after publishing; the value may be unseen.
            Err(_) => self.voices.borrow().has_changed(),
        };
        if changed {
            self.forward_voice_update()
        } else {
            None
        }
    }

    fn forward_voice_update(&mut self) -> Option<usize> {
        let state = self.voices.borrow_and_update().clone();
        match state {
            VoiceListState::Ready(voices) => {
                match self.app.dispatch(AppEvent::VoicesChanged(voices)) {
                    Ok(EventOutcome::VoicesUpdated(count)) => Some(count),
                    Ok(_) => None,
                    Err(e) => {
                        warn!(error = %e, "voice update rejected");
                        None
                    }
                }
            }
            VoiceListState::Failed(reason) => {
                warn!(%reason, "voice list unavailable");
                None
            }
            VoiceListState::Loading => None,
        }
    }

    /// Parse and run one input line.
    pub fn handle_line(&mut self, line: &str) -> MemeResult<Reply> {
        self.sync_voices();
        let command = Command::parse(line)?;
        debug!(?command, "session command");
        self.execute(command)
    }

    pub fn execute(&mut self, command: Command) -> MemeResult<Reply> {
        let message = match command {
            Command::Nothing => String::new(),
            Command::Help => HELP.to_string(),
            Command::Quit => return Ok(Reply::Quit),
            Command::Load(path) => match self.app.dispatch(AppEvent::FileSelected(path))? {
                EventOutcome::ImageDrawn { pixels, .. } => format!(
                    "loaded {} at {},{} size {}x{}",
                    self.app.image().map(|i| i.name.as_str()).unwrap_or("image"),
                    pixels.x,
                    pixels.y,
                    pixels.w,
                    pixels.h
                ),
                other => format!("{:?}", other),
            },
            Command::Top(text) => {
                self.app.dispatch(AppEvent::TopTextChanged(text))?;
                format!("top: {:?}", self.app.top_text())
            }
            Command::Bottom(text) => {
                self.app.dispatch(AppEvent::BottomTextChanged(text))?;
                format!("bottom: {:?}", self.app.bottom_text())
            }
            Command::Generate => {
                self.app.dispatch(AppEvent::GenerateClicked)?;
                "generated".to_string()
            }
            Command::Clear => {
                self.app.dispatch(AppEvent::ClearClicked)?;
                "cleared".to_string()
            }
            Command::Read => match self.app.dispatch(AppEvent::ReadTextClicked)? {
                EventOutcome::Speaking(handle) => return Ok(Reply::Speaking(handle)),
                other => format!("{:?}", other),
            },
            Command::Voices => self.voice_listing(),
            Command::Voice(index) => match self.app.dispatch(AppEvent::VoiceSelected(index))? {
                EventOutcome::VoiceSelected(voice) => format!("voice: {}", voice),
                other => format!("{:?}", other),
            },
            Command::Volume(level) => match self.app.dispatch(AppEvent::VolumeChanged(level))? {
                EventOutcome::VolumeSet(icon) => format!("volume {} ({})", level, icon.asset()),
                other => format!("{:?}", other),
            },
            Command::Save(path) => {
                self.app.save_png(&path)?;
                info!(path = %path.display(), "canvas saved");
                format!("saved {}", path.display())
            }
            Command::Status => format_status(&self.app.status()),
        };
        Ok(Reply::Message(message))
    }

    fn voice_listing(&self) -> String {
        let voices = self.app.voices();
        if voices.is_empty() {
            return match &*self.voices.borrow() {
                VoiceListState::Loading => "voices are still loading".to_string(),
                VoiceListState::Failed(reason) => format!("no voices: {}", reason),
                VoiceListState::Ready(_) => "no voices available".to_string(),
            };
        }
        let selected = self.app.selected_voice();
        voices
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let mark = if Some(v) == selected { '*' } else { ' ' };
                format!("{}{:>3}  {}", mark, i, v)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

pub fn format_status(status: &StatusReport) -> String {
    let enabled = status
        .enabled
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        concat!(
            "state: {}\nenabled: {}\nimage: {}\ntop: {:?}\nbottom: {:?}\n",
            "voices: {} (selected: {})\nvolume: {} ({})\nspeech: {}",
        ),
        status.controls,
        enabled,
        status.image.as_deref().unwrap_or("none"),
        status.top_text,
        status.bottom_text,
        status.voices,
        status.selected_voice.as_deref().unwrap_or("default"),
        status.volume_level,
        status.volume_icon.asset(),
        status.speech_backend,
    )
}

fn describe_error(error: &MemeError) -> String {
    match error.recovery_suggestion() {
        Some(hint) => format!("error: {} ({})", error, hint),
        None => format!("error: {}", error),
    }
}

/// Run the session until `quit` or end of input.
pub async fn run<R, W>(mut session: Session, input: R, mut output: W) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    let mut updates = session.voices.clone();
    let mut catalog_open = true;

    output.write_all(b"type 'help' for commands\n").await?;
    loop {
        output.flush().await?;
        tokio::select! {
            changed = updates.changed(), if catalog_open => {
                if changed.is_err() {
                    catalog_open = false;
                }
                if let Some(count) = session.sync_voices() {
                    output.write_all(format!("{} voices available\n", count).as_bytes()).await?;
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match session.handle_line(&line) {
                    Ok(Reply::Quit) => break,
                    Ok(Reply::Message(text)) if text.is_empty() => {}
                    Ok(Reply::Message(text)) => {
                        output.write_all(text.as_bytes()).await?;
                        output.write_all(b"\n").await?;
                    }
                    Ok(Reply::Speaking(handle)) => {
                        if !matches!(handle, SpeechHandle::Silent) {
                            output.write_all(b"reading captions\n").await?;
                        }
                        tokio::task::spawn_blocking(move || {
                            if let Err(e) = handle.wait() {
                                warn!(error = %e, "reading captions failed");
                            }
                        });
                    }
                    Err(e) => {
                        if classify::is_user_error(&e) {
                            debug!(category = e.category(), "command rejected");
                        } else {
                            warn!(category = e.category(), error = %e, "command failed");
                        }
                        output.write_all(describe_error(&e).as_bytes()).await?;
                        output.write_all(b"\n").await?;
                    }
                }
            }
        }
    }
    output.flush().await
}
