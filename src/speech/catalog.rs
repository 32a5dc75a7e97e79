//! Voice list with an explicit ready notification.
//!
//! The catalog enumerates voices once on the blocking pool and publishes the result
//! through a `tokio::sync::watch` channel. Consumers pick the pattern that suits them:
//! `current()` to poll, `subscribe()` to react to changes, `ready()` to await.
//! Each publish replaces the whole list.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};

use crate::error::{MemeError, MemeResult};
use crate::speech::{SpeechSynthesizer, Voice};

#[derive(Debug, Clone, PartialEq)]
pub enum VoiceListState {
    Loading,
    Ready(Arc<[Voice]>),
    Failed(String),
}

pub struct VoiceCatalog {
    rx: watch::Receiver<VoiceListState>,
}

impl VoiceCatalog {
    /// Start enumerating `synth`'s voices. Must be called inside a tokio runtime.
    pub fn load(synth: Arc<dyn SpeechSynthesizer>) -> Self {
        let (tx, rx) = watch::channel(VoiceListState::Loading);
        tokio::task::spawn_blocking(move || {
            let state = match synth.list_voices() {
                Ok(voices) => {
                    info!(backend = synth.name(), count = voices.len(), "voices ready");
                    VoiceListState::Ready(voices.into())
                }
                Err(e) => {
                    warn!(backend = synth.name(), error = %e, "voice enumeration failed");
                    VoiceListState::Failed(e.to_string())
                }
            };
            // Nobody listening any more is fine.
            let _ = tx.send(state);
        });
        Self { rx }
    }

    /// A catalog that is already populated.
    pub fn ready_with(voices: Vec<Voice>) -> Self {
        let (_tx, rx) = watch::channel(VoiceListState::Ready(voices.into()));
        Self { rx }
    }

    pub fn subscribe(&self) -> watch::Receiver<VoiceListState> {
        self.rx.clone()
    }

    pub fn state(&self) -> VoiceListState {
        self.rx.borrow().clone()
    }

    /// The voices, if enumeration has finished successfully.
    pub fn current(&self) -> Option<Arc<[Voice]>> {
        match &*self.rx.borrow() {
            VoiceListState::Ready(voices) => Some(voices.clone()),
            _ => None,
        }
    }

    /// Wait until enumeration finishes.
    pub async fn ready(&self) -> MemeResult<Arc<[Voice]>> {
        let mut rx = self.rx.clone();
        let state = rx
            .wait_for(|s| !matches!(s, VoiceListState::Loading))
            .await
            .map_err(|_| MemeError::speech("voice catalog", "loader stopped before publishing"))?
            .clone();
        match state {
            VoiceListState::Ready(voices) => Ok(voices),
            VoiceListState::Failed(reason) => Err(MemeError::speech("voice catalog", reason)),
            VoiceListState::Loading => unreachable!("wait_for only returns settled states"),
        }
    }
}
