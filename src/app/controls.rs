//! Button enablement as a two-state machine.
//!
//! | State | Generate | Clear | Read Text | Voice select |
//! |-------|----------|-------|-----------|--------------|
//! | Idle | enabled | disabled | disabled | disabled |
//! | Generated | disabled | enabled | enabled | enabled |

use std::fmt;

use crate::error::{MemeError, MemeResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControlState {
    #[default]
    Idle,
    Generated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Generate,
    Clear,
    ReadText,
    VoiceSelect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent {
    GenerateClicked,
    ClearClicked,
}

impl fmt::Display for ControlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlState::Idle => write!(f, "idle"),
            ControlState::Generated => write!(f, "generated"),
        }
    }
}

impl fmt::Display for Control {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Control::Generate => "generate",
            Control::Clear => "clear",
            Control::ReadText => "read text",
            Control::VoiceSelect => "select voice",
        };
        f.write_str(name)
    }
}

impl ControlState {
    pub fn is_enabled(self, control: Control) -> bool {
        match control {
            Control::Generate => self == ControlState::Idle,
            Control::Clear | Control::ReadText | Control::VoiceSelect => {
                self == ControlState::Generated
            }
        }
    }

    /// Fail with a state error if `control` is disabled.
    pub fn require(self, control: Control) -> MemeResult<()> {
        if self.is_enabled(control) {
            Ok(())
        } else {
            Err(MemeError::state(
                self.to_string(),
                control.to_string(),
                "button is disabled",
            ))
        }
    }

    /// Apply a click. A click on a disabled button is rejected and the state is kept.
    pub fn transition(self, event: ControlEvent) -> MemeResult<ControlState> {
        match event {
            ControlEvent::GenerateClicked => {
                self.require(Control::Generate)?;
                Ok(ControlState::Generated)
            }
            ControlEvent::ClearClicked => {
                self.require(Control::Clear)?;
                Ok(ControlState::Idle)
            }
        }
    }

    pub fn enabled_controls(self) -> Vec<Control> {
        [
            Control::Generate,
            Control::Clear,
            Control::ReadText,
            Control::VoiceSelect,
        ]
        .into_iter()
        .filter(|c| self.is_enabled(*c))
        .collect()
    }
}
