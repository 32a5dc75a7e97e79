//! # Application State
//!
//! The page's behavior without the page: an explicit [`AppState`] owned by the caller,
//! [`AppEvent`]s for every user action, and the control state machine that decides
//! which buttons are live.

pub mod controls;
pub mod events;
pub mod state;
pub mod volume;

pub use controls::{Control, ControlEvent, ControlState};
pub use events::{AppEvent, EventOutcome};
pub use state::{AppState, LoadedImage, StatusReport};
pub use volume::{VolumeIcon, VolumeSlider};
