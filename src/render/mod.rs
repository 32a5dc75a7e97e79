//! # Rendering
//!
//! The drawing surface and caption text used by the image-load and generate handlers.

pub mod canvas;
pub mod text;

pub use canvas::Canvas;
pub use text::{CaptionFont, TextMask};
