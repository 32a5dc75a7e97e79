//! # Configuration Module
//!
//! This module provides configuration structures for the meme generator: canvas size,
//! caption style, font selection and speech settings.

pub mod config;

pub use config::{CanvasConfig, CaptionStyle, MemeConfig, SpeechConfig};
