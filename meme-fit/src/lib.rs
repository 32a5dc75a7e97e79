// SPDX-License-Identifier: MIT
//! # meme-fit: Image-into-Canvas Geometry
//!
//! This crate computes where a decoded image lands inside a fixed-size canvas and
//! resamples the image to that size. It has no knowledge of captions, fonts or speech;
//! the `memegen` crate drives it from its image-load handler.
//!
//! ## Key Components
//!
//! - [`fit`]: the fit calculator ([`fit::fit_image_to_canvas`]) and named canvas presets
//! - [`cpu`]: CPU resampling of RGBA buffers using SIMD acceleration
//!
//! ## Fitting Rules
//!
//! The image is scaled uniformly to the largest size that fits the canvas:
//! - Portrait images (aspect < 1) use the full canvas height and are centered horizontally
//! - Landscape and square images use the full canvas width and are centered vertically
//!
//! ## Usage Example
//!
//! ```rust
//! use meme_fit::fit::fit_image_to_canvas;
//!
//! let rect = fit_image_to_canvas(400.0, 400.0, 100.0, 200.0);
//! assert_eq!(rect.width, 200.0);
//! assert_eq!(rect.height, 400.0);
//! assert_eq!(rect.start_x, 100.0);
//! assert_eq!(rect.start_y, 0.0);
//! ```

pub mod cpu;
pub mod fit;

pub use fit::{fit_image_to_canvas, CanvasPreset, FitRectangle, PixelRect, Size, SourceCrop};
