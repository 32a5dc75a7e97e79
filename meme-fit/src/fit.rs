// SPDX-License-Identifier: MIT
//! # Fit Calculation and Canvas Presets
//!
//! This module computes the destination rectangle for drawing an image inside a
//! fixed-size canvas without distortion.
//!
//! ## Design
//!
//! The calculation works on the aspect ratio of the source image alone:
//! 1. **Portrait** (`aspect < 1`): the image spans the full canvas height
//! 2. **Landscape or square** (`aspect >= 1`): the image spans the full canvas width
//!
//! The other axis is centered. A square image on a square canvas fills it exactly.
//!
//! All geometry is kept in `f64` canvas pixels; [`FitRectangle::to_pixels`] rounds to
//! the integer rectangle used by the raster code.

/// Represents a 2D size with width and height in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Size {
    pub w: u32,
    pub h: u32,
}

/// Destination rectangle, in canvas pixels, for drawing a source image.
///
/// `width / height` equals the source aspect ratio, and the rectangle touches the
/// canvas edges along its constrained axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FitRectangle {
    pub width: f64,
    pub height: f64,
    pub start_x: f64,
    pub start_y: f64,
}

/// Whole-pixel rectangle derived from a [`FitRectangle`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl PixelRect {
    pub fn size(&self) -> Size {
        Size { w: self.w, h: self.h }
    }
}

/// Compute the rectangle that inscribes an image inside a canvas.
///
/// # Arguments
/// * `canvas_width`, `canvas_height` - fixed dimensions of the drawing surface
/// * `image_width`, `image_height` - natural dimensions of the decoded image
///
/// All four values must be strictly positive; the image loader only reports
/// dimensions after a successful decode.
///
/// # Performance
/// O(1), a handful of floating-point operations
pub fn fit_image_to_canvas(
    canvas_width: f64,
    canvas_height: f64,
    image_width: f64,
    image_height: f64,
) -> FitRectangle {
    debug_assert!(canvas_width > 0.0 && canvas_height > 0.0);
    debug_assert!(image_width > 0.0 && image_height > 0.0);

    let aspect_ratio = image_width / image_height;

    if aspect_ratio < 1.0 {
        let height = canvas_height;
        let width = canvas_height * aspect_ratio;
        FitRectangle {
            width,
            height,
            start_x: (canvas_width - width) / 2.0,
            start_y: 0.0,
        }
    } else {
        let width = canvas_width;
        let height = canvas_width / aspect_ratio;
        FitRectangle {
            width,
            height,
            start_x: 0.0,
            start_y: (canvas_height - height) / 2.0,
        }
    }
}

/// Region of the source image, in source pixels, that lands inside the canvas.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SourceCrop {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// Overhang tolerated before a rectangle counts as overflowing the canvas.
const EDGE_EPSILON: f64 = 1e-6;

impl FitRectangle {
    /// Round the part of the rectangle inside the canvas to whole pixels.
    ///
    /// Origin and size are rounded to nearest; size is at least 1px on each axis. On a
    /// square canvas the rectangle is always inside, so this is a plain rounding.
    pub fn to_pixels(&self, canvas_w: u32, canvas_h: u32) -> PixelRect {
        let (x, w) = visible_span(self.start_x, self.width, canvas_w);
        let (y, h) = visible_span(self.start_y, self.height, canvas_h);
        PixelRect { x, y, w, h }
    }

    /// The part of an `image`-sized source that is visible when drawn at this
    /// rectangle, or `None` when the whole image fits.
    ///
    /// Only happens on non-square canvases: the fit keys on the image aspect alone, so
    /// a landscape image on a short wide canvas overhangs top and bottom. Drawing the
    /// crop keeps the scale uniform and clips the overhang.
    pub fn source_crop(&self, canvas_w: u32, canvas_h: u32, image: Size) -> Option<SourceCrop> {
        let (cw, ch) = (canvas_w as f64, canvas_h as f64);
        let x0 = self.start_x.max(0.0);
        let y0 = self.start_y.max(0.0);
        let x1 = (self.start_x + self.width).min(cw);
        let y1 = (self.start_y + self.height).min(ch);
        let inside = self.start_x >= -EDGE_EPSILON
            && self.start_y >= -EDGE_EPSILON
            && self.start_x + self.width <= cw + EDGE_EPSILON
            && self.start_y + self.height <= ch + EDGE_EPSILON;
        if inside {
            return None;
        }

        let sx = image.w as f64 / self.width;
        let sy = image.h as f64 / self.height;
        Some(SourceCrop {
            left: (x0 - self.start_x) * sx,
            top: (y0 - self.start_y) * sy,
            width: ((x1 - x0) * sx).max(0.0),
            height: ((y1 - y0) * sy).max(0.0),
        })
    }
}

fn visible_span(start: f64, len: f64, canvas: u32) -> (u32, u32) {
    let lo = start.max(0.0);
    let hi = (start + len).min(canvas as f64);
    let origin = (lo.round() as u32).min(canvas.saturating_sub(1));
    let size = ((hi - lo).max(0.0).round() as u32).clamp(1, (canvas - origin).max(1));
    (origin, size)
}

/// Named canvas sizes for the command line.
///
/// `Classic` matches the 400×400 page canvas the captions are laid out for. All presets
/// are square, so the fitted image never needs cropping.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum CanvasPreset {
    /// 400×400, the page canvas
    #[clap(name = "classic")]
    Classic,
    /// 600×600 square for chat apps
    #[clap(name = "square")]
    Square600,
    /// 1080×1080 square for social feeds
    #[clap(name = "hd")]
    Hd1080,
}

impl CanvasPreset {
    pub fn to_size(self) -> Size {
        match self {
            CanvasPreset::Classic => Size { w: 400, h: 400 },
            CanvasPreset::Square600 => Size { w: 600, h: 600 },
            CanvasPreset::Hd1080 => Size { w: 1080, h: 1080 },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn portrait_spans_full_height() {
        let r = fit_image_to_canvas(400.0, 400.0, 100.0, 200.0);
        assert_eq!(
            r,
            FitRectangle {
                width: 200.0,
                height: 400.0,
                start_x: 100.0,
                start_y: 0.0
            }
        );
    }

    #[test]
    fn landscape_spans_full_width() {
        let r = fit_image_to_canvas(400.0, 400.0, 200.0, 100.0);
        assert_eq!(
            r,
            FitRectangle {
                width: 400.0,
                height: 200.0,
                start_x: 0.0,
                start_y: 100.0
            }
        );
    }

    #[test]
    fn square_fills_square_canvas() {
        let r = fit_image_to_canvas(400.0, 400.0, 150.0, 150.0);
        assert_eq!(
            r,
            FitRectangle {
                width: 400.0,
                height: 400.0,
                start_x: 0.0,
                start_y: 0.0
            }
        );
    }

    #[test]
    fn thin_sliver_is_centered() {
        let r = fit_image_to_canvas(400.0, 400.0, 1.0, 1000.0);
        assert!((r.width - 0.4).abs() < 1e-12);
        assert_eq!(r.height, 400.0);
        assert!((r.start_x - 199.8).abs() < 1e-9);
        assert_eq!(r.start_y, 0.0);
    }

    #[test]
    fn pixels_are_clamped_to_canvas() {
        let r = fit_image_to_canvas(400.0, 400.0, 1.0, 1000.0);
        let px = r.to_pixels(400, 400);
        assert_eq!(px, PixelRect { x: 200, y: 0, w: 1, h: 400 });

        let r = fit_image_to_canvas(400.0, 400.0, 640.0, 480.0);
        let px = r.to_pixels(400, 400);
        assert_eq!(px, PixelRect { x: 0, y: 50, w: 400, h: 300 });
    }

    #[test]
    fn square_canvas_needs_no_crop() {
        let r = fit_image_to_canvas(400.0, 400.0, 300.0, 100.0);
        assert_eq!(r.source_crop(400, 400, Size { w: 300, h: 100 }), None);
    }

    #[test]
    fn overhang_on_short_canvas_is_cropped() {
        // 300x200 on 400x200: fitted 400x266.67 starting 33.3 above the canvas
        let image = Size { w: 300, h: 200 };
        let r = fit_image_to_canvas(400.0, 200.0, 300.0, 200.0);
        assert_eq!(r.to_pixels(400, 200), PixelRect { x: 0, y: 0, w: 400, h: 200 });

        let crop = r.source_crop(400, 200, image).unwrap();
        assert!(crop.left.abs() < 1e-9);
        assert!((crop.width - 300.0).abs() < 1e-9);
        assert!((crop.top - 25.0).abs() < 1e-9);
        assert!((crop.height - 150.0).abs() < 1e-9);
        // uniform scale: visible source aspect equals the drawn aspect
        assert!((crop.width / crop.height - 400.0 / 200.0).abs() < 1e-9);
    }

    #[test]
    fn classic_preset_is_page_canvas() {
        assert_eq!(CanvasPreset::Classic.to_size(), Size { w: 400, h: 400 });
    }
}
