//! # Drawing Surface
//!
//! A fixed-size RGBA canvas with the handful of 2D operations the meme page uses:
//! clear a region, fill a rectangle, draw an image into a [`FitRectangle`], and draw
//! centered caption text (fill, then stroke).

use std::path::Path;

use fast_image_resize::Resizer;
use image::{Rgba, RgbaImage};
use meme_fit::cpu::scale_rgba_into;
use meme_fit::{FitRectangle, PixelRect, Size};
use tracing::{debug, info};

use crate::config::CaptionStyle;
use crate::error::{MemeError, MemeResult};
use crate::render::text::{CaptionFont, TextMask};

pub const BLACK: [u8; 4] = [0, 0, 0, 255];
pub const TRANSPARENT: [u8; 4] = [0, 0, 0, 0];

/// Fixed-size drawing surface.
pub struct Canvas {
    pixels: RgbaImage,
    resizer: Resizer,
}

impl Canvas {
    /// Create a transparent canvas.
    pub fn new(size: Size) -> Self {
        Self {
            pixels: RgbaImage::from_pixel(size.w, size.h, Rgba(TRANSPARENT)),
            resizer: Resizer::new(),
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn size(&self) -> Size {
        Size {
            w: self.width(),
            h: self.height(),
        }
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.pixels.get_pixel(x, y).0
    }

    /// Reset a region to transparent. The region is clipped to the canvas.
    pub fn clear_rect(&mut self, x: i64, y: i64, w: u32, h: u32) {
        self.for_each_in(x, y, w, h, |px| *px = Rgba(TRANSPARENT));
    }

    pub fn clear(&mut self) {
        let (w, h) = (self.width(), self.height());
        self.clear_rect(0, 0, w, h);
    }

    /// Paint `color` over a region (source-over).
    pub fn fill_rect(&mut self, x: i64, y: i64, w: u32, h: u32, color: [u8; 4]) {
        self.for_each_in(x, y, w, h, |px| blend(px, color, 1.0));
    }

    /// Resample `image` to the rect's pixel size and composite it there.
    pub fn draw_image(&mut self, image: &RgbaImage, rect: &FitRectangle) -> MemeResult<PixelRect> {
        let (target, scaled) = self.scale_to_fit(image, rect)?;
        self.blit(&scaled, target);
        Ok(target)
    }

    /// Resample `image` for drawing at `rect` without touching the canvas.
    ///
    /// Parts of the rectangle outside the canvas are cropped from the source first, so
    /// the image keeps a uniform scale and the overhang is clipped.
    pub fn scale_to_fit(
        &mut self,
        image: &RgbaImage,
        rect: &FitRectangle,
    ) -> MemeResult<(PixelRect, RgbaImage)> {
        let (cw, ch) = (self.width(), self.height());
        let target = rect.to_pixels(cw, ch);
        let src = Size {
            w: image.width(),
            h: image.height(),
        };
        let crop = rect.source_crop(cw, ch, src);
        let scaled =
            scale_rgba_into(&mut self.resizer, image.as_raw(), src, target.size(), crop)?;
        let scaled = RgbaImage::from_raw(target.w, target.h, scaled).ok_or_else(|| {
            MemeError::render("draw_image", "scaled buffer does not match target size")
        })?;
        debug!(?src, ?target, ?crop, "scaled image");
        Ok((target, scaled))
    }

    /// Composite an already scaled image at `target`.
    pub fn blit(&mut self, scaled: &RgbaImage, target: PixelRect) {
        image::imageops::overlay(&mut self.pixels, scaled, target.x as i64, target.y as i64);
    }

    /// Fill `text` centered horizontally on `center_x` with its baseline at `baseline`.
    pub fn fill_text(
        &mut self,
        font: &CaptionFont,
        text: &str,
        center_x: f32,
        baseline: f32,
        style: &CaptionStyle,
    ) {
        let mask = font.layout(text, style.font_px, 0);
        self.paint_mask(&mask, center_x, baseline, style.fill);
    }

    /// Stroke the outline of `text` with `style.line_width`, positioned as in [`fill_text`].
    ///
    /// [`fill_text`]: Canvas::fill_text
    pub fn stroke_text(
        &mut self,
        font: &CaptionFont,
        text: &str,
        center_x: f32,
        baseline: f32,
        style: &CaptionStyle,
    ) {
        let pad = style.line_width.ceil() as u32 + 1;
        let mask = font.layout(text, style.font_px, pad).outline(style.line_width);
        self.paint_mask(&mask, center_x, baseline, style.stroke);
    }

    pub fn paint_mask(&mut self, mask: &TextMask, center_x: f32, baseline: f32, color: [u8; 4]) {
        if mask.is_empty() {
            return;
        }
        let pen_x = (center_x - mask.advance / 2.0).round() as i64;
        let left = pen_x + mask.offset_x as i64;
        let top = baseline.round() as i64 + mask.offset_y as i64;

        for my in 0..mask.height {
            let y = top + my as i64;
            if y < 0 || y >= self.height() as i64 {
                continue;
            }
            for mx in 0..mask.width {
                let x = left + mx as i64;
                if x < 0 || x >= self.width() as i64 {
                    continue;
                }
                let c = mask.coverage[(my * mask.width + mx) as usize];
                if c > 0.0 {
                    blend(self.pixels.get_pixel_mut(x as u32, y as u32), color, c);
                }
            }
        }
    }

    pub fn save_png(&self, path: &Path) -> MemeResult<()> {
        self.pixels
            .save_with_format(path, image::ImageFormat::Png)
            .map_err(|e| match e {
                image::ImageError::IoError(io) => MemeError::io_at("save canvas", path, io),
                other => MemeError::render("save_png", other.to_string()),
            })?;
        info!(path = %path.display(), "saved canvas");
        Ok(())
    }

    fn for_each_in(&mut self, x: i64, y: i64, w: u32, h: u32, mut f: impl FnMut(&mut Rgba<u8>)) {
        let x0 = x.clamp(0, self.width() as i64) as u32;
        let y0 = y.clamp(0, self.height() as i64) as u32;
        let x1 = (x + w as i64).clamp(0, self.width() as i64) as u32;
        let y1 = (y + h as i64).clamp(0, self.height() as i64) as u32;
        for py in y0..y1 {
            for px in x0..x1 {
                f(self.pixels.get_pixel_mut(px, py));
            }
        }
    }
}

/// Source-over compositing of `src` scaled by `coverage` onto `dst` (straight alpha).
fn blend(dst: &mut Rgba<u8>, src: [u8; 4], coverage: f32) {
    let sa = (src[3] as f32 / 255.0) * coverage.clamp(0.0, 1.0);
    if sa <= 0.0 {
        return;
    }
    let da = dst.0[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    for i in 0..3 {
        let sc = src[i] as f32;
        let dc = dst.0[i] as f32;
        dst.0[i] = ((sc * sa + dc * da * (1.0 - sa)) / out_a).round() as u8;
    }
    dst.0[3] = (out_a * 255.0).round() as u8;
}

#[cfg(test)]
mod tests {
    use super::*;
    use meme_fit::fit_image_to_canvas;

    fn canvas() -> Canvas {
        Canvas::new(Size { w: 40, h: 40 })
    }

    #[test]
    fn fill_and_clear_rect() {
        let mut c = canvas();
        c.fill_rect(0, 0, 40, 40, BLACK);
        assert_eq!(c.pixel(39, 39), BLACK);
        c.clear_rect(10, 10, 5, 5);
        assert_eq!(c.pixel(12, 12), TRANSPARENT);
        assert_eq!(c.pixel(9, 9), BLACK);
    }

    #[test]
    fn regions_are_clipped() {
        let mut c = canvas();
        c.fill_rect(-10, 30, 100, 100, [255, 0, 0, 255]);
        assert_eq!(c.pixel(0, 39), [255, 0, 0, 255]);
        assert_eq!(c.pixel(0, 29), TRANSPARENT);
    }

    #[test]
    fn draw_landscape_image_letterboxes() {
        let mut c = canvas();
        c.fill_rect(0, 0, 40, 40, BLACK);
        let img = RgbaImage::from_pixel(20, 10, Rgba([0, 255, 0, 255]));
        let rect = fit_image_to_canvas(40.0, 40.0, 20.0, 10.0);
        let px = c.draw_image(&img, &rect).unwrap();
        assert_eq!(px, PixelRect { x: 0, y: 10, w: 40, h: 20 });
        assert_eq!(c.pixel(20, 5), BLACK);
        assert_eq!(c.pixel(20, 35), BLACK);
        let mid = c.pixel(20, 20);
        assert!(mid[0] <= 1 && mid[1] >= 254 && mid[2] <= 1, "{:?}", mid);
    }

    #[test]
    fn overhang_on_wide_canvas_is_clipped_not_squashed() {
        // 30x20 image, red in rows 0..5, blue below, on an 80x40 canvas. The fit is
        // 80x53.3 starting 6.7 above the canvas; only source rows 2.5..17.5 show.
        let mut c = Canvas::new(Size { w: 80, h: 40 });
        let img = RgbaImage::from_fn(30, 20, |_, y| {
            if y < 5 { Rgba([255, 0, 0, 255]) } else { Rgba([0, 0, 255, 255]) }
        });
        let rect = fit_image_to_canvas(80.0, 40.0, 30.0, 20.0);
        let px = c.draw_image(&img, &rect).unwrap();
        assert_eq!(px, PixelRect { x: 0, y: 0, w: 80, h: 40 });

        // red/blue edge lands at (5 - 2.5) * 40 / 15 = 6.7; squashing would put it at 10
        let first_blue = (0..40)
            .find(|&y| {
                let p = c.pixel(40, y);
                p[2] > p[0]
            })
            .unwrap();
        assert!((6..=7).contains(&first_blue), "edge at row {}", first_blue);
        let bottom = c.pixel(40, 39);
        assert!(bottom[2] >= 254 && bottom[0] <= 1, "{:?}", bottom);
    }

    #[test]
    fn scale_to_fit_leaves_canvas_untouched() {
        let mut c = canvas();
        let img = RgbaImage::from_pixel(10, 20, Rgba([9, 9, 9, 255]));
        let rect = fit_image_to_canvas(40.0, 40.0, 10.0, 20.0);
        let (target, scaled) = c.scale_to_fit(&img, &rect).unwrap();
        assert_eq!(target, PixelRect { x: 10, y: 0, w: 20, h: 40 });
        assert_eq!(scaled.dimensions(), (20, 40));
        assert!(c.pixels().pixels().all(|p| p.0 == TRANSPARENT));
    }

    #[test]
    fn blend_half_coverage_over_black() {
        let mut px = Rgba(BLACK);
        blend(&mut px, [255, 255, 255, 255], 0.5);
        assert_eq!(px.0, [128, 128, 128, 255]);
    }

    #[test]
    fn blend_onto_transparent_keeps_color() {
        let mut px = Rgba(TRANSPARENT);
        blend(&mut px, [255, 255, 255, 255], 1.0);
        assert_eq!(px.0, [255, 255, 255, 255]);
    }

    #[test]
    fn empty_mask_paints_nothing() {
        let mut c = canvas();
        let mask = TextMask {
            width: 0,
            height: 0,
            coverage: Vec::new(),
            offset_x: 0,
            offset_y: 0,
            advance: 0.0,
        };
        c.paint_mask(&mask, 20.0, 20.0, BLACK);
        assert!(c.pixels().pixels().all(|p| p.0 == TRANSPARENT));
    }

    #[test]
    fn mask_is_centered_on_baseline() {
        let mut c = canvas();
        let mask = TextMask {
            width: 4,
            height: 2,
            coverage: vec![1.0; 8],
            offset_x: 0,
            offset_y: -2,
            advance: 4.0,
        };
        c.paint_mask(&mask, 20.0, 30.0, BLACK);
        // pen starts at 18, rows 28..30
        assert_eq!(c.pixel(18, 28), BLACK);
        assert_eq!(c.pixel(21, 29), BLACK);
        assert_eq!(c.pixel(22, 29), TRANSPARENT);
        assert_eq!(c.pixel(18, 30), TRANSPARENT);
    }
}
