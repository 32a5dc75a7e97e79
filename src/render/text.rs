//! # Caption Text
//!
//! Font discovery and glyph layout for captions. A caption is laid out once into a
//! coverage mask; the canvas then paints the mask itself (fill) or the band around its
//! outline (stroke).
//!
//! Fonts come from an explicit file when one is configured, otherwise from the
//! system's bold sans-serif face located with `fontdb`. Glyphs are rasterized with
//! `fontdue`.

use std::path::Path;

use fontdb::{Database, Family, Query, Weight};
use fontdue::{Font, FontSettings};
use tracing::{debug, info};

use crate::error::{MemeError, MemeResult};

/// Families tried, in order, when no font file is configured.
const FALLBACK_FAMILIES: &[Family<'static>] = &[
    Family::SansSerif,
    Family::Name("DejaVu Sans"),
    Family::Name("Liberation Sans"),
    Family::Name("Arial"),
    Family::Name("Helvetica"),
];

/// A loaded caption font.
pub struct CaptionFont {
    font: Font,
    source: String,
}

impl std::fmt::Debug for CaptionFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptionFont").field("source", &self.source).finish()
    }
}

impl CaptionFont {
    /// Load `path` if given, else the system's bold sans-serif.
    pub fn load(path: Option<&Path>) -> MemeResult<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Self::system_bold_sans(),
        }
    }

    pub fn from_file(path: &Path) -> MemeResult<Self> {
        let bytes = std::fs::read(path).map_err(|e| MemeError::io_at("read font", path, e))?;
        Self::from_bytes(bytes, 0, path.display().to_string())
    }

    pub fn from_bytes(bytes: Vec<u8>, collection_index: u32, source: String) -> MemeResult<Self> {
        let settings = FontSettings {
            collection_index,
            ..FontSettings::default()
        };
        let font = Font::from_bytes(bytes, settings)
            .map_err(|e| MemeError::font(format!("{}: {}", source, e)))?;
        info!(font = %source, "loaded caption font");
        Ok(Self { font, source })
    }

    /// Find a bold sans-serif face among the installed system fonts.
    pub fn system_bold_sans() -> MemeResult<Self> {
        let mut db = Database::new();
        db.load_system_fonts();
        debug!(faces = db.len(), "scanned system fonts");

        let query = Query {
            families: FALLBACK_FAMILIES,
            weight: Weight::BOLD,
            ..Query::default()
        };
        let id = db.query(&query).ok_or_else(|| {
            MemeError::font("no sans-serif face installed")
                .with_recovery_suggestion("pass a TTF/OTF file with --font")
        })?;
        let source = db
            .face(id)
            .map(|face| face.post_script_name.clone())
            .unwrap_or_else(|| "system sans-serif".to_string());

        db.with_face_data(id, |data, index| {
            Self::from_bytes(data.to_vec(), index, source.clone())
        })
        .unwrap_or_else(|| Err(MemeError::font(format!("{}: face data unavailable", source))))
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Lay `text` out on a single line at `px` size.
    ///
    /// `pad` extra transparent pixels surround the glyphs so a stroke can grow past
    /// the outline without being cut off.
    pub fn layout(&self, text: &str, px: f32, pad: u32) -> TextMask {
        struct Placed {
            left: i32,
            top: i32,
            width: usize,
            height: usize,
            bitmap: Vec<u8>,
        }

        let mut placed = Vec::new();
        let mut pen_x = 0.0f32;
        let mut prev: Option<char> = None;

        for ch in text.chars() {
            if let Some(p) = prev {
                pen_x += self.font.horizontal_kern(p, ch, px).unwrap_or(0.0);
            }
            let (metrics, bitmap) = self.font.rasterize(ch, px);
            if metrics.width > 0 && metrics.height > 0 {
                placed.push(Placed {
                    left: (pen_x + metrics.xmin as f32).round() as i32,
                    // y grows downward; ymin is the bitmap's bottom edge above the baseline
                    top: -(metrics.ymin + metrics.height as i32),
                    width: metrics.width,
                    height: metrics.height,
                    bitmap,
                });
            }
            pen_x += metrics.advance_width;
            prev = Some(ch);
        }

        if placed.is_empty() {
            return TextMask {
                width: 0,
                height: 0,
                coverage: Vec::new(),
                offset_x: 0,
                offset_y: 0,
                advance: pen_x,
            };
        }

        let pad = pad as i32;
        let min_x = placed.iter().map(|g| g.left).min().unwrap_or(0) - pad;
        let min_y = placed.iter().map(|g| g.top).min().unwrap_or(0) - pad;
        let max_x = placed.iter().map(|g| g.left + g.width as i32).max().unwrap_or(0) + pad;
        let max_y = placed.iter().map(|g| g.top + g.height as i32).max().unwrap_or(0) + pad;

        let width = (max_x - min_x) as u32;
        let height = (max_y - min_y) as u32;
        let mut coverage = vec![0.0f32; (width * height) as usize];

        for g in &placed {
            for row in 0..g.height {
                for col in 0..g.width {
                    let a = g.bitmap[row * g.width + col] as f32 / 255.0;
                    let x = (g.left - min_x) as usize + col;
                    let y = (g.top - min_y) as usize + row;
                    let cell = &mut coverage[y * width as usize + x];
                    // Overlapping glyphs (tight kerning) keep the stronger coverage.
                    *cell = cell.max(a);
                }
            }
        }

        TextMask {
            width,
            height,
            coverage,
            offset_x: min_x,
            offset_y: min_y,
            advance: pen_x,
        }
    }
}

/// Glyph coverage for one line of text.
///
/// `offset_x` is the mask's left edge relative to the pen start; `offset_y` is its top
/// edge relative to the baseline (negative above it).
#[derive(Debug, Clone)]
pub struct TextMask {
    pub width: u32,
    pub height: u32,
    pub coverage: Vec<f32>,
    pub offset_x: i32,
    pub offset_y: i32,
    /// Total advance width, used for centering.
    pub advance: f32,
}

impl TextMask {
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn at(&self, x: i32, y: i32) -> f32 {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return 0.0;
        }
        self.coverage[(y as u32 * self.width + x as u32) as usize]
    }

    /// Coverage of a `line_width` band straddling the glyph outline.
    ///
    /// Computed as dilation minus erosion with a disk of radius `line_width / 2`.
    pub fn outline(&self, line_width: f32) -> TextMask {
        let radius = (line_width / 2.0).max(0.0);
        let reach = radius.ceil() as i32;
        let offsets: Vec<(i32, i32)> = (-reach..=reach)
            .flat_map(|dy| (-reach..=reach).map(move |dx| (dx, dy)))
            .filter(|(dx, dy)| ((dx * dx + dy * dy) as f32) <= radius * radius)
            .collect();

        let mut coverage = vec![0.0f32; self.coverage.len()];
        for y in 0..self.height as i32 {
            for x in 0..self.width as i32 {
                let mut hi = 0.0f32;
                let mut lo = 1.0f32;
                for (dx, dy) in &offsets {
                    let c = self.at(x + dx, y + dy);
                    hi = hi.max(c);
                    lo = lo.min(c);
                }
                coverage[(y as u32 * self.width + x as u32) as usize] = (hi - lo).clamp(0.0, 1.0);
            }
        }

        TextMask {
            coverage,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask_from(rows: &[&str]) -> TextMask {
        let height = rows.len() as u32;
        let width = rows[0].len() as u32;
        let coverage = rows
            .iter()
            .flat_map(|r| r.chars().map(|c| if c == '#' { 1.0 } else { 0.0 }))
            .collect();
        TextMask {
            width,
            height,
            coverage,
            offset_x: 0,
            offset_y: 0,
            advance: width as f32,
        }
    }

    #[test]
    fn outline_of_block_is_its_edge() {
        let mask = mask_from(&[
            ".......", //
            ".#####.",
            ".#####.",
            ".#####.",
            ".......",
        ]);
        let outline = mask.outline(2.0);
        // Interior pixel is fully surrounded: no stroke.
        assert_eq!(outline.at(3, 2), 0.0);
        // Edge pixel inside the glyph and the pixel just outside both get stroke.
        assert_eq!(outline.at(1, 2), 1.0);
        assert_eq!(outline.at(0, 2), 1.0);
        // Corner just outside diagonally is beyond a radius-1 disk.
        assert_eq!(outline.at(0, 0), 0.0);
    }

    #[test]
    fn zero_width_outline_is_empty() {
        let mask = mask_from(&["##", "##"]);
        let outline = mask.outline(0.0);
        assert!(outline.coverage.iter().all(|c| *c == 0.0));
    }

    #[test]
    fn out_of_bounds_reads_are_transparent() {
        let mask = mask_from(&["#"]);
        assert_eq!(mask.at(-1, 0), 0.0);
        assert_eq!(mask.at(0, 1), 0.0);
        assert_eq!(mask.at(0, 0), 1.0);
    }
}
