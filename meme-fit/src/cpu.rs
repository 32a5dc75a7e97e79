// SPDX-License-Identifier: MIT
// CPU scaler built on fast_image_resize (SIMD-accelerated).
// RGBA8 in → RGBA8 out, sized to the pixel rect of a FitRectangle.

use fast_image_resize as fir;
use fir::images::{TypedImage, TypedImageRef};
use fir::pixels::U8x4;
use fir::{ResizeOptions, Resizer};

use crate::fit::{Size, SourceCrop};

#[derive(Debug)]
pub enum ScaleError {
    BufferSizeMismatch { expected: usize, actual: usize },
    EmptyDestination,
    Fir(fir::ResizeError),
    ImageBuf(fir::ImageBufferError),
}

impl From<fir::ResizeError> for ScaleError {
    fn from(e: fir::ResizeError) -> Self {
        Self::Fir(e)
    }
}

impl From<fir::ImageBufferError> for ScaleError {
    fn from(e: fir::ImageBufferError) -> Self {
        Self::ImageBuf(e)
    }
}

impl std::fmt::Display for ScaleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScaleError::BufferSizeMismatch { expected, actual } => {
                write!(f, "Source buffer is {} bytes, expected {}", actual, expected)
            }
            ScaleError::EmptyDestination => write!(f, "Destination size must be at least 1x1"),
            ScaleError::Fir(e) => write!(f, "Fast image resize error: {}", e),
            ScaleError::ImageBuf(e) => write!(f, "Image buffer error: {}", e),
        }
    }
}

impl std::error::Error for ScaleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ScaleError::Fir(e) => Some(e),
            ScaleError::ImageBuf(e) => Some(e),
            _ => None,
        }
    }
}

/// Resample a tightly packed RGBA8 buffer to `dst` size.
///
/// With `crop`, only that region of the source is resampled. Returns a new
/// `dst.w * dst.h * 4` byte buffer. When the sizes already match and nothing is cropped
/// the source is copied as-is; the canvas draws at native size more often than not for
/// square images on a matching canvas.
pub fn scale_rgba_into(
    resizer: &mut Resizer,
    src_rgba: &[u8],
    src: Size,
    dst: Size,
    crop: Option<SourceCrop>,
) -> Result<Vec<u8>, ScaleError> {
    let expected = (src.w as usize) * (src.h as usize) * 4;
    if src_rgba.len() != expected {
        return Err(ScaleError::BufferSizeMismatch {
            expected,
            actual: src_rgba.len(),
        });
    }
    if dst.w == 0 || dst.h == 0 {
        return Err(ScaleError::EmptyDestination);
    }
    if src == dst && crop.is_none() {
        return Ok(src_rgba.to_vec());
    }

    let src_view = TypedImageRef::<U8x4>::from_buffer(src.w, src.h, src_rgba)?;

    let mut out = vec![0u8; (dst.w as usize) * (dst.h as usize) * 4];
    let mut dst_image = TypedImage::<U8x4>::from_buffer(dst.w, dst.h, &mut out)?;

    // Alpha-aware so transparent edges don't bleed dark fringes into the letterbox.
    let mut opts = ResizeOptions::new()
        .resize_alg(fir::ResizeAlg::Convolution(fir::FilterType::Lanczos3))
        .use_alpha(true);
    if let Some(c) = crop {
        opts = opts.crop(c.left, c.top, c.width, c.height);
    }

    resizer.resize_typed::<U8x4>(&src_view, &mut dst_image, &opts)?;

    Ok(out)
}
