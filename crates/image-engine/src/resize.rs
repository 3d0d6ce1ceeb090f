//! Aspect-ratio-preserving resize used to normalise watermark uploads.
//!
//! Always resamples with Lanczos3 so watermark edges stay smooth against
//! the hard QR module edges.

use image::DynamicImage;
use image::imageops::FilterType;
use tracing::debug;

use crate::error::EngineError;

/// Resize an image to a target width while maintaining aspect ratio.
///
/// Returns the original image unchanged if it already matches the target width.
/// Fails if the derived height would exceed `max_height`.
pub fn resize_to_width(
    img: &DynamicImage,
    width: u32,
    max_height: u32,
) -> Result<DynamicImage, EngineError> {
    let (orig_w, orig_h) = (img.width(), img.height());

    if orig_w == 0 || orig_h == 0 {
        return Err(EngineError::Resize(format!(
            "source image has no area ({orig_w}x{orig_h})"
        )));
    }
    if width == 0 {
        return Err(EngineError::Resize("target width must be positive".into()));
    }

    let ratio = f64::from(width) / f64::from(orig_w);
    let new_height = (f64::from(orig_h) * ratio).round().min(f64::from(u32::MAX)) as u32;
    let new_height = new_height.max(1);

    if new_height > max_height {
        return Err(EngineError::Resize(format!(
            "{orig_w}x{orig_h} image would be {new_height}px tall at width {width} (max {max_height})"
        )));
    }

    if orig_w == width {
        debug!(width, "Image already at target width, skipping resize");
        return Ok(img.clone());
    }

    debug!(
        orig_w,
        orig_h,
        new_width = width,
        new_height,
        "Resizing image to target width"
    );

    Ok(img.resize_exact(width, new_height, FilterType::Lanczos3))
}
