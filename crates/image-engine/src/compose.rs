//! Watermark composition: centre a watermark over a QR symbol and flatten.

use image::{DynamicImage, Rgba, RgbaImage};
use tracing::debug;

use crate::error::EngineError;

/// Top-left position that puts the watermark's centre on the canvas centre.
///
/// Uses integer division throughout, so a 64px square watermark on a
/// `size`-pixel canvas lands at `(size/2 - 32, size/2 - 32)`. The result is
/// negative when the watermark is larger than the canvas.
pub fn centering_offset(size: u32, wm_width: u32, wm_height: u32) -> (i64, i64) {
    let half = i64::from(size / 2);
    (half - i64::from(wm_width / 2), half - i64::from(wm_height / 2))
}

/// Composite `watermark` centred over `base`.
///
/// The base is copied as-is into a fresh RGBA buffer, then the watermark is
/// blended over it with its own alpha. Pixels falling outside the base are
/// clipped.
pub fn composite(
    base: &DynamicImage,
    watermark: &DynamicImage,
    size: u32,
) -> Result<RgbaImage, EngineError> {
    if base.width() != size || base.height() != size {
        return Err(EngineError::Composite(format!(
            "base image is {}x{}, expected {size}x{size}",
            base.width(),
            base.height()
        )));
    }
    if watermark.width() == 0 || watermark.height() == 0 {
        return Err(EngineError::Composite("watermark has no area".into()));
    }

    let (x, y) = centering_offset(size, watermark.width(), watermark.height());
    debug!(
        x,
        y,
        wm_width = watermark.width(),
        wm_height = watermark.height(),
        "Compositing watermark"
    );

    let mut out = base.to_rgba8();
    overlay(&mut out, &watermark.to_rgba8(), x, y);
    Ok(out)
}

/// Overlay `top` onto `base` at a possibly negative position.
///
/// `top` is alpha-composited over the base ("over" operator).
pub fn overlay(base: &mut RgbaImage, top: &RgbaImage, x: i64, y: i64) {
    let (base_w, base_h) = (i64::from(base.width()), i64::from(base.height()));

    for (dx, dy, pixel) in top.enumerate_pixels() {
        let target_x = x + i64::from(dx);
        let target_y = y + i64::from(dy);
        if target_x < 0 || target_y < 0 || target_x >= base_w || target_y >= base_h {
            continue;
        }
        let (tx, ty) = (target_x as u32, target_y as u32);

        match pixel[3] {
            0 => {}
            255 => base.put_pixel(tx, ty, *pixel),
            _ => {
                let blended = blend_pixel(base.get_pixel(tx, ty), pixel);
                base.put_pixel(tx, ty, blended);
            }
        }
    }
}

fn blend_pixel(bg: &Rgba<u8>, fg: &Rgba<u8>) -> Rgba<u8> {
    let fg_a = f32::from(fg[3]) / 255.0;
    let bg_a = f32::from(bg[3]) / 255.0;
    let out_a = fg_a + bg_a * (1.0 - fg_a);
    if out_a <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }

    let channel = |i: usize| {
        let c = (f32::from(fg[i]) * fg_a + f32::from(bg[i]) * bg_a * (1.0 - fg_a)) / out_a;
        c.round().clamp(0.0, 255.0) as u8
    };

    Rgba([
        channel(0),
        channel(1),
        channel(2),
        (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
    ])
}
