//! QR symbol rendering at an exact pixel size.

use std::str::FromStr;

use image::{DynamicImage, GrayImage, Luma};
use qrcode::{EcLevel, QrCode};
use tracing::debug;

use crate::error::EngineError;

/// Light modules kept around the symbol on every side.
pub const QUIET_ZONE: u32 = 4;

/// QR error correction level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorLevel {
    L,
    #[default]
    M,
    Q,
    H,
}

impl From<ErrorLevel> for EcLevel {
    fn from(v: ErrorLevel) -> Self {
        match v {
            ErrorLevel::L => EcLevel::L,
            ErrorLevel::M => EcLevel::M,
            ErrorLevel::Q => EcLevel::Q,
            ErrorLevel::H => EcLevel::H,
        }
    }
}

impl FromStr for ErrorLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "L" => Ok(Self::L),
            "M" => Ok(Self::M),
            "Q" => Ok(Self::Q),
            "H" => Ok(Self::H),
            other => Err(format!("unknown error correction level '{other}' (expected L, M, Q or H)")),
        }
    }
}

impl std::fmt::Display for ErrorLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::L => "L",
            Self::M => "M",
            Self::Q => "Q",
            Self::H => "H",
        };
        f.write_str(s)
    }
}

/// Render `content` as a `size` x `size` grayscale QR code.
///
/// Modules are scaled by a whole number of pixels and the symbol (including
/// its quiet zone) is centred on a white canvas. Fails if the content cannot
/// be encoded or the symbol does not fit in `size` pixels.
pub fn encode_qr(content: &str, level: ErrorLevel, size: u32) -> Result<DynamicImage, EngineError> {
    if content.is_empty() {
        return Err(EngineError::Encoding("no content to encode".into()));
    }

    let code = QrCode::with_error_correction_level(content.as_bytes(), level.into())
        .map_err(|e| EngineError::Encoding(e.to_string()))?;
    let module_count = code.width() as u32;
    let real_size = module_count + 2 * QUIET_ZONE;

    if size < real_size {
        return Err(EngineError::Encoding(format!(
            "requested size {size}px is smaller than the {real_size}x{real_size} module symbol"
        )));
    }

    let scale = size / real_size;
    let offset = (size - real_size * scale) / 2 + QUIET_ZONE * scale;

    debug!(module_count, scale, size, %level, "Rendering QR symbol");

    let mut img = GrayImage::from_pixel(size, size, Luma([255u8]));

    for (i, color) in code.to_colors().iter().enumerate() {
        if *color != qrcode::Color::Dark {
            continue;
        }
        let x = (i as u32) % module_count;
        let y = (i as u32) / module_count;
        let (px, py) = (offset + x * scale, offset + y * scale);
        for dy in 0..scale {
            for dx in 0..scale {
                img.put_pixel(px + dx, py + dy, Luma([0u8]));
            }
        }
    }

    Ok(DynamicImage::ImageLuma8(img))
}
