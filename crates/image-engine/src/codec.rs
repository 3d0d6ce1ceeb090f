//! PNG decoding/encoding and byte-level content sniffing.
//!
//! Sniffing looks only at a leading window of the payload and never decodes
//! it, so it is cheap enough to run as a guard before a full decode.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, ImageReader, Limits};

use crate::error::EngineError;

/// Maximum number of leading bytes inspected by [`sniff_format`].
pub const SNIFF_LEN: usize = 512;

/// Largest width or height [`decode_png`] accepts.
pub const MAX_DECODE_DIMENSION: u32 = 16_384;

const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";
/// Signature + IHDR length/type + 13 data bytes + CRC.
const PNG_MIN_HEADER: usize = 8 + 8 + 13 + 4;

/// Content label produced by [`sniff_format`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SniffedFormat {
    Png,
    Jpeg,
    Gif,
    Bmp,
    WebP,
    Text,
    Binary,
}

impl SniffedFormat {
    /// MIME label for the sniffed content.
    pub fn mime(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Gif => "image/gif",
            Self::Bmp => "image/bmp",
            Self::WebP => "image/webp",
            Self::Text => "text/plain; charset=utf-8",
            Self::Binary => "application/octet-stream",
        }
    }

    /// Whether the content looks like a raster image of any kind.
    pub fn is_raster(self) -> bool {
        !matches!(self, Self::Text | Self::Binary)
    }
}

impl std::fmt::Display for SniffedFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mime())
    }
}

/// Classify a payload from its first [`SNIFF_LEN`] bytes.
pub fn sniff_format(data: &[u8]) -> SniffedFormat {
    let window = &data[..data.len().min(SNIFF_LEN)];

    if window.starts_with(PNG_SIGNATURE) {
        return if has_png_header(window) {
            SniffedFormat::Png
        } else {
            SniffedFormat::Binary
        };
    }
    if window.starts_with(b"\xFF\xD8\xFF") {
        return SniffedFormat::Jpeg;
    }
    if window.starts_with(b"GIF87a") || window.starts_with(b"GIF89a") {
        return SniffedFormat::Gif;
    }
    if window.starts_with(b"BM") {
        return SniffedFormat::Bmp;
    }
    if window.len() >= 14 && window.starts_with(b"RIFF") && &window[8..14] == b"WEBPVP" {
        return SniffedFormat::WebP;
    }

    if window.iter().any(|&b| is_binary_byte(b)) {
        SniffedFormat::Binary
    } else {
        SniffedFormat::Text
    }
}

fn has_png_header(window: &[u8]) -> bool {
    window.len() >= PNG_MIN_HEADER
        && window[8..12] == [0, 0, 0, 13]
        && &window[12..16] == b"IHDR"
}

// Control bytes that never appear in plain text.
fn is_binary_byte(b: u8) -> bool {
    matches!(b, 0x00..=0x08 | 0x0B | 0x0E..=0x1A | 0x1C..=0x1F)
}

/// Decode a PNG payload. Other formats are rejected even if `image` could
/// read them, as are images wider or taller than [`MAX_DECODE_DIMENSION`].
pub fn decode_png(data: &[u8]) -> Result<DynamicImage, EngineError> {
    let mut limits = Limits::default();
    limits.max_image_width = Some(MAX_DECODE_DIMENSION);
    limits.max_image_height = Some(MAX_DECODE_DIMENSION);

    let mut reader = ImageReader::with_format(Cursor::new(data), ImageFormat::Png);
    reader.limits(limits);
    reader
        .decode()
        .map_err(|e| EngineError::Decode(e.to_string()))
}

/// Encode an image as PNG.
pub fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, EngineError> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png)
        .map_err(|e| EngineError::Encode(e.to_string()))?;
    Ok(buf.into_inner())
}
