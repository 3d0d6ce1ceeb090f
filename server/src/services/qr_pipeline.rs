//! Per-request QR generation pipeline.
//!
//! Validates the form inputs, renders the base symbol and, when a watermark
//! was uploaded, sniffs, resizes and composites it. Every intermediate
//! artifact lives in memory owned by the request.

use image_engine::image::DynamicImage;
use image_engine::{
    EngineError, ErrorLevel, SniffedFormat, composite, decode_png, encode_png, encode_qr,
    resize_to_width, sniff_format,
};
use tracing::debug;

/// A failed generation, tagged with the stage that failed.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("{0}")]
    Validation(String),

    #[error("Could not generate QR code. {0}")]
    Encoding(EngineError),

    #[error("Could not upload the watermark image. {0}")]
    Upload(String),

    #[error("Provided watermark image is a {0} not a PNG.")]
    Format(SniffedFormat),

    #[error("Could not resize the watermark image. {0}")]
    Resize(EngineError),

    #[error("Could not generate QR code with the watermark image. {0}")]
    Composite(EngineError),

    #[error("Internal error while generating QR code: {0}")]
    Internal(String),
}

impl GenerateError {
    /// HTTP status for this error. Caller mistakes and pipeline failures are
    /// all reported as 400; only a crashed worker is a 500.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Internal(_) => 500,
            _ => 400,
        }
    }
}

pub const MISSING_CONTENT: &str = "Could not determine the desired QR code content.";
const SIZE_PREFIX: &str = "Could not determine the desired QR code size:";

/// Validated generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrRequest {
    pub content: String,
    pub size: u32,
}

impl QrRequest {
    /// Validate the raw `url` and `size` form values.
    pub fn parse(url: Option<&str>, size: Option<&str>, max_size: u32) -> Result<Self, GenerateError> {
        let content = match url {
            Some(u) if !u.is_empty() => u.to_string(),
            _ => return Err(GenerateError::Validation(MISSING_CONTENT.into())),
        };

        let size_err = |reason: String| GenerateError::Validation(format!("{SIZE_PREFIX} {reason}"));
        let raw = match size {
            Some(s) if !s.is_empty() => s,
            _ => return Err(size_err("no size provided".into())),
        };
        let parsed: i64 = raw
            .parse()
            .map_err(|e| size_err(format!("'{raw}' is not a number ({e})")))?;
        if parsed <= 0 {
            return Err(size_err(format!("{parsed} is not a positive integer")));
        }
        if parsed > i64::from(max_size) {
            return Err(size_err(format!("{parsed} exceeds the maximum of {max_size}")));
        }

        Ok(Self {
            content,
            size: parsed as u32,
        })
    }
}

/// State of the optional `watermark` upload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Watermark {
    /// No watermark field was sent.
    #[default]
    Absent,
    /// The field was read completely.
    Present(Vec<u8>),
    /// The field (or the body around it) could not be read.
    Broken(String),
}

/// Settings shared by every request.
#[derive(Debug, Clone, Copy)]
pub struct PipelineOptions {
    pub error_level: ErrorLevel,
    pub watermark_width: u32,
}

/// Run the pipeline and return the encoded PNG.
pub fn generate(
    request: &QrRequest,
    watermark: Watermark,
    options: &PipelineOptions,
) -> Result<Vec<u8>, GenerateError> {
    let base = encode_qr(&request.content, options.error_level, request.size)
        .map_err(GenerateError::Encoding)?;
    debug!(size = request.size, "Base QR code generated");

    let upload = match watermark {
        Watermark::Absent => {
            debug!("No watermark uploaded, returning plain QR code");
            return encode_png(&base).map_err(GenerateError::Encoding);
        }
        Watermark::Broken(reason) => return Err(GenerateError::Upload(reason)),
        Watermark::Present(bytes) => bytes,
    };

    let format = sniff_format(&upload);
    if format != SniffedFormat::Png {
        return Err(GenerateError::Format(format));
    }

    let decoded = decode_png(&upload).map_err(GenerateError::Resize)?;
    // Anything taller than the canvas would be clipped anyway.
    let resized = resize_to_width(&decoded, options.watermark_width, request.size)
        .map_err(GenerateError::Resize)?;
    debug!(
        width = resized.width(),
        height = resized.height(),
        "Watermark resized"
    );

    let flattened =
        composite(&base, &resized, request.size).map_err(GenerateError::Composite)?;
    encode_png(&DynamicImage::ImageRgba8(flattened))
        .map_err(GenerateError::Composite)
}
