//! Raster pipeline for watermarked QR codes.
//!
//! Provides QR symbol rendering, PNG decode/encode with content sniffing,
//! Lanczos3 resizing, and centred alpha compositing of a watermark onto
//! the rendered symbol.

pub mod codec;
pub mod compose;
pub mod error;
pub mod qr;
pub mod resize;

// Re-exports for convenience
pub use image;
pub use codec::{SniffedFormat, decode_png, encode_png, sniff_format};
pub use compose::{centering_offset, composite, overlay};
pub use error::EngineError;
pub use qr::{ErrorLevel, encode_qr};
pub use resize::resize_to_width;

/// Width in pixels every watermark is scaled to before compositing.
pub const WATERMARK_WIDTH: u32 = 64;
