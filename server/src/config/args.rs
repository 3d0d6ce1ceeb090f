//! Command-line flags. Every flag overrides its environment counterpart.

use clap::Parser;

#[derive(Parser, Debug, Default)]
#[command(name = "qrmark-server")]
#[command(about = "HTTP service that renders QR codes with an optional centred PNG watermark")]
pub struct Args {
    /// HTTP network address, e.g. ":8080" or "127.0.0.1:3000"
    #[arg(long)]
    pub addr: Option<String>,

    /// Maximum request body size in bytes
    #[arg(long)]
    pub max_upload_bytes: Option<String>,

    /// Largest QR code size (in pixels) a caller may request
    #[arg(long)]
    pub max_size: Option<String>,

    /// QR code error correction level (L, M, Q, H)
    #[arg(short = 'e', long)]
    pub error_level: Option<String>,
}

impl Args {
    /// Flags given on the command line as `(setting key, flag name, value)`.
    pub fn overrides(&self) -> Vec<(&'static str, &'static str, &str)> {
        [
            ("ADDR", "--addr", self.addr.as_deref()),
            ("MAX_UPLOAD_BYTES", "--max-upload-bytes", self.max_upload_bytes.as_deref()),
            ("MAX_SIZE", "--max-size", self.max_size.as_deref()),
            ("ERROR_LEVEL", "--error-level", self.error_level.as_deref()),
        ]
        .into_iter()
        .filter_map(|(key, flag, value)| value.map(|v| (key, flag, v)))
        .collect()
    }
}
