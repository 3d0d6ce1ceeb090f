//! Error type shared by every stage of the raster pipeline.

/// A failure in one raster pipeline stage.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("QR encode error: {0}")]
    Encoding(String),

    #[error("could not decode image: {0}")]
    Decode(String),

    #[error("could not encode image: {0}")]
    Encode(String),

    #[error("could not resize image: {0}")]
    Resize(String),

    #[error("could not composite images: {0}")]
    Composite(String),
}
