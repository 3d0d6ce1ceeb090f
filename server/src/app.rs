use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::AppConfig;
use crate::services::qr_pipeline::PipelineOptions;

/// Application shared state accessible from every axum handler.
#[derive(Clone)]
pub struct SharedState {
    inner: Arc<SharedStateInner>,
}

struct SharedStateInner {
    /// Application configuration (fixed for the process lifetime)
    config: AppConfig,
    /// Cancelled when the server should stop accepting requests
    shutdown_token: CancellationToken,
}

impl SharedState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            inner: Arc::new(SharedStateInner {
                config,
                shutdown_token: CancellationToken::new(),
            }),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.inner.shutdown_token
    }

    /// Per-request pipeline settings derived from the config.
    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            error_level: self.inner.config.error_level,
            watermark_width: image_engine::WATERMARK_WIDTH,
        }
    }
}
