//! Runtime application configuration: defaults, environment overrides, CLI flags.

use anyhow::anyhow;
use image_engine::ErrorLevel;

use super::args::Args;
use super::validation::validate_setting;

/// Prefix for every environment variable the server reads.
pub const ENV_PREFIX: &str = "QRMARK_";

/// Setting keys, in load order.
pub const SETTING_KEYS: [&str; 4] = ["ADDR", "MAX_UPLOAD_BYTES", "MAX_SIZE", "ERROR_LEVEL"];

/// Runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub addr: String,
    pub max_upload_bytes: usize,
    pub max_size: u32,
    pub error_level: ErrorLevel,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            addr: ":8080".into(),
            max_upload_bytes: 1024 * 1024,
            max_size: 4096,
            error_level: ErrorLevel::M,
        }
    }
}

impl AppConfig {
    /// Build the configuration: defaults, then `QRMARK_*` environment
    /// variables, then command-line flags.
    pub fn load(args: &Args) -> Result<Self, anyhow::Error> {
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(key).ok());
        config.apply_args(args)?;
        Ok(config)
    }

    /// Apply environment overrides. Invalid values are logged and skipped.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        for key in SETTING_KEYS {
            let var = format!("{ENV_PREFIX}{key}");
            let Some(value) = lookup(&var) else {
                continue;
            };
            if let Err(e) = self.set(key, &value) {
                tracing::warn!("Ignoring {var}={value:?}: {e}");
            }
        }
    }

    /// Apply command-line overrides. Invalid values are a hard error.
    pub fn apply_args(&mut self, args: &Args) -> Result<(), anyhow::Error> {
        for (key, flag, value) in args.overrides() {
            self.set(key, value)
                .map_err(|e| anyhow!("invalid value for {flag}: {e}"))?;
        }
        Ok(())
    }

    /// Validate and store a single setting.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), String> {
        validate_setting(key, value)?;
        match key {
            "ADDR" => self.addr = value.to_string(),
            "MAX_UPLOAD_BYTES" => self.max_upload_bytes = parse(value)?,
            "MAX_SIZE" => self.max_size = parse(value)?,
            "ERROR_LEVEL" => self.error_level = value.parse()?,
            _ => return Err(format!("unknown setting '{key}'")),
        }
        Ok(())
    }

    /// Socket address to bind. A bare `:port` listens on all interfaces.
    pub fn bind_addr(&self) -> String {
        if self.addr.starts_with(':') {
            format!("0.0.0.0{}", self.addr)
        } else {
            self.addr.clone()
        }
    }
}

fn parse<T: std::str::FromStr>(value: &str) -> Result<T, String> {
    value.parse().map_err(|_| format!("invalid number '{value}'"))
}
