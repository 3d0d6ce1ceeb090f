//! Configuration management: defaults, validation, loading from environment + CLI.

pub mod app_config;
pub mod args;
pub mod validation;

pub use app_config::AppConfig;
pub use args::Args;
