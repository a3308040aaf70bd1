// Configuration management module
// TOML settings for the external embedding service

pub mod settings;

pub use settings::{Config, ConfigError, OllamaConfig};

/// Get the configuration directory path
#[inline]
pub fn get_config_dir() -> Result<std::path::PathBuf, ConfigError> {
    Config::config_dir()
}
