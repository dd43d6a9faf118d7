// src/config/loader.rs
//! Configuration loader: TOML files layered with environment overrides

use crate::config::AnalysisConfig;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Environment prefix for overrides, e.g. `OPTIMAP__TEMPORAL__CUTOFF_HZ=80`
pub const ENV_PREFIX: &str = "OPTIMAP";

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Configuration parse error: {0}")]
    ParseError(String),

    #[error("Configuration validation errors: {}", .0.join("; "))]
    ValidationError(Vec<String>),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

impl From<::config::ConfigError> for ConfigError {
    fn from(err: ::config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

/// Loads [`AnalysisConfig`] from layered sources
pub struct ConfigLoader {
    config_paths: Vec<PathBuf>,
    env_prefix: Option<String>,
}

impl ConfigLoader {
    /// Loader over the default search paths with environment overrides
    pub fn new() -> Self {
        Self {
            config_paths: Self::discover_config_paths(),
            env_prefix: Some(ENV_PREFIX.to_string()),
        }
    }

    /// Loader over explicit paths; every path must exist
    pub fn with_paths(paths: Vec<PathBuf>) -> Self {
        Self {
            config_paths: paths,
            env_prefix: Some(ENV_PREFIX.to_string()),
        }
    }

    /// Disable environment overrides
    pub fn without_env(mut self) -> Self {
        self.env_prefix = None;
        self
    }

    /// Load, merge and validate the configuration
    pub fn load(&self) -> Result<AnalysisConfig, ConfigError> {
        let mut builder = ::config::Config::builder();

        for path in &self.config_paths {
            if !path.exists() {
                return Err(ConfigError::FileNotFound(path.display().to_string()));
            }
            debug!(path = %path.display(), "adding configuration file");
            builder = builder.add_source(::config::File::from(path.as_path()));
        }

        if let Some(prefix) = &self.env_prefix {
            builder = builder.add_source(
                ::config::Environment::with_prefix(prefix)
                    .prefix_separator("__")
                    .separator("__"),
            );
        }

        let config: AnalysisConfig = builder.build()?.try_deserialize()?;
        config.validate_consistency().map_err(ConfigError::ValidationError)?;
        Ok(config)
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<AnalysisConfig, ConfigError> {
        let config: AnalysisConfig = toml::from_str(content)?;
        config.validate_consistency().map_err(ConfigError::ValidationError)?;
        Ok(config)
    }

    /// Validate a configuration file without keeping it
    pub fn validate_config_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content).map(|_| ())
    }

    fn discover_config_paths() -> Vec<PathBuf> {
        ["optimap.toml", "config/optimap.toml"]
            .iter()
            .map(PathBuf::from)
            .filter(|p| p.exists())
            .collect()
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::filters::{DriftOrder, FilterOrder};
    use std::io::Write;

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[temporal]\ncutoff_hz = 80.0\norder = 20\n\n[drift]\norder = \"exp\"\n\n[snr]\nnoise_count = 50"
        )
        .unwrap();

        let config = ConfigLoader::with_paths(vec![file.path().to_path_buf()])
            .without_env()
            .load()
            .unwrap();

        assert_eq!(config.temporal.cutoff_hz, 80.0);
        assert_eq!(config.temporal.order, FilterOrder::Explicit(20));
        assert_eq!(config.drift.order, DriftOrder::Exponential);
        assert_eq!(config.snr.noise_count, 50);
    }

    #[test]
    fn test_missing_file() {
        let result = ConfigLoader::with_paths(vec![PathBuf::from("/nonexistent/optimap.toml")])
            .without_env()
            .load();
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let result = ConfigLoader::from_toml_str("[spatial]\nsize = 4");
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));

        let result = ConfigLoader::from_toml_str("[drift]\norder = \"gross\"");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));

        let result = ConfigLoader::from_toml_str("[temporal]\norder = \"gross\"");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_config_error_converts_to_analysis_error() {
        let err: crate::error::AnalysisError = ConfigError::FileNotFound("x.toml".into()).into();
        assert_eq!(err.kind(), crate::error::ErrorKind::Configuration);
        assert!(err.to_string().contains("x.toml"));
    }
}
