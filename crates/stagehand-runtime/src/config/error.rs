//! Errors raised while layering configuration.

use std::path::PathBuf;
use thiserror::Error;

/// Failure while loading one configuration layer.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A config file exists but could not be read.
    #[error("failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A config file is not valid TOML for [`StageConfig`](super::StageConfig).
    #[error("failed to parse config file '{path}': {source}")]
    ParseToml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// A `STAGEHAND_*` variable holds a value of the wrong shape.
    #[error("invalid value for environment variable '{name}': {message}")]
    InvalidEnvVar { name: String, message: String },
}

impl ConfigError {
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadFile {
            path: path.into(),
            source,
        }
    }

    pub fn parse_toml(path: impl Into<PathBuf>, source: toml::de::Error) -> Self {
        Self::ParseToml {
            path: path.into(),
            source,
        }
    }

    pub fn invalid_env_var(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidEnvVar {
            name: name.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_var_error_names_variable_and_reason() {
        let err = ConfigError::invalid_env_var("STAGEHAND_OVERLAY", "expected bool");
        assert_eq!(
            err.to_string(),
            "invalid value for environment variable 'STAGEHAND_OVERLAY': expected bool"
        );
    }

    #[test]
    fn read_file_mentions_path() {
        let err = ConfigError::read_file(
            "/etc/stagehand/config.toml",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.to_string().contains("/etc/stagehand/config.toml"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
