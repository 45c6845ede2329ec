//! Server error types.

use std::path::PathBuf;

use holdgate_core::ConfigError;
use thiserror::Error;

/// Errors loading or interpreting the settings file.
///
/// Missing keys are never errors; they fall back to defaults. These are
/// present-but-broken values with no safe fallback.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// Settings file could not be read
    #[error("cannot read {}: {source}", path.display())]
    Io {
        /// File that was requested
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// File is not valid TOML or has unknown or mistyped keys
    #[error("invalid settings: {0}")]
    Parse(#[from] toml::de::Error),

    /// Values parsed but violate a gate invariant
    #[error("invalid settings: {0}")]
    Invalid(#[from] ConfigError),
}

/// Errors loading the status font.
#[derive(Error, Debug)]
pub enum FontError {
    /// Font file could not be read
    #[error("cannot read font {}: {source}", path.display())]
    Io {
        /// Font file that was requested
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// Font data could not be parsed
    #[error("cannot parse font: {0}")]
    Parse(&'static str),
}

/// Top-level errors of the `holdgate` binary.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Settings could not be loaded
    #[error(transparent)]
    Settings(#[from] SettingsError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_error_display() {
        let err = SettingsError::Invalid(ConfigError::ZeroPort);
        assert_eq!(err.to_string(), "invalid settings: target port must be in 1..=65535");

        let err = SettingsError::Io {
            path: PathBuf::from("/etc/holdgate.toml"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert!(err.to_string().starts_with("cannot read /etc/holdgate.toml: "));
    }

    #[test]
    fn server_error_is_transparent_for_settings() {
        let err = ServerError::from(SettingsError::Invalid(ConfigError::EmptySecret));
        assert_eq!(err.to_string(), "invalid settings: shared secret is empty");
    }
}
