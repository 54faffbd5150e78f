//! Error types for configuration loading and property overrides.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors raised while loading, overriding, or resolving project
/// configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration at {path}")]
    Read {
        /// Path of the configuration file.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for the expected schema.
    #[error("invalid configuration at {path}: {source}")]
    Parse {
        /// Path of the configuration file.
        path: Utf8PathBuf,
        /// The TOML parser's error.
        #[source]
        source: toml::de::Error,
    },

    /// A property override was not of the form `KEY=VALUE`.
    #[error("malformed property override {input:?}; expected KEY=VALUE")]
    MalformedProperty {
        /// The raw override text.
        input: String,
    },

    /// A property override named a key jobpack does not recognise.
    #[error("unknown property {key}")]
    UnknownProperty {
        /// The unrecognised key.
        key: String,
    },

    /// A property value could not be interpreted for its key.
    #[error("invalid value {value:?} for property {key}: {reason}")]
    InvalidProperty {
        /// The property key.
        key: String,
        /// The offending value.
        value: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// A mandatory property has no value.
    #[error("missing mandatory property {key}")]
    MissingProperty {
        /// The property key.
        key: &'static str,
    },
}

/// Result type alias using [`ConfigError`].
pub type Result<T> = std::result::Result<T, ConfigError>;
