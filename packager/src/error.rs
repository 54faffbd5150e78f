//! Error types for the jobpack packager.
//!
//! Variants fall into four groups: configuration problems detected before
//! any side effect, dependency installation failures, filesystem failures
//! carrying the offending path, and object store failures carrying the
//! offending key.

use crate::archive::ArchiveError;
use crate::dependency::Dependency;
use crate::store::StoreError;
use camino::Utf8PathBuf;
use jobpack::ConfigError;
use thiserror::Error;

/// Errors that can occur while packaging, uploading, or releasing.
#[derive(Debug, Error)]
pub enum PackagerError {
    /// A configuration value is missing or malformed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An ACL parameter holds a value outside the permissible set.
    #[error("invalid value {value:?} for {parameter}; expected one of: {expected}")]
    InvalidAcl {
        /// Name of the configuration parameter.
        parameter: String,
        /// The rejected value.
        value: String,
        /// Comma-separated permissible values.
        expected: String,
    },

    /// A server-side encryption parameter holds an unrecognised mode.
    #[error("invalid value {value:?} for {parameter}; expected one of: {expected}")]
    InvalidServerSideEncryption {
        /// Name of the configuration parameter.
        parameter: String,
        /// The rejected value.
        value: String,
        /// Comma-separated recognised modes.
        expected: String,
    },

    /// A required store credential is absent from the environment.
    #[error("missing store credentials: {variable} is not set")]
    MissingCredentials {
        /// The environment variable that must be set.
        variable: &'static str,
    },

    /// The installer exited unsuccessfully for a dependency.
    #[error("command `{command}` failed to install dependency {dependency}: {reason}")]
    DependencyInstall {
        /// The dependency being installed.
        dependency: Dependency,
        /// The full installer command line.
        command: String,
        /// Exit status and captured stderr, or the spawn failure.
        reason: String,
    },

    /// A filesystem operation failed.
    #[error("filesystem error at {path}: {source}")]
    Filesystem {
        /// The path being read or written.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A previously packaged artifact is not on disk.
    #[error("artifact {path} not found; run `jobpack package` first")]
    MissingArtifact {
        /// The expected artifact path.
        path: Utf8PathBuf,
    },

    /// Archive assembly failed.
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    /// An object store call failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// At least one file could not be promoted during a release.
    #[error(
        "release incomplete: {failed} of {total} object(s) failed: {}",
        summarise(.failures)
    )]
    ReleaseIncomplete {
        /// Number of objects attempted.
        total: usize,
        /// Number of objects that failed.
        failed: usize,
        /// The individual failures, in bundle order.
        failures: Vec<StoreError>,
    },

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Test stub received an unexpected or mismatched invocation.
    #[cfg(any(test, feature = "test-support"))]
    #[error("stub mismatch: {message}")]
    StubMismatch {
        /// Description of what was expected versus what was received.
        message: String,
    },
}

fn summarise(failures: &[StoreError]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type alias using [`PackagerError`].
pub type Result<T> = std::result::Result<T, PackagerError>;
