//! Error types for archive assembly.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors arising while walking source roots or writing the archive.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// A source root, source file, or output path could not be accessed.
    #[error("I/O error during archive assembly at {path}: {source}")]
    Filesystem {
        /// The path being read or written.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A file name in a source root is not valid UTF-8.
    #[error("file name in {directory} is not valid UTF-8: {name}")]
    NonUtf8Name {
        /// Directory containing the entry.
        directory: Utf8PathBuf,
        /// Lossy rendering of the name.
        name: String,
    },

    /// A directory link points back at one of its own ancestors.
    #[error("directory {path} links back to its ancestor {target}")]
    DirectoryCycle {
        /// The directory reached through the link.
        path: Utf8PathBuf,
        /// The ancestor it resolves to.
        target: Utf8PathBuf,
    },

    /// Two source files map to the same path inside the archive.
    #[error("archive entry {archive_path} is provided by both {first} and {second}")]
    DuplicateEntry {
        /// The contested archive-relative path.
        archive_path: String,
        /// The source that claimed the path first.
        first: Utf8PathBuf,
        /// The source that claimed it again.
        second: Utf8PathBuf,
    },

    /// A source file would overwrite the synthesized version marker.
    #[error("{source_path} collides with the reserved archive entry {archive_path}")]
    ReservedEntry {
        /// The reserved archive-relative path.
        archive_path: String,
        /// The colliding source file.
        source_path: Utf8PathBuf,
    },

    /// The zip writer rejected an entry or could not finalise the archive.
    #[error("failed to write archive {path}: {source}")]
    Zip {
        /// The archive being written.
        path: Utf8PathBuf,
        /// The zip library's error.
        #[source]
        source: zip::result::ZipError,
    },
}
