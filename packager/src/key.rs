//! Object key naming.
//!
//! Keys follow `{bucket_prefix}{segment}/{file_name}`. The segment is
//! `v{version}` for versioned uploads and the release prefix for promoted
//! copies. Downstream consumers rely on this scheme, so it is kept in one
//! place.

use std::fmt;

/// The middle component of an object key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionSegment<'a> {
    /// `v{version}`, used for uploads.
    Versioned(&'a str),
    /// A stable token such as `latest`, used for releases.
    Release(&'a str),
}

impl fmt::Display for VersionSegment<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Versioned(version) => write!(f, "v{version}"),
            Self::Release(prefix) => f.write_str(prefix),
        }
    }
}

/// A fully composed, case-sensitive object key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectKey(String);

impl ObjectKey {
    /// Composes a key from its parts.
    ///
    /// # Examples
    ///
    /// ```
    /// use jobpack_packager::key::{ObjectKey, VersionSegment};
    ///
    /// let upload = ObjectKey::new("palp/", VersionSegment::Versioned("123"), "palp.zip");
    /// assert_eq!(upload.as_str(), "palp/v123/palp.zip");
    ///
    /// let release = ObjectKey::new("", VersionSegment::Release("latest"), "palp.zip");
    /// assert_eq!(release.as_str(), "latest/palp.zip");
    /// ```
    #[must_use]
    pub fn new(bucket_prefix: &str, segment: VersionSegment<'_>, file_name: &str) -> Self {
        Self(format!("{bucket_prefix}{segment}/{file_name}"))
    }

    /// The key as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ObjectKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
