//! Semantic wrapper for declared dependencies.
//!
//! A [`Dependency`] is the requirement string handed to the installer, for
//! example `requests` or `boto3==1.4.8`. Exclusion sets are matched against
//! either the full requirement or its bare package name.

use std::fmt;

/// Characters that start a version constraint or environment marker.
const CONSTRAINT_START: &[char] = &['=', '<', '>', '!', '~', ';', '[', ' ', '@'];

/// A declared dependency requirement.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Dependency(String);

impl Dependency {
    /// Create a new dependency.
    #[must_use]
    pub fn new(requirement: impl Into<String>) -> Self {
        Self(requirement.into())
    }

    /// Get the full requirement string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The package name without any version constraint.
    ///
    /// # Examples
    ///
    /// ```
    /// use jobpack_packager::dependency::Dependency;
    ///
    /// assert_eq!(Dependency::from("boto3==1.4.8").name(), "boto3");
    /// assert_eq!(Dependency::from("requests[socks]>=2").name(), "requests");
    /// assert_eq!(Dependency::from("six").name(), "six");
    /// ```
    #[must_use]
    pub fn name(&self) -> &str {
        let trimmed = self.0.trim();
        trimmed
            .split(CONSTRAINT_START)
            .next()
            .unwrap_or(trimmed)
    }

    /// Returns `true` when `exclude` names this dependency.
    ///
    /// Either the full requirement or the bare name may be listed.
    #[must_use]
    pub fn is_excluded_by<S: AsRef<str>>(&self, exclude: &[S]) -> bool {
        exclude.iter().any(|candidate| {
            let candidate = candidate.as_ref().trim();
            candidate == self.0.trim() || candidate == self.name()
        })
    }
}

impl AsRef<str> for Dependency {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Dependency {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for Dependency {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
