//! `KEY=VALUE` property overrides.
//!
//! Keys use the dotted names shown in the configuration documentation
//! (`s3.bucket_name`, `teamcity_output`, ...). A property is applied to the
//! raw [`ConfigFile`] before defaults are resolved, so an override always
//! wins over the file and the defaults.

use crate::config::ConfigFile;
use crate::error::{ConfigError, Result};
use camino::Utf8PathBuf;
use std::fmt;
use std::str::FromStr;

/// Every key accepted by [`Property::apply`].
pub const RECOGNISED_KEYS: [&str; 21] = [
    "project.name",
    "project.version",
    "project.dependencies",
    "project.target_dir",
    "project.source_dir",
    "project.scripts_dir",
    "package.subdir",
    "package.main_file",
    "package.dependency_excludes",
    "package.installer",
    "s3.bucket_name",
    "s3.bucket_prefix",
    "s3.file_access_control",
    "s3.release_prefix",
    "s3.server_side_encryption",
    "s3.region",
    "s3.endpoint_url",
    "install_dependencies_index_url",
    "teamcity_output",
    "teamcity_parameter",
    "emr.main-file",
];

/// A single `KEY=VALUE` override.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Property {
    key: String,
    value: String,
}

impl Property {
    /// Creates a property from a key and a value.
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// The dotted property key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The raw property value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Writes this property into `file`.
    ///
    /// List-valued keys (`project.dependencies`,
    /// `package.dependency_excludes`) take comma-separated values.
    /// `emr.main-file` is accepted as an alias of `package.main_file`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownProperty`] for unrecognised keys and
    /// [`ConfigError::InvalidProperty`] when `teamcity_output` is not a
    /// boolean.
    ///
    /// # Examples
    ///
    /// ```
    /// use jobpack::{ConfigFile, Property};
    ///
    /// let mut file = ConfigFile::default();
    /// Property::new("s3.bucket_prefix", "palp/").apply(&mut file)?;
    /// assert_eq!(file.s3.bucket_prefix.as_deref(), Some("palp/"));
    /// # Ok::<(), jobpack::ConfigError>(())
    /// ```
    pub fn apply(&self, file: &mut ConfigFile) -> Result<()> {
        let value = self.value.clone();
        match self.key.as_str() {
            "project.name" => file.project.name = Some(value),
            "project.version" => file.project.version = Some(value),
            "project.dependencies" => file.project.dependencies = split_list(&value),
            "project.target_dir" => file.project.target_dir = Some(Utf8PathBuf::from(value)),
            "project.source_dir" => file.project.source_dir = Some(Utf8PathBuf::from(value)),
            "project.scripts_dir" => file.project.scripts_dir = Some(Utf8PathBuf::from(value)),
            "package.subdir" => file.package.subdir = Some(value),
            "package.main_file" | "emr.main-file" => file.package.main_file = Some(value),
            "package.dependency_excludes" => {
                file.package.dependency_excludes = Some(split_list(&value));
            }
            "package.installer" => file.package.installer = Some(value),
            "s3.bucket_name" => file.s3.bucket_name = Some(value),
            "s3.bucket_prefix" => file.s3.bucket_prefix = Some(value),
            "s3.file_access_control" => file.s3.file_access_control = Some(value),
            "s3.release_prefix" => file.s3.release_prefix = Some(value),
            "s3.server_side_encryption" => file.s3.server_side_encryption = Some(value),
            "s3.region" => file.s3.region = Some(value),
            "s3.endpoint_url" => file.s3.endpoint_url = Some(value),
            "install_dependencies_index_url" => file.install_dependencies_index_url = Some(value),
            "teamcity_output" => file.teamcity_output = self.parse_bool()?,
            "teamcity_parameter" => file.teamcity_parameter = Some(value),
            _ => {
                return Err(ConfigError::UnknownProperty {
                    key: self.key.clone(),
                });
            }
        }
        Ok(())
    }

    fn parse_bool(&self) -> Result<bool> {
        match self.value.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Ok(true),
            "false" | "no" | "0" | "" => Ok(false),
            _ => Err(ConfigError::InvalidProperty {
                key: self.key.clone(),
                value: self.value.clone(),
                reason: "expected true or false".to_owned(),
            }),
        }
    }
}

impl FromStr for Property {
    type Err = ConfigError;

    fn from_str(input: &str) -> Result<Self> {
        let Some((key, value)) = input.split_once('=') else {
            return Err(ConfigError::MalformedProperty {
                input: input.to_owned(),
            });
        };
        let key = key.trim();
        if key.is_empty() {
            return Err(ConfigError::MalformedProperty {
                input: input.to_owned(),
            });
        }
        Ok(Self::new(key, value))
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_owned)
        .collect()
}
