//! Project configuration file model and resolution.
//!
//! `jobpack.toml` is deserialised into [`ConfigFile`], where every setting is
//! optional. Property overrides are applied to that raw model, and
//! [`ConfigFile::resolve`] then fills in defaults and anchors relative paths
//! at the configuration file's directory. The resulting [`ProjectConfig`] is
//! never mutated afterwards.

use crate::error::{ConfigError, Result};
use crate::properties::Property;
use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use serde::Deserialize;
use std::fs;

/// Default access control applied to uploaded and released objects.
pub const DEFAULT_FILE_ACCESS_CONTROL: &str = "bucket-owner-full-control";
/// Default version segment for the promoted copy.
pub const DEFAULT_RELEASE_PREFIX: &str = "latest";
/// Default entry script shipped next to the archive.
pub const DEFAULT_MAIN_FILE: &str = "main.py";
/// Default installer program.
pub const DEFAULT_INSTALLER: &str = "pip";
/// Default store region.
pub const DEFAULT_REGION: &str = "us-east-1";
/// Dependencies provided by the cluster runtime and never bundled.
pub const DEFAULT_DEPENDENCY_EXCLUDES: [&str; 2] = ["boto", "boto3"];

const DEFAULT_TARGET_DIR: &str = "target";
const DEFAULT_SOURCE_DIR: &str = "src/main/python";
const DEFAULT_SCRIPTS_DIR: &str = "src/main/scripts";

/// Raw contents of `jobpack.toml`.
///
/// Every field is optional so that property overrides can supply values the
/// file leaves out.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    /// Custom package index passed to the installer.
    pub install_dependencies_index_url: Option<String>,
    /// Whether the TeamCity notification line is emitted.
    pub teamcity_output: bool,
    /// Name of the TeamCity parameter that receives the uploaded key.
    pub teamcity_parameter: Option<String>,
    /// `[project]` table.
    pub project: ProjectSection,
    /// `[package]` table.
    pub package: PackageSection,
    /// `[s3]` table.
    pub s3: S3Section,
}

/// The `[project]` table.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectSection {
    /// Project name; also the archive's file stem.
    pub name: Option<String>,
    /// Project version stamped into keys and the `VERSION` entry.
    pub version: Option<String>,
    /// Declared runtime dependencies, in installation order.
    pub dependencies: Vec<String>,
    /// Build output directory.
    pub target_dir: Option<Utf8PathBuf>,
    /// Main source tree.
    pub source_dir: Option<Utf8PathBuf>,
    /// Scripts tree merged into the archive when present.
    pub scripts_dir: Option<Utf8PathBuf>,
}

/// The `[package]` table.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PackageSection {
    /// Name of the version-stamped output directory, without the version.
    pub subdir: Option<String>,
    /// Entry script shipped beside the archive; empty disables it.
    pub main_file: Option<String>,
    /// Dependency names that are never installed into the bundle.
    pub dependency_excludes: Option<Vec<String>>,
    /// Installer program used to materialize dependencies.
    pub installer: Option<String>,
}

/// The `[s3]` table.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct S3Section {
    /// Target bucket. Mandatory for upload and release.
    pub bucket_name: Option<String>,
    /// Prefix prepended to every object key.
    pub bucket_prefix: Option<String>,
    /// Canned ACL for uploaded and released objects.
    pub file_access_control: Option<String>,
    /// Version segment used for the promoted copy.
    pub release_prefix: Option<String>,
    /// Server-side encryption mode applied on upload.
    pub server_side_encryption: Option<String>,
    /// Store region used for request signing.
    pub region: Option<String>,
    /// Store endpoint; defaults to the regional S3 endpoint.
    pub endpoint_url: Option<String>,
}

impl ConfigFile {
    /// Reads and parses a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] when the file cannot be read and
    /// [`ConfigError::Parse`] when it is not valid for the schema.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use camino::Utf8Path;
    /// use jobpack::ConfigFile;
    ///
    /// let file = ConfigFile::load(Utf8Path::new("jobpack.toml"))?;
    /// # Ok::<(), jobpack::ConfigError>(())
    /// ```
    pub fn load(path: &Utf8Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })
    }

    /// Applies a list of property overrides in order.
    ///
    /// # Errors
    ///
    /// Returns the first error reported by [`Property::apply`].
    pub fn apply_properties(&mut self, properties: &[Property]) -> Result<()> {
        for property in properties {
            debug!("Overriding property {}", property.key());
            property.apply(self)?;
        }
        Ok(())
    }

    /// Fills in defaults and produces the immutable project configuration.
    ///
    /// Relative directories are resolved against `base_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingProperty`] when the project name or
    /// version is absent or blank.
    ///
    /// # Examples
    ///
    /// ```
    /// use camino::Utf8Path;
    /// use jobpack::ConfigFile;
    ///
    /// let file: ConfigFile = toml::from_str(
    ///     "[project]\nname = \"palp\"\nversion = \"123\"\n",
    /// ).expect("valid configuration");
    /// let config = file.resolve(Utf8Path::new("/work")).expect("resolves");
    ///
    /// assert_eq!(config.store.release_prefix, "latest");
    /// assert_eq!(config.layout.target_dir, "/work/target");
    /// ```
    pub fn resolve(self, base_dir: &Utf8Path) -> Result<ProjectConfig> {
        let name = required(self.project.name, "project.name")?;
        let version = required(self.project.version, "project.version")?;

        let layout = ProjectLayout {
            target_dir: anchor(base_dir, self.project.target_dir, DEFAULT_TARGET_DIR),
            source_dir: anchor(base_dir, self.project.source_dir, DEFAULT_SOURCE_DIR),
            scripts_dir: anchor(base_dir, self.project.scripts_dir, DEFAULT_SCRIPTS_DIR),
        };

        let package = PackageSettings {
            subdir: self.package.subdir.unwrap_or_else(|| name.clone()),
            main_file: non_blank(
                self.package
                    .main_file
                    .or_else(|| Some(DEFAULT_MAIN_FILE.to_owned())),
            ),
            dependency_excludes: self.package.dependency_excludes.unwrap_or_else(|| {
                DEFAULT_DEPENDENCY_EXCLUDES
                    .iter()
                    .map(|name| (*name).to_owned())
                    .collect()
            }),
            installer: self
                .package
                .installer
                .unwrap_or_else(|| DEFAULT_INSTALLER.to_owned()),
            index_url: non_blank(self.install_dependencies_index_url),
        };

        let store = StoreSettings {
            bucket_name: non_blank(self.s3.bucket_name),
            bucket_prefix: self.s3.bucket_prefix.unwrap_or_default(),
            file_access_control: self
                .s3
                .file_access_control
                .unwrap_or_else(|| DEFAULT_FILE_ACCESS_CONTROL.to_owned()),
            release_prefix: self
                .s3
                .release_prefix
                .unwrap_or_else(|| DEFAULT_RELEASE_PREFIX.to_owned()),
            server_side_encryption: non_blank(self.s3.server_side_encryption),
            region: self
                .s3
                .region
                .unwrap_or_else(|| DEFAULT_REGION.to_owned()),
            endpoint_url: non_blank(self.s3.endpoint_url),
        };

        let notification = NotificationSettings {
            enabled: self.teamcity_output,
            parameter: non_blank(self.teamcity_parameter),
        };

        Ok(ProjectConfig {
            name,
            version,
            dependencies: self.project.dependencies,
            layout,
            package,
            store,
            notification,
        })
    }
}

/// Resolved, immutable project configuration.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProjectConfig {
    /// Project name.
    pub name: String,
    /// Project version.
    pub version: String,
    /// Declared runtime dependencies, in declaration order.
    pub dependencies: Vec<String>,
    /// Source and output directories.
    pub layout: ProjectLayout,
    /// Packaging settings.
    pub package: PackageSettings,
    /// Object store settings.
    pub store: StoreSettings,
    /// CI notification settings.
    pub notification: NotificationSettings,
}

impl ProjectConfig {
    /// Loads `path`, applies `properties`, and resolves the result.
    ///
    /// Relative directories are anchored at the configuration file's parent
    /// directory.
    ///
    /// # Errors
    ///
    /// Returns any loading, override, or resolution error.
    pub fn load(path: &Utf8Path, properties: &[Property]) -> Result<Self> {
        let mut file = ConfigFile::load(path)?;
        file.apply_properties(properties)?;
        let base_dir = path.parent().unwrap_or_else(|| Utf8Path::new("."));
        file.resolve(base_dir)
    }
}

/// Directories the pipeline reads from and writes to.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProjectLayout {
    /// Build output directory.
    pub target_dir: Utf8PathBuf,
    /// Main source tree.
    pub source_dir: Utf8PathBuf,
    /// Scripts tree.
    pub scripts_dir: Utf8PathBuf,
}

/// Settings for dependency materialization and archive assembly.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PackageSettings {
    /// Output directory name without the version suffix.
    pub subdir: String,
    /// Entry script shipped beside the archive.
    pub main_file: Option<String>,
    /// Dependency names never installed into the bundle.
    pub dependency_excludes: Vec<String>,
    /// Installer program.
    pub installer: String,
    /// Custom package index.
    pub index_url: Option<String>,
}

/// Settings for the artifact store.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StoreSettings {
    /// Target bucket, if configured.
    pub bucket_name: Option<String>,
    /// Prefix prepended to every key.
    pub bucket_prefix: String,
    /// Canned ACL value, validated before use.
    pub file_access_control: String,
    /// Version segment of released keys.
    pub release_prefix: String,
    /// Server-side encryption value, validated before use.
    pub server_side_encryption: Option<String>,
    /// Region used for request signing.
    pub region: String,
    /// Endpoint override.
    pub endpoint_url: Option<String>,
}

impl StoreSettings {
    /// Returns the bucket name or fails because it is mandatory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingProperty`] for `s3.bucket_name`.
    pub fn require_bucket_name(&self) -> Result<&str> {
        self.bucket_name
            .as_deref()
            .ok_or(ConfigError::MissingProperty {
                key: "s3.bucket_name",
            })
    }
}

/// Settings for the CI notification line.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct NotificationSettings {
    /// Whether output is enabled.
    pub enabled: bool,
    /// Parameter name receiving the uploaded key.
    pub parameter: Option<String>,
}

impl NotificationSettings {
    /// Returns the parameter name when notifications should be emitted.
    #[must_use]
    pub fn active_parameter(&self) -> Option<&str> {
        if self.enabled {
            self.parameter.as_deref()
        } else {
            None
        }
    }
}

fn required(value: Option<String>, key: &'static str) -> Result<String> {
    non_blank(value).ok_or(ConfigError::MissingProperty { key })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|candidate| !candidate.trim().is_empty())
}

fn anchor(base_dir: &Utf8Path, value: Option<Utf8PathBuf>, default: &str) -> Utf8PathBuf {
    let path = value.unwrap_or_else(|| Utf8PathBuf::from(default));
    if path.is_absolute() {
        path
    } else {
        base_dir.join(path)
    }
}
