//! Artifact bundles on local disk.
//!
//! A bundle is the archive plus the sibling files shipped next to it, all
//! stored under `{target_dir}/{subdir}-{version}/`. [`BundleLayout`] derives
//! the expected names from configuration; [`ArtifactBundle`] is a bundle
//! that exists.

use crate::error::{PackagerError, Result};
use camino::{Utf8Path, Utf8PathBuf};
use jobpack::ProjectConfig;

/// Expected on-disk shape of the bundle for one project version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleLayout {
    directory: Utf8PathBuf,
    archive_name: String,
    sibling_names: Vec<String>,
}

impl BundleLayout {
    /// Creates a layout from explicit parts.
    #[must_use]
    pub fn new(
        directory: impl Into<Utf8PathBuf>,
        archive_name: impl Into<String>,
        sibling_names: Vec<String>,
    ) -> Self {
        Self {
            directory: directory.into(),
            archive_name: archive_name.into(),
            sibling_names,
        }
    }

    /// Derives the layout from resolved configuration.
    ///
    /// # Examples
    ///
    /// ```
    /// use jobpack::ConfigFile;
    /// use jobpack_packager::bundle::BundleLayout;
    /// use camino::Utf8Path;
    ///
    /// let file: ConfigFile =
    ///     toml::from_str("[project]\nname = \"palp\"\nversion = \"123\"\n")?;
    /// let config = file.resolve(Utf8Path::new("/work"))?;
    /// let layout = BundleLayout::for_project(&config);
    ///
    /// assert_eq!(layout.directory(), "/work/target/palp-123");
    /// assert_eq!(layout.file_names(), vec!["palp.zip", "main.py"]);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    #[must_use]
    pub fn for_project(config: &ProjectConfig) -> Self {
        let directory = config
            .layout
            .target_dir
            .join(format!("{}-{}", config.package.subdir, config.version));
        let sibling_names = config
            .package
            .main_file
            .iter()
            .filter_map(|main| Utf8Path::new(main).file_name())
            .map(str::to_owned)
            .collect();
        Self::new(directory, format!("{}.zip", config.name), sibling_names)
    }

    /// The version-stamped output directory.
    #[must_use]
    pub fn directory(&self) -> &Utf8Path {
        &self.directory
    }

    /// File name of the archive.
    #[must_use]
    pub fn archive_name(&self) -> &str {
        &self.archive_name
    }

    /// Full path of the archive.
    #[must_use]
    pub fn archive_path(&self) -> Utf8PathBuf {
        self.directory.join(&self.archive_name)
    }

    /// Every file name in the bundle, archive first.
    #[must_use]
    pub fn file_names(&self) -> Vec<&str> {
        std::iter::once(self.archive_name.as_str())
            .chain(self.sibling_names.iter().map(String::as_str))
            .collect()
    }

    /// Finds the packaged bundle on disk.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::MissingArtifact`] for the first expected file
    /// that is not a regular file.
    pub fn locate(&self) -> Result<ArtifactBundle> {
        let archive = existing(self.archive_path())?;
        let siblings = self
            .sibling_names
            .iter()
            .map(|name| existing(self.directory.join(name)))
            .collect::<Result<Vec<_>>>()?;
        Ok(ArtifactBundle::new(self.directory.clone(), archive, siblings))
    }
}

fn existing(path: Utf8PathBuf) -> Result<Utf8PathBuf> {
    if path.is_file() {
        Ok(path)
    } else {
        Err(PackagerError::MissingArtifact { path })
    }
}

/// The files produced by packaging one version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactBundle {
    directory: Utf8PathBuf,
    archive: Utf8PathBuf,
    siblings: Vec<Utf8PathBuf>,
}

impl ArtifactBundle {
    /// Wraps files that already exist under `directory`.
    #[must_use]
    pub fn new(directory: Utf8PathBuf, archive: Utf8PathBuf, siblings: Vec<Utf8PathBuf>) -> Self {
        Self {
            directory,
            archive,
            siblings,
        }
    }

    /// The directory holding the bundle.
    #[must_use]
    pub fn directory(&self) -> &Utf8Path {
        &self.directory
    }

    /// The archive.
    #[must_use]
    pub fn archive(&self) -> &Utf8Path {
        &self.archive
    }

    /// Sibling files, in configuration order.
    #[must_use]
    pub fn siblings(&self) -> &[Utf8PathBuf] {
        &self.siblings
    }

    /// Every file in the bundle, archive first.
    pub fn files(&self) -> impl Iterator<Item = &Utf8Path> {
        std::iter::once(self.archive.as_path()).chain(self.siblings.iter().map(Utf8PathBuf::as_path))
    }
}
