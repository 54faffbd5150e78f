//! Shared fixtures for the packager behaviour tests.

use camino::{Utf8Path, Utf8PathBuf};
use jobpack::{ConfigFile, ProjectConfig, Property};
use std::fs;
use tempfile::TempDir;

/// A throwaway project laid out with the default source directories.
pub struct Project {
    _dir: TempDir,
    root: Utf8PathBuf,
    properties: Vec<Property>,
}

impl Project {
    /// Creates a project with a main script, one module, and one script.
    pub fn new(name: &str, version: &str) -> Self {
        let dir = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::try_from(dir.path().to_path_buf()).expect("utf-8 temp dir");
        let project = Self {
            _dir: dir,
            root,
            properties: vec![
                Property::new("project.name", name),
                Property::new("project.version", version),
            ],
        };
        project.write("src/main/python/main.py", "print('job')\n");
        project.write("src/main/python/pkg/mod.py", "VALUE = 1\n");
        project.write("src/main/scripts/run.sh", "#!/bin/sh\n");
        project
    }

    /// The project directory.
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Writes `contents` to `relative`, creating parent directories.
    pub fn write(&self, relative: &str, contents: &str) {
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent");
        }
        fs::write(path, contents).expect("write file");
    }

    /// Records a `KEY=VALUE` override applied by [`Project::config`].
    pub fn set(&mut self, key: &str, value: &str) {
        self.properties.push(Property::new(key, value));
    }

    /// Resolves the configuration from the recorded overrides.
    pub fn config(&self) -> ProjectConfig {
        let mut file = ConfigFile::default();
        file.apply_properties(&self.properties)
            .expect("valid overrides");
        file.resolve(&self.root).expect("resolves")
    }

    /// Installer arguments for `dependency` under the default layout.
    pub fn install_args(&self, dependency: &str) -> Vec<String> {
        vec![
            "install".to_owned(),
            "--target".to_owned(),
            self.root.join("target/dependencies").to_string(),
            dependency.to_owned(),
        ]
    }
}
