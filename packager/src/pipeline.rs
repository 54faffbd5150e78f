//! Package, upload, publish, and release orchestration.
//!
//! Each step takes the resolved configuration and its collaborators
//! explicitly. Store parameters are validated before packaging or reading
//! any bundle file, so a misconfigured upload never leaves side effects.

use crate::archive::{AssembleParams, SourceRoot, assemble};
use crate::bundle::{ArtifactBundle, BundleLayout};
use crate::dependency::Dependency;
use crate::deps::{CommandExecutor, MaterializeParams, MaterializeReport, materialize};
use crate::error::{PackagerError, Result};
use crate::notify::Notifier;
use crate::release::{ReleaseCoordinator, ReleaseReport, UploadReport};
use crate::store::ObjectStore;
use camino::{Utf8Path, Utf8PathBuf};
use jobpack::ProjectConfig;
use log::{debug, info};
use std::collections::BTreeSet;
use std::fs;
use std::io::{self, Write};

/// Name of the staging directory for installed dependencies.
pub const DEPENDENCIES_DIR: &str = "dependencies";

/// Result of [`package`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageOutcome {
    /// The bundle written to disk.
    pub bundle: ArtifactBundle,
    /// What happened to each declared dependency.
    pub dependencies: MaterializeReport,
}

/// Installs dependencies and assembles the bundle for `config`.
///
/// The dependency staging directory is emptied first. Dependencies, the
/// source tree, and the scripts tree are merged in that order; the main
/// file is excluded from the trees and shipped next to the archive.
///
/// # Errors
///
/// Returns [`PackagerError::DependencyInstall`] for the first failing
/// installation, [`PackagerError::Filesystem`] when the source tree or main
/// file is missing or staging cannot be prepared, and
/// [`PackagerError::Archive`] when assembly fails.
pub fn package(config: &ProjectConfig, executor: &dyn CommandExecutor) -> Result<PackageOutcome> {
    let layout = BundleLayout::for_project(config);
    let source_dir = &config.layout.source_dir;
    require_dir(source_dir)?;
    let main_file = main_file_path(config)?;

    let dependencies_dir = config.layout.target_dir.join(DEPENDENCIES_DIR);
    reset_dir(&dependencies_dir)?;

    let declared: Vec<Dependency> = config
        .dependencies
        .iter()
        .map(|requirement| Dependency::new(requirement.as_str()))
        .collect();
    info!(
        "Installing {} declared dependencies into {dependencies_dir}",
        declared.len()
    );
    let report = materialize(
        executor,
        &MaterializeParams {
            installer: &config.package.installer,
            dependencies: &declared,
            exclude: &config.package.dependency_excludes,
            target_dir: &dependencies_dir,
            index_url: config.package.index_url.as_deref(),
        },
    )?;

    let roots = source_roots(config, &dependencies_dir, main_file.as_deref());
    let siblings: Vec<Utf8PathBuf> = main_file.into_iter().collect();
    info!("Assembling {}", layout.archive_path());
    let bundle = assemble(&AssembleParams {
        roots: &roots,
        exclude_files: &BTreeSet::new(),
        output_dir: layout.directory(),
        archive_name: layout.archive_name(),
        version: &config.version,
        siblings: &siblings,
    })?;

    Ok(PackageOutcome {
        bundle,
        dependencies: report,
    })
}

/// Uploads the packaged bundle for `config`.
///
/// # Errors
///
/// Returns configuration errors before reading any file, then
/// [`PackagerError::MissingArtifact`] when the bundle has not been packaged,
/// and the errors of [`ReleaseCoordinator::upload`].
pub fn upload<S, W>(
    config: &ProjectConfig,
    store: &S,
    notifier: &mut Notifier<W>,
) -> Result<UploadReport>
where
    S: ObjectStore + ?Sized,
    W: Write,
{
    let coordinator = ReleaseCoordinator::new(store, &config.store, &config.version)?;
    let bundle = BundleLayout::for_project(config).locate()?;
    coordinator.upload(&bundle, notifier)
}

/// Packages and then uploads, validating store parameters first.
///
/// # Errors
///
/// Returns the errors of [`package`] and [`ReleaseCoordinator::upload`].
pub fn publish<S, W>(
    config: &ProjectConfig,
    executor: &dyn CommandExecutor,
    store: &S,
    notifier: &mut Notifier<W>,
) -> Result<(PackageOutcome, UploadReport)>
where
    S: ObjectStore + ?Sized,
    W: Write,
{
    let coordinator = ReleaseCoordinator::new(store, &config.store, &config.version)?;
    let outcome = package(config, executor)?;
    let report = coordinator.upload(&outcome.bundle, notifier)?;
    Ok((outcome, report))
}

/// Promotes the uploaded version of every bundle file to the release prefix.
///
/// # Errors
///
/// Returns configuration errors before any store call and
/// [`PackagerError::ReleaseIncomplete`] when some copies fail.
pub fn release<S: ObjectStore + ?Sized>(
    config: &ProjectConfig,
    store: &S,
) -> Result<ReleaseReport> {
    let coordinator = ReleaseCoordinator::new(store, &config.store, &config.version)?;
    let layout = BundleLayout::for_project(config);
    coordinator.release(&layout.file_names())
}

fn source_roots(
    config: &ProjectConfig,
    dependencies_dir: &Utf8Path,
    main_file: Option<&Utf8Path>,
) -> Vec<SourceRoot> {
    let main_name: Vec<&str> = main_file.and_then(Utf8Path::file_name).into_iter().collect();
    let mut roots = Vec::new();
    if dependencies_dir.is_dir() {
        roots.push(SourceRoot::new(dependencies_dir));
    }
    roots.push(SourceRoot::new(&config.layout.source_dir).excluding(main_name.iter().copied()));
    if config.layout.scripts_dir.is_dir() {
        roots.push(SourceRoot::new(&config.layout.scripts_dir).excluding(main_name.iter().copied()));
    } else {
        debug!("No scripts directory at {}", config.layout.scripts_dir);
    }
    roots
}

fn main_file_path(config: &ProjectConfig) -> Result<Option<Utf8PathBuf>> {
    let Some(main_file) = &config.package.main_file else {
        return Ok(None);
    };
    let path = config.layout.source_dir.join(main_file);
    if path.is_file() {
        Ok(Some(path))
    } else {
        Err(not_found(path))
    }
}

fn require_dir(path: &Utf8Path) -> Result<()> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(not_found(path.to_owned()))
    }
}

fn not_found(path: Utf8PathBuf) -> PackagerError {
    PackagerError::Filesystem {
        path,
        source: io::Error::from(io::ErrorKind::NotFound),
    }
}

fn reset_dir(path: &Utf8Path) -> Result<()> {
    let to_filesystem_error = |source| PackagerError::Filesystem {
        path: path.to_owned(),
        source,
    };
    match fs::remove_dir_all(path) {
        Ok(()) => debug!("Removed stale {path}"),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => return Err(to_filesystem_error(err)),
    }
    fs::create_dir_all(path).map_err(to_filesystem_error)
}
