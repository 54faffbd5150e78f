//! Archive writing and sibling copying.

use super::entries::{SourceRoot, entries};
use super::error::ArchiveError;
use super::tree::{FsTree, SourceTree};
use crate::bundle::ArtifactBundle;
use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use std::collections::{BTreeMap, BTreeSet, btree_map};
use std::fs;
use std::io::{self, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

/// Archive path of the synthesized version marker.
pub const VERSION_ENTRY: &str = "VERSION";

/// Inputs for [`assemble`].
#[derive(Debug, Clone, Copy)]
pub struct AssembleParams<'a> {
    /// Roots merged into the archive, in order.
    pub roots: &'a [SourceRoot],
    /// File names skipped in every root.
    pub exclude_files: &'a BTreeSet<String>,
    /// Version-stamped output directory; created when missing.
    pub output_dir: &'a Utf8Path,
    /// File name of the archive inside `output_dir`.
    pub archive_name: &'a str,
    /// Content of the `VERSION` entry.
    pub version: &'a str,
    /// Files copied next to the archive.
    pub siblings: &'a [Utf8PathBuf],
}

/// Assembles an archive from roots on the real filesystem.
///
/// # Errors
///
/// See [`assemble_from`].
pub fn assemble(params: &AssembleParams<'_>) -> Result<ArtifactBundle, ArchiveError> {
    assemble_from(&FsTree, params)
}

/// Assembles an archive reading sources from `tree`.
///
/// Entries are written in archive-path order with a fixed timestamp, so the
/// same inputs always give the same bytes. The `VERSION` entry is written
/// last.
///
/// # Errors
///
/// Returns [`ArchiveError::Filesystem`] when a root or sibling cannot be read
/// or the output cannot be written, [`ArchiveError::DuplicateEntry`] when two
/// sources map to one archive path, and [`ArchiveError::ReservedEntry`] when
/// a source would shadow `VERSION`.
pub fn assemble_from<T: SourceTree + ?Sized>(
    tree: &T,
    params: &AssembleParams<'_>,
) -> Result<ArtifactBundle, ArchiveError> {
    let plan = plan_entries(tree, params.roots, params.exclude_files)?;

    fs::create_dir_all(params.output_dir).map_err(|source| ArchiveError::Filesystem {
        path: params.output_dir.to_owned(),
        source,
    })?;

    let archive = params.output_dir.join(params.archive_name);
    write_archive(tree, &archive, &plan, params.version)?;
    debug!("Wrote {} entries to {archive}", plan.len() + 1);

    let siblings = params
        .siblings
        .iter()
        .map(|sibling| copy_sibling(tree, sibling, params.output_dir))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ArtifactBundle::new(
        params.output_dir.to_owned(),
        archive,
        siblings,
    ))
}

fn plan_entries<T: SourceTree + ?Sized>(
    tree: &T,
    roots: &[SourceRoot],
    exclude_files: &BTreeSet<String>,
) -> Result<BTreeMap<String, Utf8PathBuf>, ArchiveError> {
    let mut plan = BTreeMap::new();
    for root in roots {
        debug!("Adding {} to archive", root.path);
        for entry in entries(tree, root, exclude_files) {
            let entry = entry?;
            if entry.archive_path == VERSION_ENTRY {
                return Err(ArchiveError::ReservedEntry {
                    archive_path: entry.archive_path,
                    source_path: entry.source,
                });
            }
            match plan.entry(entry.archive_path) {
                btree_map::Entry::Vacant(slot) => {
                    slot.insert(entry.source);
                }
                btree_map::Entry::Occupied(slot) => {
                    return Err(ArchiveError::DuplicateEntry {
                        archive_path: slot.key().clone(),
                        first: slot.get().clone(),
                        second: entry.source,
                    });
                }
            }
        }
    }
    Ok(plan)
}

fn write_archive<T: SourceTree + ?Sized>(
    tree: &T,
    archive: &Utf8Path,
    plan: &BTreeMap<String, Utf8PathBuf>,
    version: &str,
) -> Result<(), ArchiveError> {
    let zip_error = |source| ArchiveError::Zip {
        path: archive.to_owned(),
        source,
    };
    let file = fs::File::create(archive).map_err(io_error(archive))?;
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default())
        .unix_permissions(0o644);

    for (archive_path, source) in plan {
        writer
            .start_file(archive_path.as_str(), options)
            .map_err(zip_error)?;
        let mut reader = tree.open(source)?;
        io::copy(&mut reader, &mut writer).map_err(io_error(source))?;
    }

    writer.start_file(VERSION_ENTRY, options).map_err(zip_error)?;
    writer
        .write_all(version.as_bytes())
        .map_err(io_error(archive))?;
    writer.finish().map_err(zip_error)?;
    Ok(())
}

fn io_error(path: &Utf8Path) -> impl FnOnce(io::Error) -> ArchiveError + '_ {
    move |source| ArchiveError::Filesystem {
        path: path.to_owned(),
        source,
    }
}

fn copy_sibling<T: SourceTree + ?Sized>(
    tree: &T,
    sibling: &Utf8Path,
    output_dir: &Utf8Path,
) -> Result<Utf8PathBuf, ArchiveError> {
    let Some(name) = sibling.file_name() else {
        return Err(ArchiveError::Filesystem {
            path: sibling.to_owned(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "sibling has no file name"),
        });
    };
    let destination = output_dir.join(name);
    let mut reader = tree.open(sibling)?;
    let mut file = fs::File::create(&destination).map_err(io_error(&destination))?;
    io::copy(&mut reader, &mut file).map_err(io_error(&destination))?;
    debug!("Copied {sibling} to {destination}");
    Ok(destination)
}
