//! File tree abstraction used by archive traversal.
//!
//! [`SourceTree`] is the seam between traversal and the filesystem:
//! production code walks the real disk through [`FsTree`], while tests
//! inject a virtual tree (`MemoryTree`) so traversal and archive writing
//! can be exercised without touching the disk.

use super::error::ArchiveError;
use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use std::fs;
use std::io::{self, Read};

/// Kind of a node in a source tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// A regular file (symlinks are followed).
    File,
    /// A directory (symlinks are followed).
    Directory,
    /// Anything else: sockets, devices, dangling or looping links. Never
    /// archived.
    Other,
}

/// A single child of a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    /// The child's file name.
    pub name: String,
    /// What the child is.
    pub kind: NodeKind,
}

/// Read access to a tree of files.
pub trait SourceTree {
    /// Lists the children of `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Filesystem`] when `dir` cannot be read.
    fn list(&self, dir: &Utf8Path) -> Result<Vec<TreeNode>, ArchiveError>;

    /// Opens `file` for reading.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Filesystem`] when `file` cannot be opened.
    fn open(&self, file: &Utf8Path) -> Result<Box<dyn Read + '_>, ArchiveError>;

    /// Resolves `dir` to a path that is identical for every route to the
    /// same directory. Used to detect link cycles.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Filesystem`] when `dir` cannot be resolved.
    fn canonical(&self, dir: &Utf8Path) -> Result<Utf8PathBuf, ArchiveError> {
        Ok(dir.to_owned())
    }
}

/// The real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsTree;

impl SourceTree for FsTree {
    fn list(&self, dir: &Utf8Path) -> Result<Vec<TreeNode>, ArchiveError> {
        let read_dir = fs::read_dir(dir).map_err(|source| ArchiveError::Filesystem {
            path: dir.to_owned(),
            source,
        })?;

        let mut nodes = Vec::new();
        for entry in read_dir {
            let entry = entry.map_err(|source| ArchiveError::Filesystem {
                path: dir.to_owned(),
                source,
            })?;
            let name = entry
                .file_name()
                .into_string()
                .map_err(|raw| ArchiveError::NonUtf8Name {
                    directory: dir.to_owned(),
                    name: raw.to_string_lossy().into_owned(),
                })?;
            let kind = node_kind(&entry).map_err(|source| ArchiveError::Filesystem {
                path: dir.join(&name),
                source,
            })?;
            nodes.push(TreeNode { name, kind });
        }
        nodes.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(nodes)
    }

    fn open(&self, file: &Utf8Path) -> Result<Box<dyn Read + '_>, ArchiveError> {
        let handle = fs::File::open(file).map_err(|source| ArchiveError::Filesystem {
            path: file.to_owned(),
            source,
        })?;
        Ok(Box::new(handle))
    }

    fn canonical(&self, dir: &Utf8Path) -> Result<Utf8PathBuf, ArchiveError> {
        dir.canonicalize_utf8()
            .map_err(|source| ArchiveError::Filesystem {
                path: dir.to_owned(),
                source,
            })
    }
}

/// Classifies a directory entry, following symlinks.
///
/// A link whose target cannot be resolved is [`NodeKind::Other`]; any other
/// metadata failure is returned.
fn node_kind(entry: &fs::DirEntry) -> io::Result<NodeKind> {
    match fs::metadata(entry.path()) {
        Ok(meta) if meta.is_file() => Ok(NodeKind::File),
        Ok(meta) if meta.is_dir() => Ok(NodeKind::Directory),
        Ok(_) => Ok(NodeKind::Other),
        Err(err) => {
            if entry.file_type()?.is_symlink() {
                debug!("Skipping unresolvable link {}: {err}", entry.path().display());
                Ok(NodeKind::Other)
            } else {
                Err(err)
            }
        }
    }
}

/// An in-memory tree of files keyed by path. Directories are implied by
/// the file paths beneath them.
#[cfg(any(test, feature = "test-support"))]
#[derive(Debug, Clone, Default)]
pub struct MemoryTree {
    files: std::collections::BTreeMap<Utf8PathBuf, Vec<u8>>,
}

#[cfg(any(test, feature = "test-support"))]
impl MemoryTree {
    /// Adds a file with the given contents.
    #[must_use]
    pub fn with_file(
        mut self,
        path: impl Into<Utf8PathBuf>,
        contents: impl AsRef<[u8]>,
    ) -> Self {
        self.files.insert(path.into(), contents.as_ref().to_vec());
        self
    }
}

#[cfg(any(test, feature = "test-support"))]
impl SourceTree for MemoryTree {
    fn list(&self, dir: &Utf8Path) -> Result<Vec<TreeNode>, ArchiveError> {
        let mut children = std::collections::BTreeMap::new();
        for path in self.files.keys() {
            let Ok(rest) = path.strip_prefix(dir) else {
                continue;
            };
            let mut components = rest.components();
            let Some(first) = components.next() else {
                continue;
            };
            let kind = if components.next().is_some() {
                NodeKind::Directory
            } else {
                NodeKind::File
            };
            children.insert(first.as_str().to_owned(), kind);
        }

        if children.is_empty() {
            return Err(ArchiveError::Filesystem {
                path: dir.to_owned(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            });
        }

        Ok(children
            .into_iter()
            .map(|(name, kind)| TreeNode { name, kind })
            .collect())
    }

    fn open(&self, file: &Utf8Path) -> Result<Box<dyn Read + '_>, ArchiveError> {
        let contents = self
            .files
            .get(file)
            .ok_or_else(|| ArchiveError::Filesystem {
                path: file.to_owned(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            })?;
        Ok(Box::new(std::io::Cursor::new(contents.as_slice())))
    }
}
