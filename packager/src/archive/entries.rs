//! Lazy traversal of a source root into archive entries.

use super::error::ArchiveError;
use super::tree::{NodeKind, SourceTree};
use camino::Utf8PathBuf;
use std::collections::{BTreeSet, VecDeque};
use std::rc::Rc;

/// A directory merged into the archive namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRoot {
    /// Directory on disk.
    pub path: Utf8PathBuf,
    /// Folder prefix inside the archive; empty for the archive root.
    pub folder: String,
    /// File names skipped anywhere beneath this root.
    pub excludes: BTreeSet<String>,
}

impl SourceRoot {
    /// A root merged at the top of the archive with no exclusions.
    #[must_use]
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            path: path.into(),
            folder: String::new(),
            excludes: BTreeSet::new(),
        }
    }

    /// Places this root's files beneath `folder` inside the archive.
    #[must_use]
    pub fn with_folder(mut self, folder: impl Into<String>) -> Self {
        self.folder = folder.into().trim_matches('/').to_owned();
        self
    }

    /// Skips files with any of the given names.
    #[must_use]
    pub fn excluding<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excludes.extend(names.into_iter().map(Into::into));
        self
    }
}

/// A file to be written into the archive.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ArchiveEntry {
    /// Path inside the archive, always `/`-separated.
    pub archive_path: String,
    /// Source file in the tree.
    pub source: Utf8PathBuf,
}

/// Iterator over the archive entries of one source root.
///
/// Directories are listed only when the iterator reaches them. A directory
/// that resolves to one of its own ancestors is reported as
/// [`ArchiveError::DirectoryCycle`]. After the first error the iterator is
/// exhausted.
pub struct Entries<'a, T: SourceTree + ?Sized> {
    tree: &'a T,
    excludes: &'a BTreeSet<String>,
    extra_excludes: &'a BTreeSet<String>,
    pending: Vec<PendingDir>,
    ready: VecDeque<ArchiveEntry>,
}

struct PendingDir {
    dir: Utf8PathBuf,
    folder: String,
    /// Canonical paths of every directory above `dir` in this walk.
    ancestors: Rc<Vec<Utf8PathBuf>>,
}

/// Walks `root`, yielding every regular file whose name is not excluded by
/// the root or by `extra_excludes`.
///
/// # Examples
///
/// ```no_run
/// use jobpack_packager::archive::{FsTree, SourceRoot, entries};
/// use std::collections::BTreeSet;
///
/// let root = SourceRoot::new("src/main/python").excluding(["main.py"]);
/// let none = BTreeSet::new();
/// for entry in entries(&FsTree, &root, &none) {
///     println!("{}", entry?.archive_path);
/// }
/// # Ok::<(), jobpack_packager::archive::ArchiveError>(())
/// ```
pub fn entries<'a, T: SourceTree + ?Sized>(
    tree: &'a T,
    root: &'a SourceRoot,
    extra_excludes: &'a BTreeSet<String>,
) -> Entries<'a, T> {
    Entries {
        tree,
        excludes: &root.excludes,
        extra_excludes,
        pending: vec![PendingDir {
            dir: root.path.clone(),
            folder: root.folder.clone(),
            ancestors: Rc::default(),
        }],
        ready: VecDeque::new(),
    }
}

impl<T: SourceTree + ?Sized> Entries<'_, T> {
    fn is_excluded(&self, name: &str) -> bool {
        self.excludes.contains(name) || self.extra_excludes.contains(name)
    }

    fn expand(&mut self, pending: &PendingDir) -> Result<(), ArchiveError> {
        let PendingDir {
            dir,
            folder,
            ancestors,
        } = pending;
        let canonical = self.tree.canonical(dir)?;
        if ancestors.contains(&canonical) {
            return Err(ArchiveError::DirectoryCycle {
                path: dir.clone(),
                target: canonical,
            });
        }
        let mut chain = Vec::with_capacity(ancestors.len() + 1);
        chain.extend(ancestors.iter().cloned());
        chain.push(canonical);
        let chain = Rc::new(chain);

        let nodes = self.tree.list(dir)?;
        let mut subdirs = Vec::new();
        for node in nodes {
            match node.kind {
                NodeKind::File if !self.is_excluded(&node.name) => {
                    self.ready.push_back(ArchiveEntry {
                        archive_path: join_folder(folder, &node.name),
                        source: dir.join(&node.name),
                    });
                }
                NodeKind::Directory => {
                    subdirs.push(PendingDir {
                        dir: dir.join(&node.name),
                        folder: join_folder(folder, &node.name),
                        ancestors: Rc::clone(&chain),
                    });
                }
                NodeKind::File | NodeKind::Other => {}
            }
        }
        // Reversed so that popping visits subdirectories in listing order.
        self.pending.extend(subdirs.into_iter().rev());
        Ok(())
    }
}

impl<T: SourceTree + ?Sized> Iterator for Entries<'_, T> {
    type Item = Result<ArchiveEntry, ArchiveError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(entry) = self.ready.pop_front() {
                return Some(Ok(entry));
            }
            let pending = self.pending.pop()?;
            if let Err(err) = self.expand(&pending) {
                self.pending.clear();
                return Some(Err(err));
            }
        }
    }
}

fn join_folder(folder: &str, name: &str) -> String {
    if folder.is_empty() {
        name.to_owned()
    } else {
        format!("{folder}/{name}")
    }
}
