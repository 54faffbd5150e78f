//! Archive assembly for job bundles.
//!
//! Several source roots (materialized dependencies, the main source tree,
//! the scripts tree) are merged into one deflate-compressed zip. Each root
//! carries its own exclusion set, a `VERSION` entry is synthesized after
//! the roots are merged, and sibling files are copied next to the archive.
//!
//! # Sub-modules
//!
//! - [`assemble`] - Archive writing and sibling copying.
//! - [`entries`] - Lazy traversal of a source root into archive entries.
//! - [`error`] - Error types for assembly failures.
//! - [`tree`] - File tree abstraction with a filesystem implementation.

pub mod assemble;
pub mod entries;
pub mod error;
pub mod tree;

pub use assemble::{AssembleParams, VERSION_ENTRY, assemble, assemble_from};
pub use entries::{ArchiveEntry, Entries, SourceRoot, entries};
pub use error::ArchiveError;
pub use tree::{FsTree, NodeKind, SourceTree, TreeNode};

#[cfg(any(test, feature = "test-support"))]
pub use tree::MemoryTree;
