//! Packaging and release pipeline for jobpack bundles.
//!
//! This crate installs a project's declared dependencies, zips them with the
//! project's sources into a versioned archive, uploads the bundle to an
//! S3-compatible store, and promotes uploaded versions to a release prefix.
//! It backs the `jobpack` CLI binary and can be driven programmatically with
//! substitute executors and stores.
//!
//! # Modules
//!
//! - [`archive`] - Deterministic archive assembly from source roots
//! - [`bundle`] - Bundle layout on disk
//! - [`cli`] - Command-line argument definitions
//! - [`dependency`] - Declared dependency requirements
//! - [`deps`] - Dependency materialization through an installer command
//! - [`error`] - Semantic error types for every pipeline step
//! - [`key`] - Object key construction
//! - [`notify`] - CI service-message notifications
//! - [`output`] - Human-readable summaries
//! - [`pipeline`] - Package, upload, publish, and release orchestration
//! - [`release`] - Upload and promotion against an object store
//! - [`store`] - Object store trait, S3 backend, and access-control values

pub mod archive;
pub mod bundle;
pub mod cli;
pub mod dependency;
pub mod deps;
pub mod error;
pub mod key;
pub mod notify;
pub mod output;
pub mod pipeline;
pub mod release;
pub mod store;
#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
