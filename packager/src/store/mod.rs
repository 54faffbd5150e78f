//! Object store client.
//!
//! [`ObjectStore`] is the seam between release coordination and the
//! network. Parameter values are validated into [`CannedAcl`] and
//! [`ServerSideEncryption`] before a store is ever called.
//!
//! # Sub-modules
//!
//! - [`acl`] - ACL and encryption enumerations and their validation.
//! - [`error`] - Store error type.
//! - [`s3`] - S3 REST backend.
//! - [`signing`] - Signature Version 4 request signing.

pub mod acl;
pub mod error;
#[cfg(any(test, feature = "test-support"))]
pub mod memory;
pub mod s3;
pub mod signing;

pub use acl::{CannedAcl, ServerSideEncryption, validate_acl, validate_server_side_encryption};
pub use error::StoreError;
#[cfg(any(test, feature = "test-support"))]
pub use memory::{InMemoryStore, StoredObject};
pub use s3::S3Store;

/// Put and copy operations against a bucket.
///
/// Calls are blocking and never retried internally.
#[cfg_attr(test, mockall::automock)]
pub trait ObjectStore {
    /// Uploads `data` to `key`.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on transport, authentication, or missing
    /// bucket failures.
    fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: &[u8],
        acl: CannedAcl,
        sse: Option<ServerSideEncryption>,
    ) -> Result<(), StoreError>;

    /// Copies `source_key` to `destination_key` server-side, applying `acl`
    /// and `sse` to the destination. The source's encryption is not carried
    /// over.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] naming `source_key` when the source
    /// does not exist, or another [`StoreError`] on other failures.
    fn copy_object(
        &self,
        bucket: &str,
        source_key: &str,
        destination_key: &str,
        acl: CannedAcl,
        sse: Option<ServerSideEncryption>,
    ) -> Result<(), StoreError>;
}
