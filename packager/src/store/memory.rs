//! In-memory object store for tests.

use super::ObjectStore;
use super::acl::{CannedAcl, ServerSideEncryption};
use super::error::StoreError;
use std::cell::RefCell;
use std::collections::BTreeMap;

/// An object held by [`InMemoryStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Object bytes.
    pub data: Vec<u8>,
    /// ACL applied by the last write.
    pub acl: CannedAcl,
    /// Encryption requested by the last write.
    pub sse: Option<ServerSideEncryption>,
}

/// An [`ObjectStore`] keeping buckets in memory.
///
/// Buckets must be created up front; writes to unknown buckets fail with
/// [`StoreError::NoSuchBucket`].
#[derive(Debug, Default)]
pub struct InMemoryStore {
    buckets: RefCell<BTreeMap<String, BTreeMap<String, StoredObject>>>,
    calls: RefCell<Vec<String>>,
}

impl InMemoryStore {
    /// Creates an empty bucket.
    #[must_use]
    pub fn with_bucket(self, bucket: &str) -> Self {
        self.buckets.borrow_mut().entry(bucket.to_owned()).or_default();
        self
    }

    /// Seeds an object directly, bypassing call recording.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NoSuchBucket`] when `bucket` was not created.
    pub fn insert(
        &self,
        bucket: &str,
        key: &str,
        data: impl Into<Vec<u8>>,
        acl: CannedAcl,
    ) -> Result<(), StoreError> {
        self.write(
            bucket,
            key,
            StoredObject {
                data: data.into(),
                acl,
                sse: None,
            },
        )
    }

    /// Looks up an object.
    #[must_use]
    pub fn object(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        self.buckets
            .borrow()
            .get(bucket)
            .and_then(|objects| objects.get(key))
            .cloned()
    }

    /// Keys in `bucket`, sorted.
    #[must_use]
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        self.buckets
            .borrow()
            .get(bucket)
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Every call received, rendered as `put {key}` or `copy {src} {dst}`.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    fn write(&self, bucket: &str, key: &str, object: StoredObject) -> Result<(), StoreError> {
        let mut buckets = self.buckets.borrow_mut();
        let objects = buckets
            .get_mut(bucket)
            .ok_or_else(|| StoreError::NoSuchBucket {
                bucket: bucket.to_owned(),
                key: key.to_owned(),
            })?;
        objects.insert(key.to_owned(), object);
        Ok(())
    }
}

impl ObjectStore for InMemoryStore {
    fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: &[u8],
        acl: CannedAcl,
        sse: Option<ServerSideEncryption>,
    ) -> Result<(), StoreError> {
        self.calls.borrow_mut().push(format!("put {key}"));
        self.write(
            bucket,
            key,
            StoredObject {
                data: data.to_vec(),
                acl,
                sse,
            },
        )
    }

    fn copy_object(
        &self,
        bucket: &str,
        source_key: &str,
        destination_key: &str,
        acl: CannedAcl,
        sse: Option<ServerSideEncryption>,
    ) -> Result<(), StoreError> {
        self.calls
            .borrow_mut()
            .push(format!("copy {source_key} {destination_key}"));
        if !self.buckets.borrow().contains_key(bucket) {
            return Err(StoreError::NoSuchBucket {
                bucket: bucket.to_owned(),
                key: destination_key.to_owned(),
            });
        }
        let source = self
            .object(bucket, source_key)
            .ok_or_else(|| StoreError::NotFound {
                bucket: bucket.to_owned(),
                key: source_key.to_owned(),
            })?;
        self.write(
            bucket,
            destination_key,
            StoredObject {
                data: source.data,
                acl,
                sse,
            },
        )
    }
}
