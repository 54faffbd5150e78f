//! Upload and release coordination.
//!
//! A bundle moves through `Packaged -> Uploaded -> Released`. Uploading
//! writes every bundle file under the versioned key; releasing copies each
//! versioned key to the stable release key. The coordinator validates its
//! parameters when it is built, so an invalid ACL or encryption mode stops
//! the run before any object is touched.

use crate::bundle::ArtifactBundle;
use crate::error::{PackagerError, Result};
use crate::key::{ObjectKey, VersionSegment};
use crate::notify::Notifier;
use crate::store::{
    CannedAcl, ObjectStore, ServerSideEncryption, StoreError, validate_acl,
    validate_server_side_encryption,
};
use jobpack::StoreSettings;
use log::{info, warn};
use std::fmt;
use std::fs;
use std::io::Write;

/// Configuration key holding the ACL.
pub const ACL_PARAMETER: &str = "s3.file_access_control";
/// Configuration key holding the encryption mode.
pub const SSE_PARAMETER: &str = "s3.server_side_encryption";

/// Where a bundle version is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ReleaseStage {
    /// Built on local disk.
    Packaged,
    /// Stored under its versioned keys.
    Uploaded,
    /// Copied to the release keys.
    Released,
}

impl fmt::Display for ReleaseStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Packaged => "packaged",
            Self::Uploaded => "uploaded",
            Self::Released => "released",
        })
    }
}

/// Keys written by [`ReleaseCoordinator::upload`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReport {
    /// Versioned keys, archive first.
    pub keys: Vec<ObjectKey>,
    /// Whether the status line was written.
    pub notified: bool,
}

/// Copies made by [`ReleaseCoordinator::release`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseReport {
    /// `(source, destination)` pairs in bundle order.
    pub copies: Vec<(ObjectKey, ObjectKey)>,
}

/// Drives an [`ObjectStore`] through upload and release for one version.
pub struct ReleaseCoordinator<'a, S: ObjectStore + ?Sized> {
    store: &'a S,
    bucket: String,
    bucket_prefix: String,
    release_prefix: String,
    version: String,
    acl: CannedAcl,
    sse: Option<ServerSideEncryption>,
}

impl<S: ObjectStore + ?Sized> fmt::Debug for ReleaseCoordinator<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReleaseCoordinator")
            .field("bucket", &self.bucket)
            .field("bucket_prefix", &self.bucket_prefix)
            .field("release_prefix", &self.release_prefix)
            .field("version", &self.version)
            .field("acl", &self.acl)
            .field("sse", &self.sse)
            .finish_non_exhaustive()
    }
}

impl<'a, S: ObjectStore + ?Sized> ReleaseCoordinator<'a, S> {
    /// Validates `settings` and binds them to `store`.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::Config`] when the bucket name is missing,
    /// [`PackagerError::InvalidAcl`] for an unknown ACL, and
    /// [`PackagerError::InvalidServerSideEncryption`] for an unknown mode.
    pub fn new(store: &'a S, settings: &StoreSettings, version: &str) -> Result<Self> {
        let bucket = settings.require_bucket_name()?.to_owned();
        let acl = validate_acl(ACL_PARAMETER, &settings.file_access_control)?;
        let sse = settings
            .server_side_encryption
            .as_deref()
            .map(|mode| validate_server_side_encryption(SSE_PARAMETER, mode))
            .transpose()?;
        Ok(Self {
            store,
            bucket,
            bucket_prefix: settings.bucket_prefix.clone(),
            release_prefix: settings.release_prefix.clone(),
            version: version.to_owned(),
            acl,
            sse,
        })
    }

    /// The versioned key for `file_name`.
    #[must_use]
    pub fn versioned_key(&self, file_name: &str) -> ObjectKey {
        ObjectKey::new(
            &self.bucket_prefix,
            VersionSegment::Versioned(&self.version),
            file_name,
        )
    }

    /// The release key for `file_name`.
    #[must_use]
    pub fn release_key(&self, file_name: &str) -> ObjectKey {
        ObjectKey::new(
            &self.bucket_prefix,
            VersionSegment::Release(&self.release_prefix),
            file_name,
        )
    }

    /// Uploads every bundle file under its versioned key, then announces the
    /// archive's key through `notifier`.
    ///
    /// Stops at the first failed upload.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::Filesystem`] when a bundle file cannot be
    /// read, [`PackagerError::Store`] when an upload fails, and
    /// [`PackagerError::Io`] when the status line cannot be written.
    pub fn upload<W: Write>(
        &self,
        bundle: &ArtifactBundle,
        notifier: &mut Notifier<W>,
    ) -> Result<UploadReport> {
        let mut keys = Vec::new();
        for path in bundle.files() {
            let file_name = path.file_name().unwrap_or(path.as_str());
            let key = self.versioned_key(file_name);
            let data = fs::read(path).map_err(|source| PackagerError::Filesystem {
                path: path.to_owned(),
                source,
            })?;
            info!("Uploading {path} to s3://{}/{key}", self.bucket);
            self.store
                .put_object(&self.bucket, key.as_str(), &data, self.acl, self.sse)?;
            keys.push(key);
        }

        let notified = match keys.first() {
            Some(archive_key) => notifier.announce(archive_key.as_str())?,
            None => false,
        };
        Ok(UploadReport { keys, notified })
    }

    /// Copies each versioned key to its release key, re-applying the ACL and
    /// encryption mode.
    ///
    /// Every file is attempted even after a failure.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::ReleaseIncomplete`] listing every failed copy.
    pub fn release(&self, file_names: &[&str]) -> Result<ReleaseReport> {
        let mut copies = Vec::new();
        let mut failures: Vec<StoreError> = Vec::new();

        for file_name in file_names {
            let source = self.versioned_key(file_name);
            let destination = self.release_key(file_name);
            info!(
                "Copying s3://{bucket}/{source} to s3://{bucket}/{destination}",
                bucket = self.bucket
            );
            match self.store.copy_object(
                &self.bucket,
                source.as_str(),
                destination.as_str(),
                self.acl,
                self.sse,
            ) {
                Ok(()) => copies.push((source, destination)),
                Err(err) => {
                    warn!("Could not release {file_name}: {err}");
                    failures.push(err);
                }
            }
        }

        if failures.is_empty() {
            Ok(ReleaseReport { copies })
        } else {
            Err(PackagerError::ReleaseIncomplete {
                total: file_names.len(),
                failed: failures.len(),
                failures,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MockObjectStore;
    use camino::Utf8PathBuf;
    use mockall::Sequence;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    #[fixture]
    fn settings() -> StoreSettings {
        StoreSettings {
            bucket_name: Some("jobs".to_owned()),
            bucket_prefix: String::new(),
            file_access_control: "bucket-owner-full-control".to_owned(),
            release_prefix: "latest".to_owned(),
            server_side_encryption: None,
            region: "us-east-1".to_owned(),
            endpoint_url: None,
        }
    }

    struct Bundle {
        _dir: TempDir,
        bundle: ArtifactBundle,
    }

    #[fixture]
    fn bundle() -> Bundle {
        let dir = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::try_from(dir.path().to_path_buf()).expect("utf-8 temp dir");
        let archive = root.join("palp.zip");
        let main = root.join("main.py");
        fs::write(&archive, b"zip bytes").expect("write archive");
        fs::write(&main, b"print()").expect("write main");
        Bundle {
            _dir: dir,
            bundle: ArtifactBundle::new(root, archive, vec![main]),
        }
    }

    #[rstest]
    #[case("", "v123/palp.zip", "latest/palp.zip")]
    #[case("palp/", "palp/v123/palp.zip", "palp/latest/palp.zip")]
    fn keys_follow_the_prefix(
        settings: StoreSettings,
        #[case] prefix: &str,
        #[case] versioned: &str,
        #[case] released: &str,
    ) {
        let store = MockObjectStore::new();
        let settings = StoreSettings {
            bucket_prefix: prefix.to_owned(),
            ..settings
        };
        let coordinator = ReleaseCoordinator::new(&store, &settings, "123").expect("valid");
        assert_eq!(coordinator.versioned_key("palp.zip").as_str(), versioned);
        assert_eq!(coordinator.release_key("palp.zip").as_str(), released);
    }

    #[rstest]
    fn invalid_acl_fails_before_any_store_call(settings: StoreSettings) {
        let store = MockObjectStore::new();
        let settings = StoreSettings {
            file_access_control: "no_such_value".to_owned(),
            ..settings
        };
        let err = ReleaseCoordinator::new(&store, &settings, "123").expect_err("invalid acl");
        assert!(matches!(
            err,
            PackagerError::InvalidAcl { ref parameter, .. } if parameter == ACL_PARAMETER
        ));
    }

    #[rstest]
    fn invalid_encryption_fails_before_any_store_call(settings: StoreSettings) {
        let store = MockObjectStore::new();
        let settings = StoreSettings {
            server_side_encryption: Some("rot13".to_owned()),
            ..settings
        };
        let err = ReleaseCoordinator::new(&store, &settings, "123").expect_err("invalid sse");
        assert!(matches!(err, PackagerError::InvalidServerSideEncryption { .. }));
    }

    #[rstest]
    fn missing_bucket_is_a_configuration_error(settings: StoreSettings) {
        let store = MockObjectStore::new();
        let settings = StoreSettings {
            bucket_name: None,
            ..settings
        };
        let err = ReleaseCoordinator::new(&store, &settings, "123").expect_err("no bucket");
        assert!(err.to_string().contains("s3.bucket_name"));
    }

    #[rstest]
    fn upload_puts_every_file_in_order_and_notifies_once(
        settings: StoreSettings,
        bundle: Bundle,
    ) {
        let settings = StoreSettings {
            server_side_encryption: Some("AES256".to_owned()),
            ..settings
        };
        let mut store = MockObjectStore::new();
        let mut seq = Sequence::new();
        let expected: [(&str, &[u8]); 2] = [
            ("v123/palp.zip", b"zip bytes"),
            ("v123/main.py", b"print()"),
        ];
        for (key, body) in expected {
            store
                .expect_put_object()
                .withf(move |bucket, k, data, acl, sse| {
                    bucket == "jobs"
                        && k == key
                        && data == body
                        && *acl == CannedAcl::BucketOwnerFullControl
                        && *sse == Some(ServerSideEncryption::Aes256)
                })
                .times(1)
                .in_sequence(&mut seq)
                .returning(|_, _, _, _, _| Ok(()));
        }

        let coordinator = ReleaseCoordinator::new(&store, &settings, "123").expect("valid");
        let notification = jobpack::NotificationSettings {
            enabled: true,
            parameter: Some("k".to_owned()),
        };
        let mut notifier = Notifier::new(&notification, Vec::new());
        let report = coordinator
            .upload(&bundle.bundle, &mut notifier)
            .expect("uploads");

        assert!(report.notified);
        assert_eq!(
            report.keys.iter().map(ObjectKey::as_str).collect::<Vec<_>>(),
            vec!["v123/palp.zip", "v123/main.py"]
        );
        assert_eq!(
            String::from_utf8(notifier.into_inner()).expect("utf-8"),
            "##teamcity[setParameter name='k' value='v123/palp.zip']\n"
        );
    }

    #[rstest]
    fn upload_stops_at_the_first_failure(settings: StoreSettings, bundle: Bundle) {
        let mut store = MockObjectStore::new();
        store
            .expect_put_object()
            .times(1)
            .returning(|bucket, key, _, _, _| {
                Err(StoreError::NoSuchBucket {
                    bucket: bucket.to_owned(),
                    key: key.to_owned(),
                })
            });

        let coordinator = ReleaseCoordinator::new(&store, &settings, "123").expect("valid");
        let mut notifier = Notifier::disabled(Vec::new());
        let err = coordinator
            .upload(&bundle.bundle, &mut notifier)
            .expect_err("first put fails");

        assert!(matches!(
            err,
            PackagerError::Store(StoreError::NoSuchBucket { ref key, .. }) if key == "v123/palp.zip"
        ));
        assert!(notifier.into_inner().is_empty());
    }

    #[rstest]
    fn release_copies_to_the_release_prefix_with_the_acl(settings: StoreSettings) {
        let mut store = MockObjectStore::new();
        store
            .expect_copy_object()
            .withf(|bucket, source, destination, acl, sse| {
                bucket == "jobs"
                    && source == "v123/palp.zip"
                    && destination == "latest/palp.zip"
                    && *acl == CannedAcl::BucketOwnerFullControl
                    && sse.is_none()
            })
            .times(1)
            .returning(|_, _, _, _, _| Ok(()));

        let coordinator = ReleaseCoordinator::new(&store, &settings, "123").expect("valid");
        let report = coordinator.release(&["palp.zip"]).expect("released");
        assert_eq!(report.copies.len(), 1);
    }

    #[rstest]
    fn release_copies_apply_the_configured_encryption(settings: StoreSettings) {
        let mut store = MockObjectStore::new();
        store
            .expect_copy_object()
            .withf(|_, _, _, _, sse| *sse == Some(ServerSideEncryption::AwsKms))
            .times(2)
            .returning(|_, _, _, _, _| Ok(()));

        let settings = StoreSettings {
            server_side_encryption: Some("aws:kms".to_owned()),
            ..settings
        };
        let coordinator = ReleaseCoordinator::new(&store, &settings, "123").expect("valid");
        let report = coordinator
            .release(&["palp.zip", "main.py"])
            .expect("released");
        assert_eq!(report.copies.len(), 2);
    }

    #[rstest]
    fn release_attempts_every_file_and_reports_all_failures(settings: StoreSettings) {
        let mut store = MockObjectStore::new();
        let mut seq = Sequence::new();
        store
            .expect_copy_object()
            .withf(|_, source, _, _, _| source == "v123/palp.zip")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|bucket, source, _, _, _| {
                Err(StoreError::NotFound {
                    bucket: bucket.to_owned(),
                    key: source.to_owned(),
                })
            });
        store
            .expect_copy_object()
            .withf(|_, source, _, _, _| source == "v123/main.py")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _, _, _| Ok(()));

        let coordinator = ReleaseCoordinator::new(&store, &settings, "123").expect("valid");
        let err = coordinator
            .release(&["palp.zip", "main.py"])
            .expect_err("one copy fails");

        match err {
            PackagerError::ReleaseIncomplete {
                total,
                failed,
                failures,
            } => {
                assert_eq!((total, failed), (2, 1));
                assert_eq!(failures[0].key(), "v123/palp.zip");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[rstest]
    #[case(ReleaseStage::Packaged, "packaged")]
    #[case(ReleaseStage::Uploaded, "uploaded")]
    #[case(ReleaseStage::Released, "released")]
    fn stages_display_in_lower_case(#[case] stage: ReleaseStage, #[case] expected: &str) {
        assert_eq!(stage.to_string(), expected);
    }
}
