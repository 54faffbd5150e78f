//! Access-control and encryption parameter validation.
//!
//! Both values arrive as free-form configuration strings. They are parsed
//! into closed enumerations before any object store call so an invalid
//! value never reaches the network.

use crate::error::{PackagerError, Result};
use std::fmt;

/// A canned access-control list applied to stored objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CannedAcl {
    /// `private`
    Private,
    /// `public-read`
    PublicRead,
    /// `public-read-write`
    PublicReadWrite,
    /// `authenticated-read`
    AuthenticatedRead,
    /// `bucket-owner-read`
    BucketOwnerRead,
    /// `bucket-owner-full-control`
    BucketOwnerFullControl,
    /// `aws-exec-read`
    AwsExecRead,
    /// `log-delivery-write`
    LogDeliveryWrite,
}

impl CannedAcl {
    /// Every recognised ACL, in documentation order.
    pub const ALL: [Self; 8] = [
        Self::Private,
        Self::PublicRead,
        Self::PublicReadWrite,
        Self::AuthenticatedRead,
        Self::BucketOwnerRead,
        Self::BucketOwnerFullControl,
        Self::AwsExecRead,
        Self::LogDeliveryWrite,
    ];

    /// The wire value sent in the `x-amz-acl` header.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Private => "private",
            Self::PublicRead => "public-read",
            Self::PublicReadWrite => "public-read-write",
            Self::AuthenticatedRead => "authenticated-read",
            Self::BucketOwnerRead => "bucket-owner-read",
            Self::BucketOwnerFullControl => "bucket-owner-full-control",
            Self::AwsExecRead => "aws-exec-read",
            Self::LogDeliveryWrite => "log-delivery-write",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|acl| acl.as_str() == value)
    }
}

impl fmt::Display for CannedAcl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A server-side encryption mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServerSideEncryption {
    /// `AES256`, keys managed by the store.
    Aes256,
    /// `aws:kms`
    AwsKms,
    /// `aws:kms:dsse`, dual-layer KMS encryption.
    AwsKmsDsse,
}

impl ServerSideEncryption {
    /// Every recognised mode.
    pub const ALL: [Self; 3] = [Self::Aes256, Self::AwsKms, Self::AwsKmsDsse];

    /// The wire value sent in the `x-amz-server-side-encryption` header.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Aes256 => "AES256",
            Self::AwsKms => "aws:kms",
            Self::AwsKmsDsse => "aws:kms:dsse",
        }
    }
}

impl fmt::Display for ServerSideEncryption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses `value` as a canned ACL.
///
/// Matching is exact and case-sensitive.
///
/// # Errors
///
/// Returns [`PackagerError::InvalidAcl`] naming `parameter` and `value` when
/// `value` is not a recognised ACL.
///
/// # Examples
///
/// ```
/// use jobpack_packager::store::{CannedAcl, validate_acl};
///
/// let acl = validate_acl("s3.file_access_control", "public-read")?;
/// assert_eq!(acl, CannedAcl::PublicRead);
/// assert!(validate_acl("s3.file_access_control", "no_such_value").is_err());
/// # Ok::<(), jobpack_packager::error::PackagerError>(())
/// ```
pub fn validate_acl(parameter: &str, value: &str) -> Result<CannedAcl> {
    CannedAcl::parse(value).ok_or_else(|| PackagerError::InvalidAcl {
        parameter: parameter.to_owned(),
        value: value.to_owned(),
        expected: join(CannedAcl::ALL.iter().map(|acl| acl.as_str())),
    })
}

/// Parses `value` as a server-side encryption mode.
///
/// # Errors
///
/// Returns [`PackagerError::InvalidServerSideEncryption`] naming `parameter`
/// and `value` when the mode is not recognised.
pub fn validate_server_side_encryption(
    parameter: &str,
    value: &str,
) -> Result<ServerSideEncryption> {
    ServerSideEncryption::ALL
        .into_iter()
        .find(|mode| mode.as_str() == value)
        .ok_or_else(|| PackagerError::InvalidServerSideEncryption {
            parameter: parameter.to_owned(),
            value: value.to_owned(),
            expected: join(ServerSideEncryption::ALL.iter().map(|mode| mode.as_str())),
        })
}

fn join<'a>(values: impl Iterator<Item = &'a str>) -> String {
    values.collect::<Vec<_>>().join(", ")
}
