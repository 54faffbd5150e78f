//! Object store errors.

use thiserror::Error;

/// Errors returned by [`ObjectStore`](super::ObjectStore) calls.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The addressed object does not exist.
    #[error("object s3://{bucket}/{key} not found")]
    NotFound {
        /// Bucket that was addressed.
        bucket: String,
        /// Key that was addressed.
        key: String,
    },

    /// The bucket does not exist.
    #[error("bucket {bucket} does not exist (writing {key})")]
    NoSuchBucket {
        /// Bucket that was addressed.
        bucket: String,
        /// Key that was being written.
        key: String,
    },

    /// The store rejected the request or could not be reached.
    #[error("request for s3://{bucket}/{key} failed: {reason}")]
    Request {
        /// Bucket that was addressed.
        bucket: String,
        /// Key that was addressed.
        key: String,
        /// Transport failure or status and error code.
        reason: String,
    },
}

impl StoreError {
    /// The key the failure concerns.
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::NotFound { key, .. }
            | Self::NoSuchBucket { key, .. }
            | Self::Request { key, .. } => key,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_names_bucket_and_key() {
        let err = StoreError::NotFound {
            bucket: "jobs".to_owned(),
            key: "v123/palp.zip".to_owned(),
        };
        assert_eq!(err.to_string(), "object s3://jobs/v123/palp.zip not found");
        assert_eq!(err.key(), "v123/palp.zip");
    }

    #[test]
    fn missing_bucket_names_the_key_being_written() {
        let err = StoreError::NoSuchBucket {
            bucket: "jobs".to_owned(),
            key: "latest/main.py".to_owned(),
        };
        assert_eq!(err.key(), "latest/main.py");
        assert_eq!(
            err.to_string(),
            "bucket jobs does not exist (writing latest/main.py)"
        );
    }
}
