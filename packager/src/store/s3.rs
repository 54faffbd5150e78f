//! S3 REST backend over `ureq`.
//!
//! Requests use path-style addressing (`{endpoint}/{bucket}/{key}`) and are
//! signed with Signature Version 4. HTTP status codes are inspected rather
//! than surfaced as transport errors so the S3 error code in the response
//! body can be reported.

use super::ObjectStore;
use super::acl::{CannedAcl, ServerSideEncryption};
use super::error::StoreError;
use super::signing::{
    CanonicalRequest, Credentials, amz_date, authorization, encode_key, sha256_hex,
};
use crate::error::PackagerError;
use chrono::Utc;
use jobpack::StoreSettings;
use log::debug;
use std::sync::OnceLock;
use std::time::Duration;
use ureq::http::Uri;

/// Environment variable holding the access key identifier.
pub const ACCESS_KEY_ID_VAR: &str = "AWS_ACCESS_KEY_ID";
/// Environment variable holding the secret access key.
pub const SECRET_ACCESS_KEY_VAR: &str = "AWS_SECRET_ACCESS_KEY";
/// Environment variable holding an optional session token.
pub const SESSION_TOKEN_VAR: &str = "AWS_SESSION_TOKEN";

/// Network timeout for a single store request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// An [`ObjectStore`] speaking the S3 REST protocol.
#[derive(Debug)]
pub struct S3Store {
    credentials: Credentials,
    region: String,
    endpoint: String,
    host: String,
}

impl S3Store {
    /// Creates a store for `region`, defaulting the endpoint to the regional
    /// AWS endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::Config`] when `endpoint` is not an absolute
    /// URL with a host.
    pub fn new(
        credentials: Credentials,
        region: &str,
        endpoint: Option<&str>,
    ) -> crate::error::Result<Self> {
        let endpoint = endpoint.map_or_else(
            || format!("https://s3.{region}.amazonaws.com"),
            |url| url.trim_end_matches('/').to_owned(),
        );
        let host = endpoint
            .parse::<Uri>()
            .ok()
            .and_then(|uri| uri.authority().map(|authority| authority.as_str().to_owned()))
            .ok_or_else(|| {
                PackagerError::Config(jobpack::ConfigError::InvalidProperty {
                    key: "s3.endpoint_url".to_owned(),
                    value: endpoint.clone(),
                    reason: "expected an absolute URL such as https://s3.example.com".to_owned(),
                })
            })?;
        Ok(Self {
            credentials,
            region: region.to_owned(),
            endpoint,
            host,
        })
    }

    /// Creates a store from `settings` and credentials in the environment.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::MissingCredentials`] when the access key or
    /// secret is unset or empty, and the errors of [`S3Store::new`].
    pub fn from_env(settings: &StoreSettings) -> crate::error::Result<Self> {
        let credentials = Credentials {
            access_key_id: required_var(ACCESS_KEY_ID_VAR)?,
            secret_access_key: required_var(SECRET_ACCESS_KEY_VAR)?,
            session_token: optional_var(SESSION_TOKEN_VAR),
        };
        Self::new(
            credentials,
            &settings.region,
            settings.endpoint_url.as_deref(),
        )
    }

    /// The endpoint requests are sent to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn object_path(bucket: &str, key: &str) -> String {
        format!("/{}/{}", encode_key(bucket), encode_key(key))
    }

    fn send(&self, bucket: &str, key: &str, request: Request<'_>) -> Result<String, StoreError> {
        let path = Self::object_path(bucket, key);
        let url = format!("{}{path}", self.endpoint);
        let now = Utc::now();
        let payload_sha256 = sha256_hex(request.body);

        let mut headers = vec![
            ("host".to_owned(), self.host.clone()),
            ("x-amz-content-sha256".to_owned(), payload_sha256.clone()),
            ("x-amz-date".to_owned(), amz_date(now)),
        ];
        if let Some(token) = &self.credentials.session_token {
            headers.push(("x-amz-security-token".to_owned(), token.clone()));
        }
        headers.extend(request.headers);

        let signed = authorization(
            &self.credentials,
            &self.region,
            now,
            &CanonicalRequest {
                method: "PUT",
                path: &path,
                query: "",
                headers: &headers,
                payload_sha256: &payload_sha256,
            },
        )
        .map_err(|err| request_error(bucket, key, &err))?;

        let mut builder = http_agent().put(&url).header("authorization", &signed);
        for (name, value) in headers.iter().filter(|(name, _)| name != "host") {
            builder = builder.header(name, value);
        }

        debug!("PUT {url}");
        let response = builder
            .send(request.body)
            .map_err(|err| request_error(bucket, key, &err))?;
        let status = response.status().as_u16();
        let body = response
            .into_body()
            .read_to_string()
            .map_err(|err| request_error(bucket, key, &err))?;

        if (200..300).contains(&status) && !body.contains("<Error>") {
            Ok(body)
        } else {
            Err(classify(status, &body, bucket, key))
        }
    }
}

struct Request<'a> {
    headers: Vec<(String, String)>,
    body: &'a [u8],
}

impl ObjectStore for S3Store {
    fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: &[u8],
        acl: CannedAcl,
        sse: Option<ServerSideEncryption>,
    ) -> Result<(), StoreError> {
        self.send(
            bucket,
            key,
            Request {
                headers: object_headers(acl, sse),
                body: data,
            },
        )?;
        Ok(())
    }

    fn copy_object(
        &self,
        bucket: &str,
        source_key: &str,
        destination_key: &str,
        acl: CannedAcl,
        sse: Option<ServerSideEncryption>,
    ) -> Result<(), StoreError> {
        let mut headers = object_headers(acl, sse);
        headers.push((
            "x-amz-copy-source".to_owned(),
            Self::object_path(bucket, source_key),
        ));
        self.send(
            bucket,
            destination_key,
            Request {
                headers,
                body: &[],
            },
        )
        .map_err(|err| match err {
            // The copy target never exists beforehand; a missing object is the source.
            StoreError::NotFound { bucket, .. } => StoreError::NotFound {
                bucket,
                key: source_key.to_owned(),
            },
            other => other,
        })?;
        Ok(())
    }
}

/// Headers applied to every object written, whether uploaded or copied.
fn object_headers(acl: CannedAcl, sse: Option<ServerSideEncryption>) -> Vec<(String, String)> {
    let mut headers = vec![("x-amz-acl".to_owned(), acl.as_str().to_owned())];
    if let Some(mode) = sse {
        headers.push((
            "x-amz-server-side-encryption".to_owned(),
            mode.as_str().to_owned(),
        ));
    }
    headers
}

/// Maps an unsuccessful response to a [`StoreError`].
fn classify(status: u16, body: &str, bucket: &str, key: &str) -> StoreError {
    let code = error_code(body);
    match code {
        Some("NoSuchBucket") => StoreError::NoSuchBucket {
            bucket: bucket.to_owned(),
            key: key.to_owned(),
        },
        Some("NoSuchKey") => StoreError::NotFound {
            bucket: bucket.to_owned(),
            key: key.to_owned(),
        },
        _ if status == 404 => StoreError::NotFound {
            bucket: bucket.to_owned(),
            key: key.to_owned(),
        },
        Some(code) => StoreError::Request {
            bucket: bucket.to_owned(),
            key: key.to_owned(),
            reason: format!("HTTP {status} {code}"),
        },
        None => StoreError::Request {
            bucket: bucket.to_owned(),
            key: key.to_owned(),
            reason: format!("HTTP {status}"),
        },
    }
}

fn error_code(body: &str) -> Option<&str> {
    let (_, rest) = body.split_once("<Code>")?;
    let (code, _) = rest.split_once("</Code>")?;
    Some(code.trim())
}

fn request_error(bucket: &str, key: &str, err: &impl ToString) -> StoreError {
    StoreError::Request {
        bucket: bucket.to_owned(),
        key: key.to_owned(),
        reason: err.to_string(),
    }
}

fn required_var(name: &'static str) -> crate::error::Result<String> {
    optional_var(name).ok_or(PackagerError::MissingCredentials { variable: name })
}

fn optional_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.trim().is_empty())
}

/// Shared `ureq` agent; status codes are returned as responses.
fn http_agent() -> &'static ureq::Agent {
    static AGENT: OnceLock<ureq::Agent> = OnceLock::new();
    AGENT.get_or_init(|| {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(REQUEST_TIMEOUT))
            .http_status_as_error(false)
            .build();
        ureq::Agent::new_with_config(config)
    })
}
