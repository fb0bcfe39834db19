//! S3-compatible storage backend.
//!
//! Lists objects from AWS S3, Backblaze B2, Tigris, MinIO and other
//! S3-compatible services. Credentials are provided explicitly via the
//! configuration file; each backend specifies its own `key_id` and
//! `key_secret`.

use crate::{
    FileInfo, StorageBackend,
    backend::FileInfoStream,
    error::{ErrorKind, Result},
    validate_path,
};
use async_stream::stream;
use async_trait::async_trait;
use aws_sdk_s3::{
    Client,
    config::{BehaviorVersion, Credentials, Region, retry::RetryConfig},
    types::Object,
};
use exn::ResultExt;
use std::path::Path;
use time::OffsetDateTime;

/// S3-compatible storage backend.
///
/// All paths are relative to the configured key prefix (if any).
#[derive(Debug, Clone)]
pub struct S3Backend {
    name: String,
    client: Client,
    bucket: String,
    prefix: Option<String>,
}

impl S3Backend {
    /// Create a new S3 storage backend.
    ///
    /// # Arguments
    /// * `name` - A name for this backend (sources refer to it by name)
    /// * `bucket` - S3 bucket name
    /// * `prefix` - Optional key prefix (acts as virtual directory)
    /// * `region` - AWS region or provider-specific region
    /// * `endpoint` - Custom endpoint URL for S3-compatible services
    /// * `key_id` - access key ID
    /// * `key_secret` - secret access key
    pub async fn new(
        name: impl Into<String>,
        bucket: impl Into<String>,
        prefix: Option<String>,
        region: impl Into<String>,
        endpoint: Option<impl Into<String>>,
        key_id: impl Into<String>,
        key_secret: impl Into<String>,
    ) -> Result<Self> {
        let prefix = prefix.map(validate_path).transpose()?.map(|p| p.to_string_lossy().into_owned());
        let credentials = Credentials::new(key_id, key_secret, None, None, "forge-config");
        let mut config_builder = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .credentials_provider(credentials)
            .region(Region::new(region.into()))
            // The SDK retries individual requests; the catalog loader retries
            // whole listings on top of that.
            .retry_config(RetryConfig::standard().with_max_attempts(2))
            // Path-style addressing for S3-compatible services.
            .force_path_style(true);
        if let Some(endpoint_url) = endpoint {
            config_builder = config_builder.endpoint_url(endpoint_url);
        }
        Ok(Self {
            name: name.into(),
            client: Client::from_conf(config_builder.build()),
            bucket: bucket.into(),
            prefix,
        })
    }

    /// Turn a listed object into a [`FileInfo`]. Keys that don't map onto a
    /// valid storage path (`assets/../../x.png` is a legal key) are
    /// [`MalformedEntry`](ErrorKind::MalformedEntry).
    fn file_info(&self, key: &str, object: &Object) -> Result<FileInfo> {
        let malformed = || ErrorKind::MalformedEntry(key.to_string());
        let path = validate_path(strip_key(self.prefix.as_deref(), key)).or_raise(malformed)?;
        let modified = match object.last_modified() {
            Some(dt) => OffsetDateTime::from_unix_timestamp_nanos(dt.as_nanos()).or_raise(malformed)?,
            None => OffsetDateTime::UNIX_EPOCH,
        };
        let size = object.size().and_then(|s| u64::try_from(s).ok()).unwrap_or(0);
        Ok(FileInfo::new(path, size, modified))
    }
}

fn join_key(prefix: Option<&str>, path: &str) -> String {
    match prefix {
        Some(prefix) => format!("{}/{}", prefix.trim_end_matches('/'), path),
        None => path.to_string(),
    }
}

fn strip_key<'a>(prefix: Option<&str>, key: &'a str) -> &'a str {
    match prefix {
        Some(prefix) => {
            let prefix = prefix.trim_end_matches('/');
            key.strip_prefix(prefix).and_then(|s| s.strip_prefix('/')).unwrap_or(key)
        },
        None => key,
    }
}

#[async_trait]
impl StorageBackend for S3Backend {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_stream<'a>(&'a self, prefix: Option<&'a Path>) -> FileInfoStream<'a> {
        let key_prefix = match prefix.map(validate_path).transpose() {
            // S3 prefixes are string-based; the trailing slash keeps them
            // component-based like the local backend.
            Ok(path) => path
                .map(|p| join_key(self.prefix.as_deref(), &p.to_string_lossy()))
                .or_else(|| self.prefix.clone())
                .map(|k| format!("{}/", k.trim_end_matches('/'))),
            Err(e) => return Box::pin(futures::stream::once(async move { Err(e) })),
        };

        Box::pin(stream! {
            let mut pages = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .set_prefix(key_prefix)
                .into_paginator()
                .send();
            while let Some(page) = pages.next().await {
                let page = match page {
                    Ok(page) => page,
                    Err(e) => { yield Err(exn::Exn::from(ErrorKind::Network(e.to_string()))); break; },
                };
                for object in page.contents() {
                    let Some(key) = object.key() else { continue };
                    // "Directory" placeholder objects.
                    if key.ends_with('/') {
                        continue;
                    }
                    yield self.file_info(key, object);
                }
            }
        })
    }
}
