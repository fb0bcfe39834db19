//! Turning configured backends into live [`BackendHandle`]s.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use forge_config::BackendConfig;
use forge_storage::BackendHandle;
use forge_storage::backend::{IndexedBackend, LocalBackend};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Live backends, keyed by the name sources refer to them by.
pub type Backends = HashMap<String, BackendHandle>;

/// Construct every configured backend. Backends marked `indexed` are
/// wrapped so their packs become special.
///
/// Fails on the first backend that can't be constructed; a local root that
/// doesn't exist is a configuration mistake, not a temporary outage.
pub async fn build(config: &BTreeMap<String, BackendConfig>) -> Result<Backends> {
    let mut backends = Backends::with_capacity(config.len());
    for (name, backend) in config {
        let handle = connect(name, backend).await?;
        let handle: BackendHandle = match backend.indexed() {
            true => Arc::new(IndexedBackend::new(handle)),
            false => handle,
        };
        tracing::debug!(backend = %name, enumerable = handle.is_enumerable(), "Backend ready");
        backends.insert(name.clone(), handle);
    }
    Ok(backends)
}

async fn connect(name: &str, backend: &BackendConfig) -> Result<BackendHandle> {
    match backend {
        BackendConfig::Local { root, .. } => {
            let local = LocalBackend::new(name, root).or_raise(|| ErrorKind::Backend(name.to_string()))?;
            Ok(Arc::new(local))
        },
        #[cfg(feature = "s3")]
        BackendConfig::S3 {
            bucket,
            prefix,
            region,
            endpoint,
            key_id,
            key_secret,
            ..
        } => {
            let s3 = forge_storage::backend::S3Backend::new(
                name,
                bucket,
                prefix.clone(),
                region,
                endpoint.as_deref(),
                key_id,
                key_secret,
            )
            .await
            .or_raise(|| ErrorKind::Backend(name.to_string()))?;
            Ok(Arc::new(s3))
        },
        #[cfg(not(feature = "s3"))]
        BackendConfig::S3 { .. } => exn::bail!(ErrorKind::UnsupportedBackend(name.to_string())),
    }
}
