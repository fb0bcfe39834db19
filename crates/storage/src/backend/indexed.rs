//! Search-indexed storage backend decorator.
//!
//! Some asset hosts are only meant to be queried: their listings are partial
//! (a featured subset, the first page of an index) and the full catalog is
//! unbounded. Wrapping such a backend marks it as non-enumerable, which turns
//! every pack sourced from it into a *special* pack.

use async_trait::async_trait;
use std::path::Path;

use crate::{BackendHandle, StorageBackend, backend::FileInfoStream};

/// Search-only storage backend.
///
/// Delegates every call to the wrapped backend, but reports
/// [`is_enumerable()`](StorageBackend::is_enumerable) as `false`.
#[derive(Clone)]
pub struct IndexedBackend {
    inner: BackendHandle,
}
impl IndexedBackend {
    pub fn new(inner: BackendHandle) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl StorageBackend for IndexedBackend {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn is_enumerable(&self) -> bool {
        false
    }

    fn list_stream<'a>(&'a self, prefix: Option<&'a Path>) -> FileInfoStream<'a> {
        tracing::trace!(backend = self.inner.name(), "Listing search-indexed backend; results are partial");
        self.inner.list_stream(prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::LocalBackend;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_delegates_but_is_not_enumerable() {
        let temp_dir = tempfile::tempdir().unwrap();
        std::fs::write(temp_dir.path().join("featured.png"), b"data").unwrap();
        let inner = LocalBackend::new("index", temp_dir.path()).unwrap();
        assert!(inner.is_enumerable());
        let backend = IndexedBackend::new(Arc::new(inner));
        assert!(!backend.is_enumerable());
        assert_eq!(backend.name(), "index");
        let listing = backend.list(None).await.unwrap();
        assert_eq!(listing.files.len(), 1);
        assert_eq!(listing.files[0].size, 4);
    }
}
