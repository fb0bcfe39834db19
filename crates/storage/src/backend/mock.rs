//! In-memory storage backend for testing.

use super::FileInfoStream;
use crate::error::{ErrorKind, Result};
use crate::file::FileInfo;
use crate::path::validate as validate_path;
use crate::StorageBackend;
use async_stream::stream;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use time::OffsetDateTime;
use tokio::sync::RwLock;

/// How a mock backend misbehaves when listed.
#[derive(Debug, Clone, Copy)]
enum Failure {
    None,
    /// Every listing fails with a non-retryable error.
    Unavailable,
    /// The first `n` listings fail with a retryable network error.
    Flaky(usize),
}

/// In-memory storage backend for testing.
///
/// Files are stored in a map behind a [`RwLock`], so all trait methods can
/// operate on `&self`. Listings come out in path order. Failure injection
/// ([`unavailable`](Self::unavailable), [`flaky`](Self::flaky)) lets tests
/// exercise partial backend outages.
///
/// # Examples
///
/// ```
/// use forge_storage::backend::{MockBackend, StorageBackend};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let backend = MockBackend::with_files(["assets/caves/rock.png", "assets/caves/bat.png"]);
/// assert_eq!(backend.list(None).await.unwrap().files.len(), 2);
/// # }
/// ```
pub struct MockBackend {
    name: String,
    storage: RwLock<BTreeMap<PathBuf, (OffsetDateTime, u64)>>,
    failure: Failure,
    calls: AtomicUsize,
    enumerable: bool,
    malformed: Vec<String>,
}

impl MockBackend {
    /// Create a mock backend pre-populated with (empty) files.
    ///
    /// Panics if any path fails validation (e.g. path traversal). If test
    /// setup is wrong, then test should not pass.
    pub fn with_files(files: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        let now = OffsetDateTime::now_utc();
        let mut map = BTreeMap::new();
        for path in files {
            let path = path.into();
            let Ok(validated) = validate_path(&path) else {
                // The panic here is DELIBERATE. MockBackend is intended to be
                // used in tests; panics are expected. There is no error result.
                panic!("MockBackend::with_files: invalid path {}", path.display());
            };
            map.insert(validated, (now, 0));
        }
        Self {
            name: "mock".to_string(),
            storage: RwLock::new(map),
            failure: Failure::None,
            calls: AtomicUsize::new(0),
            enumerable: true,
            malformed: Vec::new(),
        }
    }

    /// Change the name of the mock backend.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Every listing request fails.
    pub fn unavailable(mut self) -> Self {
        self.failure = Failure::Unavailable;
        self
    }

    /// The first `failures` listing requests fail with a retryable error.
    pub fn flaky(mut self, failures: usize) -> Self {
        self.failure = Failure::Flaky(failures);
        self
    }

    /// Report the backend as search-only.
    pub fn search_only(mut self) -> Self {
        self.enumerable = false;
        self
    }

    /// Listings also report these keys, as entries that can't be turned
    /// into storage paths.
    pub fn with_malformed(mut self, keys: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.malformed.extend(keys.into_iter().map(Into::into));
        self
    }

    /// Number of listing requests made so far.
    pub fn list_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Add a file after construction.
    pub async fn insert(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = validate_path(path)?;
        self.storage.write().await.insert(path, (OffsetDateTime::now_utc(), 0));
        Ok(())
    }

    fn failure_for_call(&self, call: usize) -> Option<ErrorKind> {
        match self.failure {
            Failure::None => None,
            Failure::Unavailable => Some(ErrorKind::PermissionDenied(PathBuf::from(&self.name))),
            Failure::Flaky(n) if call < n => Some(ErrorKind::Network(format!("mock failure {} of {n}", call + 1))),
            Failure::Flaky(_) => None,
        }
    }
}
impl Default for MockBackend {
    fn default() -> Self {
        let files: [&str; 0] = [];
        Self::with_files(files)
    }
}

#[async_trait]
impl StorageBackend for MockBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_enumerable(&self) -> bool {
        self.enumerable
    }

    fn list_stream<'a>(&'a self, prefix: Option<&'a Path>) -> FileInfoStream<'a> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(kind) = self.failure_for_call(call) {
            return Box::pin(futures::stream::once(async move { Err(exn::Exn::from(kind)) }));
        }
        let validated_prefix = match prefix.map(validate_path).transpose() {
            Ok(pfx) => pfx,
            Err(e) => return Box::pin(futures::stream::once(async move { Err(e) })),
        };

        Box::pin(stream! {
            // Snapshot matching entries under the read lock, then drop it
            // before yielding to avoid holding the lock across yield points.
            let entries: Vec<FileInfo> = {
                let guard = self.storage.read().await;
                guard
                    .iter()
                    .filter(|(path, _)| match &validated_prefix {
                        Some(pfx) => path.starts_with(pfx),
                        None => true,
                    })
                    .map(|(path, (modified, size))| FileInfo::new(path.clone(), *size, *modified))
                    .collect()
            };
            for key in &self.malformed {
                yield Err(exn::Exn::from(ErrorKind::MalformedEntry(key.clone())));
            }
            for info in entries {
                yield Ok(info);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_list_with_prefix() {
        let backend = MockBackend::with_files(["caves/rock.png", "caves/bat.png", "woods/oak.png"]);
        let files = backend.list(Some(Path::new("caves"))).await.unwrap().files;
        let paths: Vec<_> = files.iter().map(|f| f.path.to_str().unwrap()).collect();
        assert_eq!(paths, vec!["caves/bat.png", "caves/rock.png"]);
    }

    #[tokio::test]
    async fn test_insert() {
        let backend = MockBackend::default();
        assert!(backend.list(None).await.unwrap().files.is_empty());
        backend.insert("a.png").await.unwrap();
        assert_eq!(backend.list(None).await.unwrap().files.len(), 1);
        assert!(backend.insert("../a.png").await.is_err());
    }

    #[tokio::test]
    async fn test_malformed_entries_are_skipped() {
        let backend = MockBackend::with_files(["caves/rock.png"]).with_malformed(["caves/../../x.png"]);
        let listing = backend.list(None).await.unwrap();
        assert_eq!(listing.files.len(), 1);
        assert_eq!(listing.skipped, 1);
    }

    #[tokio::test]
    async fn test_unavailable() {
        let backend = MockBackend::with_files(["a.png"]).unavailable();
        let err = backend.list(None).await.unwrap_err();
        assert!(!err.is_retryable());
        assert_eq!(backend.list_calls(), 1);
    }

    #[tokio::test]
    async fn test_flaky_recovers() {
        let backend = MockBackend::with_files(["a.png"]).flaky(2);
        assert!(backend.list(None).await.unwrap_err().is_retryable());
        assert!(backend.list(None).await.is_err());
        assert_eq!(backend.list(None).await.unwrap().files.len(), 1);
        assert_eq!(backend.list_calls(), 3);
    }

    #[test]
    #[should_panic(expected = "invalid path")]
    fn test_with_files_panics_on_bad_path() {
        MockBackend::with_files(["../escape"]);
    }
}
