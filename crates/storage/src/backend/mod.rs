//! Storage backend trait and implementations.
//!
//! A storage backend is anything a catalog can be browsed from: a directory
//! on disk, an S3-compatible bucket, or (in tests) memory. Backends only need
//! to list what they hold; catalogs never write.

mod indexed;
mod local;
#[cfg(feature = "mock")]
mod mock;
#[cfg(feature = "s3")]
mod s3;

pub use self::indexed::IndexedBackend;
pub use self::local::LocalBackend;
#[cfg(feature = "mock")]
pub use self::mock::MockBackend;
#[cfg(feature = "s3")]
pub use self::s3::S3Backend;
use crate::error::{ErrorKind, Result};
use crate::file::{FileInfo, Listing};
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use std::path::Path;
use std::pin::Pin;

type FileInfoStream<'a> = Pin<Box<dyn Stream<Item = Result<FileInfo>> + Send + 'a>>;

/// Unified interface for browsing storage backends.
///
/// All operations are asynchronous since most backends sit behind a network.
///
/// # Path Handling
/// All paths are relative to the storage root and must be validated using
/// [`validate_path`](crate::validate_path) before use. Implementations should
/// enforce this validation.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use forge_storage::{backend::StorageBackend, error::Result};
///
/// async fn count_icons(backend: &dyn StorageBackend) -> Result<usize> {
///     Ok(backend.list(Some(Path::new("icons"))).await?.files.len())
/// }
/// ```
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Name of the configured backend (name taken from the configuration
    /// object key). Sources refer to their backend by this name.
    fn name(&self) -> &str;

    /// Whether the backend can list its whole contents.
    ///
    /// Search-indexed backends can't (or shouldn't) be enumerated; packs
    /// sourced from them are flagged as special and only offered to queries.
    fn is_enumerable(&self) -> bool {
        true
    }

    /// List all files under an optional prefix.
    ///
    /// Default implementation of this method is to drain
    /// [`list_stream()`](Self::list_stream) into a [`Listing`]. Entries that
    /// fail with [`MalformedEntry`](ErrorKind::MalformedEntry) are skipped and
    /// counted; any other failure fails the whole listing.
    async fn list(&self, prefix: Option<&Path>) -> Result<Listing> {
        let mut listing = Listing::default();
        let mut stream = self.list_stream(prefix);
        while let Some(item) = stream.next().await {
            match item {
                Ok(file) => listing.files.push(file),
                Err(err) if matches!(&*err, ErrorKind::MalformedEntry(_)) => {
                    tracing::debug!(backend = self.name(), error = ?err, "Skipping malformed entry");
                    listing.skipped += 1;
                },
                Err(err) => return Err(err),
            }
        }
        Ok(listing)
    }

    /// Stream file metadata under an optional prefix.
    ///
    /// Yields results incrementally. If a prefix is provided, only files
    /// whose paths start with the prefix (component-wise) are returned.
    /// Listing a prefix that doesn't exist yields nothing rather than an
    /// error.
    ///
    /// # Examples
    ///
    /// ```
    /// use futures::TryStreamExt;
    /// use std::path::Path;
    /// # use forge_storage::{backend::StorageBackend, error::Result};
    /// # async fn example(backend: &dyn StorageBackend) -> Result<()> {
    /// let mut stream = backend.list_stream(Some(Path::new("assets/caves")));
    /// while let Some(info) = stream.try_next().await? {
    ///     println!("{}: {} bytes", info.path.display(), info.size);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    fn list_stream<'a>(&'a self, prefix: Option<&'a Path>) -> FileInfoStream<'a>;
}
