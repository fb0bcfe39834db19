//! Local filesystem storage backend.
//!
//! Browses a configured directory using `tokio::fs` for async I/O. This is
//! what host-provided "public" and "data" folders map onto.

use crate::backend::FileInfoStream;
use crate::error::ErrorKind;
use crate::{FileInfo, StorageBackend, error::Result, path::validate as validate_path};
use async_stream::stream;
use async_trait::async_trait;
use exn::ResultExt;
use std::path::{Path, PathBuf};
use tokio::fs::{self, DirEntry};

enum WalkEntry {
    File(FileInfo),
    Descend(PathBuf),
    Skip,
}

/// Local filesystem storage backend.
///
/// All paths are relative to the configured root directory.
///
/// # Examples
///
/// ```no_run
/// use forge_storage::backend::LocalBackend;
///
/// let backend = LocalBackend::new("public", "/srv/foundry/public").ok();
/// ```
#[derive(Clone)]
pub struct LocalBackend {
    name: String,
    /// Root directory that source paths are relative to
    root: PathBuf,
}
impl LocalBackend {
    /// Create a new local filesystem backend.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidPath`](ErrorKind::InvalidPath) if the root is not
    /// absolute or is not a directory, and [`NotFound`](ErrorKind::NotFound)
    /// if it doesn't exist. Browsing never creates directories.
    pub fn new(name: impl Into<String>, root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_absolute() {
            exn::bail!(ErrorKind::InvalidPath(root));
        }
        if !root.exists() {
            exn::bail!(ErrorKind::NotFound(root));
        }
        if !root.is_dir() {
            exn::bail!(ErrorKind::InvalidPath(root));
        }
        Ok(Self { name: name.into(), root })
    }

    /// Convert an absolute path back to a relative storage path.
    fn relative_path(&self, absolute: impl AsRef<Path>) -> Result<PathBuf> {
        let absolute = absolute.as_ref();
        let relative = absolute.strip_prefix(&self.root).or_raise(|| {
            ErrorKind::BackendError(format!("path `{:?}` is not within root `{:?}`", absolute, self.root))
        })?;
        validate_path(relative)
    }

    fn map_io_error(e: std::io::Error, path: &Path) -> ErrorKind {
        match e.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied(path.to_path_buf()),
            _ => ErrorKind::Io(e),
        }
    }

    /// Classify one directory entry.
    async fn process_entry(&self, entry: DirEntry, prefix: Option<&Path>) -> Result<WalkEntry> {
        let path = entry.path();
        let metadata = entry.metadata().await.map_err(|e| Self::map_io_error(e, &path))?;
        let relative = self
            .relative_path(&path)
            .or_raise(|| ErrorKind::MalformedEntry(path.display().to_string()))?;
        if metadata.is_dir() {
            // Only descend into directories that can still contain matches.
            return Ok(match prefix {
                Some(pfx) if !relative.starts_with(pfx) && !pfx.starts_with(&relative) => WalkEntry::Skip,
                _ => WalkEntry::Descend(path),
            });
        }
        if let Some(pfx) = prefix
            && !relative.starts_with(pfx)
        {
            return Ok(WalkEntry::Skip);
        }
        if !metadata.is_file() {
            // Most likely a broken symlink.
            return Ok(WalkEntry::Skip);
        }
        let modified = metadata.modified().map_err(ErrorKind::Io)?;
        Ok(WalkEntry::File(FileInfo::new(relative, metadata.len(), modified)))
    }
}

#[async_trait]
impl StorageBackend for LocalBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_stream<'a>(&'a self, prefix: Option<&'a Path>) -> FileInfoStream<'a> {
        let validated_prefix = match prefix.map(validate_path).transpose() {
            Ok(pfx) => pfx,
            Err(e) => return Box::pin(futures::stream::once(async move { Result::Err(e) })),
        };

        // Walk from the parent of the prefix: the leaf component may be a
        // file, or not exist at all. Path::starts_with is component-based,
        // so "assets/cave" never matches "assets/caves/rock.png".
        let start_dir = validated_prefix
            .as_ref()
            .map(|prefix| self.root.join(prefix).parent().unwrap_or(&self.root).to_path_buf())
            .unwrap_or_else(|| self.root.clone());
        let mut stack = vec![start_dir];

        Box::pin(stream! {
            while let Some(current) = stack.pop() {
                let mut entries = match fs::read_dir(&current).await {
                    Ok(entries) => entries,
                    // Same as S3: a directory that doesn't exist is empty.
                    Err(err) if err.kind() == std::io::ErrorKind::NotFound => continue,
                    Err(err) => {
                        yield Err(exn::Exn::from(Self::map_io_error(err, &current)));
                        continue;
                    },
                };
                loop {
                    let entry = match entries.next_entry().await {
                        Ok(Some(entry)) => entry,
                        Ok(None) => break,
                        Err(err) => {
                            yield Err(exn::Exn::from(Self::map_io_error(err, &current)));
                            break;
                        },
                    };
                    match self.process_entry(entry, validated_prefix.as_deref()).await {
                        Ok(WalkEntry::File(file)) => yield Ok(file),
                        Ok(WalkEntry::Descend(dir)) => stack.push(dir),
                        Ok(WalkEntry::Skip) => {},
                        Err(err) => yield Err(err),
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend_with(files: &[&str]) -> (tempfile::TempDir, LocalBackend) {
        let temp_dir = tempfile::tempdir().unwrap();
        for file in files {
            let path = temp_dir.path().join(file);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(&path, b"data").unwrap();
        }
        let backend = LocalBackend::new("public", temp_dir.path()).unwrap();
        (temp_dir, backend)
    }

    #[test]
    fn test_new_requires_existing_absolute_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(LocalBackend::new("public", temp_dir.path()).is_ok());
        assert!(LocalBackend::new("public", "relative/path").is_err());
        let missing = LocalBackend::new("public", temp_dir.path().join("missing")).err().unwrap();
        assert!(matches!(&*missing, ErrorKind::NotFound(_)));
        std::fs::write(temp_dir.path().join("file"), b"").unwrap();
        assert!(LocalBackend::new("public", temp_dir.path().join("file")).is_err());
    }

    #[test]
    fn test_relative_path() {
        let (temp_dir, backend) = backend_with(&[]);
        let absolute = temp_dir.path().join("icons/svg/dice.svg");
        assert_eq!(backend.relative_path(&absolute).unwrap(), Path::new("icons/svg/dice.svg"));
        assert!(backend.relative_path("/other/file.png").is_err());
    }

    #[tokio::test]
    async fn test_list_all() {
        let (_dir, backend) = backend_with(&["icons/a.png", "icons/svg/b.svg", "sounds/rain.ogg"]);
        let files = backend.list(None).await.unwrap().files;
        assert_eq!(files.len(), 3);
        assert!(files.iter().all(|f| f.size == 4));
    }

    #[tokio::test]
    async fn test_list_with_prefix_is_component_based() {
        let (_dir, backend) = backend_with(&["assets/caves/rock.png", "assets/cavern/bat.png", "assets/caves.png"]);
        let mut files = backend.list(Some(Path::new("assets/caves"))).await.unwrap().files;
        assert_eq!(files.len(), 1);
        assert_eq!(files.pop().unwrap().path, Path::new("assets/caves/rock.png"));
    }

    #[tokio::test]
    async fn test_list_nested_prefix() {
        let (_dir, backend) = backend_with(&["a/b/c/deep.png", "a/other.png"]);
        let files = backend.list(Some(Path::new("a/b"))).await.unwrap().files;
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, Path::new("a/b/c/deep.png"));
    }

    #[tokio::test]
    async fn test_list_nonexistent_prefix() {
        let (_dir, backend) = backend_with(&["icons/a.png"]);
        let files = backend.list(Some(Path::new("nonexistent/"))).await.unwrap().files;
        assert!(files.is_empty());
    }

    #[tokio::test]
    async fn test_list_invalid_prefix() {
        let (_dir, backend) = backend_with(&["icons/a.png"]);
        let err = backend.list(Some(Path::new("../outside"))).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidPath(_)));
    }
}
