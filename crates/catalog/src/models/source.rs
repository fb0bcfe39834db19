use crate::models::kind::ContentKind;
use crate::models::pack::PackRef;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A content source the browser is allowed to scan: one pack, published by
/// someone, stored under `path` on the storage backend named `backend`.
///
/// Supplied by configuration (or the host) and never modified afterwards.
/// Two descriptors are the same source when their `(backend, path)` match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceDescriptor {
    #[serde(rename = "type")]
    pub kind: ContentKind,
    pub publisher: String,
    pub pack: String,
    pub backend: String,
    pub path: PathBuf,
}
impl SourceDescriptor {
    pub fn new(
        kind: ContentKind,
        publisher: impl Into<String>,
        pack: impl Into<String>,
        backend: impl Into<String>,
        path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            kind,
            publisher: publisher.into(),
            pack: pack.into(),
            backend: backend.into(),
            path: path.into(),
        }
    }

    pub fn id(&self) -> (&str, &Path) {
        (&self.backend, &self.path)
    }

    pub fn pack_ref(&self) -> PackRef {
        PackRef::new(&self.publisher, &self.pack)
    }
}
