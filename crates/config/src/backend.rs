use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A named storage backend, as declared under `backends:`.
///
/// ```yaml
/// backends:
///   public:
///     type: local
///     root: /srv/foundry/public
///   cloud:
///     type: s3
///     bucket: assets
///     region: us-west-004
///     key_id: ...
///     key_secret: ...
///     indexed: true
/// ```
///
/// `indexed: true` marks the backend as search-only; its packs become
/// special packs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BackendConfig {
    Local {
        root: PathBuf,
        #[serde(default)]
        indexed: bool,
    },
    S3 {
        bucket: String,
        #[serde(default)]
        prefix: Option<String>,
        region: String,
        #[serde(default)]
        endpoint: Option<String>,
        key_id: String,
        key_secret: String,
        #[serde(default)]
        indexed: bool,
    },
}
impl BackendConfig {
    pub fn indexed(&self) -> bool {
        match self {
            BackendConfig::Local { indexed, .. } | BackendConfig::S3 { indexed, .. } => *indexed,
        }
    }
}
