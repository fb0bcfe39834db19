use forge_catalog::{ContentKind, SourceDescriptor};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Sources found by listing a backend instead of being declared one by one.
///
/// Every directory directly below `root` becomes a pack named after the
/// directory, with one source per entry in `kinds`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoverConfig {
    pub backend: String,
    #[serde(default)]
    pub root: PathBuf,
    pub publisher: String,
    pub kinds: Vec<ContentKind>,
}
impl DiscoverConfig {
    /// The sources for one discovered pack directory (`dir` is relative to
    /// the root).
    pub fn sources_for(&self, dir: &str) -> Vec<SourceDescriptor> {
        let path = self.root.join(dir);
        self.kinds
            .iter()
            .map(|kind| SourceDescriptor::new(*kind, &self.publisher, dir, &self.backend, &path))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sources_for() {
        let rule = DiscoverConfig {
            backend: "forge-bazaar".to_string(),
            root: PathBuf::from("assets"),
            publisher: "Bazaar".to_string(),
            kinds: vec![ContentKind::Tiles, ContentKind::Sounds],
        };
        assert_eq!(
            rule.sources_for("dungeon-kit"),
            [
                SourceDescriptor::new(ContentKind::Tiles, "Bazaar", "dungeon-kit", "forge-bazaar", "assets/dungeon-kit"),
                SourceDescriptor::new(ContentKind::Sounds, "Bazaar", "dungeon-kit", "forge-bazaar", "assets/dungeon-kit"),
            ]
        );
    }
}
