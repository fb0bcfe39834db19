use crate::models::kind::ContentKind;
use crate::models::pack::PackRef;
use serde::{Deserialize, Serialize};

/// One browsable asset.
///
/// Built once from a backend listing and never patched afterwards; a changed
/// listing produces new entries on the next scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetEntry {
    /// Path of the asset on its backend. Unique within the owning pack.
    pub id: String,
    pub label: String,
    /// Reference to a preview image, in `backend:path` form.
    pub thumbnail: Option<String>,
    pub pack: PackRef,
    pub kind: ContentKind,
    /// Lower-cased path and label, matched against search terms.
    pub searchable: String,
}
impl AssetEntry {
    /// Create an asset from a listed path. The label is derived from the
    /// file stem and the search blob from both.
    pub fn new(kind: ContentKind, pack: PackRef, backend: &str, id: impl Into<String>, stem: &str) -> Self {
        let id = id.into();
        let label = pretty_label(stem);
        let searchable = format!("{} {}", id, label).to_lowercase();
        let thumbnail = kind.has_thumbnail().then(|| format!("{backend}:{id}"));
        Self {
            id,
            label,
            thumbnail,
            pack,
            kind,
            searchable,
        }
    }

    /// Case-insensitive substring match. `term` must already be lower-cased;
    /// an empty term matches everything.
    pub fn matches(&self, term: &str) -> bool {
        term.is_empty() || self.searchable.contains(term)
    }

    pub fn describe(&self) -> AssetCard {
        self.kind.describe_asset(self)
    }
}

/// Pre-formatted asset, as handed to the display surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetCard {
    pub label: String,
    pub thumbnail: Option<String>,
    pub badge: Option<&'static str>,
}

/// `dark_forest-01` becomes `dark forest 01`.
fn pretty_label(stem: &str) -> String {
    stem.split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("dark_forest-01", "dark forest 01")]
    #[case("  Oak   Tree ", "Oak Tree")]
    #[case("__", "")]
    fn test_pretty_label(#[case] stem: &str, #[case] expected: &str) {
        assert_eq!(pretty_label(stem), expected);
    }

    #[test]
    fn test_new_builds_search_blob() {
        let asset = AssetEntry::new(
            ContentKind::Tiles,
            PackRef::new("Bazaar", "Caves"),
            "bazaar",
            "assets/caves/Stalagmite_Big.webp",
            "Stalagmite_Big",
        );
        assert_eq!(asset.label, "Stalagmite Big");
        assert_eq!(asset.thumbnail.as_deref(), Some("bazaar:assets/caves/Stalagmite_Big.webp"));
        assert!(asset.matches("stalagmite big"));
        assert!(asset.matches("caves/"));
        assert!(asset.matches(""));
        assert!(!asset.matches("Stalagmite"), "terms are lower-cased by the caller");
    }

    #[test]
    fn test_sounds_have_no_thumbnail() {
        let asset = AssetEntry::new(
            ContentKind::Sounds,
            PackRef::new("Bazaar", "Ambience"),
            "bazaar",
            "assets/ambience/rain.ogg",
            "rain",
        );
        assert_eq!(asset.thumbnail, None);
        let card = asset.describe();
        assert_eq!(card.badge, Some("sound"));
        assert_eq!(card.label, "rain");
    }
}
