use crate::models::asset::AssetEntry;
use crate::models::pack::{PackEntry, PackRef};

/// Which packs a search is restricted to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PackFilter {
    #[default]
    All,
    Pack(PackRef),
}
impl PackFilter {
    pub fn admits(&self, pack: &PackRef) -> bool {
        match self {
            PackFilter::All => true,
            PackFilter::Pack(wanted) => wanted == pack,
        }
    }

    pub fn admits_entry(&self, pack: &PackEntry) -> bool {
        match self {
            PackFilter::All => true,
            PackFilter::Pack(wanted) => pack.is(wanted),
        }
    }
}
impl From<Option<PackRef>> for PackFilter {
    fn from(pack: Option<PackRef>) -> Self {
        pack.map(PackFilter::Pack).unwrap_or_default()
    }
}

/// A free-text search, optionally restricted to one pack. Not persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    term: String,
    pub pack: PackFilter,
}
impl SearchQuery {
    pub fn new(term: impl AsRef<str>, pack: impl Into<PackFilter>) -> Self {
        Self {
            term: term.as_ref().trim().to_lowercase(),
            pack: pack.into(),
        }
    }

    /// The empty query: every asset of every pack.
    pub fn everything() -> Self {
        Self::default()
    }

    /// The lower-cased, trimmed search term.
    pub fn term(&self) -> &str {
        &self.term
    }

    pub fn has_term(&self) -> bool {
        !self.term.is_empty()
    }

    pub fn matches(&self, asset: &AssetEntry) -> bool {
        self.pack.admits(&asset.pack) && asset.matches(&self.term)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::kind::ContentKind;

    fn asset(pack: &PackRef, id: &str) -> AssetEntry {
        AssetEntry::new(ContentKind::Images, pack.clone(), "mock", id, id)
    }

    #[test]
    fn test_term_is_normalized() {
        let query = SearchQuery::new("  Dark FOREST ", PackFilter::All);
        assert_eq!(query.term(), "dark forest");
        assert!(query.has_term());
        assert!(!SearchQuery::new("   ", PackFilter::All).has_term());
    }

    #[test]
    fn test_matches_pack_and_term() {
        let caves = PackRef::new("Bazaar", "Caves");
        let woods = PackRef::new("Bazaar", "Woods");
        let query = SearchQuery::new("ROCK", Some(caves.clone()));
        assert!(query.matches(&asset(&caves, "big_rock")));
        assert!(!query.matches(&asset(&caves, "stalagmite")));
        assert!(!query.matches(&asset(&woods, "big_rock")));
        assert!(SearchQuery::everything().matches(&asset(&woods, "anything")));
    }
}
