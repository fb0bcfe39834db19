use forge_catalog::{AssetCount, AssetEntry, CatalogSlice, PackEntry, PackFilter, SearchQuery};

/// Result of filtering a catalog slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Search {
    /// Matching assets, in load order. Never empty.
    Matches(Vec<AssetEntry>),
    /// Nothing matched.
    Empty,
    /// There's no search term and every visible pack is search-only, so
    /// there's nothing sensible to enumerate.
    QueryRequired,
}

/// Filter `slice` by `query`.
///
/// `debug_scan` enumerates search-only packs even without a term.
pub fn search(slice: &CatalogSlice, query: &SearchQuery, debug_scan: bool) -> Search {
    if !query.has_term() && !debug_scan {
        let mut visible = slice.visible_packs(&query.pack).peekable();
        if visible.peek().is_some() && visible.all(|p| p.special) {
            return Search::QueryRequired;
        }
    }
    let matches: Vec<AssetEntry> = slice.assets.iter().filter(|a| query.matches(a)).cloned().collect();
    match matches.is_empty() {
        true => Search::Empty,
        false => Search::Matches(matches),
    }
}

/// Pack selector contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackListing {
    /// Visible packs, sorted by publisher then name.
    pub packs: Vec<PackEntry>,
    pub count: AssetCount,
}
impl PackListing {
    pub fn new(slice: &CatalogSlice) -> Self {
        let mut packs: Vec<PackEntry> = slice.visible_packs(&PackFilter::All).cloned().collect();
        PackEntry::sort(&mut packs);
        Self {
            packs,
            count: slice.asset_count(),
        }
    }
}
