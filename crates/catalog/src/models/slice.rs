use crate::models::asset::AssetEntry;
use crate::models::count::AssetCount;
use crate::models::pack::PackEntry;
use crate::models::query::PackFilter;

/// Diagnostics gathered while building a [`CatalogSlice`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    /// Sources that were browsed.
    pub sources: usize,
    /// Sources whose backend was missing or whose browse failed.
    pub failed_sources: usize,
    /// Listing entries dropped for missing or unusable fields.
    pub dropped: usize,
    /// Listing entries dropped because the same `(pack, id)` was already seen.
    pub duplicates: usize,
}

/// Every pack and asset known to one browsing module.
///
/// Slices are built whole and replaced whole; nothing appends to an existing
/// slice. Equality ignores [`LoadStats`].
#[derive(Debug, Clone, Default)]
pub struct CatalogSlice {
    pub packs: Vec<PackEntry>,
    pub assets: Vec<AssetEntry>,
    pub stats: LoadStats,
}
impl CatalogSlice {
    pub fn new(packs: Vec<PackEntry>, assets: Vec<AssetEntry>) -> Self {
        Self {
            packs,
            assets,
            stats: LoadStats::default(),
        }
    }

    pub fn with_stats(mut self, stats: LoadStats) -> Self {
        self.stats = stats;
        self
    }

    /// Every source was browsed and none of them answered. Such a slice
    /// says nothing about the catalog and must not be cached.
    pub fn is_complete_failure(&self) -> bool {
        self.stats.sources > 0 && self.stats.failed_sources == self.stats.sources
    }

    /// Packs shown in the selector that pass `filter`, in load order.
    pub fn visible_packs<'a>(&'a self, filter: &'a PackFilter) -> impl Iterator<Item = &'a PackEntry> + 'a {
        self.packs.iter().filter(move |p| p.is_visible() && filter.admits_entry(p))
    }

    /// Sum of the non-special pack counts, flagged as a lower bound when any
    /// visible pack is special.
    pub fn asset_count(&self) -> AssetCount {
        self.visible_packs(&PackFilter::All).fold(AssetCount::default(), |count, pack| match pack.special {
            true => count.at_least(),
            false => count.add(pack.count),
        })
    }
}
impl PartialEq for CatalogSlice {
    fn eq(&self, other: &Self) -> bool {
        self.packs == other.packs && self.assets == other.assets
    }
}
impl Eq for CatalogSlice {}
