//! Building catalog slices from sources.
//!
//! Every source is browsed once per load. Browses run concurrently, but
//! their results are merged in source order, so identical backend state
//! always produces identical slices. Sources can also be discovered by
//! listing a backend ([`Loader::discover`]).

mod normalize;
mod retry;

use crate::backends::Backends;
use crate::error::{ErrorKind, Result};
use crate::loader::normalize::normalize;
use crate::loader::retry::with_retry;
use exn::{OptionExt, ResultExt};
use forge_catalog::{AssetEntry, CatalogSlice, LoadStats, PackEntry, PackFilter, PackRef, SourceDescriptor};
use forge_config::{DEFAULT_CONCURRENCY, DiscoverConfig, RetryConfig};
use forge_storage::{BackendHandle, Listing};
use futures::{StreamExt, stream};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::Path;
use tracing::instrument;

/// What one successful browse produced.
struct Browsed {
    backend: BackendHandle,
    listing: Listing,
}

pub struct Loader {
    backends: Backends,
    retry: RetryConfig,
    concurrency: usize,
}

impl Loader {
    pub fn new(backends: Backends) -> Self {
        Self {
            backends,
            retry: RetryConfig::default(),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Maximum number of sources browsed at the same time.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Register a backend under its own name, returning the one it replaces.
    pub fn insert_backend(&mut self, backend: BackendHandle) -> Option<BackendHandle> {
        self.backends.insert(backend.name().to_string(), backend)
    }

    /// Packs found across `sources`, in source order.
    pub async fn load_packs(&self, sources: &[SourceDescriptor]) -> Vec<PackEntry> {
        self.load_slice(sources).await.packs
    }

    /// Assets found across `sources`. With a pack filter, only the sources
    /// belonging to that pack are browsed.
    pub async fn load_assets(&self, sources: &[SourceDescriptor], filter: Option<&PackFilter>) -> Vec<AssetEntry> {
        let sources: Vec<SourceDescriptor> = match filter {
            Some(filter) => sources.iter().filter(|s| filter.admits(&s.pack_ref())).cloned().collect(),
            None => sources.to_vec(),
        };
        self.load_slice(&sources).await.assets
    }

    /// Browse every source once and derive both packs and assets.
    ///
    /// Never fails: a source whose backend is missing or whose browse fails
    /// contributes nothing and is counted in [`LoadStats::failed_sources`].
    #[instrument(skip_all, fields(sources = sources.len()))]
    pub async fn load_slice(&self, sources: &[SourceDescriptor]) -> CatalogSlice {
        let browses: Vec<Result<Browsed>> = stream::iter(sources)
            .map(|source| self.browse(source))
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut stats = LoadStats {
            sources: sources.len(),
            ..LoadStats::default()
        };
        let mut packs: Vec<PackEntry> = Vec::new();
        let mut pack_index: HashMap<PackRef, usize> = HashMap::new();
        let mut seen: HashSet<(PackRef, String)> = HashSet::new();
        let mut assets = Vec::new();

        for (source, browsed) in sources.iter().zip(browses) {
            let browsed = match browsed {
                Ok(browsed) => browsed,
                Err(err) => {
                    tracing::warn!(pack = %source.pack_ref(), backend = %source.backend, error = ?err, "Source unavailable");
                    stats.failed_sources += 1;
                    continue;
                },
            };
            let pack = source.pack_ref();
            let normalized = normalize(source, browsed.backend.name(), browsed.listing.files);
            stats.dropped += browsed.listing.skipped + normalized.dropped;

            let mut count = 0;
            for asset in normalized.assets {
                if !seen.insert((pack.clone(), asset.id.clone())) {
                    tracing::debug!(pack = %pack, id = %asset.id, "Dropping duplicate entry");
                    stats.duplicates += 1;
                    continue;
                }
                count += 1;
                assets.push(asset);
            }

            let special = !browsed.backend.is_enumerable();
            match pack_index.get(&pack) {
                Some(&index) => {
                    packs[index].count += count;
                    packs[index].special |= special;
                },
                None => {
                    pack_index.insert(pack.clone(), packs.len());
                    packs.push(PackEntry::new(pack, count, special));
                },
            }
        }

        tracing::info!(
            packs = packs.len(),
            assets = assets.len(),
            failed_sources = stats.failed_sources,
            dropped = stats.dropped,
            duplicates = stats.duplicates,
            "Catalog loaded",
        );
        CatalogSlice::new(packs, assets).with_stats(stats)
    }

    /// Sources for every pack directory directly below the rule's root, in
    /// directory name order.
    ///
    /// A backend that is missing or can't be listed discovers nothing.
    #[instrument(skip_all, fields(backend = %rule.backend))]
    pub async fn discover(&self, rule: &DiscoverConfig) -> Vec<SourceDescriptor> {
        let Some(backend) = self.backends.get(&rule.backend) else {
            tracing::warn!("Discovery on unknown backend");
            return Vec::new();
        };
        let prefix = (!rule.root.as_os_str().is_empty()).then_some(rule.root.as_path());
        let listing = match with_retry(&self.retry, || backend.list(prefix)).await {
            Ok(listing) => listing,
            Err(err) => {
                tracing::warn!(error = ?err, "Discovery failed");
                return Vec::new();
            },
        };
        let dirs: BTreeSet<&str> = listing.files.iter().filter_map(|file| pack_dir(&rule.root, &file.path)).collect();
        tracing::debug!(packs = dirs.len(), "Discovered packs");
        dirs.into_iter().flat_map(|dir| rule.sources_for(dir)).collect()
    }

    async fn browse(&self, source: &SourceDescriptor) -> Result<Browsed> {
        let backend = self
            .backends
            .get(&source.backend)
            .ok_or_raise(|| ErrorKind::UnknownBackend(source.backend.clone()))?;
        // An empty path means the whole backend.
        let prefix = (!source.path.as_os_str().is_empty()).then_some(source.path.as_path());
        let listing = with_retry(&self.retry, || backend.list(prefix))
            .await
            .or_raise(|| ErrorKind::SourceUnavailable(source.pack_ref()))?;
        tracing::trace!(pack = %source.pack_ref(), files = listing.files.len(), skipped = listing.skipped, "Browsed source");
        Ok(Browsed {
            backend: backend.clone(),
            listing,
        })
    }
}

/// The directory right below `root` that `path` sits in. Files directly in
/// `root` belong to no pack.
fn pack_dir<'p>(root: &Path, path: &'p Path) -> Option<&'p str> {
    let mut components = path.strip_prefix(root).ok()?.components();
    let dir = components.next()?;
    components.next()?;
    dir.as_os_str().to_str()
}
