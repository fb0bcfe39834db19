use crate::backends::{self, Backends};
use crate::error::Result;
use crate::loader::Loader;
use crate::paginate::ResultSet;
use crate::registry::{ModuleDescriptor, ModuleRegistry, Selection};
use crate::search::{PackListing, Search, search};
use forge_cache::{CacheKey, CatalogCache};
use forge_catalog::{CatalogSlice, ContentKind, SearchQuery, SourceDescriptor};
use forge_config::{Config, DiscoverConfig};
use forge_storage::BackendHandle;
use std::collections::HashSet;
use std::sync::Arc;

/// What a search (or a module change) leaves the display surface with.
///
/// None of these are errors; each one is a state the surface shows.
#[derive(Debug)]
pub enum Outcome {
    /// At least one match, ready to be revealed a page at a time.
    Results(ResultSet),
    Empty,
    /// Only search-only packs are visible; ask for a search term.
    QueryRequired,
    NoActiveModule,
    NoModulesRegistered,
}

/// A browsing session.
///
/// Catalogs are loaded the first time a module needs them and served from
/// the cache after that, until the session restarts or a backend they
/// depend on is replaced. Overlapping searches for the same module may load
/// the catalog twice; the last one to finish wins the cache slot.
pub struct Forge {
    page_size: usize,
    debug_scan: bool,
    sources: Vec<SourceDescriptor>,
    registry: ModuleRegistry,
    loader: Loader,
    cache: CatalogCache,
    active: Option<String>,
}

impl Forge {
    pub fn new(config: &Config, backends: Backends) -> Self {
        Self {
            page_size: config.page_size,
            debug_scan: config.debug_scan,
            sources: config.declared_sources(),
            registry: ModuleRegistry::from_config(&config.modules),
            loader: Loader::new(backends).with_retry(config.retry).with_concurrency(config.concurrency),
            cache: CatalogCache::new(config.cache_capacity),
            active: None,
        }
    }

    /// Build the configured backends, discover sources on them and start
    /// from there.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let backends = backends::build(&config.backends).await?;
        let mut forge = Self::new(config, backends);
        forge.discover(&config.discover).await;
        Ok(forge)
    }

    /// Add the sources found by each discovery rule, after the ones already
    /// known. Returns how many were added.
    pub async fn discover(&mut self, rules: &[DiscoverConfig]) -> usize {
        let before = self.sources.len();
        for rule in rules {
            let found = self.loader.discover(rule).await;
            self.sources.extend(found);
        }
        self.sources.len() - before
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    pub fn cache(&self) -> &CatalogCache {
        &self.cache
    }

    pub fn active_module(&self) -> Option<&ModuleDescriptor> {
        self.active.as_deref().and_then(|id| self.registry.get(id))
    }

    /// Forget every cached catalog and the active module.
    pub fn start_session(&mut self) {
        self.cache.clear_all();
        self.active = None;
        tracing::info!(modules = self.registry.list().len(), sources = self.sources.len(), "Session started");
    }

    /// Start a session on `requested` (or the first module, when that isn't
    /// registered) and run an empty search on it.
    pub async fn open(&mut self, requested: Option<&str>) -> Outcome {
        self.start_session();
        self.activate(requested).await
    }

    /// Switch modules and run an empty search on the new one.
    pub async fn select_module(&mut self, id: &str) -> Outcome {
        self.activate(Some(id)).await
    }

    async fn activate(&mut self, requested: Option<&str>) -> Outcome {
        let id = match self.registry.resolve(requested) {
            Selection::Module(module) => module.id.clone(),
            Selection::NoModulesRegistered => {
                self.active = None;
                return Outcome::NoModulesRegistered;
            },
        };
        tracing::debug!(module = %id, "Module selected");
        self.active = Some(id);
        self.search(&SearchQuery::everything()).await
    }

    /// Search the active module's catalog, loading it if it isn't cached.
    pub async fn search(&self, query: &SearchQuery) -> Outcome {
        if self.registry.is_empty() {
            return Outcome::NoModulesRegistered;
        }
        let Some(module) = self.active_module() else {
            return Outcome::NoActiveModule;
        };
        let slice = self.slice(module).await;
        match search(&slice, query, self.debug_scan) {
            Search::Matches(assets) => {
                tracing::debug!(module = %module.id, term = query.term(), matches = assets.len(), "Search complete");
                Outcome::Results(ResultSet::new(assets, self.page_size))
            },
            Search::Empty => Outcome::Empty,
            Search::QueryRequired => Outcome::QueryRequired,
        }
    }

    /// Pack selector contents for the active module.
    pub async fn packs(&self) -> Option<PackListing> {
        let module = self.active_module()?;
        Some(PackListing::new(&*self.slice(module).await))
    }

    /// Swap in a new backend under its own name. Every module with a source
    /// on that backend has its cached catalog dropped; returns how many
    /// entries were invalidated.
    pub fn replace_backend(&mut self, backend: BackendHandle) -> usize {
        let name = backend.name().to_string();
        self.loader.insert_backend(backend);
        let kinds: HashSet<ContentKind> = self.sources.iter().filter(|s| s.backend == name).map(|s| s.kind).collect();
        let affected: HashSet<&str> = self
            .registry
            .list()
            .iter()
            .filter(|m| kinds.contains(&m.kind))
            .map(|m| m.id.as_str())
            .collect();
        let invalidated = self.cache.invalidate_where(|key| affected.contains(key.module.as_str()));
        tracing::info!(backend = %name, invalidated, "Backend replaced");
        invalidated
    }

    async fn slice(&self, module: &ModuleDescriptor) -> Arc<CatalogSlice> {
        let key = CacheKey::module(&module.id);
        if let Some(slice) = self.cache.get(&key) {
            return slice;
        }
        let sources = self.registry.sources_for(module, &self.sources);
        let slice = self.loader.load_slice(&sources).await;
        if slice.is_complete_failure() {
            // Not cached, so the next search tries the backends again.
            tracing::warn!(module = %module.id, sources = slice.stats.sources, "Every source failed");
            return Arc::new(slice);
        }
        self.cache.put(key, slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forge_catalog::{PackFilter, PackRef};
    use forge_config::{BackendConfig, ModuleConfig};
    use std::collections::BTreeMap;
    use forge_storage::StorageBackend;
    use forge_storage::backend::MockBackend;

    fn handle(backend: &Arc<MockBackend>) -> BackendHandle {
        backend.clone()
    }

    fn tiles_config(sources: Vec<SourceDescriptor>) -> Config {
        Config {
            sources,
            modules: vec![
                ModuleConfig::new("tiles", "Tiles", ContentKind::Tiles),
                ModuleConfig::new("sounds", "Sounds", ContentKind::Sounds),
            ],
            ..Config::default()
        }
    }

    fn forest_and_caves() -> (Arc<MockBackend>, Config) {
        let files = (0..150)
            .map(|i| format!("forest/tree_{i:03}.webp"))
            .chain((0..100).map(|i| format!("caves/rock_{i:03}.webp")));
        let backend = Arc::new(MockBackend::with_files(files).with_name("public"));
        let config = tiles_config(vec![
            SourceDescriptor::new(ContentKind::Tiles, "FA", "Forest", "public", "forest"),
            SourceDescriptor::new(ContentKind::Tiles, "FA", "Caves", "public", "caves"),
        ]);
        (backend, config)
    }

    #[tokio::test]
    async fn test_reveal_across_two_packs() {
        let (backend, config) = forest_and_caves();
        let mut forge = Forge::new(&config, Backends::from([("public".to_string(), handle(&backend))]));
        let Outcome::Results(results) = forge.open(Some("tiles")).await else {
            panic!("expected results");
        };
        assert_eq!(results.len(), 250);

        let first = results.first_page();
        assert_eq!(first.len(), 100);
        assert_eq!(first[0].id, "forest/tree_000.webp");

        let second = results.reveal_more().unwrap();
        assert_eq!((second.offset(), second.len()), (100, 100));
        assert_eq!(second[49].id, "forest/tree_149.webp");
        assert_eq!(second[50].id, "caves/rock_000.webp");
        drop(second);

        let third = results.reveal_more().unwrap();
        assert_eq!((third.offset(), third.len()), (200, 50));
        assert_eq!(third[49].id, "caves/rock_099.webp");
        drop(third);

        assert!(results.reveal_more().is_none());
        assert_eq!(results.revealed(), 250);
    }

    #[tokio::test]
    async fn test_catalog_is_cached_per_session() {
        let (backend, config) = forest_and_caves();
        let mut forge = Forge::new(&config, Backends::from([("public".to_string(), handle(&backend))]));
        forge.open(Some("tiles")).await;
        let query = SearchQuery::new("rock_01", PackFilter::Pack(PackRef::new("FA", "Caves")));
        let Outcome::Results(results) = forge.search(&query).await else {
            panic!("expected results");
        };
        assert_eq!(results.len(), 10);
        assert_eq!(backend.list_calls(), 2, "one browse per source");

        backend.insert("caves/rock_new.webp").await.unwrap();
        assert!(matches!(forge.search(&SearchQuery::new("rock_new", PackFilter::All)).await, Outcome::Empty));

        forge.open(Some("tiles")).await;
        assert_eq!(backend.list_calls(), 4);
        assert!(matches!(forge.search(&SearchQuery::new("rock_new", PackFilter::All)).await, Outcome::Results(_)));
    }

    #[tokio::test]
    async fn test_packs() {
        let (backend, config) = forest_and_caves();
        let mut forge = Forge::new(&config, Backends::from([("public".to_string(), handle(&backend))]));
        assert!(forge.packs().await.is_none());
        forge.open(None).await;
        // "Sounds" sorts before "Tiles" and has no sources.
        assert_eq!(forge.active_module().map(|m| m.id.as_str()), Some("sounds"));
        assert_eq!(forge.packs().await.unwrap().packs, vec![]);

        forge.select_module("tiles").await;
        let listing = forge.packs().await.unwrap();
        let names: Vec<_> = listing.packs.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Caves", "Forest"]);
        assert_eq!(listing.count.to_string(), "250");
    }

    #[tokio::test]
    async fn test_partial_backend_failure() {
        let public = Arc::new(MockBackend::with_files(["caves/rock.png", "forest/oak.png"]).with_name("public"));
        let broken = Arc::new(MockBackend::with_files(["tavern/bar.png"]).with_name("broken").unavailable());
        let config = tiles_config(vec![
            SourceDescriptor::new(ContentKind::Tiles, "FA", "Caves", "public", "caves"),
            SourceDescriptor::new(ContentKind::Tiles, "FA", "Tavern", "broken", "tavern"),
            SourceDescriptor::new(ContentKind::Tiles, "FA", "Forest", "public", "forest"),
        ]);
        let backends = Backends::from([
            ("public".to_string(), handle(&public)),
            ("broken".to_string(), handle(&broken)),
        ]);
        let mut forge = Forge::new(&config, backends);
        let Outcome::Results(results) = forge.open(Some("tiles")).await else {
            panic!("expected results");
        };
        let ids: Vec<_> = results.first_page().iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, ["caves/rock.png", "forest/oak.png"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_total_outage_is_not_cached() {
        let public = Arc::new(MockBackend::with_files(["caves/rock.png"]).with_name("public").flaky(3));
        let config = tiles_config(vec![SourceDescriptor::new(ContentKind::Tiles, "FA", "Caves", "public", "caves")]);
        let mut forge = Forge::new(&config, Backends::from([("public".to_string(), handle(&public))]));
        assert!(matches!(forge.open(Some("tiles")).await, Outcome::Empty));
        assert_eq!(public.list_calls(), 3, "every attempt failed");
        assert!(forge.cache().is_empty());

        let Outcome::Results(results) = forge.search(&SearchQuery::new("rock", PackFilter::All)).await else {
            panic!("expected results once the backend recovers");
        };
        assert_eq!(results.len(), 1);
        assert_eq!(public.list_calls(), 4);
        assert_eq!(forge.cache().len(), 1);
    }

    #[tokio::test]
    async fn test_from_config_discovers_sources() {
        let public = tempfile::tempdir().unwrap();
        let bazaar = tempfile::tempdir().unwrap();
        for (root, path) in [
            (public.path(), "icons/svg/skull.svg"),
            (bazaar.path(), "assets/tavern/bar.png"),
            (bazaar.path(), "assets/tavern/ambience.ogg"),
            (bazaar.path(), "assets/caves/rock.webp"),
        ] {
            let path = root.join(path);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(&path, b"asset").unwrap();
        }
        let local = |root: &std::path::Path| BackendConfig::Local {
            root: root.to_path_buf(),
            indexed: false,
        };
        let config = Config {
            backends: BTreeMap::from([
                ("public".to_string(), local(public.path())),
                ("forge-bazaar".to_string(), local(bazaar.path())),
            ]),
            discover: vec![DiscoverConfig {
                backend: "forge-bazaar".to_string(),
                root: "assets".into(),
                publisher: "Bazaar".to_string(),
                kinds: vec![ContentKind::Tiles, ContentKind::Sounds],
            }],
            ..Config::default()
        };
        let mut forge = Forge::from_config(&config).await.unwrap();
        let packs: Vec<_> = forge.sources.iter().map(|s| (s.kind, s.pack.as_str())).collect();
        assert_eq!(
            packs,
            [
                (ContentKind::Images, "Core Data Icons"),
                (ContentKind::Tiles, "caves"),
                (ContentKind::Sounds, "caves"),
                (ContentKind::Tiles, "tavern"),
                (ContentKind::Sounds, "tavern"),
            ]
        );

        let Outcome::Results(icons) = forge.open(Some("images")).await else {
            panic!("expected the core icons");
        };
        assert_eq!(icons.first_page()[0].pack, PackRef::new("Foundry VTT", "Core Data Icons"));
        let Outcome::Results(sounds) = forge.select_module("sounds").await else {
            panic!("expected discovered sounds");
        };
        assert_eq!(sounds.first_page()[0].id, "assets/tavern/ambience.ogg");
    }

    #[tokio::test]
    async fn test_search_only_catalog_requires_query() {
        let bazaar = Arc::new(MockBackend::with_files(["bazaar/door.png"]).with_name("bazaar").search_only());
        let config = tiles_config(vec![SourceDescriptor::new(
            ContentKind::Tiles,
            "Bazaar",
            "Everything",
            "bazaar",
            "bazaar",
        )]);
        let mut forge = Forge::new(&config, Backends::from([("bazaar".to_string(), handle(&bazaar))]));
        assert!(matches!(forge.open(Some("tiles")).await, Outcome::QueryRequired));
        assert!(matches!(forge.search(&SearchQuery::new("door", PackFilter::All)).await, Outcome::Results(_)));
        assert!(matches!(forge.search(&SearchQuery::new("window", PackFilter::All)).await, Outcome::Empty));
        assert_eq!(forge.packs().await.unwrap().count.to_string(), "0+");
    }

    #[tokio::test]
    async fn test_debug_scan_enumerates_search_only_catalog() {
        let bazaar = Arc::new(MockBackend::with_files(["bazaar/door.png"]).with_name("bazaar").search_only());
        let mut config = tiles_config(vec![SourceDescriptor::new(ContentKind::Tiles, "Bazaar", "All", "bazaar", "bazaar")]);
        config.debug_scan = true;
        let mut forge = Forge::new(&config, Backends::from([("bazaar".to_string(), handle(&bazaar))]));
        assert!(matches!(forge.open(Some("tiles")).await, Outcome::Results(_)));
    }

    #[tokio::test]
    async fn test_structural_outcomes() {
        let config = Config {
            modules: vec![],
            ..Config::default()
        };
        let mut forge = Forge::new(&config, Backends::new());
        assert!(matches!(forge.open(Some("tiles")).await, Outcome::NoModulesRegistered));
        assert!(matches!(forge.search(&SearchQuery::everything()).await, Outcome::NoModulesRegistered));

        let mut forge = Forge::new(&tiles_config(vec![]), Backends::new());
        assert!(matches!(forge.search(&SearchQuery::everything()).await, Outcome::NoActiveModule));
        assert!(matches!(forge.open(Some("tiles")).await, Outcome::Empty));
        forge.start_session();
        assert!(matches!(forge.search(&SearchQuery::everything()).await, Outcome::NoActiveModule));
    }

    #[tokio::test]
    async fn test_replace_backend_invalidates_dependent_modules() {
        let (backend, mut config) = forest_and_caves();
        let sounds = Arc::new(MockBackend::with_files(["ambience/rain.ogg"]).with_name("audio"));
        config
            .sources
            .push(SourceDescriptor::new(ContentKind::Sounds, "FA", "Ambience", "audio", "ambience"));
        let backends = Backends::from([
            ("public".to_string(), handle(&backend)),
            ("audio".to_string(), handle(&sounds)),
        ]);
        let mut forge = Forge::new(&config, backends);
        forge.open(Some("tiles")).await;
        forge.select_module("sounds").await;
        assert_eq!(forge.cache().len(), 2);

        let replacement = Arc::new(MockBackend::with_files(["ambience/rain.ogg", "ambience/wind.ogg"]).with_name("audio"));
        assert_eq!(forge.replace_backend(handle(&replacement)), 1);
        assert_eq!(forge.cache().len(), 1);
        assert!(forge.cache().get(&CacheKey::module("tiles")).is_some());

        let Outcome::Results(results) = forge.search(&SearchQuery::everything()).await else {
            panic!("expected results");
        };
        assert_eq!(results.len(), 2);
        assert_eq!(replacement.name(), "audio");
        assert_eq!(sounds.list_calls(), 1);
    }
}
