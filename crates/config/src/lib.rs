//! Configuration loading and validation.
//!
//! Configuration is layered with [`figment`]:
//! 1. built-in defaults ([`Config::default`]),
//! 2. a configuration file (TOML, YAML or JSON, picked by extension), either
//!    given explicitly or found in the platform config directory,
//! 3. environment variables prefixed with `FORGE_`, with `__` separating
//!    nested keys (`FORGE_RETRY__ATTEMPTS=5`).

mod backend;
mod discover;
pub mod error;
mod module;

pub use crate::backend::BackendConfig;
pub use crate::discover::DiscoverConfig;
pub use crate::module::ModuleConfig;
use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use forge_catalog::{ContentKind, SourceDescriptor};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Number of results revealed per page.
pub const DEFAULT_PAGE_SIZE: usize = 100;
/// Catalog slices kept in memory before the least recently used is evicted.
pub const DEFAULT_CACHE_CAPACITY: usize = 16;
/// Sources browsed at the same time while loading a catalog.
pub const DEFAULT_CONCURRENCY: usize = 8;
/// Backend the built-in sources are browsed from.
pub const CORE_BACKEND: &str = "public";
const ENV_PREFIX: &str = "FORGE_";
const CONFIG_FILE: &str = "config.toml";

/// Retry policy for browsing a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts, including the first.
    pub attempts: u32,
    /// Delay before the first retry; doubled for each retry after that.
    pub backoff_ms: u64,
}
impl RetryConfig {
    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }
}
impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff_ms: 250,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub page_size: usize,
    /// Enumerate search-only packs even without a search term. Diagnostics
    /// only: turns off the "query required" short-circuit.
    pub debug_scan: bool,
    pub cache_capacity: usize,
    pub concurrency: usize,
    pub retry: RetryConfig,
    pub backends: BTreeMap<String, BackendConfig>,
    /// Include the built-in sources (see [`Config::core_sources`]).
    pub core_sources: bool,
    pub sources: Vec<SourceDescriptor>,
    pub discover: Vec<DiscoverConfig>,
    pub modules: Vec<ModuleConfig>,
}
impl Default for Config {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            debug_scan: false,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            concurrency: DEFAULT_CONCURRENCY,
            retry: RetryConfig::default(),
            backends: BTreeMap::new(),
            core_sources: true,
            sources: Vec::new(),
            discover: Vec::new(),
            modules: ModuleConfig::defaults(),
        }
    }
}

impl Config {
    /// Sources every installation has: the host's own icon set.
    pub fn core_sources() -> Vec<SourceDescriptor> {
        vec![SourceDescriptor::new(ContentKind::Images, "Foundry VTT", "Core Data Icons", CORE_BACKEND, "icons")]
    }

    /// Sources known without listing anything: the built-in ones (when
    /// enabled and their backend is declared) followed by `sources`.
    pub fn declared_sources(&self) -> Vec<SourceDescriptor> {
        let core = match self.core_sources && self.backends.contains_key(CORE_BACKEND) {
            true => Self::core_sources(),
            false => Vec::new(),
        };
        core.into_iter().chain(self.sources.iter().cloned()).collect()
    }

    /// Where the configuration file lives when none is given explicitly.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "forge").map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }

    /// Build the layered [`Figment`] without extracting it.
    ///
    /// An explicit `path` must exist. Without one, the default path is used
    /// only if there is a file there.
    pub fn figment(path: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        let file = match path {
            Some(path) if !path.is_file() => exn::bail!(ErrorKind::NotFound(path.to_path_buf())),
            Some(path) => Some(path.to_path_buf()),
            None => Self::default_path().filter(|p| p.is_file()),
        };
        if let Some(file) = file {
            tracing::debug!(path = %file.display(), "Loading configuration file");
            let extension = file.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase);
            figment = match extension.as_deref() {
                Some("toml") => figment.merge(Toml::file(&file)),
                Some("yaml" | "yml") => figment.merge(Yaml::file(&file)),
                Some("json") => figment.merge(Json::file(&file)),
                _ => exn::bail!(ErrorKind::UnsupportedFormat(file)),
            };
        }
        Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// Load and validate the configuration.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::from_figment(Self::figment(path)?)
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Config = figment.extract().or_raise(|| ErrorKind::Parse)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            exn::bail!(ErrorKind::Invalid("page_size must be at least 1".to_string()));
        }
        if self.cache_capacity == 0 {
            exn::bail!(ErrorKind::Invalid("cache_capacity must be at least 1".to_string()));
        }
        if self.concurrency == 0 {
            exn::bail!(ErrorKind::Invalid("concurrency must be at least 1".to_string()));
        }
        if self.retry.attempts == 0 {
            exn::bail!(ErrorKind::Invalid("retry.attempts must be at least 1".to_string()));
        }
        if let Some(source) = self.sources.iter().find(|s| !self.backends.contains_key(&s.backend)) {
            exn::bail!(ErrorKind::Invalid(format!(
                "source {}/{} refers to undeclared backend `{}`",
                source.publisher, source.pack, source.backend
            )));
        }
        for rule in &self.discover {
            if !self.backends.contains_key(&rule.backend) {
                exn::bail!(ErrorKind::Invalid(format!("discovery refers to undeclared backend `{}`", rule.backend)));
            }
            if rule.kinds.is_empty() {
                exn::bail!(ErrorKind::Invalid(format!("discovery on `{}` needs at least one kind", rule.backend)));
            }
        }
        let mut ids = HashSet::new();
        for module in &self.modules {
            if module.id.trim().is_empty() {
                exn::bail!(ErrorKind::Invalid("module id must not be empty".to_string()));
            }
            if !ids.insert(module.id.as_str()) {
                exn::bail!(ErrorKind::Invalid(format!("duplicate module id `{}`", module.id)));
            }
        }
        Ok(())
    }
}
