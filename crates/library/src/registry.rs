use forge_catalog::{ContentKind, SourceDescriptor};
use forge_config::ModuleConfig;

/// A browsing module: one tab, one content kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDescriptor {
    pub id: String,
    pub name: String,
    pub kind: ContentKind,
}
impl ModuleDescriptor {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: ContentKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
        }
    }
}
impl From<&ModuleConfig> for ModuleDescriptor {
    fn from(config: &ModuleConfig) -> Self {
        Self::new(&config.id, &config.name, config.kind)
    }
}

/// Which module a request ends up on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection<'a> {
    Module(&'a ModuleDescriptor),
    NoModulesRegistered,
}

/// The registered browsing modules, kept sorted by name.
#[derive(Debug, Clone, Default)]
pub struct ModuleRegistry {
    modules: Vec<ModuleDescriptor>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(modules: &[ModuleConfig]) -> Self {
        let mut registry = Self::new();
        for module in modules {
            registry.register(module.into());
        }
        registry
    }

    /// Add a module. Returns `false` (and changes nothing) if the id is
    /// already taken.
    pub fn register(&mut self, module: ModuleDescriptor) -> bool {
        if self.get(&module.id).is_some() {
            tracing::warn!(module = %module.id, "Module already registered");
            return false;
        }
        let index = self.modules.partition_point(|m| m.name <= module.name);
        self.modules.insert(index, module);
        true
    }

    pub fn get(&self, id: &str) -> Option<&ModuleDescriptor> {
        self.modules.iter().find(|m| m.id == id)
    }

    /// Modules sorted by name.
    pub fn list(&self) -> &[ModuleDescriptor] {
        &self.modules
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// The requested module if it's registered, otherwise the first module
    /// by name.
    pub fn resolve(&self, requested: Option<&str>) -> Selection<'_> {
        let found = requested.and_then(|id| {
            let found = self.get(id);
            if found.is_none() {
                tracing::debug!(module = %id, "Requested module isn't registered, falling back");
            }
            found
        });
        match found.or_else(|| self.modules.first()) {
            Some(module) => Selection::Module(module),
            None => Selection::NoModulesRegistered,
        }
    }

    /// The sources a module browses: those of its content kind.
    pub fn sources_for(&self, module: &ModuleDescriptor, sources: &[SourceDescriptor]) -> Vec<SourceDescriptor> {
        sources.iter().filter(|s| s.kind == module.kind).cloned().collect()
    }
}
