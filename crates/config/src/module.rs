use forge_catalog::ContentKind;
use serde::{Deserialize, Serialize};

/// A browsing module: a tab in the interface, browsing one content kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleConfig {
    pub id: String,
    pub name: String,
    pub kind: ContentKind,
}
impl ModuleConfig {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: ContentKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
        }
    }

    /// One module per content kind, named after it.
    pub fn defaults() -> Vec<ModuleConfig> {
        ContentKind::ALL
            .into_iter()
            .map(|kind| {
                let id = kind.as_str();
                let mut name = id.to_string();
                if let Some(first) = name.get_mut(0..1) {
                    first.make_ascii_uppercase();
                }
                ModuleConfig::new(id, name, kind)
            })
            .collect()
    }
}
