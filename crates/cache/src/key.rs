use std::fmt::{Display, Formatter, Result as FmtResult};

/// Key of one cached catalog slice.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    pub module: String,
    pub scope: Option<String>,
}
impl CacheKey {
    /// The key for a module's whole catalog.
    pub fn module(id: impl Into<String>) -> Self {
        Self { module: id.into(), scope: None }
    }

    pub fn scoped(id: impl Into<String>, scope: impl Into<String>) -> Self {
        Self {
            module: id.into(),
            scope: Some(scope.into()),
        }
    }
}
impl Display for CacheKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match &self.scope {
            Some(scope) => write!(f, "{}#{}", self.module, scope),
            None => write!(f, "{}", self.module),
        }
    }
}
