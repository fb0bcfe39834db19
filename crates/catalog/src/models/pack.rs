use crate::error::{Error, ErrorKind};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Identity of a pack: who published it, and what it's called.
///
/// Ordering is publisher first, then name, which is the order packs are
/// listed in the pack selector.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PackRef {
    pub publisher: String,
    pub name: String,
}
impl PackRef {
    pub fn new(publisher: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            publisher: publisher.into(),
            name: name.into(),
        }
    }
}
impl Display for PackRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}/{}", self.publisher, self.name)
    }
}
impl FromStr for PackRef {
    type Err = Error;

    /// Parses `publisher/name`. Only the first slash splits, pack names may
    /// contain more of them.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((publisher, name)) if !publisher.trim().is_empty() && !name.trim().is_empty() => {
                Ok(PackRef::new(publisher.trim(), name.trim()))
            },
            _ => Err(Error::from(ErrorKind::InvalidPackRef(s.to_string()))),
        }
    }
}

/// A pack as shown in the pack selector.
///
/// `count` is the number of assets found during the scan. When `special` is
/// set the pack comes from a search-only backend and `count` only covers
/// what could be listed, not what exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackEntry {
    pub publisher: String,
    pub name: String,
    pub count: u64,
    pub special: bool,
}
impl PackEntry {
    pub fn new(pack: PackRef, count: u64, special: bool) -> Self {
        Self {
            publisher: pack.publisher,
            name: pack.name,
            count,
            special,
        }
    }

    pub fn pack_ref(&self) -> PackRef {
        PackRef::new(&self.publisher, &self.name)
    }

    pub fn is(&self, pack: &PackRef) -> bool {
        self.publisher == pack.publisher && self.name == pack.name
    }

    /// Empty packs are hidden from the selector, unless they're special
    /// (an empty listing says nothing about a search-only source).
    pub fn is_visible(&self) -> bool {
        self.count > 0 || self.special
    }

    /// Sort by publisher, then by name.
    pub fn sort(packs: &mut [PackEntry]) {
        packs.sort_by(Self::compare);
    }

    fn compare(a: &PackEntry, b: &PackEntry) -> Ordering {
        a.publisher.cmp(&b.publisher).then_with(|| a.name.cmp(&b.name))
    }
}
