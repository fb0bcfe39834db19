//! Session-scoped cache of catalog slices.
//!
//! The cache maps a [`CacheKey`] (a browsing module, optionally narrowed by a
//! sub-scope) to the whole [`CatalogSlice`](forge_catalog::CatalogSlice) that
//! was last loaded for it. It is not the source of truth - the backends are.
//! Everything in here can be thrown away and rebuilt by scanning again, and
//! it is thrown away at the start of every browsing session.
//!
//! # Freshness
//! There is no expiry timer. Entries leave the cache when:
//! - the session restarts ([`CatalogCache::clear_all`]),
//! - a caller invalidates them because a backend changed
//!   ([`CatalogCache::invalidate`], [`CatalogCache::invalidate_where`]), or
//! - more modules are cached than the configured capacity, in which case the
//!   least recently used entry is evicted.

mod key;
mod store;

pub use crate::key::CacheKey;
pub use crate::store::{CacheEntry, CacheStats, CatalogCache, DEFAULT_CAPACITY};
