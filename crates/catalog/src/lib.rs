//! Data model for browsing remote asset catalogs.
//!
//! A catalog is built by scanning [`SourceDescriptor`]s (one pack on one
//! storage backend each) into [`PackEntry`] and [`AssetEntry`] values. The
//! complete set for one browsing module is a [`CatalogSlice`], which is the
//! unit that gets cached, invalidated, and searched.

pub mod error;
pub mod models;

pub use crate::models::{
    AssetCard, AssetCount, AssetEntry, CatalogSlice, ContentKind, LoadStats, PackEntry, PackFilter, PackRef,
    SearchQuery, SourceDescriptor,
};
