use forge_catalog::{AssetEntry, SourceDescriptor};
use forge_storage::FileInfo;
use std::path::Path;

pub(crate) struct Normalized {
    pub(crate) assets: Vec<AssetEntry>,
    /// Entries that couldn't be turned into an asset.
    pub(crate) dropped: usize,
}

/// Turn one source's raw listing into asset entries, in path order.
///
/// Entries are dropped when their path isn't UTF-8, has no file stem, or has
/// an extension the source's content kind doesn't accept.
pub(crate) fn normalize(source: &SourceDescriptor, backend: &str, mut files: Vec<FileInfo>) -> Normalized {
    files.sort_by(|a, b| a.path.cmp(&b.path));
    let pack = source.pack_ref();
    let mut dropped = 0;
    let assets = files
        .into_iter()
        .filter_map(|file| match usable(source, &file.path) {
            Some((id, stem)) => Some(AssetEntry::new(source.kind, pack.clone(), backend, id, stem)),
            None => {
                tracing::debug!(path = %file.path.display(), pack = %pack, "Dropping malformed entry");
                dropped += 1;
                None
            },
        })
        .collect();
    Normalized { assets, dropped }
}

fn usable<'p>(source: &SourceDescriptor, path: &'p Path) -> Option<(&'p str, &'p str)> {
    let id = path.to_str()?;
    let stem = path.file_stem()?.to_str()?;
    source.kind.accepts(path).then_some((id, stem))
}
