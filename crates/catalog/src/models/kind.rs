use crate::models::asset::{AssetCard, AssetEntry};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::Path;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "gif", "svg", "avif"];
const TILE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "gif", "svg", "avif", "webm"];
const SOUND_EXTENSIONS: &[&str] = &["ogg", "mp3", "wav", "flac", "webm", "m4a", "opus"];

/// The content domain a source (and a browsing module) belongs to.
///
/// Each variant knows which files it is willing to list and how its assets
/// are presented, so the loader and the display surface never have to look
/// up per-module behaviour by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Images,
    Tiles,
    Sounds,
}
impl ContentKind {
    pub const ALL: [ContentKind; 3] = [ContentKind::Images, ContentKind::Tiles, ContentKind::Sounds];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Images => "images",
            ContentKind::Tiles => "tiles",
            ContentKind::Sounds => "sounds",
        }
    }

    /// File extensions (lower-case, without the dot) this kind accepts.
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            ContentKind::Images => IMAGE_EXTENSIONS,
            ContentKind::Tiles => TILE_EXTENSIONS,
            ContentKind::Sounds => SOUND_EXTENSIONS,
        }
    }

    /// Whether a listed file belongs to this kind, judged by its extension.
    pub fn accepts(&self, path: impl AsRef<Path>) -> bool {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions().iter().any(|known| ext.eq_ignore_ascii_case(known)))
    }

    /// Turn an asset into the renderable unit handed to the display surface.
    pub fn describe_asset(&self, asset: &AssetEntry) -> AssetCard {
        match self {
            ContentKind::Images | ContentKind::Tiles => AssetCard {
                label: asset.label.clone(),
                thumbnail: asset.thumbnail.clone(),
                badge: None,
            },
            // No preview for audio; the badge tells the surface to draw a
            // play control instead.
            ContentKind::Sounds => AssetCard {
                label: asset.label.clone(),
                thumbnail: None,
                badge: Some("sound"),
            },
        }
    }

    /// Tiles and images get a thumbnail reference, sounds don't.
    pub(crate) fn has_thumbnail(&self) -> bool {
        !matches!(self, ContentKind::Sounds)
    }
}
impl Display for ContentKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}
