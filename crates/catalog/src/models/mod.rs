mod asset;
mod count;
mod kind;
mod pack;
mod query;
mod slice;
mod source;

pub use self::asset::{AssetCard, AssetEntry};
pub use self::count::AssetCount;
pub use self::kind::ContentKind;
pub use self::pack::{PackEntry, PackRef};
pub use self::query::{PackFilter, SearchQuery};
pub use self::slice::{CatalogSlice, LoadStats};
pub use self::source::SourceDescriptor;
