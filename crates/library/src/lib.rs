//! Catalog loading, search and incremental reveal.
//!
//! The [`Forge`] session ties everything together: it owns the storage
//! backends, the module registry and the catalog cache, and answers
//! searches for the active module with a [`ResultSet`] that the display
//! surface reveals one page at a time.

pub mod backends;
pub mod error;
mod forge;
pub mod loader;
mod paginate;
mod registry;
mod search;

pub use crate::backends::Backends;
pub use crate::forge::{Forge, Outcome};
pub use crate::loader::Loader;
pub use crate::paginate::{Reveal, ResultSet};
pub use crate::registry::{ModuleDescriptor, ModuleRegistry, Selection};
pub use crate::search::{PackListing, Search, search};
