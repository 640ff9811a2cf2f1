//! Effect and palette name catalogues and their alphabetical views

mod index;
mod names;

pub use index::{compare_names, palette_skip, AlphaIndex};
pub use names::{CatalogueError, NameCatalogue};
