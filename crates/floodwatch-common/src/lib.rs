//! Common types shared across the floodwatch map viewer crates.

pub mod bbox;
pub mod catalog;
pub mod date;
pub mod error;
pub mod layer;

pub use bbox::BoundingBox;
pub use catalog::LayerCatalog;
pub use date::MapDate;
pub use error::{FloodwatchError, FloodwatchResult};
pub use layer::{LayerDescriptor, LayerFamily, DATE_PLACEHOLDER};
