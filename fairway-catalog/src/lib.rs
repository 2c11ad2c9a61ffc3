pub mod item;

pub use item::{CatalogKind, CatalogSummary, RawSelection};
