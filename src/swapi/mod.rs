//! SWAPI reader: the API root lists collections, each collection reports a
//! `count`, and items live at `{base}{collection}/{index}/` for `1..=count`.
pub mod client;
pub mod skip;

pub use client::{CollectionIndex, SwapiClient, DEFAULT_BASE_URL};
pub use skip::KnownGaps;

/// One decoded item response, untyped.
pub type RawRecord = serde_json::Map<String, serde_json::Value>;
