//! Core domain types for the groomer harvester.
//!
//! Everything here is pure and synchronous: search cells, the Overpass query
//! builder, typed tag lookups, the mobile-business heuristic, and the output
//! row model. Network and file access live in `groomer-data`.

pub mod cell;
pub mod classify;
pub mod query;
pub mod row;
pub mod tags;

pub use cell::{CityCell, CityCellError, florida_cells, validate_cells};
pub use classify::{DEFAULT_MOBILE_KEYWORDS, MobileClassifier, normalize_phone};
pub use query::{OverpassQuery, SERVER_TIMEOUT_SECS, build_query, radius_meters};
pub use row::{DedupKey, OUTPUT_HEADER, OutputRow};
pub use tags::{FieldCandidates, Tags};
