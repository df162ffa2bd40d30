//! Network, scanning, and output adapters for the groomer harvester.
//!
//! Responsibilities:
//! - Query Overpass mirrors with rotation, classification, and backoff.
//! - Shrink the search radius per cell when answers fail or look truncated.
//! - Normalise raw elements into rows and suppress in-run duplicates.
//! - Append rows to a CSV file that survives restarts.
//!
//! Boundaries:
//! - Do not encode domain rules (live in `groomer-core`).
//! - Keep blocking I/O behind the [`overpass::OverpassTransport`] and
//!   [`pacing::Sleeper`] seams so tests run without the network or a clock.
//!
//! Invariants:
//! - Cells are processed sequentially; no two requests are in flight.
//! - At most one row per dedup key is written per run.
//! - The output header is written once per file.

pub mod harvest;
pub mod normalize;
pub mod overpass;
pub mod pacing;
pub mod scan;
pub mod writer;

#[doc(hidden)]
pub mod test_support;

pub use harvest::{
    DEFAULT_OUTPUT, DEFAULT_PACING, HarvestError, HarvestReport, HarvestSettings, Harvester,
    harvest_to_file, harvest_with,
};
pub use normalize::Normalizer;
pub use scan::{CellOutcome, CellScanner, ShrinkPolicy};
pub use writer::{IncrementalWriter, RowSink, WriterError};
