//! Facade crate for the groomer harvester.
//!
//! This crate re-exports the domain types from `groomer-core` and the
//! harvesting pipeline from `groomer-data` so embedders depend on one crate.

#![forbid(unsafe_code)]

pub use groomer_core::{
    CityCell, CityCellError, DedupKey, MobileClassifier, OUTPUT_HEADER, OutputRow, OverpassQuery,
    build_query, florida_cells,
};
pub use groomer_data::overpass::{
    EndpointPool, EndpointPoolError, FetchError, HttpTransport, HttpTransportConfig,
    OverpassTransport, ResilientFetcher, RetryPolicy,
};
pub use groomer_data::{
    CellOutcome, CellScanner, HarvestError, HarvestReport, HarvestSettings, Harvester,
    IncrementalWriter, Normalizer, RowSink, ShrinkPolicy, WriterError, harvest_to_file,
};
