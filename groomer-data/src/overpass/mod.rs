//! Overpass API access: mirror rotation, transport, and retrying fetches.
//!
//! # Architecture
//!
//! [`EndpointPool`] picks a mirror per attempt, [`OverpassTransport`] performs
//! one POST, and [`ResilientFetcher`] classifies each reply and decides
//! whether to back off and try the next mirror. [`HttpTransport`] implements
//! the synchronous transport trait by blocking on async `reqwest` calls.
//!
//! # Example
//!
//! ```no_run
//! use groomer_core::{CityCell, build_query};
//! use groomer_data::overpass::{
//!     EndpointPool, HttpTransport, HttpTransportConfig, ResilientFetcher, RetryPolicy,
//! };
//! use groomer_data::pacing::ThreadSleeper;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = HttpTransport::with_config(HttpTransportConfig::default())?;
//! let fetcher = ResilientFetcher::new(
//!     transport,
//!     EndpointPool::default(),
//!     RetryPolicy::default(),
//!     ThreadSleeper,
//! );
//! let cell = CityCell::new("Miami", 25.7617, -80.1918, 45)?;
//! let payload = fetcher.fetch(&build_query(&cell, 45))?;
//! println!("{} elements", payload.elements.len());
//! # Ok(())
//! # }
//! ```

mod endpoint;
mod fetcher;
mod payload;
mod transport;

pub use endpoint::{DEFAULT_ENDPOINTS, Endpoint, EndpointPool, EndpointPoolError};
pub use fetcher::{
    AttemptOutcome, DEFAULT_BACKOFF_BASE, DEFAULT_MAX_ATTEMPTS, FetchAttempt, FetchError,
    OVERLOAD_STATUSES, ResilientFetcher, RetryPolicy, RetryableFailure,
};
pub use payload::{Center, OverpassResponse, RawElement};
pub use transport::{
    DEFAULT_REQUEST_TIMEOUT, DEFAULT_USER_AGENT, HttpReply, HttpTransport, HttpTransportConfig,
    OverpassTransport, TransportBuildError, TransportError,
};
