//! Round-robin selection over interchangeable Overpass mirrors.

use std::fmt;

use thiserror::Error;
use url::Url;

/// Public Overpass mirrors tried by default, in rotation order.
pub const DEFAULT_ENDPOINTS: [&str; 5] = [
    "https://overpass.kumi.systems/api/interpreter",
    "https://overpass-api.de/api/interpreter",
    "https://overpass.openstreetmap.ru/api/interpreter",
    "https://overpass.nchc.org.tw/api/interpreter",
    "https://overpass.osm.ch/api/interpreter",
];

/// Errors raised while building an [`EndpointPool`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EndpointPoolError {
    /// No mirrors were configured.
    #[error("at least one Overpass endpoint is required")]
    Empty,
    /// A mirror URL could not be parsed or is not HTTP(S).
    #[error("invalid Overpass endpoint {url:?}: {message}")]
    InvalidUrl {
        /// URL as configured.
        url: String,
        /// Why it was rejected.
        message: String,
    },
}

/// A validated mirror URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint(Url);

impl Endpoint {
    /// Parse and validate an HTTP(S) endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`EndpointPoolError::InvalidUrl`] when `raw` is not an absolute
    /// `http` or `https` URL.
    pub fn parse(raw: &str) -> Result<Self, EndpointPoolError> {
        let url = Url::parse(raw.trim()).map_err(|err| EndpointPoolError::InvalidUrl {
            url: raw.to_owned(),
            message: err.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(EndpointPoolError::InvalidUrl {
                url: raw.to_owned(),
                message: format!("unsupported scheme {:?}", url.scheme()),
            });
        }
        Ok(Self(url))
    }

    /// The endpoint as a URL string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for Endpoint {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered, non-empty list of mirrors.
///
/// Selection is `attempt mod len`, so consecutive attempts visit every mirror
/// before repeating one.
///
/// # Examples
/// ```
/// use groomer_data::overpass::EndpointPool;
///
/// # fn main() -> Result<(), groomer_data::overpass::EndpointPoolError> {
/// let pool = EndpointPool::new(["https://a.example/api", "https://b.example/api"])?;
/// assert_eq!(pool.select(0).as_str(), "https://a.example/api");
/// assert_eq!(pool.select(3).as_str(), "https://b.example/api");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointPool {
    endpoints: Vec<Endpoint>,
}

impl EndpointPool {
    /// Validate every URL and build the pool.
    ///
    /// # Errors
    ///
    /// Returns [`EndpointPoolError::Empty`] for an empty list, or
    /// [`EndpointPoolError::InvalidUrl`] for the first unusable URL.
    pub fn new<I, S>(urls: I) -> Result<Self, EndpointPoolError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let endpoints = urls
            .into_iter()
            .map(|url| Endpoint::parse(url.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        if endpoints.is_empty() {
            return Err(EndpointPoolError::Empty);
        }
        Ok(Self { endpoints })
    }

    /// Index of the mirror used for `attempt`.
    #[must_use]
    pub fn index_for(&self, attempt: u32) -> usize {
        usize::try_from(attempt).map_or(0, |attempt| attempt % self.endpoints.len())
    }

    /// Mirror used for `attempt`.
    #[must_use]
    pub fn select(&self, attempt: u32) -> &Endpoint {
        &self.endpoints[self.index_for(attempt)]
    }

    /// Number of mirrors in the pool.
    #[must_use]
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    /// Always `false`; the constructor rejects empty pools.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// Mirrors in rotation order.
    pub fn iter(&self) -> impl Iterator<Item = &Endpoint> {
        self.endpoints.iter()
    }
}

impl Default for EndpointPool {
    fn default() -> Self {
        Self {
            endpoints: DEFAULT_ENDPOINTS
                .iter()
                .filter_map(|url| Endpoint::parse(url).ok())
                .collect(),
        }
    }
}
