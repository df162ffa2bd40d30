//! Overpass QL query construction.
//!
//! [`build_query`] turns a [`CityCell`] and a radius into the query document
//! posted to an Overpass mirror. The function is pure: the same inputs always
//! produce byte-identical output.

use std::{fmt, ops::Deref};

use crate::CityCell;

/// Server-side timeout requested in the query header, in seconds.
pub const SERVER_TIMEOUT_SECS: u32 = 120;

/// OSM element kinds searched for every filter.
const ELEMENT_KINDS: [&str; 3] = ["node", "way", "relation"];

/// Tag filters OR-ed together by the query union.
///
/// Covers the grooming shop category, names and descriptions that mention
/// mobile grooming, and the explicit mobile-service attributes.
const FILTERS: [&str; 5] = [
    r#"["shop"="pet_grooming"]"#,
    r#"["name"~"(?i)mobile.*groom|groom.*mobile"]"#,
    r#"["description"~"(?i)mobile.*groom"]"#,
    r#"["mobile"~"(?i)yes|true"]"#,
    r#"["service:mobile"~"(?i)yes|true"]"#,
];

/// A generated Overpass QL document.
///
/// # Examples
/// ```
/// use groomer_core::OverpassQuery;
///
/// let query = OverpassQuery::new("[out:json];");
/// assert_eq!(query.as_ref(), "[out:json];");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverpassQuery(String);

impl OverpassQuery {
    /// Wrap a raw query string.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }
}

impl AsRef<str> for OverpassQuery {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Deref for OverpassQuery {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for OverpassQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Convert a radius in kilometres to the metre value used by `around:`.
#[must_use]
pub fn radius_meters(radius_km: u32) -> u64 {
    u64::from(radius_km) * 1000
}

/// Build the query searching `radius_km` around the cell centre.
///
/// # Examples
/// ```
/// use groomer_core::{CityCell, build_query};
///
/// # fn main() -> Result<(), groomer_core::CityCellError> {
/// let cell = CityCell::new("Miami", 25.7617, -80.1918, 45)?;
/// let query = build_query(&cell, 45);
/// assert!(query.contains("around:45000,25.7617,-80.1918"));
/// # Ok(())
/// # }
/// ```
#[must_use]
pub fn build_query(cell: &CityCell, radius_km: u32) -> OverpassQuery {
    let around = format!(
        "(around:{},{},{})",
        radius_meters(radius_km),
        cell.latitude(),
        cell.longitude()
    );
    let mut body = format!("[out:json][timeout:{SERVER_TIMEOUT_SECS}];\n(\n");
    for filter in FILTERS {
        for kind in ELEMENT_KINDS {
            body.push_str(&format!("  {kind}{filter}{around};\n"));
        }
    }
    body.push_str(");\nout center tags;\n");
    OverpassQuery(body)
}
