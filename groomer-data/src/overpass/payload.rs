//! Overpass API JSON response types.
//!
//! Only the parts of the response the harvester consumes are modelled: the
//! element list, each element's tags, and its position. Nodes carry `lat` and
//! `lon` directly; ways and relations requested with `out center` carry a
//! nested `center` object instead.
//!
//! See: <https://wiki.openstreetmap.org/wiki/Overpass_API/Output_Formats#JSON>

use geo::Coord;
use groomer_core::Tags;
use serde::Deserialize;

/// Decoded Overpass response.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct OverpassResponse {
    /// Matching elements; absent in some truncated responses.
    #[serde(default)]
    pub elements: Vec<RawElement>,
}

/// One entity returned for a cell.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawElement {
    /// Free-form OSM tags; `null` and missing both decode as empty.
    #[serde(default, deserialize_with = "tags_or_empty")]
    pub tags: Tags,
    /// Latitude of a node.
    #[serde(default)]
    pub lat: Option<f64>,
    /// Longitude of a node.
    #[serde(default)]
    pub lon: Option<f64>,
    /// Geometry centre for ways and relations.
    #[serde(default)]
    pub center: Option<Center>,
}

/// Centre point attached to way and relation results.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Center {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
}

impl RawElement {
    /// Position of the element, preferring direct coordinates over `center`.
    ///
    /// # Examples
    /// ```
    /// use geo::Coord;
    /// use groomer_data::overpass::RawElement;
    ///
    /// let element: RawElement =
    ///     serde_json::from_str(r#"{"center":{"lat":25.7,"lon":-80.2}}"#).expect("valid element");
    /// assert_eq!(element.position(), Some(Coord { x: -80.2, y: 25.7 }));
    /// ```
    #[must_use]
    pub fn position(&self) -> Option<Coord<f64>> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some(Coord { x: lon, y: lat }),
            _ => self.center.map(|center| Coord {
                x: center.lon,
                y: center.lat,
            }),
        }
    }
}

fn tags_or_empty<'de, D>(deserializer: D) -> Result<Tags, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<Tags>::deserialize(deserializer).map(Option::unwrap_or_default)
}
