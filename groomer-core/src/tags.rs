//! Typed access to OSM key/value tags.
//!
//! Logical output fields are read from an ordered list of candidate tag keys;
//! [`FieldCandidates::first_in`] returns the first non-empty value.
use std::collections::BTreeMap;

/// OSM tags keyed by tag name.
///
/// A sorted map keeps iteration, and therefore the classifier's text input,
/// stable across runs.
pub type Tags = BTreeMap<String, String>;

/// Ordered tag keys consulted for one logical field.
///
/// # Examples
/// ```
/// use groomer_core::{FieldCandidates, Tags};
///
/// let tags = Tags::from([
///     ("phone".to_owned(), "555-0100".to_owned()),
///     ("contact:phone".to_owned(), String::new()),
/// ]);
/// assert_eq!(FieldCandidates::PHONE.first_in(&tags), Some("555-0100"));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldCandidates(&'static [&'static str]);

impl FieldCandidates {
    /// Business name.
    pub const NAME: Self = Self(&["name"]);
    /// Contact phone, preferring the `contact:` namespace.
    pub const PHONE: Self = Self(&["contact:phone", "phone"]);
    /// Website, preferring the `contact:` namespace.
    pub const WEBSITE: Self = Self(&["contact:website", "website", "url"]);
    /// Street name.
    pub const STREET: Self = Self(&["addr:street"]);
    /// House number.
    pub const HOUSE_NUMBER: Self = Self(&["addr:housenumber"]);
    /// Locality.
    pub const CITY: Self = Self(&["addr:city"]);
    /// Postal code.
    pub const POSTCODE: Self = Self(&["addr:postcode"]);

    /// Return the first candidate value that is present and non-empty.
    #[must_use]
    pub fn first_in<'a>(&self, tags: &'a Tags) -> Option<&'a str> {
        self.0
            .iter()
            .filter_map(|key| tags.get(*key))
            .map(String::as_str)
            .find(|value| !value.is_empty())
    }

    /// Like [`first_in`](Self::first_in) but yields an empty string when absent.
    #[must_use]
    pub fn first_or_empty<'a>(&self, tags: &'a Tags) -> &'a str {
        self.first_in(tags).unwrap_or_default()
    }
}
