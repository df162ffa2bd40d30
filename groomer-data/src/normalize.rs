//! Mapping raw elements to output rows with in-run duplicate suppression.

use std::collections::HashSet;

use groomer_core::{CityCell, DedupKey, FieldCandidates, MobileClassifier, OutputRow, normalize_phone};
use log::debug;

use crate::overpass::RawElement;

/// Default value of the `source` column.
pub const DEFAULT_SOURCE: &str = "OSM";

/// Default region code appended to every address.
pub const DEFAULT_REGION_CODE: &str = "FL";

/// Turns [`RawElement`]s into [`OutputRow`]s, emitting each
/// [`DedupKey`] at most once.
///
/// The seen-set lives only as long as the normalizer; a new run starts empty
/// and does not consult rows written by earlier runs.
#[derive(Debug, Clone)]
pub struct Normalizer {
    classifier: MobileClassifier,
    source: String,
    region_code: String,
    seen: HashSet<DedupKey>,
    suppressed: u64,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(MobileClassifier::default(), DEFAULT_SOURCE, DEFAULT_REGION_CODE)
    }
}

impl Normalizer {
    /// Create a normalizer with an empty seen-set.
    pub fn new(
        classifier: MobileClassifier,
        source: impl Into<String>,
        region_code: impl Into<String>,
    ) -> Self {
        Self {
            classifier,
            source: source.into(),
            region_code: region_code.into(),
            seen: HashSet::new(),
            suppressed: 0,
        }
    }

    /// Build the row for `element`, or `None` if its key was already emitted.
    ///
    /// # Examples
    /// ```
    /// use groomer_core::CityCell;
    /// use groomer_data::normalize::Normalizer;
    /// use groomer_data::overpass::RawElement;
    ///
    /// let cell = CityCell::new("Miami", 25.76, -80.19, 45).expect("valid cell");
    /// let element: RawElement =
    ///     serde_json::from_str(r#"{"tags":{"name":"Fluffy Mobile Grooming"}}"#).expect("valid");
    ///
    /// let mut normalizer = Normalizer::default();
    /// let row = normalizer.normalize(&element, &cell).expect("first sighting");
    /// assert_eq!(row.address, "Miami, FL");
    /// assert!(row.is_mobile_guess);
    /// assert!(normalizer.normalize(&element, &cell).is_none());
    /// ```
    pub fn normalize(&mut self, element: &RawElement, cell: &CityCell) -> Option<OutputRow> {
        let row = self.build_row(element, cell);
        if self.seen.insert(row.dedup_key()) {
            Some(row)
        } else {
            debug!("suppressed duplicate {:?} in {}", row.name, row.city);
            self.suppressed += 1;
            None
        }
    }

    /// Build the row for `element` without touching the seen-set.
    #[must_use]
    pub fn build_row(&self, element: &RawElement, cell: &CityCell) -> OutputRow {
        let tags = &element.tags;
        let name = FieldCandidates::NAME.first_or_empty(tags);
        let phone = normalize_phone(FieldCandidates::PHONE.first_or_empty(tags));
        let website = FieldCandidates::WEBSITE.first_or_empty(tags);
        let street = FieldCandidates::STREET.first_or_empty(tags);
        let house_number = FieldCandidates::HOUSE_NUMBER.first_or_empty(tags);
        let city = FieldCandidates::CITY.first_in(tags).unwrap_or(cell.name());
        let postcode = FieldCandidates::POSTCODE.first_or_empty(tags);

        let street_line = format!("{house_number} {street}");
        let address = [street_line.trim(), city, self.region_code.as_str(), postcode]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(", ");

        let tag_text = tags.values().map(String::as_str).collect::<Vec<_>>().join(" ");
        let is_mobile_guess = self
            .classifier
            .looks_mobile(&format!("{name} {website} {tag_text}"));

        OutputRow {
            source: self.source.clone(),
            name: name.to_owned(),
            phone,
            website: website.to_owned(),
            address,
            city: city.to_owned(),
            position: element.position(),
            is_mobile_guess,
        }
    }

    /// Rows dropped as duplicates so far.
    #[must_use]
    pub const fn suppressed(&self) -> u64 {
        self.suppressed
    }

    /// Distinct keys emitted so far.
    #[must_use]
    pub fn distinct(&self) -> usize {
        self.seen.len()
    }
}
