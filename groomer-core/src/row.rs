//! Persisted output rows and their duplicate-suppression key.

use geo::Coord;

/// Column header written once at the top of every output file.
pub const OUTPUT_HEADER: [&str; 9] = [
    "source",
    "name",
    "phone",
    "website",
    "address",
    "city",
    "lat",
    "lng",
    "is_mobile_guess",
];

/// One harvested business, ready to append to the output file.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputRow {
    /// Data source label, e.g. `OSM`.
    pub source: String,
    /// Business name as tagged.
    pub name: String,
    /// Digits and `+` only.
    pub phone: String,
    /// Website or URL tag, verbatim.
    pub website: String,
    /// Street line, city, region code, and postcode joined with `", "`.
    pub address: String,
    /// Locality tag, or the cell name when the tag is absent.
    pub city: String,
    /// WGS84 position (`x = longitude`, `y = latitude`), if the service gave one.
    pub position: Option<Coord<f64>>,
    /// Keyword heuristic result; favours false positives.
    pub is_mobile_guess: bool,
}

/// Identity used to suppress repeated rows within a single run.
///
/// Values are compared exactly as written, without case folding.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    /// Row name.
    pub name: String,
    /// Normalized phone.
    pub phone: String,
    /// Row city.
    pub city: String,
}

impl OutputRow {
    /// Key identifying this row for duplicate suppression.
    #[must_use]
    pub fn dedup_key(&self) -> DedupKey {
        DedupKey {
            name: self.name.clone(),
            phone: self.phone.clone(),
            city: self.city.clone(),
        }
    }

    /// Render the row as text cells in [`OUTPUT_HEADER`] order.
    ///
    /// A missing position leaves `lat` and `lng` empty.
    ///
    /// # Examples
    /// ```
    /// use geo::Coord;
    /// use groomer_core::OutputRow;
    ///
    /// let row = OutputRow {
    ///     source: "OSM".into(),
    ///     name: "Suds on Wheels".into(),
    ///     phone: "5550100".into(),
    ///     website: String::new(),
    ///     address: "Tampa, FL".into(),
    ///     city: "Tampa".into(),
    ///     position: Some(Coord { x: -82.45, y: 27.95 }),
    ///     is_mobile_guess: false,
    /// };
    /// let record = row.to_record();
    /// assert_eq!(record[6], "27.95");
    /// assert_eq!(record[7], "-82.45");
    /// assert_eq!(record[8], "false");
    /// ```
    #[must_use]
    pub fn to_record(&self) -> [String; 9] {
        let (lat, lng) = self.position.map_or_else(
            || (String::new(), String::new()),
            |coord| (coord.y.to_string(), coord.x.to_string()),
        );
        [
            self.source.clone(),
            self.name.clone(),
            self.phone.clone(),
            self.website.clone(),
            self.address.clone(),
            self.city.clone(),
            lat,
            lng,
            self.is_mobile_guess.to_string(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn row() -> OutputRow {
        OutputRow {
            source: "OSM".to_owned(),
            name: "Fluffy Mobile Grooming".to_owned(),
            phone: "5551234567".to_owned(),
            website: String::new(),
            address: "Miami, FL".to_owned(),
            city: "Miami".to_owned(),
            position: None,
            is_mobile_guess: true,
        }
    }

    #[rstest]
    fn key_uses_name_phone_and_city(row: OutputRow) {
        let key = row.dedup_key();
        assert_eq!(key.name, "Fluffy Mobile Grooming");
        assert_eq!(key.phone, "5551234567");
        assert_eq!(key.city, "Miami");
    }

    #[rstest]
    fn key_is_case_sensitive(row: OutputRow) {
        let mut shouting = row.clone();
        shouting.name = shouting.name.to_uppercase();
        assert_ne!(row.dedup_key(), shouting.dedup_key());
    }

    #[rstest]
    fn record_leaves_missing_position_blank(row: OutputRow) {
        let record = row.to_record();
        assert_eq!(record.len(), OUTPUT_HEADER.len());
        assert_eq!(record[6], "");
        assert_eq!(record[7], "");
        assert_eq!(record[8], "true");
    }
}
