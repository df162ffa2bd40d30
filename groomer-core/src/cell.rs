//! Geographic search cells.
//!
//! A [`CityCell`] names a point and the radius searched around it. Cells are
//! immutable once built and form the unit of work for a harvest run.

use std::collections::HashSet;

use geo::Coord;
use thiserror::Error;

/// A named search centre and its starting radius.
///
/// Coordinates are WGS84 with `x = longitude` and `y = latitude`.
///
/// # Examples
/// ```
/// use groomer_core::CityCell;
///
/// # fn main() -> Result<(), groomer_core::CityCellError> {
/// let miami = CityCell::new("Miami", 25.7617, -80.1918, 45)?;
/// assert_eq!(miami.name(), "Miami");
/// assert_eq!(miami.initial_radius_km(), 45);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CityCell {
    name: String,
    center: Coord<f64>,
    initial_radius_km: u32,
}

/// Errors returned when building or validating city cells.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CityCellError {
    /// The cell name was blank.
    #[error("city cell name must not be empty")]
    EmptyName,
    /// Latitude or longitude was outside the WGS84 range or not finite.
    #[error("city cell {name:?} has invalid coordinates ({latitude}, {longitude})")]
    InvalidCoordinates {
        /// Cell name.
        name: String,
        /// Latitude as supplied.
        latitude: f64,
        /// Longitude as supplied.
        longitude: f64,
    },
    /// The starting radius was zero.
    #[error("city cell {name:?} must have a positive radius")]
    ZeroRadius {
        /// Cell name.
        name: String,
    },
    /// No cells were supplied for the run.
    #[error("at least one city cell is required")]
    NoCells,
    /// Two cells share a name.
    #[error("city cell {name:?} is listed more than once")]
    DuplicateName {
        /// Repeated name.
        name: String,
    },
}

impl CityCell {
    /// Validate and construct a cell.
    ///
    /// # Errors
    ///
    /// Returns [`CityCellError`] when the name is blank, the coordinates are
    /// outside WGS84 bounds, or the radius is zero.
    pub fn new(
        name: impl Into<String>,
        latitude: f64,
        longitude: f64,
        initial_radius_km: u32,
    ) -> Result<Self, CityCellError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(CityCellError::EmptyName);
        }
        let in_range = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);
        if !in_range {
            return Err(CityCellError::InvalidCoordinates {
                name,
                latitude,
                longitude,
            });
        }
        if initial_radius_km == 0 {
            return Err(CityCellError::ZeroRadius { name });
        }
        Ok(Self {
            name,
            center: Coord {
                x: longitude,
                y: latitude,
            },
            initial_radius_km,
        })
    }

    /// Human-readable cell name, also used as the fallback city.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Search centre (`x = longitude`, `y = latitude`).
    #[must_use]
    pub fn center(&self) -> Coord<f64> {
        self.center
    }

    /// Latitude of the search centre.
    #[must_use]
    pub fn latitude(&self) -> f64 {
        self.center.y
    }

    /// Longitude of the search centre.
    #[must_use]
    pub fn longitude(&self) -> f64 {
        self.center.x
    }

    /// Radius used for the first query against this cell.
    #[must_use]
    pub fn initial_radius_km(&self) -> u32 {
        self.initial_radius_km
    }
}

/// Check that a run has at least one cell and no repeated names.
///
/// # Errors
///
/// Returns [`CityCellError::NoCells`] for an empty slice and
/// [`CityCellError::DuplicateName`] for the first repeated name.
pub fn validate_cells(cells: &[CityCell]) -> Result<(), CityCellError> {
    if cells.is_empty() {
        return Err(CityCellError::NoCells);
    }
    let mut names = HashSet::with_capacity(cells.len());
    for cell in cells {
        if !names.insert(cell.name()) {
            return Err(CityCellError::DuplicateName {
                name: cell.name().to_owned(),
            });
        }
    }
    Ok(())
}

/// Florida cities covered by a default run: name, latitude, longitude, radius.
const FLORIDA_CELLS: &[(&str, f64, f64, u32)] = &[
    ("Miami", 25.7617, -80.1918, 45),
    ("Fort Lauderdale", 26.1224, -80.1373, 35),
    ("West Palm Beach", 26.7153, -80.0534, 35),
    ("Boca Raton", 26.3683, -80.1289, 30),
    ("Orlando", 28.5383, -81.3792, 40),
    ("Tampa", 27.9506, -82.4572, 40),
    ("St Petersburg", 27.7676, -82.6403, 35),
    ("Clearwater", 27.9659, -82.8001, 30),
    ("Jacksonville", 30.3322, -81.6557, 45),
    ("Sarasota", 27.3364, -82.5307, 35),
    ("Naples", 26.1420, -81.7948, 35),
    ("Fort Myers", 26.6406, -81.8723, 35),
    ("Lakeland", 28.0395, -81.9498, 30),
    ("Daytona Beach", 29.2108, -81.0228, 30),
    ("Ocala", 29.1872, -82.1401, 30),
    ("Gainesville", 29.6516, -82.3248, 30),
    ("Tallahassee", 30.4383, -84.2807, 35),
    ("Pensacola", 30.4213, -87.2169, 35),
    ("Port St. Lucie", 27.2730, -80.3582, 30),
    ("Melbourne", 28.0836, -80.6081, 30),
];

/// The built-in Florida cell list, in harvest order.
///
/// # Examples
/// ```
/// let cells = groomer_core::florida_cells();
/// assert_eq!(cells.first().map(|cell| cell.name()), Some("Miami"));
/// ```
#[must_use]
pub fn florida_cells() -> Vec<CityCell> {
    FLORIDA_CELLS
        .iter()
        .map(|&(name, latitude, longitude, initial_radius_km)| CityCell {
            name: name.to_owned(),
            center: Coord {
                x: longitude,
                y: latitude,
            },
            initial_radius_km,
        })
        .collect()
}
