//! Adaptive per-cell scanning.
//!
//! A cell is queried at its initial radius. A failed fetch, or an empty
//! answer while the radius is still above the floor, shrinks the radius and
//! tries again. Empty answers at large radii usually mean the service
//! truncated the response under load, so they are not taken at face value
//! until the radius cannot shrink any further.

use groomer_core::{CityCell, build_query};
use log::{info, warn};

use crate::overpass::{FetchError, OverpassTransport, RawElement, ResilientFetcher};
use crate::pacing::Sleeper;

/// Default number of query rounds per cell.
pub const DEFAULT_MAX_SHRINKS: u32 = 4;

/// Default multiplier applied to the radius after a failed round.
pub const DEFAULT_SHRINK_FACTOR: f64 = 0.65;

/// Default radius floor in kilometres.
pub const DEFAULT_MIN_RADIUS_KM: u32 = 10;

/// How the search radius contracts between rounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShrinkPolicy {
    /// Query rounds allowed per cell before it is skipped.
    pub max_shrinks: u32,
    /// Multiplier in `(0, 1)`; the result is truncated to whole kilometres.
    pub factor: f64,
    /// Floor below which the radius never drops.
    pub min_radius_km: u32,
}

impl Default for ShrinkPolicy {
    fn default() -> Self {
        Self {
            max_shrinks: DEFAULT_MAX_SHRINKS,
            factor: DEFAULT_SHRINK_FACTOR,
            min_radius_km: DEFAULT_MIN_RADIUS_KM,
        }
    }
}

impl ShrinkPolicy {
    /// Radius for the round after one at `radius_km`.
    ///
    /// # Examples
    /// ```
    /// use groomer_data::scan::ShrinkPolicy;
    ///
    /// let policy = ShrinkPolicy::default();
    /// assert_eq!(policy.shrink(45), 29);
    /// assert_eq!(policy.shrink(12), 10);
    /// assert_eq!(policy.shrink(10), 10);
    /// ```
    #[must_use]
    pub fn shrink(&self, radius_km: u32) -> u32 {
        let scaled = (f64::from(radius_km) * self.factor).floor();
        // `as` saturates, so NaN and negative factors land on the floor.
        let scaled = scaled as u32;
        scaled.max(self.min_radius_km)
    }

    /// Whether an empty answer at `radius_km` should be retried smaller.
    #[must_use]
    pub const fn distrusts_empty_at(&self, radius_km: u32) -> bool {
        radius_km > self.min_radius_km
    }
}

/// Result of scanning one cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellOutcome {
    /// A round produced a trustworthy answer.
    Done {
        /// Radius of the successful round.
        radius_km: u32,
        /// Elements returned by that round, possibly empty at the floor.
        elements: Vec<RawElement>,
        /// Every radius queried, in order.
        radii_tried: Vec<u32>,
    },
    /// The round budget ran out.
    GaveUp {
        /// Every radius queried, in order.
        radii_tried: Vec<u32>,
        /// Failure from the final round, if it failed rather than came back empty.
        last_error: Option<FetchError>,
    },
}

impl CellOutcome {
    /// Radii queried for the cell.
    #[must_use]
    pub fn radii_tried(&self) -> &[u32] {
        match self {
            Self::Done { radii_tried, .. } | Self::GaveUp { radii_tried, .. } => radii_tried,
        }
    }
}

/// Drives a [`ResilientFetcher`] through the shrink state machine.
#[derive(Debug)]
pub struct CellScanner<T, S> {
    fetcher: ResilientFetcher<T, S>,
    policy: ShrinkPolicy,
}

impl<T, S> CellScanner<T, S>
where
    T: OverpassTransport,
    S: Sleeper,
{
    /// Wrap `fetcher` with a shrink policy.
    pub fn new(fetcher: ResilientFetcher<T, S>, policy: ShrinkPolicy) -> Self {
        Self { fetcher, policy }
    }

    /// Fetcher used for each round.
    pub fn fetcher(&self) -> &ResilientFetcher<T, S> {
        &self.fetcher
    }

    /// Active shrink policy.
    #[must_use]
    pub fn policy(&self) -> ShrinkPolicy {
        self.policy
    }

    /// Scan `cell`, shrinking the radius until an answer is trusted or the
    /// round budget is spent.
    pub fn scan_cell(&self, cell: &CityCell) -> CellOutcome {
        let mut radius_km = cell.initial_radius_km();
        let mut radii_tried = Vec::new();
        let mut last_error = None;

        for _ in 0..self.policy.max_shrinks {
            radii_tried.push(radius_km);
            info!("[{}] radius {radius_km} km", cell.name());
            let query = build_query(cell, radius_km);
            match self.fetcher.fetch(&query) {
                Err(err) => {
                    warn!("[{}] fetch at {radius_km} km failed: {err}", cell.name());
                    last_error = Some(err);
                }
                Ok(payload) => {
                    last_error = None;
                    info!("[{}] {} elements", cell.name(), payload.elements.len());
                    if !payload.elements.is_empty() || !self.policy.distrusts_empty_at(radius_km)
                    {
                        return CellOutcome::Done {
                            radius_km,
                            elements: payload.elements,
                            radii_tried,
                        };
                    }
                }
            }
            radius_km = self.policy.shrink(radius_km);
        }

        warn!(
            "[{}] service still busy after radii {radii_tried:?}, skipping",
            cell.name()
        );
        CellOutcome::GaveUp {
            radii_tried,
            last_error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overpass::{EndpointPool, RetryPolicy};
    use crate::test_support::{RecordingSleeper, StubTransport};
    use rstest::{fixture, rstest};
    use std::time::Duration;

    const ONE_ELEMENT: &str = r#"{"elements":[{"tags":{"name":"A"},"lat":25.0,"lon":-80.0}]}"#;
    const EMPTY: &str = r#"{"elements":[]}"#;

    #[fixture]
    fn cell() -> CityCell {
        CityCell::new("Miami", 25.7617, -80.1918, 45).expect("valid cell")
    }

    fn scanner<'a>(
        transport: &'a StubTransport,
        sleeper: &'a RecordingSleeper,
        max_attempts: u32,
    ) -> CellScanner<&'a StubTransport, &'a RecordingSleeper> {
        let pool = EndpointPool::new(["http://a.test/", "http://b.test/"]).expect("valid pool");
        let retry = RetryPolicy {
            max_attempts,
            base_delay: Duration::from_millis(1),
        };
        CellScanner::new(
            ResilientFetcher::new(transport, pool, retry, sleeper),
            ShrinkPolicy::default(),
        )
    }

    #[rstest]
    #[case(45, 29)]
    #[case(29, 18)]
    #[case(18, 11)]
    #[case(11, 10)]
    #[case(10, 10)]
    #[case(3, 10)]
    fn shrink_truncates_and_respects_floor(#[case] radius: u32, #[case] expected: u32) {
        assert_eq!(ShrinkPolicy::default().shrink(radius), expected);
    }

    #[rstest]
    fn first_non_empty_answer_finishes(cell: CityCell) {
        let transport = StubTransport::always_ok(ONE_ELEMENT);
        let sleeper = RecordingSleeper::default();
        let outcome = scanner(&transport, &sleeper, 3).scan_cell(&cell);

        match outcome {
            CellOutcome::Done {
                radius_km,
                elements,
                radii_tried,
            } => {
                assert_eq!(radius_km, 45);
                assert_eq!(elements.len(), 1);
                assert_eq!(radii_tried, vec![45]);
            }
            other => panic!("expected Done, got {other:?}"),
        }
    }

    #[rstest]
    fn gives_up_after_round_budget(cell: CityCell) {
        let transport = StubTransport::always_status(503);
        let sleeper = RecordingSleeper::default();
        let outcome = scanner(&transport, &sleeper, 2).scan_cell(&cell);

        assert_eq!(outcome.radii_tried(), &[45, 29, 18, 11]);
        assert!(matches!(
            outcome,
            CellOutcome::GaveUp {
                last_error: Some(FetchError::Exhausted { attempts: 2, .. }),
                ..
            }
        ));
        assert_eq!(transport.endpoints_called().len(), 8);
    }

    #[rstest]
    fn empty_answers_shrink_until_the_floor() {
        let cell = CityCell::new("Key West", 24.5551, -81.78, 16).expect("valid cell");
        let transport = StubTransport::always_ok(EMPTY);
        let sleeper = RecordingSleeper::default();
        let outcome = scanner(&transport, &sleeper, 1).scan_cell(&cell);

        match outcome {
            CellOutcome::Done {
                radius_km,
                elements,
                radii_tried,
            } => {
                assert_eq!(radius_km, 10);
                assert!(elements.is_empty());
                assert_eq!(radii_tried, vec![16, 10]);
            }
            other => panic!("expected Done, got {other:?}"),
        }
    }

    #[rstest]
    fn failure_then_success_reports_smaller_radius(cell: CityCell) {
        let transport = StubTransport::new().then_status(504).then_ok(ONE_ELEMENT);
        let sleeper = RecordingSleeper::default();
        let outcome = scanner(&transport, &sleeper, 1).scan_cell(&cell);

        assert!(matches!(outcome, CellOutcome::Done { radius_km: 29, .. }));
        let queries = transport.queries();
        assert!(queries[0].contains("around:45000,"));
        assert!(queries[1].contains("around:29000,"));
    }

    #[rstest]
    fn empty_answers_at_large_radius_give_up(cell: CityCell) {
        let transport = StubTransport::always_ok(EMPTY);
        let sleeper = RecordingSleeper::default();
        let outcome = scanner(&transport, &sleeper, 1).scan_cell(&cell);

        assert_eq!(
            outcome,
            CellOutcome::GaveUp {
                radii_tried: vec![45, 29, 18, 11],
                last_error: None,
            }
        );
    }

    #[rstest]
    fn malformed_answer_shrinks_like_a_failed_fetch(cell: CityCell) {
        let transport = StubTransport::new().then_ok("not json").then_ok(ONE_ELEMENT);
        let sleeper = RecordingSleeper::default();
        let outcome = scanner(&transport, &sleeper, 3).scan_cell(&cell);

        match outcome {
            CellOutcome::Done {
                radius_km,
                elements,
                radii_tried,
            } => {
                assert_eq!(radius_km, 29);
                assert_eq!(elements.len(), 1);
                assert_eq!(radii_tried, vec![45, 29]);
            }
            other => panic!("expected Done, got {other:?}"),
        }
        assert_eq!(transport.endpoints_called().len(), 2);
        assert!(sleeper.recorded().is_empty());
    }

    #[rstest]
    fn persistently_malformed_answers_give_up(cell: CityCell) {
        let transport = StubTransport::always_ok("not json");
        let sleeper = RecordingSleeper::default();
        let outcome = scanner(&transport, &sleeper, 3).scan_cell(&cell);

        assert_eq!(outcome.radii_tried(), &[45, 29, 18, 11]);
        assert!(
            matches!(
                outcome,
                CellOutcome::GaveUp {
                    last_error: Some(FetchError::Malformed { .. }),
                    ..
                }
            ),
            "got {outcome:?}"
        );
        assert_eq!(transport.endpoints_called().len(), 4);
    }
}
