//! Run orchestration: settings, validation, and the sequential cell loop.
//!
//! Cells are processed strictly one after another with a fixed pause between
//! them. Per-cell failures are logged and counted; only configuration and
//! output errors end a run early.

use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use groomer_core::{CityCell, CityCellError, DEFAULT_MOBILE_KEYWORDS, MobileClassifier, validate_cells};
use log::info;
use thiserror::Error;

use crate::normalize::{DEFAULT_REGION_CODE, DEFAULT_SOURCE, Normalizer};
use crate::overpass::{
    DEFAULT_BACKOFF_BASE, DEFAULT_ENDPOINTS, DEFAULT_MAX_ATTEMPTS, DEFAULT_REQUEST_TIMEOUT,
    DEFAULT_USER_AGENT, EndpointPool, EndpointPoolError, HttpTransport, HttpTransportConfig,
    OverpassTransport, ResilientFetcher, RetryPolicy, TransportBuildError,
};
use crate::pacing::{Sleeper, ThreadSleeper};
use crate::scan::{
    CellOutcome, CellScanner, DEFAULT_MAX_SHRINKS, DEFAULT_MIN_RADIUS_KM, DEFAULT_SHRINK_FACTOR,
    ShrinkPolicy,
};
use crate::writer::{IncrementalWriter, RowSink, WriterError};

/// Default output file name.
pub const DEFAULT_OUTPUT: &str = "fl_pet_groomers_osm.csv";

/// Default pause between cells.
pub const DEFAULT_PACING: Duration = Duration::from_millis(1200);

/// Fatal errors for a harvest run.
#[derive(Debug, Error)]
pub enum HarvestError {
    /// The cell list is empty or contains an invalid cell.
    #[error("invalid city cells: {0}")]
    Cells(#[from] CityCellError),
    /// The mirror list is empty or contains an unusable URL.
    #[error(transparent)]
    Endpoints(#[from] EndpointPoolError),
    /// `max_attempts` was zero.
    #[error("max fetch attempts must be at least 1")]
    ZeroAttempts,
    /// `max_shrinks` was zero.
    #[error("max radius shrinks must be at least 1")]
    ZeroShrinks,
    /// `min_radius_km` was zero.
    #[error("minimum radius must be at least 1 km")]
    ZeroMinRadius,
    /// The shrink factor was outside `(0, 1)`.
    #[error("shrink factor must lie strictly between 0 and 1, got {factor}")]
    InvalidShrinkFactor {
        /// Rejected factor.
        factor: f64,
    },
    /// The HTTP transport could not be built.
    #[error(transparent)]
    Transport(#[from] TransportBuildError),
    /// Output could not be opened or written.
    #[error(transparent)]
    Output(#[from] WriterError),
}

/// Tunables for a harvest run.
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use groomer_data::harvest::HarvestSettings;
///
/// let settings = HarvestSettings::default()
///     .with_max_attempts(3)
///     .with_pacing(Duration::ZERO);
/// assert_eq!(settings.max_attempts, 3);
/// assert!(settings.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct HarvestSettings {
    /// Mirror URLs in rotation order.
    pub endpoints: Vec<String>,
    /// Round trips per fetch.
    pub max_attempts: u32,
    /// Backoff unit; attempt `n` waits `n + 1` units.
    pub backoff_base: Duration,
    /// Query rounds per cell.
    pub max_shrinks: u32,
    /// Radius multiplier applied after a failed or distrusted round.
    pub shrink_factor: f64,
    /// Radius floor in kilometres.
    pub min_radius_km: u32,
    /// Pause after every cell.
    pub pacing: Duration,
    /// Client-side request timeout.
    pub request_timeout: Duration,
    /// `User-Agent` header value.
    pub user_agent: String,
    /// Value of the `source` column.
    pub source: String,
    /// Region code appended to addresses.
    pub region_code: String,
    /// Mobile-business keywords.
    pub keywords: Vec<String>,
    /// Output CSV path.
    pub output: Utf8PathBuf,
}

impl Default for HarvestSettings {
    fn default() -> Self {
        Self {
            endpoints: DEFAULT_ENDPOINTS.iter().map(|url| (*url).to_owned()).collect(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_base: DEFAULT_BACKOFF_BASE,
            max_shrinks: DEFAULT_MAX_SHRINKS,
            shrink_factor: DEFAULT_SHRINK_FACTOR,
            min_radius_km: DEFAULT_MIN_RADIUS_KM,
            pacing: DEFAULT_PACING,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            source: DEFAULT_SOURCE.to_owned(),
            region_code: DEFAULT_REGION_CODE.to_owned(),
            keywords: DEFAULT_MOBILE_KEYWORDS
                .iter()
                .map(|keyword| (*keyword).to_owned())
                .collect(),
            output: Utf8PathBuf::from(DEFAULT_OUTPUT),
        }
    }
}

impl HarvestSettings {
    /// Replace the mirror list.
    #[must_use]
    pub fn with_endpoints<I, S>(mut self, endpoints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.endpoints = endpoints.into_iter().map(Into::into).collect();
        self
    }

    /// Set the per-fetch attempt budget.
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Set the backoff unit.
    #[must_use]
    pub fn with_backoff_base(mut self, backoff_base: Duration) -> Self {
        self.backoff_base = backoff_base;
        self
    }

    /// Set the per-cell round budget.
    #[must_use]
    pub fn with_max_shrinks(mut self, max_shrinks: u32) -> Self {
        self.max_shrinks = max_shrinks;
        self
    }

    /// Set the radius multiplier.
    #[must_use]
    pub fn with_shrink_factor(mut self, shrink_factor: f64) -> Self {
        self.shrink_factor = shrink_factor;
        self
    }

    /// Set the radius floor.
    #[must_use]
    pub fn with_min_radius_km(mut self, min_radius_km: u32) -> Self {
        self.min_radius_km = min_radius_km;
        self
    }

    /// Set the pause between cells.
    #[must_use]
    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    /// Set the `User-Agent` header.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the output path.
    #[must_use]
    pub fn with_output(mut self, output: impl Into<Utf8PathBuf>) -> Self {
        self.output = output.into();
        self
    }

    /// Check the budgets and shrink factor, and return the parsed mirror pool.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError`] for an empty or invalid mirror list, a zero
    /// attempt or round budget, a zero radius floor, or a shrink factor
    /// outside `(0, 1)`.
    pub fn validate(&self) -> Result<EndpointPool, HarvestError> {
        if self.max_attempts == 0 {
            return Err(HarvestError::ZeroAttempts);
        }
        if self.max_shrinks == 0 {
            return Err(HarvestError::ZeroShrinks);
        }
        if self.min_radius_km == 0 {
            return Err(HarvestError::ZeroMinRadius);
        }
        if !(self.shrink_factor > 0.0 && self.shrink_factor < 1.0) {
            return Err(HarvestError::InvalidShrinkFactor {
                factor: self.shrink_factor,
            });
        }
        Ok(EndpointPool::new(&self.endpoints)?)
    }

    /// Retry policy derived from these settings.
    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            base_delay: self.backoff_base,
        }
    }

    /// Shrink policy derived from these settings.
    #[must_use]
    pub const fn shrink_policy(&self) -> ShrinkPolicy {
        ShrinkPolicy {
            max_shrinks: self.max_shrinks,
            factor: self.shrink_factor,
            min_radius_km: self.min_radius_km,
        }
    }

    /// HTTP transport configuration derived from these settings.
    #[must_use]
    pub fn transport_config(&self) -> HttpTransportConfig {
        HttpTransportConfig::default()
            .with_timeout(self.request_timeout)
            .with_user_agent(self.user_agent.clone())
    }

    fn normalizer(&self) -> Normalizer {
        Normalizer::new(
            MobileClassifier::new(&self.keywords),
            self.source.clone(),
            self.region_code.clone(),
        )
    }
}

/// Counters for a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HarvestReport {
    /// Cells that reached a trusted answer.
    pub cells_completed: u32,
    /// Cells skipped after the round budget ran out.
    pub cells_skipped: u32,
    /// Rows handed to the sink.
    pub rows_written: u64,
    /// Rows dropped as in-run duplicates.
    pub duplicates_suppressed: u64,
}

/// Sequential harvester over a list of cells.
#[derive(Debug)]
pub struct Harvester<T, S> {
    scanner: CellScanner<T, S>,
    normalizer: Normalizer,
    pacing: Duration,
}

impl<T, S> Harvester<T, S>
where
    T: OverpassTransport,
    S: Sleeper,
{
    /// Validate `settings` and assemble the pipeline around `transport`.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError`] when [`HarvestSettings::validate`] fails.
    pub fn new(transport: T, sleeper: S, settings: &HarvestSettings) -> Result<Self, HarvestError> {
        let pool = settings.validate()?;
        let fetcher = ResilientFetcher::new(transport, pool, settings.retry_policy(), sleeper);
        Ok(Self {
            scanner: CellScanner::new(fetcher, settings.shrink_policy()),
            normalizer: settings.normalizer(),
            pacing: settings.pacing,
        })
    }

    /// Scan every cell in order and stream new rows into `sink`.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::Cells`] before any request when `cells` is
    /// empty or invalid, and [`HarvestError::Output`] as soon as the sink
    /// rejects a row.
    pub fn run<W>(&mut self, cells: &[CityCell], sink: &mut W) -> Result<HarvestReport, HarvestError>
    where
        W: RowSink + ?Sized,
    {
        validate_cells(cells)?;
        let mut report = HarvestReport::default();
        let suppressed_before = self.normalizer.suppressed();

        for cell in cells {
            match self.scanner.scan_cell(cell) {
                CellOutcome::Done { elements, .. } => {
                    report.cells_completed += 1;
                    for element in &elements {
                        if let Some(row) = self.normalizer.normalize(element, cell) {
                            sink.write_row(&row)?;
                            report.rows_written += 1;
                        }
                    }
                }
                CellOutcome::GaveUp { .. } => report.cells_skipped += 1,
            }
            self.scanner.fetcher().sleeper().sleep(self.pacing);
        }

        report.duplicates_suppressed = self.normalizer.suppressed() - suppressed_before;
        info!(
            "harvest finished: {} rows written, {} duplicates suppressed, {} cells completed, {} skipped",
            report.rows_written,
            report.duplicates_suppressed,
            report.cells_completed,
            report.cells_skipped
        );
        Ok(report)
    }
}

/// Harvest `cells` over HTTP into the CSV file named by `settings.output`.
///
/// Settings, cells, and the output file are all checked before the first
/// request is sent.
///
/// # Errors
///
/// Returns [`HarvestError`] for invalid configuration, a transport that fails
/// to build, or output that cannot be opened or written.
pub fn harvest_to_file(
    settings: &HarvestSettings,
    cells: &[CityCell],
) -> Result<HarvestReport, HarvestError> {
    let transport = HttpTransport::with_config(settings.transport_config())?;
    harvest_with(transport, ThreadSleeper, settings, cells, &settings.output)
}

/// Like [`harvest_to_file`] with an explicit transport, sleeper, and output path.
///
/// # Errors
///
/// See [`harvest_to_file`].
pub fn harvest_with<T, S>(
    transport: T,
    sleeper: S,
    settings: &HarvestSettings,
    cells: &[CityCell],
    output: &Utf8Path,
) -> Result<HarvestReport, HarvestError>
where
    T: OverpassTransport,
    S: Sleeper,
{
    validate_cells(cells)?;
    let mut harvester = Harvester::new(transport, sleeper, settings)?;
    let mut writer = IncrementalWriter::open(output)?;
    info!("writing to {}", writer.path());
    let report = harvester.run(cells, &mut writer)?;
    writer.close()?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MemorySink, RecordingSleeper, StubTransport};
    use rstest::{fixture, rstest};

    const GROOMERS: &str = r#"{"elements":[
        {"tags":{"name":"Suds Mobile Grooming","phone":"555-0100"},"lat":25.7,"lon":-80.2},
        {"tags":{"name":"Suds Mobile Grooming","phone":"555-0100"},"lat":25.7,"lon":-80.2},
        {"tags":{"name":"Paws Salon"},"center":{"lat":25.8,"lon":-80.3}}
    ]}"#;

    #[fixture]
    fn settings() -> HarvestSettings {
        HarvestSettings::default()
            .with_endpoints(["http://a.test/", "http://b.test/"])
            .with_max_attempts(2)
            .with_backoff_base(Duration::from_millis(5))
            .with_pacing(Duration::from_millis(100))
    }

    fn cells() -> Vec<CityCell> {
        vec![
            CityCell::new("Miami", 25.7617, -80.1918, 45).expect("valid cell"),
            CityCell::new("Tampa", 27.9506, -82.4572, 40).expect("valid cell"),
        ]
    }

    #[rstest]
    fn defaults_match_documented_values() {
        let settings = HarvestSettings::default();
        assert_eq!(settings.max_attempts, 8);
        assert_eq!(settings.backoff_base, Duration::from_millis(1500));
        assert_eq!(settings.max_shrinks, 4);
        assert_eq!(settings.min_radius_km, 10);
        assert_eq!(settings.pacing, Duration::from_millis(1200));
        assert_eq!(settings.request_timeout, Duration::from_secs(180));
        assert_eq!(settings.endpoints.len(), 5);
        assert_eq!(settings.keywords.len(), 8);
        assert_eq!(settings.output, "fl_pet_groomers_osm.csv");
    }

    #[rstest]
    #[case(HarvestSettings::default().with_max_attempts(0))]
    #[case(HarvestSettings::default().with_max_shrinks(0))]
    #[case(HarvestSettings::default().with_min_radius_km(0))]
    #[case(HarvestSettings::default().with_shrink_factor(1.0))]
    #[case(HarvestSettings::default().with_shrink_factor(0.0))]
    #[case(HarvestSettings::default().with_shrink_factor(f64::NAN))]
    #[case(HarvestSettings::default().with_endpoints(Vec::<String>::new()))]
    #[case(HarvestSettings::default().with_endpoints(["not a url"]))]
    fn rejects_invalid_settings(#[case] settings: HarvestSettings) {
        assert!(settings.validate().is_err());
    }

    #[rstest]
    fn zero_radius_floor_is_rejected() {
        let err = HarvestSettings::default()
            .with_min_radius_km(0)
            .validate()
            .expect_err("a zero floor would allow `around:0` queries");
        assert!(matches!(err, HarvestError::ZeroMinRadius));
    }

    #[rstest]
    fn run_writes_rows_and_paces_every_cell(settings: HarvestSettings) {
        let transport = StubTransport::new()
            .then_ok(GROOMERS)
            .then_status(503)
            .then_ok(GROOMERS);
        let sleeper = RecordingSleeper::default();
        let mut sink = MemorySink::default();
        let mut harvester =
            Harvester::new(&transport, &sleeper, &settings).expect("valid settings");

        let report = harvester.run(&cells(), &mut sink).expect("run succeeds");

        assert_eq!(
            report,
            HarvestReport {
                cells_completed: 2,
                cells_skipped: 0,
                rows_written: 4,
                duplicates_suppressed: 2,
            }
        );
        let names: Vec<(&str, &str)> = sink
            .rows
            .iter()
            .map(|row| (row.name.as_str(), row.city.as_str()))
            .collect();
        assert_eq!(
            names,
            vec![
                ("Suds Mobile Grooming", "Miami"),
                ("Paws Salon", "Miami"),
                ("Suds Mobile Grooming", "Tampa"),
                ("Paws Salon", "Tampa"),
            ]
        );
        assert_eq!(
            sleeper.recorded(),
            vec![
                Duration::from_millis(100),
                Duration::from_millis(5),
                Duration::from_millis(100),
            ]
        );
    }

    #[rstest]
    fn skipped_cells_are_counted_and_still_paced(settings: HarvestSettings) {
        let transport = StubTransport::always_status(504);
        let sleeper = RecordingSleeper::default();
        let mut sink = MemorySink::default();
        let mut harvester =
            Harvester::new(&transport, &sleeper, &settings).expect("valid settings");

        let report = harvester.run(&cells(), &mut sink).expect("run succeeds");

        assert_eq!(report.cells_skipped, 2);
        assert_eq!(report.cells_completed, 0);
        assert!(sink.rows.is_empty());
        let pauses = sleeper
            .recorded()
            .into_iter()
            .filter(|pause| *pause == Duration::from_millis(100))
            .count();
        assert_eq!(pauses, 2);
    }

    #[rstest]
    fn invalid_cells_fail_before_any_request(settings: HarvestSettings) {
        let transport = StubTransport::always_ok(GROOMERS);
        let sleeper = RecordingSleeper::default();
        let mut harvester =
            Harvester::new(&transport, &sleeper, &settings).expect("valid settings");
        let mut duplicated = cells();
        duplicated.push(duplicated[0].clone());

        let err = harvester
            .run(&duplicated, &mut MemorySink::default())
            .expect_err("duplicate names");

        assert!(matches!(err, HarvestError::Cells(CityCellError::DuplicateName { .. })));
        assert!(transport.endpoints_called().is_empty());
    }

    #[rstest]
    fn unwritable_output_fails_before_any_request(settings: HarvestSettings) {
        let tmp = tempfile::TempDir::new().expect("tempdir");
        let output = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf-8 path");
        let transport = StubTransport::always_ok(GROOMERS);

        let err = harvest_with(&transport, RecordingSleeper::default(), &settings, &cells(), &output)
            .expect_err("a directory is not writable as a file");

        assert!(matches!(err, HarvestError::Output(WriterError::Open { .. })));
        assert!(transport.endpoints_called().is_empty());
    }

    #[rstest]
    #[case(HarvestSettings::default().with_max_attempts(0), Vec::new())]
    #[case(HarvestSettings::default().with_min_radius_km(0), cells())]
    #[case(HarvestSettings::default(), Vec::new())]
    fn harvest_to_file_rejects_bad_input_before_touching_output(
        #[case] settings: HarvestSettings,
        #[case] cells: Vec<CityCell>,
    ) {
        let tmp = tempfile::TempDir::new().expect("tempdir");
        let output =
            Utf8PathBuf::from_path_buf(tmp.path().join("groomers.csv")).expect("utf-8 path");
        let settings = settings.with_output(output.clone());

        let err = harvest_to_file(&settings, &cells).expect_err("configuration is invalid");

        assert!(
            matches!(
                err,
                HarvestError::Cells(_) | HarvestError::ZeroAttempts | HarvestError::ZeroMinRadius
            ),
            "got {err:?}"
        );
        assert!(!output.exists());
    }
}
