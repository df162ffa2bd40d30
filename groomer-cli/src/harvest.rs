//! Harvest command implementation for the groomer CLI.

use std::io::BufReader;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use groomer_core::{CityCell, florida_cells};
use groomer_data::{HarvestReport, HarvestSettings, harvest_to_file};
use groomer_fs::open_utf8_file;
use log::debug;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::{
    ARG_BACKOFF_MS, ARG_CELLS, ARG_ENDPOINT, ARG_MAX_ATTEMPTS, ARG_MAX_SHRINKS,
    ARG_MIN_RADIUS_KM, ARG_OUTPUT, ARG_PACING_MS, ARG_TIMEOUT_SECS, ARG_USER_AGENT, CliError,
};

/// CLI arguments for the `harvest` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Query Overpass mirrors for pet-grooming businesses around \
                 each city cell and append new rows to a CSV file. Every \
                 option can also come from a configuration file or \
                 GROOMER_CMDS_HARVEST_* environment variables.",
    about = "Harvest groomers into a CSV file"
)]
#[ortho_config(prefix = "GROOMER")]
pub(crate) struct HarvestArgs {
    /// CSV file to append to (default `fl_pet_groomers_osm.csv`).
    #[arg(long = ARG_OUTPUT, value_name = "path")]
    #[serde(default)]
    pub(crate) output: Option<Utf8PathBuf>,
    /// JSON file listing the city cells; the built-in Florida list otherwise.
    #[arg(long = ARG_CELLS, value_name = "path")]
    #[serde(default)]
    pub(crate) cells: Option<Utf8PathBuf>,
    /// Overpass mirror URL; repeat to build the rotation.
    #[arg(long = ARG_ENDPOINT, value_name = "url")]
    #[serde(default)]
    pub(crate) endpoints: Option<Vec<String>>,
    /// Round trips per fetch.
    #[arg(long = ARG_MAX_ATTEMPTS, value_name = "count")]
    #[serde(default)]
    pub(crate) max_attempts: Option<u32>,
    /// Query rounds per cell before it is skipped.
    #[arg(long = ARG_MAX_SHRINKS, value_name = "count")]
    #[serde(default)]
    pub(crate) max_shrinks: Option<u32>,
    /// Smallest search radius in kilometres.
    #[arg(long = ARG_MIN_RADIUS_KM, value_name = "km")]
    #[serde(default)]
    pub(crate) min_radius_km: Option<u32>,
    /// Backoff unit in milliseconds.
    #[arg(long = ARG_BACKOFF_MS, value_name = "ms")]
    #[serde(default)]
    pub(crate) backoff_ms: Option<u64>,
    /// Pause after every cell in milliseconds.
    #[arg(long = ARG_PACING_MS, value_name = "ms")]
    #[serde(default)]
    pub(crate) pacing_ms: Option<u64>,
    /// Per-request timeout in seconds.
    #[arg(long = ARG_TIMEOUT_SECS, value_name = "secs")]
    #[serde(default)]
    pub(crate) timeout_secs: Option<u64>,
    /// `User-Agent` header sent to the mirrors.
    #[arg(long = ARG_USER_AGENT, value_name = "agent")]
    #[serde(default)]
    pub(crate) user_agent: Option<String>,
}

impl HarvestArgs {
    pub(crate) fn into_config(self) -> Result<HarvestConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        HarvestConfig::try_from(merged)
    }
}

/// Resolved `harvest` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct HarvestConfig {
    /// Run tunables with defaults filled in.
    pub(crate) settings: HarvestSettings,
    /// Optional cells file; `None` selects the built-in list.
    pub(crate) cells: Option<Utf8PathBuf>,
}

impl HarvestConfig {
    pub(crate) fn load_cells(&self) -> Result<Vec<CityCell>, CliError> {
        self.cells
            .as_deref()
            .map_or_else(|| Ok(florida_cells()), load_cells)
    }
}

impl TryFrom<HarvestArgs> for HarvestConfig {
    type Error = CliError;

    fn try_from(args: HarvestArgs) -> Result<Self, Self::Error> {
        let mut settings = HarvestSettings::default();
        if let Some(output) = args.output {
            settings = settings.with_output(output);
        }
        if let Some(endpoints) = args.endpoints {
            settings = settings.with_endpoints(endpoints);
        }
        if let Some(max_attempts) = args.max_attempts {
            settings = settings.with_max_attempts(max_attempts);
        }
        if let Some(max_shrinks) = args.max_shrinks {
            settings = settings.with_max_shrinks(max_shrinks);
        }
        if let Some(min_radius_km) = args.min_radius_km {
            settings = settings.with_min_radius_km(min_radius_km);
        }
        if let Some(backoff_ms) = args.backoff_ms {
            settings = settings.with_backoff_base(Duration::from_millis(backoff_ms));
        }
        if let Some(pacing_ms) = args.pacing_ms {
            settings = settings.with_pacing(Duration::from_millis(pacing_ms));
        }
        if let Some(timeout_secs) = args.timeout_secs {
            settings = settings.with_request_timeout(Duration::from_secs(timeout_secs));
        }
        if let Some(user_agent) = args.user_agent {
            settings = settings.with_user_agent(user_agent);
        }
        Ok(Self {
            settings,
            cells: args.cells,
        })
    }
}

/// One entry of a cells file.
#[derive(Debug, Clone, Deserialize)]
struct CellEntry {
    name: String,
    latitude: f64,
    longitude: f64,
    initial_radius_km: u32,
}

/// Loads a JSON array of city cells from disk.
pub(crate) fn load_cells(path: &Utf8Path) -> Result<Vec<CityCell>, CliError> {
    let file = open_utf8_file(path).map_err(|source| CliError::OpenCells {
        path: path.to_path_buf(),
        source,
    })?;
    let entries: Vec<CellEntry> =
        serde_json::from_reader(BufReader::new(file)).map_err(|source| CliError::ParseCells {
            path: path.to_path_buf(),
            source,
        })?;
    entries
        .into_iter()
        .map(|entry| {
            CityCell::new(
                entry.name,
                entry.latitude,
                entry.longitude,
                entry.initial_radius_km,
            )
            .map_err(|source| CliError::InvalidCell {
                path: path.to_path_buf(),
                source,
            })
        })
        .collect()
}

pub(crate) fn run_harvest(args: HarvestArgs) -> Result<HarvestReport, CliError> {
    let config = args.into_config()?;
    debug!("resolved harvest configuration: {config:?}");
    let cells = config.load_cells()?;
    Ok(harvest_to_file(&config.settings, &cells)?)
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<HarvestConfig, CliError> {
    let merged = HarvestArgs::merge_from_layers(layers).map_err(CliError::from)?;
    HarvestConfig::try_from(merged)
}
