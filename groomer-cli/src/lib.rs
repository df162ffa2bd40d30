//! Command-line interface for the groomer harvester.
#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};

mod error;
mod harvest;

pub use error::CliError;

use harvest::{HarvestArgs, run_harvest};

const ARG_OUTPUT: &str = "output";
const ARG_CELLS: &str = "cells";
const ARG_ENDPOINT: &str = "endpoint";
const ARG_MAX_ATTEMPTS: &str = "max-attempts";
const ARG_MAX_SHRINKS: &str = "max-shrinks";
const ARG_MIN_RADIUS_KM: &str = "min-radius-km";
const ARG_BACKOFF_MS: &str = "backoff-ms";
const ARG_PACING_MS: &str = "pacing-ms";
const ARG_TIMEOUT_SECS: &str = "timeout-secs";
const ARG_USER_AGENT: &str = "user-agent";

/// Run the groomer CLI with the current process arguments and environment.
///
/// # Errors
///
/// Returns [`CliError`] when arguments or configuration are invalid, or when
/// the harvest fails fatally.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    match cli.command {
        Command::Harvest(args) => {
            run_harvest(args)?;
        }
    }
    Ok(())
}

#[derive(Debug, Parser)]
#[command(
    name = "groomer",
    about = "Harvest mobile pet-grooming businesses from OpenStreetMap",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Query Overpass mirrors city by city and append results to a CSV file.
    Harvest(HarvestArgs),
}

#[cfg(test)]
mod tests;
