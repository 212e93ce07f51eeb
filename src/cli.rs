//! Command-line interface.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::PipelineConfig;
use crate::summary::DEFAULT_TOP_N;

/// Synthetic ward-level energy consumption and monthly forecasts.
#[derive(Debug, Parser)]
#[command(name = "ward-energy", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Split state totals into a simulated ward-month dataset.
    Simulate {
        /// State totals CSV (`state,annual_consumption_kwh`).
        #[arg(long)]
        input: PathBuf,
        /// Where to write the simulated dataset.
        #[arg(long, default_value = "simulated_energy_consumption.csv")]
        output: PathBuf,
        #[command(flatten)]
        overrides: Overrides,
    },
    /// Forecast every ward series of a simulated dataset.
    Forecast {
        /// Simulated dataset CSV.
        #[arg(long)]
        input: PathBuf,
        /// Where to write the combined forecast dataset.
        #[arg(long, default_value = "all_forecasts.csv")]
        output: PathBuf,
        #[command(flatten)]
        overrides: Overrides,
    },
    /// Simulate, then forecast, writing both datasets.
    Run {
        /// State totals CSV (`state,annual_consumption_kwh`).
        #[arg(long)]
        input: PathBuf,
        #[arg(long, default_value = "simulated_energy_consumption.csv")]
        simulated_out: PathBuf,
        #[arg(long, default_value = "all_forecasts.csv")]
        forecast_out: PathBuf,
        #[command(flatten)]
        overrides: Overrides,
    },
    /// Print headline metrics for a ward and the top wards of its state.
    Summary {
        /// Simulated dataset CSV.
        #[arg(long)]
        simulated: PathBuf,
        /// Combined forecast dataset CSV.
        #[arg(long)]
        forecasts: Option<PathBuf>,
        /// State to summarize; defaults to the first state alphabetically.
        #[arg(long)]
        state: Option<String>,
        /// Ward to summarize.
        #[arg(long, default_value = "W1")]
        ward: String,
        /// Number of wards in the ranking.
        #[arg(long, default_value_t = DEFAULT_TOP_N)]
        top: usize,
    },
}

/// Options shared by the pipeline subcommands.
#[derive(Debug, Args)]
pub struct Overrides {
    /// TOML configuration file.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Override the random seed.
    #[arg(long)]
    pub seed: Option<u64>,
    /// Override the number of wards per state.
    #[arg(long)]
    pub wards: Option<usize>,
    /// Override the number of forecast worker threads.
    #[arg(long)]
    pub threads: Option<usize>,
}

impl Overrides {
    /// Applies command-line overrides on top of a loaded configuration.
    pub fn apply(&self, config: &mut PipelineConfig) {
        if let Some(seed) = self.seed {
            config.simulation.seed = seed;
        }
        if let Some(wards) = self.wards {
            config.simulation.wards_per_state = wards;
        }
        if let Some(threads) = self.threads {
            config.forecast.threads = Some(threads);
        }
    }
}
