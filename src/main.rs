//! ward-energy entry point: CLI wiring and config-driven pipeline runs.

use std::process;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ward_energy::cli::{Cli, Command, Overrides};
use ward_energy::config::PipelineConfig;
use ward_energy::error::PipelineError;
use ward_energy::forecast::ForecastRun;
use ward_energy::io::{
    export_forecasts, export_simulated, load_forecasts, load_simulated, load_states,
};
use ward_energy::runner;
use ward_energy::summary::{select_state, top_wards, ward_summary};

fn load_config(overrides: &Overrides) -> Result<PipelineConfig, PipelineError> {
    let mut config = match overrides.config {
        Some(ref path) => PipelineConfig::from_toml_file(path)?,
        None => PipelineConfig::default(),
    };
    overrides.apply(&mut config);
    runner::check_config(&config)?;
    Ok(config)
}

fn report(run: &ForecastRun) {
    println!("{run}");
}

fn execute(command: Command) -> Result<(), PipelineError> {
    match command {
        Command::Simulate {
            input,
            output,
            overrides,
        } => {
            let config = load_config(&overrides)?;
            let states = load_states(&input)?;
            let simulated = runner::simulate(&config, &states)?;
            export_simulated(&simulated, &output)?;
            info!(path = %output.display(), rows = simulated.len(), "simulated dataset written");
        }
        Command::Forecast {
            input,
            output,
            overrides,
        } => {
            let config = load_config(&overrides)?;
            let simulated = load_simulated(&input)?;
            let run = runner::forecast(&config, &simulated)?;
            export_forecasts(&run.records, &output)?;
            info!(path = %output.display(), rows = run.records.len(), "forecast dataset written");
            report(&run);
        }
        Command::Run {
            input,
            simulated_out,
            forecast_out,
            overrides,
        } => {
            let config = load_config(&overrides)?;
            let states = load_states(&input)?;
            let out = runner::run(&config, &states)?;
            export_simulated(&out.simulated, &simulated_out)?;
            info!(path = %simulated_out.display(), "simulated dataset written");
            export_forecasts(&out.forecast.records, &forecast_out)?;
            info!(path = %forecast_out.display(), "forecast dataset written");
            report(&out.forecast);
        }
        Command::Summary {
            simulated,
            forecasts,
            state,
            ward,
            top,
        } => {
            let actual = load_simulated(&simulated)?;
            let predicted = match forecasts {
                Some(ref path) => load_forecasts(path)?,
                None => Vec::new(),
            };
            let state = select_state(&actual, state)?;

            match ward_summary(&actual, &predicted, &state, &ward) {
                Some(s) => println!("{s}"),
                None => eprintln!("no observations for {state} / {ward}"),
            }
            println!("\n--- Top {top} wards in {state} ---");
            for (rank, w) in top_wards(&actual, &state, top).iter().enumerate() {
                println!("{:>2}. {:<6} {:>16.2} kWh", rank + 1, w.ward_id, w.total_kwh);
            }
        }
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("ward_energy=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = execute(cli.command) {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
