//! Config-driven wiring of the simulate and forecast stages.

use tracing::info;

use crate::config::{ModelKind, PipelineConfig};
use crate::error::PipelineError;
use crate::forecast::{
    DecompositionForecaster, ForecastAggregator, ForecastRun, Forecaster, SeasonalNaiveForecaster,
};
use crate::sim::{
    AllocationSimulator, NoiseModel, RandomSource, SeasonalProfile, SimulatedRecord,
    StateAggregate,
};

/// Both datasets produced by a full run.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub simulated: Vec<SimulatedRecord>,
    pub forecast: ForecastRun,
}

/// Validates `config`, failing with every violated constraint at once.
///
/// # Errors
///
/// Returns [`PipelineError::Config`] if any field is invalid.
pub fn check_config(config: &PipelineConfig) -> Result<(), PipelineError> {
    let errors = config.validate();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(PipelineError::Config(errors))
    }
}

/// Builds the allocation simulator described by `config`.
///
/// # Errors
///
/// Returns a [`PipelineError`] if the configuration is invalid.
pub fn build_simulator(config: &PipelineConfig) -> Result<AllocationSimulator, PipelineError> {
    check_config(config)?;
    let s = &config.simulation;
    let profile = SeasonalProfile::new(&config.profile.weights)?;
    let noise = NoiseModel::new(s.noise_std)?;
    let start = config.start_month()?;
    let simulator = AllocationSimulator::new(s.wards_per_state, profile, noise, start)?
        .with_negative_policy(s.negative_values);
    Ok(simulator)
}

/// Runs the allocation stage.
///
/// # Errors
///
/// Returns a [`PipelineError`] if the configuration or any state total is
/// invalid.
pub fn simulate(
    config: &PipelineConfig,
    states: &[StateAggregate],
) -> Result<Vec<SimulatedRecord>, PipelineError> {
    let simulator = build_simulator(config)?;
    let random = RandomSource::new(config.simulation.seed);
    Ok(simulator.simulate(states, &random)?)
}

/// Runs the forecasting stage on the configured worker pool.
///
/// Per-series failures are reported in the returned [`ForecastRun`].
///
/// # Errors
///
/// Returns a [`PipelineError`] if the configuration is invalid or the worker
/// pool cannot be created.
pub fn forecast(
    config: &PipelineConfig,
    simulated: &[SimulatedRecord],
) -> Result<ForecastRun, PipelineError> {
    check_config(config)?;
    let f = &config.forecast;
    let mut aggregator = ForecastAggregator::new(f.horizon);
    if let Some(budget) = f.fit_budget() {
        aggregator = aggregator.with_fit_budget(budget);
    }

    info!(model = ?f.model, horizon = f.horizon, "forecasting");
    match f.model {
        ModelKind::Decomposition => {
            let forecaster = DecompositionForecaster::new(f.fourier_order, f.min_points)
                .with_seasonality(f.seasonality);
            run_on_pool(f.threads, &aggregator, simulated, &forecaster)
        }
        ModelKind::SeasonalNaive => {
            let forecaster = SeasonalNaiveForecaster::new(f.min_points);
            run_on_pool(f.threads, &aggregator, simulated, &forecaster)
        }
    }
}

/// Simulates `states` and forecasts every resulting ward series.
///
/// # Errors
///
/// Returns a [`PipelineError`] for fatal configuration or input problems.
pub fn run(
    config: &PipelineConfig,
    states: &[StateAggregate],
) -> Result<PipelineOutput, PipelineError> {
    let simulated = simulate(config, states)?;
    let forecast = forecast(config, &simulated)?;
    Ok(PipelineOutput {
        simulated,
        forecast,
    })
}

fn run_on_pool<F>(
    threads: Option<usize>,
    aggregator: &ForecastAggregator,
    simulated: &[SimulatedRecord],
    forecaster: &F,
) -> Result<ForecastRun, PipelineError>
where
    F: Forecaster + Sync,
{
    match threads {
        Some(n) => {
            let pool = rayon::ThreadPoolBuilder::new().num_threads(n).build()?;
            Ok(pool.install(|| aggregator.aggregate(simulated, forecaster)))
        }
        None => Ok(aggregator.aggregate(simulated, forecaster)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecast::ForecastError;
    use crate::io::export::{write_forecasts, write_simulated};

    fn states() -> Vec<StateAggregate> {
        vec![
            StateAggregate::new("Delhi", 2.5e7),
            StateAggregate::new("Goa", 4.0e6),
        ]
    }

    #[test]
    fn same_config_and_seed_is_deterministic() {
        let config = PipelineConfig::default();
        let run_a = run(&config, &states()).expect("runs");
        let run_b = run(&config, &states()).expect("runs");

        let mut sim_a = Vec::new();
        let mut sim_b = Vec::new();
        write_simulated(&run_a.simulated, &mut sim_a).expect("first export should succeed");
        write_simulated(&run_b.simulated, &mut sim_b).expect("second export should succeed");
        assert_eq!(sim_a, sim_b);

        let mut fc_a = Vec::new();
        let mut fc_b = Vec::new();
        write_forecasts(&run_a.forecast.records, &mut fc_a).expect("first export should succeed");
        write_forecasts(&run_b.forecast.records, &mut fc_b).expect("second export should succeed");
        assert_eq!(fc_a, fc_b);
    }

    #[test]
    fn thread_count_does_not_change_output() {
        let mut config = PipelineConfig::default();
        let simulated = simulate(&config, &states()).expect("simulates");
        config.forecast.threads = Some(1);
        let single = forecast(&config, &simulated).expect("forecasts");
        config.forecast.threads = Some(4);
        let multi = forecast(&config, &simulated).expect("forecasts");
        assert_eq!(single.records, multi.records);
    }

    #[test]
    fn invalid_config_aborts_before_simulation() {
        let mut config = PipelineConfig::default();
        config.simulation.wards_per_state = 0;
        config.profile.weights.pop();
        match simulate(&config, &states()) {
            Err(PipelineError::Config(errors)) => assert_eq!(errors.len(), 2),
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn seasonal_naive_model_honours_min_points() {
        let mut config = PipelineConfig::default();
        config.forecast.model = ModelKind::SeasonalNaive;
        config.forecast.min_points = 6;
        let short = vec![SimulatedRecord {
            state: "Goa".into(),
            ward_id: "W1".into(),
            month: config.start_month().expect("valid start month"),
            consumption_kwh: 42.0,
        }];
        let run = forecast(&config, &short).expect("forecasts");
        assert_eq!(run.succeeded, 0);
        assert!(run.records.is_empty());
        assert_eq!(run.failures.len(), 1);
        assert_eq!(
            run.failures[0].error,
            ForecastError::InsufficientData {
                points: 1,
                required: 6
            }
        );
    }

    #[test]
    fn seasonal_naive_model_is_selectable() {
        let mut config = PipelineConfig::default();
        config.forecast.model = ModelKind::SeasonalNaive;
        let out = run(&config, &states()).expect("runs");
        assert_eq!(out.forecast.succeeded, 20);
        assert_eq!(out.forecast.records.len(), 240);
    }
}
