//! Fan-out of per-ward forecasts over a simulated dataset.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use tracing::{info, warn};

use super::{DEFAULT_HORIZON, ForecastError, Forecaster, SeriesPoint};
use crate::month::YearMonth;
use crate::sim::types::SimulatedRecord;

/// Predicted consumption of one ward in one future month.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastRecord {
    pub state: String,
    pub ward_id: String,
    pub month: YearMonth,
    pub predicted_consumption: f64,
}

/// A series that could not be forecast, and why.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesFailure {
    pub state: String,
    pub ward_id: String,
    pub error: ForecastError,
}

impl fmt::Display for SeriesFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}: {}", self.state, self.ward_id, self.error)
    }
}

/// Outcome of forecasting every series in a dataset.
#[derive(Debug, Clone, Default)]
pub struct ForecastRun {
    /// Predictions of every successful series, ordered by state, ward, month.
    pub records: Vec<ForecastRecord>,
    /// Series excluded from `records`, in the same order.
    pub failures: Vec<SeriesFailure>,
    /// Number of series forecast successfully.
    pub succeeded: usize,
}

impl ForecastRun {
    pub fn total_series(&self) -> usize {
        self.succeeded + self.failures.len()
    }
}

impl fmt::Display for ForecastRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Forecast Summary ---")?;
        writeln!(f, "Series forecast:  {}", self.total_series())?;
        writeln!(f, "Succeeded:        {}", self.succeeded)?;
        writeln!(f, "Failed:           {}", self.failures.len())?;
        write!(f, "Forecast rows:    {}", self.records.len())?;
        for failure in &self.failures {
            write!(f, "\n  {failure}")?;
        }
        Ok(())
    }
}

/// Identity of one ward series.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SeriesKey {
    state: String,
    ward_id: String,
}

impl SeriesKey {
    /// Numeric part of `W<n>` labels, so W2 sorts before W10.
    fn ward_ordinal(&self) -> Option<u64> {
        self.ward_id.strip_prefix('W')?.parse().ok()
    }
}

impl Ord for SeriesKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.state
            .cmp(&other.state)
            .then_with(|| match (self.ward_ordinal(), other.ward_ordinal()) {
                (Some(a), Some(b)) => a.cmp(&b),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            })
            .then_with(|| self.ward_id.cmp(&other.ward_id))
    }
}

impl PartialOrd for SeriesKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Drives a [`Forecaster`] over every (state, ward) series of a dataset.
///
/// Series are independent, so they are fitted on the current rayon pool and
/// merged afterwards in sorted order; the output does not depend on thread
/// scheduling. A failing series is reported in [`ForecastRun::failures`]
/// and never stops the others.
#[derive(Debug, Clone, Copy)]
pub struct ForecastAggregator {
    horizon: usize,
    fit_budget: Option<Duration>,
}

impl ForecastAggregator {
    pub fn new(horizon: usize) -> Self {
        Self {
            horizon,
            fit_budget: None,
        }
    }

    /// Treats any series whose fit takes longer than `budget` as failed.
    ///
    /// Fits are not interrupted; an over-budget result is discarded once it
    /// returns.
    pub fn with_fit_budget(mut self, budget: Duration) -> Self {
        self.fit_budget = Some(budget);
        self
    }

    pub fn horizon(&self) -> usize {
        self.horizon
    }

    pub fn aggregate<F>(&self, simulated: &[SimulatedRecord], forecaster: &F) -> ForecastRun
    where
        F: Forecaster + Sync,
    {
        let series = group_series(simulated);

        let outcomes: Vec<Result<Vec<SeriesPoint>, ForecastError>> = series
            .par_iter()
            .map(|(_, points)| self.forecast_one(points, forecaster))
            .collect();

        let mut run = ForecastRun::default();
        for ((key, _), outcome) in series.into_iter().zip(outcomes) {
            match outcome {
                Ok(points) => {
                    run.succeeded += 1;
                    run.records
                        .extend(points.into_iter().map(|(month, value)| ForecastRecord {
                            state: key.state.clone(),
                            ward_id: key.ward_id.clone(),
                            month,
                            predicted_consumption: value,
                        }));
                }
                Err(error) => {
                    warn!(
                        state = %key.state,
                        ward = %key.ward_id,
                        %error,
                        "series forecast failed"
                    );
                    run.failures.push(SeriesFailure {
                        state: key.state,
                        ward_id: key.ward_id,
                        error,
                    });
                }
            }
        }

        info!(
            series = run.total_series(),
            succeeded = run.succeeded,
            failed = run.failures.len(),
            rows = run.records.len(),
            "forecasting complete"
        );
        run
    }

    fn forecast_one<F: Forecaster>(
        &self,
        points: &[SeriesPoint],
        forecaster: &F,
    ) -> Result<Vec<SeriesPoint>, ForecastError> {
        let started = Instant::now();
        let predicted = forecaster.fit_and_predict(points, self.horizon)?;
        if let Some(budget) = self.fit_budget {
            let elapsed = started.elapsed();
            if elapsed > budget {
                return Err(ForecastError::Timeout {
                    elapsed_ms: elapsed.as_millis(),
                    budget_ms: budget.as_millis(),
                });
            }
        }
        Ok(predicted)
    }
}

impl Default for ForecastAggregator {
    fn default() -> Self {
        Self::new(DEFAULT_HORIZON)
    }
}

/// Splits records into chronologically ordered series, sorted by key.
fn group_series(simulated: &[SimulatedRecord]) -> Vec<(SeriesKey, Vec<SeriesPoint>)> {
    let mut grouped: BTreeMap<SeriesKey, Vec<SeriesPoint>> = BTreeMap::new();
    for r in simulated {
        grouped
            .entry(SeriesKey {
                state: r.state.clone(),
                ward_id: r.ward_id.clone(),
            })
            .or_default()
            .push((r.month, r.consumption_kwh));
    }

    grouped
        .into_iter()
        .map(|(key, mut points)| {
            // Stable: duplicate months stay adjacent and are rejected by the model.
            points.sort_by_key(|(month, _)| *month);
            (key, points)
        })
        .collect()
}
