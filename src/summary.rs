//! Per-ward headline metrics and ward rankings over the two datasets.

use std::collections::HashMap;
use std::fmt;

use crate::error::InputFormatError;
use crate::forecast::ForecastRecord;
use crate::month::YearMonth;
use crate::sim::types::SimulatedRecord;

/// Default length of the ward ranking.
pub const DEFAULT_TOP_N: usize = 5;

/// Actual-versus-forecast metrics for one ward.
#[derive(Debug, Clone, PartialEq)]
pub struct WardSummary {
    pub state: String,
    pub ward_id: String,
    /// Most recent observed month and its consumption (kWh).
    pub last_actual: (YearMonth, f64),
    /// First forecast month after the history, if the ward was forecast.
    pub next_forecast: Option<(YearMonth, f64)>,
    /// Mean monthly consumption over the history (kWh).
    pub average_kwh: f64,
    /// Last observed value minus first observed value (kWh).
    pub net_change_kwh: f64,
}

impl WardSummary {
    /// Next forecast minus last actual, when a forecast exists.
    pub fn forecast_delta_kwh(&self) -> Option<f64> {
        self.next_forecast.map(|(_, v)| v - self.last_actual.1)
    }
}

impl fmt::Display for WardSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Summary: {} / {} ---", self.state, self.ward_id)?;
        writeln!(
            f,
            "Last month actual ({}): {:.2} kWh",
            self.last_actual.0, self.last_actual.1
        )?;
        match (self.next_forecast, self.forecast_delta_kwh()) {
            (Some((month, value)), Some(delta)) => writeln!(
                f,
                "Next month forecast ({month}): {value:.2} kWh (delta {delta:+.2} kWh)"
            )?,
            _ => writeln!(f, "Next month forecast: n/a")?,
        }
        writeln!(f, "Avg monthly consumption: {:.2} kWh", self.average_kwh)?;
        write!(f, "12-month net change: {:+.2} kWh", self.net_change_kwh)
    }
}

/// Computes the headline metrics for one ward.
///
/// Returns `None` if the ward has no observations.
pub fn ward_summary(
    simulated: &[SimulatedRecord],
    forecasts: &[ForecastRecord],
    state: &str,
    ward_id: &str,
) -> Option<WardSummary> {
    let mut history: Vec<(YearMonth, f64)> = simulated
        .iter()
        .filter(|r| r.state == state && r.ward_id == ward_id)
        .map(|r| (r.month, r.consumption_kwh))
        .collect();
    history.sort_by_key(|(m, _)| *m);

    let first = *history.first()?;
    let last = *history.last()?;
    let average_kwh = history.iter().map(|(_, v)| v).sum::<f64>() / history.len() as f64;

    let next_forecast = forecasts
        .iter()
        .filter(|r| r.state == state && r.ward_id == ward_id && r.month > last.0)
        .map(|r| (r.month, r.predicted_consumption))
        .min_by_key(|(m, _)| *m);

    Some(WardSummary {
        state: state.to_string(),
        ward_id: ward_id.to_string(),
        last_actual: last,
        next_forecast,
        average_kwh,
        net_change_kwh: last.1 - first.1,
    })
}

/// A ward's total observed consumption.
#[derive(Debug, Clone, PartialEq)]
pub struct WardRanking {
    pub ward_id: String,
    pub total_kwh: f64,
}

/// The `n` wards of `state` with the highest total consumption, highest first.
///
/// Ties keep the ward with the lower label first.
pub fn top_wards(simulated: &[SimulatedRecord], state: &str, n: usize) -> Vec<WardRanking> {
    let mut totals: HashMap<&str, f64> = HashMap::new();
    for r in simulated.iter().filter(|r| r.state == state) {
        *totals.entry(r.ward_id.as_str()).or_default() += r.consumption_kwh;
    }

    let mut ranking: Vec<WardRanking> = totals
        .into_iter()
        .map(|(ward_id, total_kwh)| WardRanking {
            ward_id: ward_id.to_string(),
            total_kwh,
        })
        .collect();
    ranking.sort_by(|a, b| {
        b.total_kwh
            .total_cmp(&a.total_kwh)
            .then_with(|| a.ward_id.cmp(&b.ward_id))
    });
    ranking.truncate(n);
    ranking
}

/// Sorted distinct states in a simulated dataset.
pub fn states(simulated: &[SimulatedRecord]) -> Vec<String> {
    let mut out: Vec<String> = simulated.iter().map(|r| r.state.clone()).collect();
    out.sort();
    out.dedup();
    out
}

/// The state to summarize: `requested` if given, else the first state
/// alphabetically.
///
/// # Errors
///
/// Returns [`InputFormatError::Empty`] if the dataset has no records.
pub fn select_state(
    simulated: &[SimulatedRecord],
    requested: Option<String>,
) -> Result<String, InputFormatError> {
    if simulated.is_empty() {
        return Err(InputFormatError::Empty);
    }
    match requested {
        Some(state) => Ok(state),
        None => states(simulated)
            .into_iter()
            .next()
            .ok_or(InputFormatError::Empty),
    }
}
