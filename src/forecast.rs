//! Per-series forecasting: model capability traits and the batch driver.

/// Combined per-ward forecasting with failure isolation.
pub mod aggregate;
/// Trend plus Fourier-seasonal least-squares model.
pub mod decomposition;
pub mod naive;

use crate::month::YearMonth;

pub use aggregate::{ForecastAggregator, ForecastRecord, ForecastRun, SeriesFailure};
pub use decomposition::{DecompositionForecaster, MIN_POINTS, SeasonalityMode};
pub use naive::SeasonalNaiveForecaster;

/// Default number of future months produced per series.
pub const DEFAULT_HORIZON: usize = 12;

/// One observation or prediction of a monthly series.
pub type SeriesPoint = (YearMonth, f64);

/// Why a single series could not be forecast.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ForecastError {
    #[error("insufficient data: need at least {required} points, got {points}")]
    InsufficientData { points: usize, required: usize },
    #[error("model fit failed: {0}")]
    ModelFit(String),
    #[error("fit took {elapsed_ms} ms, budget is {budget_ms} ms")]
    Timeout { elapsed_ms: u128, budget_ms: u128 },
}

/// A model fitted to one series, able to extrapolate it.
pub trait FittedModel {
    /// Point predictions for the `horizon` months immediately following the
    /// last observed month, in order, without gaps.
    fn predict(&self, horizon: usize) -> Vec<SeriesPoint>;
}

/// Something that can fit a monthly series.
///
/// Implementations must be pure: fitting the same series twice yields models
/// with identical predictions.
pub trait Forecaster {
    type Model: FittedModel;

    /// Fits a model to `series`, which must be ordered by strictly
    /// increasing month.
    ///
    /// # Errors
    ///
    /// Returns a [`ForecastError`] if the series is too short or the model
    /// cannot be estimated.
    fn fit(&self, series: &[SeriesPoint]) -> Result<Self::Model, ForecastError>;

    /// Fits `series` and predicts `horizon` months past its end.
    ///
    /// # Errors
    ///
    /// Propagates any error from [`Forecaster::fit`].
    fn fit_and_predict(
        &self,
        series: &[SeriesPoint],
        horizon: usize,
    ) -> Result<Vec<SeriesPoint>, ForecastError> {
        Ok(self.fit(series)?.predict(horizon))
    }
}

/// Checks the ordering and finiteness every model relies on.
pub(crate) fn check_series(series: &[SeriesPoint]) -> Result<(), ForecastError> {
    if let Some((month, value)) = series.iter().find(|(_, v)| !v.is_finite()) {
        return Err(ForecastError::ModelFit(format!(
            "non-finite value {value} at {month}"
        )));
    }
    if let Some(pair) = series.windows(2).find(|w| w[0].0 >= w[1].0) {
        return Err(ForecastError::ModelFit(format!(
            "months must be strictly increasing, found {} then {}",
            pair[0].0, pair[1].0
        )));
    }
    Ok(())
}
