//! Additive trend + seasonal decomposition fitted by least squares.
//!
//! A series is modelled as
//!
//! ```text
//! y(m) = a + b·t(m) + Σₖ [cₖ·cos(2πk·p(m)/12) + sₖ·sin(2πk·p(m)/12)] + ε
//! ```
//!
//! where `t(m)` is the month offset from the first observation scaled by the
//! history span and `p(m)` is the calendar month index (January = 0). Trend
//! and seasonal terms are estimated jointly; forecasts extrapolate the trend
//! line and repeat the seasonal shape.
//!
//! With fewer than 24 observations each calendar month is seen at most once,
//! so the seasonal shape and the residual noise cannot be told apart. The
//! fit still runs, but expect it to follow the single observed year closely.

use serde::Deserialize;
use tracing::debug;

use super::{FittedModel, ForecastError, Forecaster, SeriesPoint, check_series};
use crate::month::YearMonth;

/// Smallest series the model accepts: intercept, slope and one residual.
pub const MIN_POINTS: usize = 3;

/// Months in one seasonal cycle.
const PERIOD: usize = 12;

/// Highest Fourier order that still yields distinct basis columns for a
/// monthly cycle.
const MAX_FOURIER_ORDER: usize = PERIOD / 2;

/// History length below which [`SeasonalityMode::Auto`] skips seasonality.
const TWO_CYCLES: usize = 2 * PERIOD;

/// Ridge term added to the normal equations' diagonal.
const RIDGE: f64 = 1e-8;

/// Smallest Cholesky pivot, relative to its diagonal entry, accepted as
/// evidence of an independent basis column. Must stay well above `RIDGE`.
const PIVOT_TOLERANCE: f64 = 1e-7;

pub const DEFAULT_FOURIER_ORDER: usize = 3;

/// Whether the yearly seasonal component is fitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeasonalityMode {
    /// Always fit the seasonal terms (order permitting).
    #[default]
    Enabled,
    /// Fit seasonal terms only when at least two full cycles are observed.
    Auto,
    /// Trend only.
    Disabled,
}

/// Linear trend plus Fourier-basis yearly seasonality.
#[derive(Debug, Clone, Copy)]
pub struct DecompositionForecaster {
    fourier_order: usize,
    min_points: usize,
    seasonality: SeasonalityMode,
}

impl DecompositionForecaster {
    /// Creates a forecaster with the given Fourier order and minimum series
    /// length. The order is capped at 6 and `min_points` floored at
    /// [`MIN_POINTS`].
    pub fn new(fourier_order: usize, min_points: usize) -> Self {
        Self {
            fourier_order: fourier_order.min(MAX_FOURIER_ORDER),
            min_points: min_points.max(MIN_POINTS),
            seasonality: SeasonalityMode::default(),
        }
    }

    pub fn with_seasonality(mut self, mode: SeasonalityMode) -> Self {
        self.seasonality = mode;
        self
    }

    pub fn min_points(&self) -> usize {
        self.min_points
    }

    /// Fourier order actually usable for `series`.
    fn effective_order(&self, series: &[SeriesPoint]) -> usize {
        let n = series.len();
        let seasonal = match self.seasonality {
            SeasonalityMode::Enabled => true,
            SeasonalityMode::Auto => n >= TWO_CYCLES,
            SeasonalityMode::Disabled => false,
        };
        if !seasonal {
            return 0;
        }
        // Keep the parameter count (2 + 2K) within the number of observations,
        // and 1 + 2K within the calendar months actually observed.
        let mut phases = [false; PERIOD];
        for (month, _) in series {
            phases[month.calendar_index()] = true;
        }
        let distinct_phases = phases.iter().filter(|&&seen| seen).count();
        self.fourier_order
            .min(n.saturating_sub(2) / 2)
            .min(distinct_phases.saturating_sub(1) / 2)
    }
}

impl Default for DecompositionForecaster {
    fn default() -> Self {
        Self::new(DEFAULT_FOURIER_ORDER, MIN_POINTS)
    }
}

impl Forecaster for DecompositionForecaster {
    type Model = DecompositionModel;

    fn fit(&self, series: &[SeriesPoint]) -> Result<DecompositionModel, ForecastError> {
        let n = series.len();
        if n < self.min_points {
            return Err(ForecastError::InsufficientData {
                points: n,
                required: self.min_points,
            });
        }
        check_series(series)?;

        let origin = series[0].0;
        let last = series[n - 1].0;
        let span = origin.months_until(last).max(1) as f64;
        let order = self.effective_order(series);
        if order > 0 && n < TWO_CYCLES {
            debug!(points = n, "fewer than two seasonal cycles, seasonal estimate is weak");
        }

        let y_scale = series
            .iter()
            .map(|(_, v)| v.abs())
            .fold(0.0_f64, f64::max);
        let y_scale = if y_scale > 0.0 { y_scale } else { 1.0 };

        let basis = Basis {
            origin,
            span,
            order,
        };
        let k = basis.len();
        let mut xtx = vec![vec![0.0; k]; k];
        let mut xty = vec![0.0; k];
        for &(month, value) in series {
            let row = basis.row(month);
            let y = value / y_scale;
            for i in 0..k {
                xty[i] += row[i] * y;
                for j in 0..=i {
                    xtx[i][j] += row[i] * row[j];
                }
            }
        }
        for i in 0..k {
            for j in 0..i {
                xtx[j][i] = xtx[i][j];
            }
            xtx[i][i] += RIDGE;
        }

        let coefficients = solve_cholesky(&xtx, &xty).ok_or_else(|| {
            ForecastError::ModelFit("design matrix is rank deficient".to_string())
        })?;
        if coefficients.iter().any(|c| !c.is_finite()) {
            return Err(ForecastError::ModelFit(
                "regression produced non-finite coefficients".to_string(),
            ));
        }

        debug!(points = n, fourier_order = order, "series fitted");
        Ok(DecompositionModel {
            basis,
            last,
            coefficients,
            y_scale,
        })
    }
}

/// Design-matrix row builder shared by fitting and prediction.
#[derive(Debug, Clone, Copy)]
struct Basis {
    origin: YearMonth,
    span: f64,
    order: usize,
}

impl Basis {
    fn len(&self) -> usize {
        2 + 2 * self.order
    }

    fn row(&self, month: YearMonth) -> Vec<f64> {
        let mut row = Vec::with_capacity(self.len());
        row.push(1.0);
        row.push(self.origin.months_until(month) as f64 / self.span);
        let phase = month.calendar_index() as f64;
        for k in 1..=self.order {
            let angle = 2.0 * std::f64::consts::PI * k as f64 * phase / PERIOD as f64;
            row.push(angle.cos());
            row.push(angle.sin());
        }
        row
    }
}

/// A fitted trend + seasonal model for one series.
#[derive(Debug, Clone)]
pub struct DecompositionModel {
    basis: Basis,
    last: YearMonth,
    coefficients: Vec<f64>,
    y_scale: f64,
}

impl DecompositionModel {
    /// Trend component (intercept + slope) at `month`, in original units.
    pub fn trend(&self, month: YearMonth) -> f64 {
        let row = self.basis.row(month);
        (self.coefficients[0] * row[0] + self.coefficients[1] * row[1]) * self.y_scale
    }

    /// Seasonal component at `month`, in original units.
    pub fn seasonal(&self, month: YearMonth) -> f64 {
        let row = self.basis.row(month);
        row.iter()
            .zip(&self.coefficients)
            .skip(2)
            .map(|(x, c)| x * c)
            .sum::<f64>()
            * self.y_scale
    }

    /// Fourier order used by this fit (0 when the series was trend-only).
    pub fn fourier_order(&self) -> usize {
        self.basis.order
    }

    /// Fitted value (trend + seasonal) at any month.
    pub fn value_at(&self, month: YearMonth) -> f64 {
        let row = self.basis.row(month);
        row.iter()
            .zip(&self.coefficients)
            .map(|(x, c)| x * c)
            .sum::<f64>()
            * self.y_scale
    }
}

impl FittedModel for DecompositionModel {
    fn predict(&self, horizon: usize) -> Vec<SeriesPoint> {
        (1..=horizon as u32)
            .map(|step| {
                let month = self.last.plus(step);
                (month, self.value_at(month))
            })
            .collect()
    }
}

/// Solves the symmetric positive definite system `a·x = b`.
///
/// Returns `None` if `a` is not positive definite, or so close to singular
/// that a pivot falls below [`PIVOT_TOLERANCE`] of its diagonal entry.
fn solve_cholesky(a: &[Vec<f64>], b: &[f64]) -> Option<Vec<f64>> {
    let n = b.len();
    if n == 0 || a.len() != n {
        return None;
    }

    let mut l = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[i][j];
            for k in 0..j {
                sum -= l[i][k] * l[j][k];
            }
            if i == j {
                if !(sum > PIVOT_TOLERANCE * a[i][i]) {
                    return None;
                }
                l[i][j] = sum.sqrt();
            } else {
                l[i][j] = sum / l[j][j];
            }
        }
    }

    // L·z = b
    let mut z = vec![0.0; n];
    for i in 0..n {
        let mut sum = b[i];
        for j in 0..i {
            sum -= l[i][j] * z[j];
        }
        z[i] = sum / l[i][i];
    }

    // Lᵀ·x = z
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut sum = z[i];
        for j in (i + 1)..n {
            sum -= l[j][i] * x[j];
        }
        x[i] = sum / l[i][i];
    }

    Some(x)
}
