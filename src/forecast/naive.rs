//! Seasonal naive baseline: "next year looks like last year".

use super::decomposition::MIN_POINTS;
use super::{FittedModel, ForecastError, Forecaster, SeriesPoint, check_series};
use crate::month::YearMonth;

/// Months repeated by the baseline.
const SEASON_LENGTH: usize = 12;

/// Repeats the most recent year of observations.
///
/// With less than a full year of history the available values are cycled to
/// fill the horizon.
#[derive(Debug, Clone, Copy)]
pub struct SeasonalNaiveForecaster {
    min_points: usize,
}

impl SeasonalNaiveForecaster {
    /// Creates a baseline that rejects series shorter than `min_points`,
    /// floored at [`MIN_POINTS`].
    pub fn new(min_points: usize) -> Self {
        Self {
            min_points: min_points.max(MIN_POINTS),
        }
    }

    pub fn min_points(&self) -> usize {
        self.min_points
    }
}

impl Default for SeasonalNaiveForecaster {
    fn default() -> Self {
        Self::new(MIN_POINTS)
    }
}

/// The template cycle captured by [`SeasonalNaiveForecaster`].
#[derive(Debug, Clone)]
pub struct SeasonalNaiveModel {
    last: YearMonth,
    template: Vec<f64>,
}

impl Forecaster for SeasonalNaiveForecaster {
    type Model = SeasonalNaiveModel;

    fn fit(&self, series: &[SeriesPoint]) -> Result<SeasonalNaiveModel, ForecastError> {
        if series.len() < self.min_points {
            return Err(ForecastError::InsufficientData {
                points: series.len(),
                required: self.min_points,
            });
        }
        check_series(series)?;

        let last = series[series.len() - 1].0;

        let start = series.len().saturating_sub(SEASON_LENGTH);
        Ok(SeasonalNaiveModel {
            last,
            template: series[start..].iter().map(|(_, v)| *v).collect(),
        })
    }
}

impl FittedModel for SeasonalNaiveModel {
    fn predict(&self, horizon: usize) -> Vec<SeriesPoint> {
        let mut forecast = Vec::with_capacity(horizon);
        let mut month = self.last;
        while forecast.len() < horizon {
            for value in &self.template {
                if forecast.len() == horizon {
                    break;
                }
                month = month.succ();
                forecast.push((month, *value));
            }
        }
        forecast
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(values: &[f64]) -> Vec<SeriesPoint> {
        let start = YearMonth::new(2014, 4).expect("valid month");
        start.range(values.len()).into_iter().zip(values.iter().copied()).collect()
    }

    #[test]
    fn forecast_matches_horizon_length() {
        let forecast = SeasonalNaiveForecaster::default()
            .fit_and_predict(&series(&[1.0, 2.0, 3.0]), 7)
            .expect("fits");
        assert_eq!(forecast.len(), 7);
        let values: Vec<f64> = forecast.iter().map(|(_, v)| *v).collect();
        assert_eq!(values, vec![1.0, 2.0, 3.0, 1.0, 2.0, 3.0, 1.0]);
    }

    #[test]
    fn full_year_repeats_same_calendar_month() {
        let values: Vec<f64> = (0..18).map(f64::from).collect();
        let history = series(&values);
        let forecast = SeasonalNaiveForecaster::default()
            .fit_and_predict(&history, 12)
            .expect("fits");
        for (month, value) in &forecast {
            let a_year_ago = history
                .iter()
                .find(|(m, _)| m.months_until(*month) == 12)
                .map(|(_, v)| *v);
            assert_eq!(a_year_ago, Some(*value), "{month}");
        }
    }

    #[test]
    fn empty_series_is_insufficient() {
        assert!(matches!(
            SeasonalNaiveForecaster::default().fit(&[]),
            Err(ForecastError::InsufficientData { points: 0, .. })
        ));
    }

    #[test]
    fn series_below_minimum_is_insufficient() {
        assert_eq!(
            SeasonalNaiveForecaster::default().fit(&series(&[4.0, 5.0])).err(),
            Some(ForecastError::InsufficientData {
                points: 2,
                required: MIN_POINTS
            })
        );
        assert_eq!(
            SeasonalNaiveForecaster::new(6).fit(&series(&[4.0; 5])).err(),
            Some(ForecastError::InsufficientData {
                points: 5,
                required: 6
            })
        );
    }

    #[test]
    fn minimum_is_floored() {
        assert_eq!(SeasonalNaiveForecaster::new(1).min_points(), MIN_POINTS);
    }
}
