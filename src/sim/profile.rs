//! Relative monthly demand curve.

use crate::error::AllocationConfigError;

/// Number of months in one seasonal cycle.
pub const MONTHS_PER_YEAR: usize = 12;

/// Relative demand for each month of the simulated window, April first,
/// peaking in early summer.
pub const DEFAULT_WEIGHTS: [f64; MONTHS_PER_YEAR] = [
    1.05, 1.08, 1.12, 1.15, 1.10, 1.00, 0.95, 0.90, 0.92, 0.98, 1.00, 1.05,
];

/// Normalized 12-element share of annual demand per month.
///
/// Weights are indexed by position in the simulated window, not by
/// calendar month. The stored weights are non-negative and sum to 1.
///
/// # Examples
///
/// ```
/// use ward_energy::sim::profile::SeasonalProfile;
///
/// let profile = SeasonalProfile::new(&[2.0; 12]).unwrap();
/// assert!((profile.weight(0) - 1.0 / 12.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SeasonalProfile {
    weights: [f64; MONTHS_PER_YEAR],
}

impl SeasonalProfile {
    /// Validates raw weights and re-normalizes them to sum to 1.
    ///
    /// # Errors
    ///
    /// Returns an [`AllocationConfigError`] if there are not exactly 12
    /// weights, any weight is negative or non-finite, or all weights are zero.
    pub fn new(raw: &[f64]) -> Result<Self, AllocationConfigError> {
        if raw.len() != MONTHS_PER_YEAR {
            return Err(AllocationConfigError::ProfileLength(raw.len()));
        }
        if let Some((index, &value)) = raw
            .iter()
            .enumerate()
            .find(|(_, w)| !w.is_finite() || **w < 0.0)
        {
            return Err(AllocationConfigError::ProfileWeight { index, value });
        }

        let sum: f64 = raw.iter().sum();
        if !(sum > 0.0 && sum.is_finite()) {
            return Err(AllocationConfigError::ProfileSum);
        }

        let mut weights = [0.0; MONTHS_PER_YEAR];
        for (dst, w) in weights.iter_mut().zip(raw) {
            *dst = w / sum;
        }
        Ok(Self { weights })
    }

    /// Flat profile: every month carries 1/12 of the annual total.
    pub fn uniform() -> Self {
        Self {
            weights: [1.0 / MONTHS_PER_YEAR as f64; MONTHS_PER_YEAR],
        }
    }

    /// Share of annual demand for the month at `index` within the window.
    ///
    /// # Panics
    ///
    /// Panics if `index >= 12`.
    pub fn weight(&self, index: usize) -> f64 {
        self.weights[index]
    }

    pub fn weights(&self) -> &[f64; MONTHS_PER_YEAR] {
        &self.weights
    }
}

impl Default for SeasonalProfile {
    fn default() -> Self {
        let sum: f64 = DEFAULT_WEIGHTS.iter().sum();
        Self {
            weights: DEFAULT_WEIGHTS.map(|w| w / sum),
        }
    }
}
