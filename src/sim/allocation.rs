//! Hierarchical random allocation of state totals into ward-month records.

use rand::Rng;
use rand_distr::{Distribution, Exp1, Normal};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use super::profile::{MONTHS_PER_YEAR, SeasonalProfile};
use super::random::RandomSource;
use super::types::{SimulatedRecord, StateAggregate, WardAllocation, ward_label};
use crate::error::AllocationConfigError;
use crate::month::YearMonth;

/// Default number of wards each state is split into.
pub const DEFAULT_WARDS_PER_STATE: usize = 10;

/// Default spread of the multiplicative monthly noise.
pub const DEFAULT_NOISE_STD: f64 = 0.05;

/// Multiplicative noise applied to every ward-month value.
///
/// Factors are drawn from a normal distribution with mean 1 and the
/// configured standard deviation. A spread of 0 disables noise.
#[derive(Debug, Clone, Copy)]
pub struct NoiseModel {
    std_dev: f64,
    dist: Option<Normal<f64>>,
}

impl NoiseModel {
    /// # Errors
    ///
    /// Returns [`AllocationConfigError::NoiseSpread`] for a negative or
    /// non-finite spread.
    pub fn new(std_dev: f64) -> Result<Self, AllocationConfigError> {
        if !std_dev.is_finite() || std_dev < 0.0 {
            return Err(AllocationConfigError::NoiseSpread(std_dev));
        }
        if std_dev == 0.0 {
            return Ok(Self::none());
        }
        let dist =
            Normal::new(1.0, std_dev).map_err(|_| AllocationConfigError::NoiseSpread(std_dev))?;
        Ok(Self {
            std_dev,
            dist: Some(dist),
        })
    }

    /// Noise-free model: every factor is exactly 1.
    pub fn none() -> Self {
        Self {
            std_dev: 0.0,
            dist: None,
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.std_dev
    }

    fn factor<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        self.dist.map_or(1.0, |d| d.sample(rng))
    }
}

impl Default for NoiseModel {
    fn default() -> Self {
        Self::new(DEFAULT_NOISE_STD).unwrap_or_else(|_| Self::none())
    }
}

/// What to do with a monthly value that noise pushed below zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NegativePolicy {
    /// Replace negative values with 0.
    #[default]
    Clamp,
    /// Emit the value as drawn.
    Keep,
}

/// Turns state totals into per-(state, ward, month) synthetic records.
#[derive(Debug, Clone)]
pub struct AllocationSimulator {
    wards_per_state: usize,
    profile: SeasonalProfile,
    noise: NoiseModel,
    start_month: YearMonth,
    negative_policy: NegativePolicy,
}

impl AllocationSimulator {
    /// # Errors
    ///
    /// Returns [`AllocationConfigError::NoWards`] if `wards_per_state` is 0.
    pub fn new(
        wards_per_state: usize,
        profile: SeasonalProfile,
        noise: NoiseModel,
        start_month: YearMonth,
    ) -> Result<Self, AllocationConfigError> {
        if wards_per_state == 0 {
            return Err(AllocationConfigError::NoWards);
        }
        Ok(Self {
            wards_per_state,
            profile,
            noise,
            start_month,
            negative_policy: NegativePolicy::default(),
        })
    }

    pub fn with_negative_policy(mut self, policy: NegativePolicy) -> Self {
        self.negative_policy = policy;
        self
    }

    pub fn wards_per_state(&self) -> usize {
        self.wards_per_state
    }

    /// The 12 consecutive historical months every ward is simulated over.
    pub fn months(&self) -> Vec<YearMonth> {
        self.start_month.range(MONTHS_PER_YEAR)
    }

    /// Simulates every state, one independent random sub-stream per state.
    ///
    /// Output is grouped by state in input order, then by ward, then by month,
    /// and is identical for a given `random` seed however states are scheduled.
    ///
    /// # Errors
    ///
    /// Returns [`AllocationConfigError::StateTotal`] if any state's annual
    /// total is not a positive finite number.
    pub fn simulate(
        &self,
        states: &[StateAggregate],
        random: &RandomSource,
    ) -> Result<Vec<SimulatedRecord>, AllocationConfigError> {
        if let Some(bad) = states
            .iter()
            .find(|s| !(s.annual_total_kwh.is_finite() && s.annual_total_kwh > 0.0))
        {
            return Err(AllocationConfigError::StateTotal {
                state: bad.state.clone(),
                value: bad.annual_total_kwh,
            });
        }

        let months = self.months();
        let per_state: Vec<(Vec<SimulatedRecord>, usize)> = states
            .par_iter()
            .enumerate()
            .map(|(index, state)| {
                let mut rng = random.stream(index);
                self.simulate_state(state, &months, &mut rng)
            })
            .collect();

        let mut records = Vec::with_capacity(states.len() * self.wards_per_state * months.len());
        let mut clamped = 0;
        for (state_records, state_clamped) in per_state {
            records.extend(state_records);
            clamped += state_clamped;
        }

        if clamped > 0 {
            warn!(clamped, "negative monthly values clamped to zero");
        }
        info!(
            states = states.len(),
            wards_per_state = self.wards_per_state,
            records = records.len(),
            seed = random.seed(),
            "simulation complete"
        );
        Ok(records)
    }

    /// Splits one state's annual total across its wards.
    ///
    /// Shares are a uniform draw from the probability simplex: normalized
    /// standard exponential variates, i.e. Dirichlet(1, ..., 1).
    pub fn allocate<R: Rng + ?Sized>(
        &self,
        state: &StateAggregate,
        rng: &mut R,
    ) -> Vec<WardAllocation> {
        let draws: Vec<f64> = (0..self.wards_per_state)
            .map(|_| -> f64 { Exp1.sample(rng) })
            .collect();
        let total: f64 = draws.iter().sum();

        draws
            .into_iter()
            .enumerate()
            .map(|(i, d)| {
                let share = if total > 0.0 {
                    d / total
                } else {
                    1.0 / self.wards_per_state as f64
                };
                WardAllocation {
                    ward_id: ward_label(i),
                    share,
                    annual_kwh: share * state.annual_total_kwh,
                }
            })
            .collect()
    }

    /// Returns the state's records and the number of clamped values.
    fn simulate_state<R: Rng + ?Sized>(
        &self,
        state: &StateAggregate,
        months: &[YearMonth],
        rng: &mut R,
    ) -> (Vec<SimulatedRecord>, usize) {
        let wards = self.allocate(state, rng);
        let mut records = Vec::with_capacity(wards.len() * months.len());
        let mut clamped = 0;

        for ward in &wards {
            for (m_idx, &month) in months.iter().enumerate() {
                let baseline = ward.annual_kwh * self.profile.weight(m_idx);
                let mut consumption = round_cents(baseline * self.noise.factor(rng));
                if consumption < 0.0 && self.negative_policy == NegativePolicy::Clamp {
                    consumption = 0.0;
                    clamped += 1;
                }
                records.push(SimulatedRecord {
                    state: state.state.clone(),
                    ward_id: ward.ward_id.clone(),
                    month,
                    consumption_kwh: consumption,
                });
            }
        }

        debug!(state = %state.state, wards = wards.len(), "state simulated");
        (records, clamped)
    }
}

/// Rounds to 2 decimal places, normalizing negative zero.
fn round_cents(value: f64) -> f64 {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded == 0.0 { 0.0 } else { rounded }
}
