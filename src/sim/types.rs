//! Records flowing through the allocation stage.

use std::fmt;

use crate::month::YearMonth;

/// Annual consumption total for one state, in kWh.
#[derive(Debug, Clone, PartialEq)]
pub struct StateAggregate {
    pub state: String,
    pub annual_total_kwh: f64,
}

impl StateAggregate {
    pub fn new(state: impl Into<String>, annual_total_kwh: f64) -> Self {
        Self {
            state: state.into(),
            annual_total_kwh,
        }
    }
}

/// Synthetic consumption of one ward in one month.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedRecord {
    pub state: String,
    /// Ward label, `W1` through `Wn`.
    pub ward_id: String,
    pub month: YearMonth,
    /// Rounded to 2 decimal places.
    pub consumption_kwh: f64,
}

/// A ward's share of its state's annual total, before monthly spreading.
#[derive(Debug, Clone, PartialEq)]
pub struct WardAllocation {
    pub ward_id: String,
    /// Point on the probability simplex: in `[0, 1]`, summing to 1 per state.
    pub share: f64,
    pub annual_kwh: f64,
}

/// Label of the 1-indexed ward `index + 1`.
pub fn ward_label(index: usize) -> String {
    format!("W{}", index + 1)
}

impl fmt::Display for SimulatedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} / {} {} = {:.2} kWh",
            self.state, self.ward_id, self.month, self.consumption_kwh
        )
    }
}
