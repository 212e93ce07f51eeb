//! Shared builders for integration tests.

#![allow(dead_code)]

use ward_energy::month::YearMonth;
use ward_energy::sim::{
    AllocationSimulator, NoiseModel, SeasonalProfile, SimulatedRecord, StateAggregate,
};

/// First month of the default historical window.
pub fn start_month() -> YearMonth {
    YearMonth::new(2014, 4).expect("valid month")
}

/// Two states with realistic annual totals (kWh).
pub fn two_states() -> Vec<StateAggregate> {
    vec![
        StateAggregate::new("Delhi", 29_000_000.0),
        StateAggregate::new("Goa", 3_800_000.0),
    ]
}

/// Default simulator: 10 wards, default profile, 5% noise.
pub fn default_simulator() -> AllocationSimulator {
    AllocationSimulator::new(
        10,
        SeasonalProfile::default(),
        NoiseModel::default(),
        start_month(),
    )
    .expect("valid simulator")
}

/// Simulator without noise, so ward totals can be checked exactly.
pub fn noise_free_simulator(wards: usize) -> AllocationSimulator {
    AllocationSimulator::new(wards, SeasonalProfile::default(), NoiseModel::none(), start_month())
        .expect("valid simulator")
}

/// A ward series of `len` months starting at the default window start.
pub fn series_records(state: &str, ward: &str, values: &[f64]) -> Vec<SimulatedRecord> {
    start_month()
        .range(values.len())
        .into_iter()
        .zip(values)
        .map(|(month, &kwh)| SimulatedRecord {
            state: state.to_string(),
            ward_id: ward.to_string(),
            month,
            consumption_kwh: kwh,
        })
        .collect()
}
