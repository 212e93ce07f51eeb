//! Synthetic ward-level energy consumption and per-ward monthly forecasts.
//!
//! State annual totals are split into wards and months by
//! [`sim::AllocationSimulator`]; every resulting ward series is then
//! extrapolated by a [`forecast::Forecaster`] driven by
//! [`forecast::ForecastAggregator`].

pub mod cli;
pub mod config;
pub mod error;
pub mod forecast;
/// CSV readers and writers for the input and both output datasets.
pub mod io;
pub mod month;
/// Config-driven pipeline stages.
pub mod runner;
/// Allocation of state totals into ward-month records.
pub mod sim;
pub mod summary;
