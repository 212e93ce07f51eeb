/// Dirichlet ward split and monthly spreading with noise.
pub mod allocation;
/// Normalized 12-month demand curve.
pub mod profile;
pub mod random;
pub mod types;

pub use allocation::{AllocationSimulator, NegativePolicy, NoiseModel};
pub use profile::SeasonalProfile;
pub use random::RandomSource;
pub use types::{SimulatedRecord, StateAggregate, WardAllocation};
