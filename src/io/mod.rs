/// Dataset writers.
pub mod export;
/// Dataset readers.
pub mod input;

pub use export::{export_forecasts, export_simulated};
pub use input::{load_forecasts, load_simulated, load_states};
