//! TOML-based pipeline configuration.

use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::forecast::decomposition::DEFAULT_FOURIER_ORDER;
use crate::forecast::{DEFAULT_HORIZON, MIN_POINTS, SeasonalityMode};
use crate::month::YearMonth;
use crate::sim::allocation::{DEFAULT_NOISE_STD, DEFAULT_WARDS_PER_STATE, NegativePolicy};
use crate::sim::profile::{DEFAULT_WEIGHTS, MONTHS_PER_YEAR};

/// Top-level pipeline configuration parsed from TOML.
///
/// All fields have defaults; an empty file is a valid configuration. Load
/// from TOML with [`PipelineConfig::from_toml_file`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Allocation parameters.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Seasonal demand curve.
    #[serde(default)]
    pub profile: ProfileConfig,
    /// Forecasting parameters.
    #[serde(default)]
    pub forecast: ForecastConfig,
}

/// Allocation parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Wards each state is split into (must be >= 1).
    pub wards_per_state: usize,
    /// Master random seed.
    pub seed: u64,
    /// First month of the historical window, `YYYY-MM`.
    pub start_month: String,
    /// Length of the historical window in months (must be 12).
    pub months: usize,
    /// Standard deviation of the multiplicative noise (mean 1).
    pub noise_std: f64,
    /// Handling of negative values: `"clamp"` or `"keep"`.
    pub negative_values: NegativePolicy,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            wards_per_state: DEFAULT_WARDS_PER_STATE,
            seed: 42,
            start_month: "2014-04".to_string(),
            months: MONTHS_PER_YEAR,
            noise_std: DEFAULT_NOISE_STD,
            negative_values: NegativePolicy::default(),
        }
    }
}

/// Seasonal demand curve, one weight per month of the window.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProfileConfig {
    /// Relative weights; re-normalized to sum to 1.
    pub weights: Vec<f64>,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            weights: DEFAULT_WEIGHTS.to_vec(),
        }
    }
}

/// Which model fits each ward series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    /// Linear trend plus Fourier seasonality.
    #[default]
    Decomposition,
    /// Repeat last year.
    SeasonalNaive,
}

/// Forecasting parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ForecastConfig {
    /// Model used per series.
    pub model: ModelKind,
    /// Future months per series (must be > 0).
    pub horizon: usize,
    /// Fourier order of the seasonal component (1-6).
    pub fourier_order: usize,
    /// Shortest series accepted (must be >= 3).
    pub min_points: usize,
    /// `"enabled"`, `"auto"` or `"disabled"`.
    pub seasonality: SeasonalityMode,
    /// Per-series fit budget in milliseconds.
    pub fit_timeout_ms: Option<u64>,
    /// Worker threads; defaults to one per core.
    pub threads: Option<usize>,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            model: ModelKind::default(),
            horizon: DEFAULT_HORIZON,
            fourier_order: DEFAULT_FOURIER_ORDER,
            min_points: MIN_POINTS,
            seasonality: SeasonalityMode::default(),
            fit_timeout_ms: None,
            threads: None,
        }
    }
}

impl ForecastConfig {
    pub fn fit_budget(&self) -> Option<Duration> {
        self.fit_timeout_ms.map(Duration::from_millis)
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    /// Dotted field path (e.g., `"simulation.wards_per_state"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error: {}: {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

impl PipelineConfig {
    /// Parses a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            field: "config".to_string(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError {
            field: "toml".to_string(),
            message: e.to_string(),
        })
    }

    /// Parsed start of the historical window.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if `simulation.start_month` is not `YYYY-MM`.
    pub fn start_month(&self) -> Result<YearMonth, ConfigError> {
        self.simulation.start_month.parse().map_err(|e| ConfigError {
            field: "simulation.start_month".into(),
            message: format!("{e}"),
        })
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let mut push = |field: &str, message: String| {
            errors.push(ConfigError {
                field: field.to_string(),
                message,
            });
        };

        let s = &self.simulation;
        if s.wards_per_state == 0 {
            push("simulation.wards_per_state", "must be >= 1".into());
        }
        if s.months != MONTHS_PER_YEAR {
            push(
                "simulation.months",
                format!("must be {MONTHS_PER_YEAR}, got {}", s.months),
            );
        }
        if !s.noise_std.is_finite() || s.noise_std < 0.0 {
            push("simulation.noise_std", "must be finite and >= 0".into());
        }
        if let Err(e) = self.start_month() {
            push(&e.field, e.message);
        }

        let weights = &self.profile.weights;
        if weights.len() != MONTHS_PER_YEAR {
            push(
                "profile.weights",
                format!("must have {MONTHS_PER_YEAR} entries, got {}", weights.len()),
            );
        } else if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            push("profile.weights", "entries must be finite and >= 0".into());
        } else if weights.iter().sum::<f64>() <= 0.0 {
            push("profile.weights", "must have a positive sum".into());
        }

        let f = &self.forecast;
        if f.horizon == 0 {
            push("forecast.horizon", "must be > 0".into());
        }
        if !(1..=6).contains(&f.fourier_order) {
            push("forecast.fourier_order", "must be in [1, 6]".into());
        }
        if f.min_points < MIN_POINTS {
            push("forecast.min_points", format!("must be >= {MIN_POINTS}"));
        }
        if f.fit_timeout_ms == Some(0) {
            push("forecast.fit_timeout_ms", "must be > 0".into());
        }
        if f.threads == Some(0) {
            push("forecast.threads", "must be > 0".into());
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_valid() {
        let errors = PipelineConfig::default().validate();
        assert!(errors.is_empty(), "defaults should be valid: {errors:?}");
    }

    #[test]
    fn empty_toml_is_default() {
        let cfg = PipelineConfig::from_toml_str("").expect("empty TOML parses");
        assert_eq!(cfg.simulation.wards_per_state, 10);
        assert_eq!(cfg.forecast.horizon, 12);
        assert_eq!(cfg.profile.weights.len(), 12);
    }

    #[test]
    fn valid_toml_parses() {
        let toml = r#"
[simulation]
wards_per_state = 4
seed = 99
start_month = "2020-01"
noise_std = 0.1
negative_values = "keep"

[profile]
weights = [1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 2.0, 2.0, 2.0, 2.0, 2.0, 2.0]

[forecast]
model = "seasonal_naive"
horizon = 6
fourier_order = 2
min_points = 6
seasonality = "auto"
fit_timeout_ms = 500
threads = 2
"#;
        let cfg = PipelineConfig::from_toml_str(toml);
        assert!(cfg.is_ok(), "valid TOML should parse: {:?}", cfg.err());
        let cfg = cfg.ok();
        assert_eq!(cfg.as_ref().map(|c| c.simulation.wards_per_state), Some(4));
        assert_eq!(
            cfg.as_ref().map(|c| c.simulation.negative_values),
            Some(NegativePolicy::Keep)
        );
        assert_eq!(cfg.as_ref().map(|c| c.forecast.model), Some(ModelKind::SeasonalNaive));
        assert_eq!(
            cfg.as_ref().map(|c| c.forecast.seasonality),
            Some(SeasonalityMode::Auto)
        );
        assert_eq!(
            cfg.as_ref().and_then(|c| c.forecast.fit_budget()),
            Some(Duration::from_millis(500))
        );
        assert!(cfg.map(|c| c.validate().is_empty()).unwrap_or(false));
    }

    #[test]
    fn invalid_toml_unknown_field() {
        let toml = r#"
[simulation]
wards_per_state = 10
bogus_field = true
"#;
        assert!(PipelineConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let cfg = PipelineConfig::from_toml_str("[simulation]\nseed = 7\n").ok();
        assert_eq!(cfg.as_ref().map(|c| c.simulation.seed), Some(7));
        assert_eq!(cfg.as_ref().map(|c| c.simulation.wards_per_state), Some(10));
        assert_eq!(cfg.as_ref().map(|c| c.forecast.fourier_order), Some(3));
    }

    #[test]
    fn validation_catches_zero_wards() {
        let mut cfg = PipelineConfig::default();
        cfg.simulation.wards_per_state = 0;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "simulation.wards_per_state"));
    }

    #[test]
    fn validation_catches_short_profile() {
        let mut cfg = PipelineConfig::default();
        cfg.profile.weights = vec![1.0; 11];
        assert!(cfg.validate().iter().any(|e| e.field == "profile.weights"));
    }

    #[test]
    fn validation_catches_negative_weight() {
        let mut cfg = PipelineConfig::default();
        cfg.profile.weights[2] = -1.0;
        assert!(cfg.validate().iter().any(|e| e.field == "profile.weights"));
    }

    #[test]
    fn validation_catches_bad_start_month() {
        let mut cfg = PipelineConfig::default();
        cfg.simulation.start_month = "April 2014".into();
        assert!(cfg.validate().iter().any(|e| e.field == "simulation.start_month"));
    }

    #[test]
    fn validation_catches_window_length() {
        let mut cfg = PipelineConfig::default();
        cfg.simulation.months = 24;
        assert!(cfg.validate().iter().any(|e| e.field == "simulation.months"));
    }

    #[test]
    fn validation_catches_low_min_points() {
        let mut cfg = PipelineConfig::default();
        cfg.forecast.min_points = 2;
        assert!(cfg.validate().iter().any(|e| e.field == "forecast.min_points"));
    }

    #[test]
    fn validation_catches_negative_noise() {
        let mut cfg = PipelineConfig::default();
        cfg.simulation.noise_std = -0.5;
        assert!(cfg.validate().iter().any(|e| e.field == "simulation.noise_std"));
    }

    #[test]
    fn unknown_seasonality_is_parse_error() {
        let toml = "[forecast]\nseasonality = \"sometimes\"\n";
        assert!(PipelineConfig::from_toml_str(toml).is_err());
    }
}
