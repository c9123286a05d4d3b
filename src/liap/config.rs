//! Run parameters for the Liapunov equilibrium search.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::liap::powell::PowellConfig;

/// Parameters of one search run.
///
/// # Example
/// ```
/// use liap_solver::liap::LiapParams;
///
/// let params = LiapParams::default().with_tries(20).with_stop_after(0).with_seed(7);
/// assert!(params.validate().is_ok());
/// assert_eq!(params.tol_n, 1e-10);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiapParams {
    /// Restart tries, 0 for no limit.
    pub n_tries: usize,

    /// Stop once this many distinct solutions are found, 0 for no limit.
    pub stop_after: usize,

    /// Outer tolerance. A try is accepted only if its Liapunov value is at
    /// most this; duplicates are judged within `sqrt(tol_n)`.
    pub tol_n: f64,

    /// Maximum outer minimizer passes per try.
    pub maxits_n: usize,

    /// Line search tolerance.
    pub tol_1: f64,

    /// Maximum iterations per line search.
    pub maxits_1: usize,

    /// Trace verbosity: 0 silent, 1 tries and solutions, 2 minimizer passes.
    pub trace: u32,

    /// Seed for random restarts; entropy when `None`.
    pub seed: Option<u64>,
}

impl Default for LiapParams {
    fn default() -> Self {
        Self {
            n_tries: 10,
            stop_after: 1,
            tol_n: 1.0e-10,
            maxits_n: 20,
            tol_1: 2.0e-10,
            maxits_1: 100,
            trace: 0,
            seed: None,
        }
    }
}

impl LiapParams {
    /// Default parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the number of restart tries.
    pub fn with_tries(mut self, n_tries: usize) -> Self {
        self.n_tries = n_tries;
        self
    }

    /// Builder method: set the solution count to stop at.
    pub fn with_stop_after(mut self, stop_after: usize) -> Self {
        self.stop_after = stop_after;
        self
    }

    /// Builder method: set the outer tolerance and pass budget.
    pub fn with_outer(mut self, tol_n: f64, maxits_n: usize) -> Self {
        self.tol_n = tol_n;
        self.maxits_n = maxits_n;
        self
    }

    /// Builder method: set the line search tolerance and budget.
    pub fn with_line(mut self, tol_1: f64, maxits_1: usize) -> Self {
        self.tol_1 = tol_1;
        self.maxits_1 = maxits_1;
        self
    }

    /// Builder method: set trace verbosity.
    pub fn with_trace(mut self, level: u32) -> Self {
        self.trace = level;
        self
    }

    /// Builder method: set random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Duplicate-detection tolerance for accepted solutions.
    pub fn epsilon(&self) -> f64 {
        self.tol_n.sqrt()
    }

    /// Minimizer settings derived from these parameters.
    pub fn powell(&self, interior: bool) -> PowellConfig {
        PowellConfig {
            maxits_n: self.maxits_n,
            tol_n: self.tol_n,
            maxits_1: self.maxits_1,
            tol_1: self.tol_1,
            interior,
        }
    }

    /// Check tolerances and budgets.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [("tol_n", self.tol_n), ("tol_1", self.tol_1)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::InvalidTolerance { name, value });
            }
        }
        if self.maxits_n == 0 {
            return Err(ConfigError::ZeroBudget("maxits_n"));
        }
        if self.maxits_1 == 0 {
            return Err(ConfigError::ZeroBudget("maxits_1"));
        }
        Ok(())
    }

    /// Load parameters from a JSON file. Missing fields take their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    /// Parse parameters from a JSON string. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let params: Self = serde_json::from_str(json)?;
        params.validate()?;
        Ok(params)
    }
}

/// Errors from loading or validating [`LiapParams`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading the file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The JSON did not parse.
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// A tolerance is not a positive finite number.
    #[error("{name} must be positive and finite, got {value}")]
    InvalidTolerance {
        /// Field name.
        name: &'static str,
        /// Offending value.
        value: f64,
    },

    /// An iteration budget is zero.
    #[error("{0} must be at least 1")]
    ZeroBudget(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = LiapParams::default();
        assert_eq!(params.n_tries, 10);
        assert_eq!(params.stop_after, 1);
        assert_eq!(params.maxits_n, 20);
        assert_eq!(params.tol_1, 2.0e-10);
        assert_eq!(params.maxits_1, 100);
        assert_eq!(params.trace, 0);
        assert!(params.seed.is_none());
        assert!((params.epsilon() - 1e-5).abs() < 1e-15);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let params = LiapParams::from_json_str(r#"{ "n_tries": 3, "seed": 42 }"#).unwrap();
        assert_eq!(params.n_tries, 3);
        assert_eq!(params.seed, Some(42));
        assert_eq!(params.stop_after, 1);
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        let result = LiapParams::from_json_str("{ n_tries: }");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_validation() {
        let bad = LiapParams::default().with_outer(0.0, 20);
        assert!(matches!(
            bad.validate(),
            Err(ConfigError::InvalidTolerance { name: "tol_n", .. })
        ));

        let bad = LiapParams::default().with_line(f64::NAN, 10);
        assert!(matches!(
            bad.validate(),
            Err(ConfigError::InvalidTolerance { name: "tol_1", .. })
        ));

        let bad = LiapParams::default().with_line(1e-8, 0);
        assert!(matches!(bad.validate(), Err(ConfigError::ZeroBudget("maxits_1"))));

        let json = r#"{ "maxits_n": 0 }"#;
        assert!(matches!(
            LiapParams::from_json_str(json),
            Err(ConfigError::ZeroBudget("maxits_n"))
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = LiapParams::from_json_file("does/not/exist.json");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_powell_config_carries_budgets() {
        let config = LiapParams::default().with_outer(1e-8, 5).powell(true);
        assert_eq!(config.maxits_n, 5);
        assert_eq!(config.tol_n, 1e-8);
        assert!(config.interior);
    }
}
