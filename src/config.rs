//! Configuration of the risk estimator.

use crate::error::{Result, RiskError};
use crate::footprint::Footprint;
use crate::math::AdaptiveSimpson;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Scores cannot carry more decimal places than an f64 resolves.
pub const MAX_PRECISION: u32 = 15;

/// Tuning parameters for the risk estimator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Standard deviation of the Gaussian placed on each neighbour, in m.
    pub sigma: f64,
    /// Neighbours further than this from the ego on the ground plane are ignored, in m.
    pub radius: f64,
    /// Number of decimal places reported scores are rounded to.
    pub precision: u32,
    /// The footprint of any actor that does not carry its own.
    pub default_footprint: Footprint,
    /// Absolute error tolerance of the outer (x) integral.
    pub tolerance: f64,
    /// Absolute error tolerance of each inner (y) integral.
    pub inner_tolerance: f64,
    /// Time allowed for a parallel tick before unfinished neighbours are marked stale, in ms.
    pub deadline_ms: u64,
    /// Worker threads for parallel evaluation; 0 lets rayon decide.
    pub workers: usize,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            sigma: 1.0,
            radius: 50.0,
            precision: 4,
            default_footprint: Footprint::default(),
            tolerance: 1e-9,
            inner_tolerance: 1e-11,
            deadline_ms: 50,
            workers: 0,
        }
    }
}

impl RiskConfig {
    /// Parses and validates a JSON configuration. Missing keys take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Checks that every parameter is in range.
    pub fn validate(&self) -> Result<()> {
        let positive = |name: &str, value: f64| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(RiskError::InvalidConfig(format!(
                    "{name} must be positive, got {value}"
                )))
            }
        };
        positive("sigma", self.sigma)?;
        positive("radius", self.radius)?;
        positive("tolerance", self.tolerance)?;
        positive("inner_tolerance", self.inner_tolerance)?;
        if self.precision > MAX_PRECISION {
            return Err(RiskError::InvalidConfig(format!(
                "precision must be at most {MAX_PRECISION}, got {}",
                self.precision
            )));
        }
        self.default_footprint
            .validated()
            .map_err(|err| RiskError::InvalidConfig(format!("default_footprint: {err}")))?;
        Ok(())
    }

    /// The parallel tick deadline.
    pub fn deadline(&self) -> Duration {
        Duration::from_millis(self.deadline_ms)
    }

    /// The integrator for the outer integral, in x.
    pub(crate) fn outer_quadrature(&self) -> AdaptiveSimpson {
        AdaptiveSimpson::new(self.tolerance, self.sigma)
    }

    /// The integrator for the inner integrals, in y.
    pub(crate) fn inner_quadrature(&self) -> AdaptiveSimpson {
        AdaptiveSimpson::new(self.inner_tolerance, self.sigma)
    }
}
