//! Error types for risk estimation.

use crate::snapshot::ActorId;
use thiserror::Error;

/// Result type alias for risk estimation.
pub type Result<T> = std::result::Result<T, RiskError>;

/// Errors raised while estimating collision risk.
///
/// Only [RiskError::DegenerateTransform] and [RiskError::MissingEgo] abort a whole
/// tick; the others are scoped to a single neighbour.
#[derive(Error, Debug)]
pub enum RiskError {
    /// A footprint dimension is not a positive number.
    #[error("invalid footprint: length {length}, width {width}")]
    InvalidFootprint { length: f64, width: f64 },

    /// The ego pose matrix cannot be inverted.
    #[error("ego pose matrix is singular")]
    DegenerateTransform,

    /// A strip of the octagon had unusable integration bounds and was skipped.
    #[error("degenerate octagon strip {index}")]
    DegenerateOctagonStrip { index: usize },

    /// The snapshot does not contain the ego vehicle.
    #[error("ego actor {0} missing from snapshot")]
    MissingEgo(ActorId),

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The worker pool could not be started.
    #[error("thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
