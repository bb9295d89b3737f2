pub use cgmath;
pub use config::RiskConfig;
pub use error::{Result, RiskError};
pub use estimator::{NeighbourReport, RiskEstimator, RiskOutcome, TickReport};
pub use footprint::Footprint;
pub use frame::{EgoFrame, LocalState};
pub use integrator::{Confidence, RiskIntegrator, RiskScore};
pub use octagon::SafetyOctagon;
pub use snapshot::{find_by_role, ActorId, ActorState, Pose, Rotation, TickSnapshot};
pub use util::Interval;

mod config;
mod debug;
mod error;
mod estimator;
mod footprint;
mod frame;
pub mod integrator;
pub mod math;
mod octagon;
mod snapshot;
mod util;
