//! The ego vehicle's local reference frame.

use crate::error::{Result, RiskError};
use crate::math::{normalize_degrees, to_local, to_local_vector, Matrix4d, Point3d, Vector3d};
use crate::snapshot::{ActorState, Pose};
use cgmath::prelude::*;
use serde::Serialize;

/// Determinants smaller than this are treated as singular.
const MIN_DETERMINANT: f64 = 1e-12;

/// The ego's world transform and its inverse for a single tick.
///
/// The ego sits at the origin with its heading along +x.
#[derive(Clone, Copy, Debug)]
pub struct EgoFrame {
    matrix: Matrix4d,
    inverse: Matrix4d,
    yaw: f64,
}

/// An actor's state re-expressed in the ego frame.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct LocalState {
    pub position: Point3d,
    pub velocity: Vector3d,
    /// The actor's heading relative to the ego in degrees, in (-180, 180].
    pub heading_deg: f64,
}

impl LocalState {
    /// The relative heading in radians, in (-π, π].
    pub fn heading_rad(&self) -> f64 {
        self.heading_deg.to_radians()
    }
}

impl EgoFrame {
    /// Creates the frame of an ego vehicle at `pose`.
    pub fn new(pose: &Pose) -> Result<Self> {
        Self::with_yaw(pose.matrix(), pose.rotation.yaw)
    }

    /// Creates a frame from an arbitrary world transform.
    /// Relative headings are measured from a yaw of zero.
    pub fn from_matrix(matrix: Matrix4d) -> Result<Self> {
        Self::with_yaw(matrix, 0.0)
    }

    fn with_yaw(matrix: Matrix4d, yaw: f64) -> Result<Self> {
        let det = matrix.determinant();
        if !det.is_finite() || det.abs() < MIN_DETERMINANT {
            return Err(RiskError::DegenerateTransform);
        }
        let inverse = matrix.invert().ok_or(RiskError::DegenerateTransform)?;
        let finite = (0..4).all(|c| (0..4).all(|r| inverse[c][r].is_finite()));
        if !finite {
            return Err(RiskError::DegenerateTransform);
        }
        Ok(Self {
            matrix,
            inverse,
            yaw,
        })
    }

    /// The world-to-local transform.
    pub fn inverse(&self) -> &Matrix4d {
        &self.inverse
    }

    /// Maps a world space point into the ego frame.
    pub fn to_local(&self, point: Point3d) -> Point3d {
        to_local(&self.inverse, point)
    }

    /// Maps a world space velocity into the ego frame.
    pub fn to_local_vector(&self, vector: Vector3d) -> Vector3d {
        to_local_vector(&self.inverse, vector)
    }

    /// Maps a point in the ego frame back into world space.
    pub fn to_world(&self, point: Point3d) -> Point3d {
        to_local(&self.matrix, point)
    }

    /// The heading of a world space yaw relative to the ego, in degrees.
    pub fn relative_heading(&self, yaw: f64) -> f64 {
        normalize_degrees(yaw - self.yaw)
    }

    /// Re-expresses an actor's state in the ego frame.
    pub fn localize(&self, actor: &ActorState) -> LocalState {
        LocalState {
            position: self.to_local(actor.pose.location),
            velocity: self.to_local_vector(actor.velocity),
            heading_deg: self.relative_heading(actor.pose.rotation.yaw),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::snapshot::{ActorId, Rotation};
    use assert_approx_eq::assert_approx_eq;
    use cgmath::prelude::*;
    use rand::{Rng, SeedableRng};

    #[test]
    fn neighbour_ahead_of_rotated_ego() {
        let frame = EgoFrame::new(&Pose::planar(10.0, 20.0, 90.0)).unwrap();
        let actor = ActorState::new(
            ActorId(2),
            Pose::planar(10.0, 30.0, 180.0),
            Vector3d::new(-3.0, 0.0, 0.0),
        );
        let local = frame.localize(&actor);
        assert_approx_eq!(local.position.x, 10.0);
        assert_approx_eq!(local.position.y, 0.0);
        assert_approx_eq!(local.velocity.x, 0.0);
        assert_approx_eq!(local.velocity.y, 3.0);
        assert_approx_eq!(local.heading_deg, 90.0);
    }

    #[test]
    fn heading_wraps() {
        let frame = EgoFrame::new(&Pose::planar(0.0, 0.0, 170.0)).unwrap();
        assert_approx_eq!(frame.relative_heading(-170.0), 20.0);
        assert_approx_eq!(frame.relative_heading(-10.0), 180.0);
    }

    #[test]
    fn round_trip() {
        let mut rng = rand::rngs::StdRng::from_seed(*b"Vegemite sandwhich is not fun...");
        for _ in 0..100 {
            let pose = Pose::new(
                Point3d::new(
                    rng.gen_range(-500.0..500.0),
                    rng.gen_range(-500.0..500.0),
                    rng.gen_range(-5.0..5.0),
                ),
                Rotation {
                    roll: rng.gen_range(-10.0..10.0),
                    pitch: rng.gen_range(-10.0..10.0),
                    yaw: rng.gen_range(-180.0..180.0),
                },
            );
            let frame = EgoFrame::new(&pose).unwrap();
            let world = Point3d::new(
                rng.gen_range(-500.0..500.0),
                rng.gen_range(-500.0..500.0),
                rng.gen_range(-5.0..5.0),
            );
            let back = frame.to_world(frame.to_local(world));
            for (a, b) in [(back.x, world.x), (back.y, world.y), (back.z, world.z)] {
                assert!((a - b).abs() <= 1e-9 * world.to_vec().magnitude().max(1.0));
            }
        }
    }

    #[test]
    fn ego_is_at_origin() {
        let pose = Pose::planar(-42.0, 7.5, 33.0);
        let frame = EgoFrame::new(&pose).unwrap();
        let local = frame.to_local(pose.location);
        assert_approx_eq!(local.x, 0.0);
        assert_approx_eq!(local.y, 0.0);
    }

    #[test]
    fn singular_matrix_is_rejected() {
        let mut m = Matrix4d::identity();
        m.z.z = 0.0;
        assert!(matches!(
            EgoFrame::from_matrix(m),
            Err(RiskError::DegenerateTransform)
        ));
        let mut m = Matrix4d::identity();
        m.x.x = f64::NAN;
        assert!(EgoFrame::from_matrix(m).is_err());
    }
}
