//! The per-tick view of the world handed in by the simulation driver.

use crate::footprint::Footprint;
use crate::math::{pose_matrix, Matrix4d, Point3d, Vector3d};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The simulator's identifier for an actor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorId(pub u32);

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An orientation in degrees.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rotation {
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
}

impl Rotation {
    /// A rotation about the vertical axis only.
    pub const fn from_yaw(yaw: f64) -> Self {
        Self {
            roll: 0.0,
            pitch: 0.0,
            yaw,
        }
    }
}

/// A location and orientation in world space.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub location: Point3d,
    pub rotation: Rotation,
}

impl Pose {
    /// Creates a pose.
    pub const fn new(location: Point3d, rotation: Rotation) -> Self {
        Self { location, rotation }
    }

    /// A pose on the ground plane with the given heading in degrees.
    pub fn planar(x: f64, y: f64, yaw: f64) -> Self {
        Self::new(Point3d::new(x, y, 0.0), Rotation::from_yaw(yaw))
    }

    /// The homogeneous world transform of this pose.
    pub fn matrix(&self) -> Matrix4d {
        let r = self.rotation;
        pose_matrix(self.location, r.roll, r.pitch, r.yaw)
    }

    /// The squared distance between two poses on the ground plane.
    pub fn planar_distance2(&self, other: &Pose) -> f64 {
        let dx = self.location.x - other.location.x;
        let dy = self.location.y - other.location.y;
        dx * dx + dy * dy
    }
}

/// The state of one actor at a tick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActorState {
    pub id: ActorId,
    /// The role the driver gave the actor, e.g. `hero` for the ego vehicle.
    #[serde(default)]
    pub role_name: Option<String>,
    pub pose: Pose,
    /// The world space velocity in m/s.
    pub velocity: Vector3d,
    /// The actor's footprint, if it differs from the configured default.
    #[serde(default)]
    pub footprint: Option<Footprint>,
}

impl ActorState {
    /// Creates an actor state without a role or footprint override.
    pub fn new(id: ActorId, pose: Pose, velocity: Vector3d) -> Self {
        Self {
            id,
            role_name: None,
            pose,
            velocity,
            footprint: None,
        }
    }

    /// Sets the role name.
    pub fn with_role(mut self, role_name: &str) -> Self {
        self.role_name = Some(role_name.to_owned());
        self
    }

    /// Overrides the footprint.
    pub fn with_footprint(mut self, footprint: Footprint) -> Self {
        self.footprint = Some(footprint);
        self
    }

    /// The actor's footprint, falling back to `default`.
    pub fn footprint_or(&self, default: Footprint) -> Footprint {
        self.footprint.unwrap_or(default)
    }
}

/// Every actor the driver knows of at one simulation tick.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TickSnapshot {
    /// The simulation frame number.
    pub frame: u64,
    /// The ego vehicle.
    pub ego: ActorId,
    pub actors: Vec<ActorState>,
}

impl TickSnapshot {
    /// Creates a snapshot.
    pub fn new(frame: u64, ego: ActorId, actors: Vec<ActorState>) -> Self {
        Self { frame, ego, actors }
    }

    /// Creates a snapshot whose ego is the first actor with the given role name.
    pub fn with_role(frame: u64, role_name: &str, actors: Vec<ActorState>) -> Option<Self> {
        let ego = find_by_role(&actors, role_name)?;
        Some(Self::new(frame, ego, actors))
    }

    /// Gets the actor with the given ID.
    pub fn get(&self, id: ActorId) -> Option<&ActorState> {
        self.actors.iter().find(|actor| actor.id == id)
    }

    /// Gets the ego vehicle's state.
    pub fn ego_state(&self) -> Option<&ActorState> {
        self.get(self.ego)
    }

    /// Returns an iterator over every actor except the ego.
    pub fn neighbours(&self) -> impl Iterator<Item = &ActorState> {
        let ego = self.ego;
        self.actors.iter().filter(move |actor| actor.id != ego)
    }
}

/// Finds the first actor with the given role name.
pub fn find_by_role(actors: &[ActorState], role_name: &str) -> Option<ActorId> {
    actors
        .iter()
        .find(|actor| actor.role_name.as_deref() == Some(role_name))
        .map(|actor| actor.id)
}

#[cfg(test)]
mod test {
    use super::*;

    fn actor(id: u32, x: f64) -> ActorState {
        ActorState::new(ActorId(id), Pose::planar(x, 0.0, 0.0), Vector3d::new(0.0, 0.0, 0.0))
    }

    #[test]
    fn ego_by_role() {
        let actors = vec![actor(7, 0.0), actor(3, 1.0).with_role("hero"), actor(9, 2.0)];
        let snapshot = TickSnapshot::with_role(12, "hero", actors).unwrap();
        assert_eq!(snapshot.ego, ActorId(3));
        assert_eq!(snapshot.ego_state().unwrap().pose.location.x, 1.0);
        let ids = snapshot.neighbours().map(|a| a.id).collect::<Vec<_>>();
        assert_eq!(ids, vec![ActorId(7), ActorId(9)]);

        assert!(TickSnapshot::with_role(12, "hero", vec![actor(1, 0.0)]).is_none());
    }

    #[test]
    fn snapshot_from_json() {
        let json = r#"{
            "frame": 4,
            "ego": 1,
            "actors": [
                {"id": 1, "pose": {"location": {"x": 0, "y": 0, "z": 0},
                                   "rotation": {"roll": 0, "pitch": 0, "yaw": 90}},
                 "velocity": {"x": 0, "y": 5, "z": 0}},
                {"id": 2, "pose": {"location": {"x": 3, "y": 4, "z": 0},
                                   "rotation": {"roll": 0, "pitch": 0, "yaw": 0}},
                 "velocity": {"x": 1, "y": 0, "z": 0},
                 "footprint": {"length": 10.0, "width": 2.5}}
            ]
        }"#;
        let snapshot: TickSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.frame, 4);
        assert_eq!(snapshot.ego_state().unwrap().pose.rotation.yaw, 90.0);
        let other = snapshot.get(ActorId(2)).unwrap();
        assert_eq!(other.footprint_or(Footprint::default()).length, 10.0);
        assert_eq!(other.pose.planar_distance2(&snapshot.ego_state().unwrap().pose), 25.0);
    }
}
