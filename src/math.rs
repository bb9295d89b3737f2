//! Mathematical structs and functions.

use cgmath::{Matrix4, Point2, Point3, Vector2, Vector3};
pub use gaussian::Gaussian2d;
pub use quadrature::AdaptiveSimpson;
pub use transform::{pose_matrix, to_local, to_local_vector};
pub use util::*;

mod gaussian;
mod quadrature;
mod transform;
mod util;

/// A 2D point
pub type Point2d = Point2<f64>;

/// A 2D vector
pub type Vector2d = Vector2<f64>;

/// A 3D point
pub type Point3d = Point3<f64>;

/// A 3D vector
pub type Vector3d = Vector3<f64>;

/// A 4x4 homogeneous transform
pub type Matrix4d = Matrix4<f64>;
