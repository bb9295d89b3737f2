use super::{Matrix4d, Point3d, Vector3d};
use cgmath::prelude::*;
use cgmath::Vector4;

/// Builds the homogeneous world transform of a body from its location and
/// its roll, pitch and yaw in degrees.
///
/// Rotations follow the simulator's convention: yaw about +z, pitch about +y,
/// roll about +x, applied as yaw · pitch · roll.
pub fn pose_matrix(location: Point3d, roll: f64, pitch: f64, yaw: f64) -> Matrix4d {
    let (sy, cy) = yaw.to_radians().sin_cos();
    let (sr, cr) = roll.to_radians().sin_cos();
    let (sp, cp) = pitch.to_radians().sin_cos();

    Matrix4d::from_cols(
        Vector4::new(cp * cy, sy * cp, sp, 0.0),
        Vector4::new(cy * sp * sr - sy * cr, sy * sp * sr + cy * cr, -cp * sr, 0.0),
        Vector4::new(-cy * sp * cr - sy * sr, -sy * sp * cr + cy * sr, cp * cr, 0.0),
        Vector4::new(location.x, location.y, location.z, 1.0),
    )
}

/// Maps a world space point through `inverse`, the inverse of a body's pose matrix,
/// into that body's local frame.
pub fn to_local(inverse: &Matrix4d, point: Point3d) -> Point3d {
    Point3d::from_vec((inverse * point.to_vec().extend(1.0)).truncate())
}

/// Maps a world space direction or velocity into a body's local frame.
/// Unlike [to_local], translation is ignored.
pub fn to_local_vector(inverse: &Matrix4d, vector: Vector3d) -> Vector3d {
    (inverse * vector.extend(0.0)).truncate()
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn identity_pose() {
        let m = pose_matrix(Point3d::new(0.0, 0.0, 0.0), 0.0, 0.0, 0.0);
        assert_eq!(m, Matrix4d::identity());
    }

    #[test]
    fn yaw_rotates_forward_axis() {
        let m = pose_matrix(Point3d::new(10.0, -5.0, 1.0), 0.0, 0.0, 90.0);
        let forward = (m * Vector4::new(1.0, 0.0, 0.0, 0.0)).truncate();
        assert_approx_eq!(forward.x, 0.0);
        assert_approx_eq!(forward.y, 1.0);
        assert_approx_eq!(forward.z, 0.0);

        let inv = m.invert().unwrap();
        let local = to_local(&inv, Point3d::new(10.0, 0.0, 1.0));
        assert_approx_eq!(local.x, 5.0);
        assert_approx_eq!(local.y, 0.0);
        assert_approx_eq!(local.z, 0.0);
    }

    #[test]
    fn vectors_ignore_translation() {
        let m = pose_matrix(Point3d::new(100.0, 200.0, 3.0), 0.0, 0.0, 180.0);
        let inv = m.invert().unwrap();
        let v = to_local_vector(&inv, Vector3d::new(5.0, 0.0, 0.0));
        assert_approx_eq!(v.x, -5.0);
        assert_approx_eq!(v.y, 0.0);
        assert_approx_eq!(v.z, 0.0);
    }

    #[test]
    fn pitch_and_roll_keep_rotation_orthonormal() {
        let m = pose_matrix(Point3d::new(1.0, 2.0, 3.0), 12.0, -7.5, 33.0);
        let cols = [m.x.truncate(), m.y.truncate(), m.z.truncate()];
        for (i, a) in cols.iter().enumerate() {
            assert_approx_eq!(a.magnitude(), 1.0);
            for b in &cols[i + 1..] {
                assert_approx_eq!(a.dot(*b), 0.0);
            }
        }
        assert_approx_eq!(m.determinant(), 1.0);
    }
}
