use super::Point2d;
use std::f64::consts::PI;

/// Wraps an angle in radians into the range (-π, π].
pub fn normalize_angle(angle: f64) -> f64 {
    wrap_half_turn(angle, PI)
}

/// Wraps an angle in degrees into the range (-180, 180].
pub fn normalize_degrees(angle: f64) -> f64 {
    wrap_half_turn(angle, 180.0)
}

fn wrap_half_turn(angle: f64, half_turn: f64) -> f64 {
    let wrapped = (angle + half_turn).rem_euclid(2.0 * half_turn) - half_turn;
    if wrapped <= -half_turn {
        wrapped + 2.0 * half_turn
    } else {
        wrapped
    }
}

/// Rounds a value to the given number of decimal places.
///
/// Beyond the precision of an f64 the value is returned unchanged.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let Ok(exp) = i32::try_from(decimals) else {
        return value;
    };
    let scale = 10f64.powi(exp);
    let scaled = value * scale;
    if !scaled.is_finite() {
        return value;
    }
    scaled.round() / scale
}

/// Evaluates the line through `p1` and `p2` at `x`.
///
/// A vertical line has no unique value and yields the mean of the two y values.
#[inline(always)]
pub fn lerp_y(p1: Point2d, p2: Point2d, x: f64) -> f64 {
    let dx = p2.x - p1.x;
    if dx == 0.0 {
        0.5 * (p1.y + p2.y)
    } else {
        (x - p1.x) / dx * (p2.y - p1.y) + p1.y
    }
}
