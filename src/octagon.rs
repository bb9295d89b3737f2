//! The minimum clearance envelope between two rectangular footprints.

use crate::error::Result;
use crate::footprint::Footprint;
use crate::math::{normalize_angle, Point2d, Vector2d};
use crate::util::Interval;
use cgmath::prelude::*;
use itertools::Itertools;
use serde::Serialize;
use std::f64::consts::{FRAC_PI_2, PI};

/// The region of the ego frame that a neighbour's centre must stay out of
/// for the two footprints not to overlap.
///
/// It is the Minkowski sum of the ego footprint and the neighbour footprint
/// rotated by their relative heading: an octagon, centrally symmetric about
/// the origin, with vertices in counter-clockwise order.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SafetyOctagon {
    vertices: [Point2d; 8],
    /// The relative heading used to build the octagon, in (-π, π].
    heading: f64,
}

/// One side of a footprint, walking its boundary counter-clockwise.
#[derive(Clone, Copy)]
struct Side {
    /// The direction of the side in [0, 2π).
    angle: f64,
    vec: Vector2d,
}

impl Side {
    fn new(angle: f64, len: f64) -> Self {
        Self {
            angle,
            vec: len * Vector2d::new(angle.cos(), angle.sin()),
        }
    }
}

impl SafetyOctagon {
    /// Builds the octagon for a neighbour whose heading relative to the ego is
    /// `relative_heading` radians.
    pub fn build(ego: &Footprint, neighbour: &Footprint, relative_heading: f64) -> Result<Self> {
        let ego = ego.validated()?;
        let neighbour = neighbour.validated()?;
        let heading = normalize_angle(relative_heading);

        // Side directions repeat every quarter turn, so only the phase within
        // a quarter turn orders the neighbour's sides against the ego's.
        let turns = heading.rem_euclid(2.0 * PI);
        let mut quarters = (turns / FRAC_PI_2).floor() as usize;
        let mut phase = (turns - quarters as f64 * FRAC_PI_2).clamp(0.0, FRAC_PI_2);
        if quarters >= 4 {
            quarters = 0;
            phase = 0.0;
        }

        // The neighbour side leaving the lowest corner runs along its length
        // axis for an even number of quarter turns.
        let (side0, side1) = if quarters % 2 == 0 {
            (neighbour.length, neighbour.width)
        } else {
            (neighbour.width, neighbour.length)
        };
        let half_angle = (side1 / side0).atan();
        let neighbour_start = -neighbour.half_diagonal()
            * Vector2d::new((phase + half_angle).cos(), (phase + half_angle).sin());
        let ego_start = Vector2d::new(-ego.half_len(), -ego.half_wid());

        let ego_sides = [Side::new(0.0, ego.length), Side::new(FRAC_PI_2, ego.width)];
        let neighbour_sides = [Side::new(phase, side0), Side::new(phase + FRAC_PI_2, side1)];

        // Walk the first half of the boundary, taking sides in order of direction.
        // On ties the ego side goes first.
        let start = Point2d::from_vec(ego_start + neighbour_start);
        let mut vertices = [start; 8];
        let sides = ego_sides
            .into_iter()
            .merge_by(neighbour_sides, |a, b| a.angle <= b.angle);
        for (i, side) in sides.take(3).enumerate() {
            vertices[i + 1] = vertices[i] + side.vec;
        }

        // The second half is the point reflection of the first.
        for i in 0..4 {
            vertices[i + 4] = Point2d::from_vec(-vertices[i].to_vec());
        }

        Ok(Self { vertices, heading })
    }

    /// The eight vertices in counter-clockwise order.
    pub fn vertices(&self) -> &[Point2d; 8] {
        &self.vertices
    }

    /// The relative heading the octagon was built for, in (-π, π].
    pub fn relative_heading(&self) -> f64 {
        self.heading
    }

    /// Returns an iterator over the edges, as pairs of consecutive vertices.
    pub fn edges(&self) -> impl Iterator<Item = (Point2d, Point2d)> + '_ {
        self.vertices
            .iter()
            .copied()
            .circular_tuple_windows::<(_, _)>()
    }

    /// The range of x coordinates covered by the octagon.
    pub fn x_range(&self) -> Interval<f64> {
        let (min, max) = self
            .vertices
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), v| {
                (min.min(v.x), max.max(v.x))
            });
        Interval::new(min, max)
    }

    /// The enclosed area in m².
    pub fn area(&self) -> f64 {
        0.5 * self
            .edges()
            .map(|(a, b)| a.x * b.y - b.x * a.y)
            .sum::<f64>()
    }

    /// Whether the point lies inside or on the boundary of the octagon.
    pub fn contains(&self, point: Point2d) -> bool {
        self.edges()
            .all(|(a, b)| (b - a).perp_dot(point - a) >= -1e-9)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use rand::{Rng, SeedableRng};

    fn car() -> Footprint {
        Footprint::default()
    }

    /// Area of the Minkowski sum of two rectangles, from their edge generators.
    fn expected_area(a: &Footprint, b: &Footprint, heading: f64) -> f64 {
        let (s, c) = (heading.sin().abs(), heading.cos().abs());
        a.length * a.width
            + b.length * b.width
            + (a.length * b.length + a.width * b.width) * s
            + (a.length * b.width + a.width * b.length) * c
    }

    #[test]
    fn aligned_vehicles_give_a_rectangle() {
        let oct = SafetyOctagon::build(&car(), &car(), 0.0).unwrap();
        let xs = oct.vertices().map(|v| v.x);
        let ys = oct.vertices().map(|v| v.y);
        for x in xs {
            assert!([-4.8, 0.0, 4.8].iter().any(|e| (x - e).abs() < 1e-12));
        }
        for y in ys {
            assert!([-1.8, 0.0, 1.8].iter().any(|e| (y - e).abs() < 1e-12));
        }
        assert_approx_eq!(oct.x_range().min, -4.8);
        assert_approx_eq!(oct.x_range().max, 4.8);
        assert_approx_eq!(oct.area(), 9.6 * 3.6);
    }

    #[test]
    fn opposite_heading_matches_aligned() {
        let a = SafetyOctagon::build(&car(), &car(), 0.0).unwrap();
        let b = SafetyOctagon::build(&car(), &car(), PI).unwrap();
        let c = SafetyOctagon::build(&car(), &car(), -PI).unwrap();
        for ((p, q), r) in a.vertices().iter().zip(b.vertices()).zip(c.vertices()) {
            assert_approx_eq!(p.x, q.x);
            assert_approx_eq!(p.y, q.y);
            assert_approx_eq!(p.x, r.x);
            assert_approx_eq!(p.y, r.y);
        }
    }

    #[test]
    fn octagons_are_symmetric_and_convex() {
        let mut rng = rand::rngs::StdRng::from_seed(*b"Vegemite sandwhich is not fun...");
        for _ in 0..200 {
            let ego = Footprint::new(rng.gen_range(0.5..12.0), rng.gen_range(0.5..3.0)).unwrap();
            let other = Footprint::new(rng.gen_range(0.5..12.0), rng.gen_range(0.5..3.0)).unwrap();
            let heading = rng.gen_range(-10.0..10.0);
            let oct = SafetyOctagon::build(&ego, &other, heading).unwrap();

            let v = oct.vertices();
            for i in 0..8 {
                assert_approx_eq!(v[i].x, -v[(i + 4) % 8].x);
                assert_approx_eq!(v[i].y, -v[(i + 4) % 8].y);
            }
            for i in 0..8 {
                let (a, b, c) = (v[i], v[(i + 1) % 8], v[(i + 2) % 8]);
                assert!((b - a).perp_dot(c - b) >= -1e-9);
            }
            assert!(oct.area() > 0.0);
            assert_approx_eq!(oct.area(), expected_area(&ego, &other, heading), 1e-9);
            assert!(oct.contains(Point2d::new(0.0, 0.0)));
        }
    }

    #[test]
    fn quarter_turn_swaps_axes() {
        let oct = SafetyOctagon::build(&car(), &car(), FRAC_PI_2).unwrap();
        assert_approx_eq!(oct.x_range().max, 2.4 + 0.9);
        assert_approx_eq!(oct.area(), (4.8 + 1.8) * (1.8 + 4.8));
        assert_approx_eq!(oct.relative_heading(), FRAC_PI_2);
    }

    #[test]
    fn containment_matches_overlap() {
        let oct = SafetyOctagon::build(&car(), &car(), 0.3).unwrap();
        assert!(oct.contains(Point2d::new(4.0, 0.0)));
        assert!(oct.contains(Point2d::new(0.0, 1.5)));
        assert!(!oct.contains(Point2d::new(6.0, 0.0)));
        assert!(!oct.contains(Point2d::new(0.0, 4.0)));
    }

    #[test]
    fn invalid_footprints() {
        let bad = Footprint {
            length: 0.0,
            width: 1.0,
        };
        assert!(SafetyOctagon::build(&bad, &car(), 0.0).is_err());
        assert!(SafetyOctagon::build(&car(), &bad, 0.0).is_err());
    }
}
