//! Miscellaneous utility structs and functions.

use std::fmt::Debug;

use cgmath::num_traits::Float;
use serde::{Deserialize, Serialize};

/// An interval on the real number line.
#[derive(Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval<T> {
    pub min: T,
    pub max: T,
}

impl<T> Interval<T> {
    /// Creates a new interval.
    pub const fn new(min: T, max: T) -> Self {
        Self { min, max }
    }
}

impl<T: std::cmp::PartialOrd> Interval<T> {
    /// Returns true if this interval contains the value.
    pub fn contains(&self, value: T) -> bool {
        value >= self.min && value <= self.max
    }

    /// Returns true if the lower bound exceeds the upper bound.
    pub fn is_inverted(&self) -> bool {
        self.min > self.max
    }
}

impl<T: std::ops::Sub<T, Output = T> + Copy> Interval<T> {
    /// Gets the magnitude of the interval.
    pub fn length(&self) -> T {
        self.max - self.min
    }
}

impl<T: Float> Interval<T> {
    /// Returns the centre/mid-point of the interval.
    pub fn midpoint(&self) -> T {
        T::from(0.5).unwrap() * (self.min + self.max)
    }

    pub fn lerp(&self, t: T) -> T {
        self.min + t * (self.max - self.min)
    }

    /// The overlap of two intervals. Disjoint intervals give an inverted one.
    pub fn intersect(&self, other: &Self) -> Self {
        Interval::new(self.min.max(other.min), self.max.min(other.max))
    }

    /// Whether both bounds are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.min.is_finite() && self.max.is_finite()
    }

    /// Splits the interval into the fewest equal sub-intervals
    /// no wider than `max_width`.
    pub fn split(&self, max_width: T) -> impl Iterator<Item = Interval<T>> {
        let len = self.length();
        let count = if len > T::zero() && max_width > T::zero() {
            (len / max_width).ceil().to_usize().unwrap_or(1).max(1)
        } else {
            1
        };
        let whole = *self;
        let n = T::from(count).unwrap();
        (0..count).map(move |i| {
            let i = T::from(i).unwrap();
            Interval::new(
                whole.lerp(i / n),
                whole.lerp((i + T::one()) / n),
            )
        })
    }
}

impl<T: Debug> Debug for Interval<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Interval({:?}, {:?})", &self.min, &self.max)
    }
}
