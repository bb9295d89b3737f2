use crate::error::{Result, RiskError};
use serde::{Deserialize, Serialize};

/// Default vehicle length in m.
pub const DEFAULT_LENGTH: f64 = 4.8;

/// Default vehicle width in m.
pub const DEFAULT_WIDTH: f64 = 1.8;

/// The rectangular plan-view envelope of a vehicle.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Footprint {
    /// The vehicle length in m.
    pub length: f64,
    /// The vehicle width in m.
    pub width: f64,
}

impl Default for Footprint {
    fn default() -> Self {
        Self {
            length: DEFAULT_LENGTH,
            width: DEFAULT_WIDTH,
        }
    }
}

impl Footprint {
    /// Creates a footprint, checking that both dimensions are positive.
    pub fn new(length: f64, width: f64) -> Result<Self> {
        Self { length, width }.validated()
    }

    /// Returns the footprint if both dimensions are positive and finite.
    pub fn validated(self) -> Result<Self> {
        let ok = |v: f64| v.is_finite() && v > 0.0;
        if ok(self.length) && ok(self.width) {
            Ok(self)
        } else {
            Err(RiskError::InvalidFootprint {
                length: self.length,
                width: self.width,
            })
        }
    }

    /// Half the vehicle's length in m.
    pub fn half_len(&self) -> f64 {
        0.5 * self.length
    }

    /// Half the vehicle's width in m.
    pub fn half_wid(&self) -> f64 {
        0.5 * self.width
    }

    /// Half the length of the footprint's diagonal in m.
    pub fn half_diagonal(&self) -> f64 {
        0.5 * self.length.hypot(self.width)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn rejects_non_positive_dimensions() {
        assert!(Footprint::new(4.8, 1.8).is_ok());
        assert!(matches!(
            Footprint::new(0.0, 1.8),
            Err(RiskError::InvalidFootprint { .. })
        ));
        assert!(Footprint::new(4.8, -1.0).is_err());
        assert!(Footprint::new(f64::NAN, 1.0).is_err());
        assert!(Footprint::new(f64::INFINITY, 1.0).is_err());
    }

    #[test]
    fn default_is_a_passenger_car() {
        let fp = Footprint::default();
        assert_eq!((fp.length, fp.width), (4.8, 1.8));
        assert!((fp.half_diagonal() - 2.5632).abs() < 1e-4);
    }
}
