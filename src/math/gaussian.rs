use super::Point2d;
use std::f64::consts::PI;

/// An isotropic bivariate normal density.
#[derive(Clone, Copy, Debug)]
pub struct Gaussian2d {
    mean: Point2d,
    /// Precomputed `-0.5 / sigma²`.
    exp_coeff: f64,
    /// Precomputed `1 / (2π sigma²)`.
    norm: f64,
}

impl Gaussian2d {
    /// Creates a density centred on `mean` with standard deviation `sigma` on both axes.
    pub fn new(mean: Point2d, sigma: f64) -> Self {
        let var = sigma * sigma;
        Self {
            mean,
            exp_coeff: -0.5 / var,
            norm: 1.0 / (2.0 * PI * var),
        }
    }

    /// The centre of the density.
    pub fn mean(&self) -> Point2d {
        self.mean
    }

    /// Samples the density.
    #[inline(always)]
    pub fn density(&self, x: f64, y: f64) -> f64 {
        let dx = x - self.mean.x;
        let dy = y - self.mean.y;
        self.norm * (self.exp_coeff * (dx * dx + dy * dy)).exp()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn peak_and_falloff() {
        let g = Gaussian2d::new(Point2d::new(1.0, -2.0), 2.0);
        assert_approx_eq!(g.density(1.0, -2.0), 1.0 / (8.0 * PI));
        assert_approx_eq!(g.density(3.0, -2.0), (-0.5f64).exp() / (8.0 * PI));
        assert_approx_eq!(g.density(3.0, -2.0), g.density(1.0, 0.0));
        assert!(g.density(50.0, 50.0) < 1e-100);
    }
}
