use crate::util::Interval;

/// Refinement always descends at least this many levels, so that a narrow
/// peak between the first three samples is not mistaken for a flat function.
const MIN_DEPTH: u32 = 2;

/// Adaptive Simpson quadrature with Richardson extrapolation.
#[derive(Clone, Copy, Debug)]
pub struct AdaptiveSimpson {
    /// The absolute error tolerance over the whole range.
    pub tolerance: f64,
    /// The maximum recursion depth of each panel.
    pub max_depth: u32,
    /// The range is first split into panels no wider than this.
    pub max_panel: f64,
}

impl AdaptiveSimpson {
    /// Creates an integrator with the given tolerance and initial panel width.
    pub fn new(tolerance: f64, max_panel: f64) -> Self {
        Self {
            tolerance,
            max_depth: 40,
            max_panel,
        }
    }

    /// Integrates `f` over `range`.
    ///
    /// An empty or inverted range integrates to zero.
    pub fn integrate(&self, mut f: impl FnMut(f64) -> f64, range: Interval<f64>) -> f64 {
        let length = range.length();
        if !(length > 0.0) {
            return 0.0;
        }
        range
            .split(self.max_panel)
            .map(|panel| {
                let tol = self.tolerance * panel.length() / length;
                let (a, b) = (panel.min, panel.max);
                let m = panel.midpoint();
                let (fa, fm, fb) = (f(a), f(m), f(b));
                let whole = simpson(a, b, fa, fm, fb);
                self.refine(&mut f, a, b, fa, fm, fb, whole, tol, 0)
            })
            .sum()
    }

    #[allow(clippy::too_many_arguments)]
    fn refine(
        &self,
        f: &mut impl FnMut(f64) -> f64,
        a: f64,
        b: f64,
        fa: f64,
        fm: f64,
        fb: f64,
        whole: f64,
        tol: f64,
        depth: u32,
    ) -> f64 {
        let m = 0.5 * (a + b);
        let (lm, rm) = (0.5 * (a + m), 0.5 * (m + b));
        let (flm, frm) = (f(lm), f(rm));
        let left = simpson(a, m, fa, flm, fm);
        let right = simpson(m, b, fm, frm, fb);
        let delta = left + right - whole;

        let converged = depth >= MIN_DEPTH && delta.abs() <= 15.0 * tol;
        // A non-finite estimate cannot improve by subdividing.
        let exhausted = depth >= self.max_depth
            || !whole.is_finite()
            || !delta.is_finite()
            || tol <= f64::EPSILON * whole.abs();
        if converged || exhausted {
            left + right + delta / 15.0
        } else {
            self.refine(f, a, m, fa, flm, fm, left, 0.5 * tol, depth + 1)
                + self.refine(f, m, b, fm, frm, fb, right, 0.5 * tol, depth + 1)
        }
    }
}

#[inline(always)]
fn simpson(a: f64, b: f64, fa: f64, fm: f64, fb: f64) -> f64 {
    (b - a) / 6.0 * (fa + 4.0 * fm + fb)
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use std::f64::consts::PI;

    #[test]
    fn polynomials_are_exact() {
        let q = AdaptiveSimpson::new(1e-12, 10.0);
        assert_approx_eq!(q.integrate(|x| x * x * x - 2.0 * x, Interval::new(-1.0, 3.0)), 12.0);
    }

    #[test]
    fn standard_normal_mass() {
        let q = AdaptiveSimpson::new(1e-12, 1.0);
        let pdf = |x: f64| (-0.5 * x * x).exp() / (2.0 * PI).sqrt();
        let mass = q.integrate(pdf, Interval::new(-1.0, 1.0));
        assert_approx_eq!(mass, 0.682689492137, 1e-10);
        let mass = q.integrate(pdf, Interval::new(-40.0, 40.0));
        assert_approx_eq!(mass, 1.0, 1e-10);
    }

    #[test]
    fn narrow_peak_is_found() {
        // All of the first-level samples land on zeros of the peak.
        let q = AdaptiveSimpson::new(1e-10, 100.0);
        let peak = |x: f64| (-0.5 * ((x - 10.0) / 0.5).powi(2)).exp();
        let mass = q.integrate(peak, Interval::new(0.0, 80.0));
        assert_approx_eq!(mass, 0.5 * (2.0 * PI).sqrt(), 1e-6);
    }

    #[test]
    fn non_finite_integrand_terminates() {
        let q = AdaptiveSimpson::new(1e-12, 0.5);
        let mut calls = 0;
        let mass = q.integrate(
            |_| {
                calls += 1;
                f64::NAN
            },
            Interval::new(0.0, 8.0),
        );
        assert!(mass.is_nan());
        // Three samples per panel plus one split.
        assert_eq!(calls, 16 * 5);
    }

    #[test]
    fn empty_ranges() {
        let q = AdaptiveSimpson::new(1e-10, 1.0);
        assert_eq!(q.integrate(|_| 1.0, Interval::new(1.0, 1.0)), 0.0);
        assert_eq!(q.integrate(|_| 1.0, Interval::new(2.0, 1.0)), 0.0);
    }
}
