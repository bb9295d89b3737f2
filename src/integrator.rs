//! Integration of a neighbour's position density over a safety octagon.

use crate::config::RiskConfig;
use crate::error::{Result, RiskError};
use crate::math::{lerp_y, round_to, AdaptiveSimpson, Gaussian2d, Point2d};
use crate::octagon::SafetyOctagon;
use crate::util::Interval;
use arrayvec::ArrayVec;
use itertools::Itertools;
use serde::Serialize;
use smallvec::SmallVec;

/// Vertex x coordinates closer than this are merged, and narrower strips dropped.
const STRIP_EPSILON: f64 = 1e-12;

/// Integration stops this many standard deviations from the mean on each axis.
/// The mass beyond is below 1e-22.
const CUTOFF_SIGMAS: f64 = 10.0;

/// A straight boundary of a [Strip], as the line through two points.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StripEdge {
    pub p1: Point2d,
    pub p2: Point2d,
}

impl StripEdge {
    /// Creates an edge through two points.
    pub fn new(p1: Point2d, p2: Point2d) -> Self {
        Self { p1, p2 }
    }

    /// A horizontal edge at `y`.
    pub fn constant(y: f64) -> Self {
        Self::new(Point2d::new(0.0, y), Point2d::new(1.0, y))
    }

    /// The y coordinate of the edge at `x`.
    #[inline(always)]
    pub fn y_at(&self, x: f64) -> f64 {
        lerp_y(self.p1, self.p2, x)
    }

    fn is_finite(&self) -> bool {
        [self.p1.x, self.p1.y, self.p2.x, self.p2.y]
            .iter()
            .all(|v| v.is_finite())
    }
}

/// A vertical slice of a polygon, bounded left and right by constant x
/// and below and above by straight edges.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Strip {
    pub x: Interval<f64>,
    pub lower: StripEdge,
    pub upper: StripEdge,
}

impl Strip {
    /// The area of the strip, a trapezoid.
    pub fn area(&self) -> f64 {
        let height = |x| self.upper.y_at(x) - self.lower.y_at(x);
        0.5 * (height(self.x.min) + height(self.x.max)) * self.x.length()
    }

    fn is_usable(&self) -> bool {
        self.x.is_finite()
            && !self.x.is_inverted()
            && self.lower.is_finite()
            && self.upper.is_finite()
    }
}

/// Splits the octagon into vertical strips at each distinct vertex x coordinate.
///
/// Within a strip no vertex lies strictly between its bounds, so exactly two
/// octagon edges span it: the lower and the upper boundary.
pub fn decompose(octagon: &SafetyOctagon) -> ArrayVec<Strip, 7> {
    let mut xs = octagon
        .vertices()
        .iter()
        .map(|v| v.x)
        .collect::<SmallVec<[f64; 8]>>();
    xs.sort_by(f64::total_cmp);
    xs.dedup_by(|a, b| (*a - *b).abs() <= STRIP_EPSILON);

    let mut strips = ArrayVec::new();
    for (x0, x1) in xs.iter().copied().tuple_windows() {
        if x1 - x0 <= STRIP_EPSILON {
            continue;
        }
        let mid = 0.5 * (x0 + x1);
        let spanning = octagon
            .edges()
            .filter(|(a, b)| {
                let (lo, hi) = (a.x.min(b.x), a.x.max(b.x));
                hi - lo > STRIP_EPSILON && lo <= x0 + STRIP_EPSILON && hi >= x1 - STRIP_EPSILON
            })
            .map(|(a, b)| StripEdge::new(a, b))
            .minmax_by(|a, b| a.y_at(mid).total_cmp(&b.y_at(mid)));
        // Without a spanning pair the strip stays in the list, unusable, so
        // the integrator reports it.
        let (lower, upper) = match spanning {
            itertools::MinMaxResult::MinMax(lower, upper) => (lower, upper),
            _ => (StripEdge::constant(f64::NAN), StripEdge::constant(f64::NAN)),
        };
        strips.push(Strip {
            x: Interval::new(x0, x1),
            lower,
            upper,
        });
    }
    strips
}

/// How far a [RiskScore] can be trusted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    /// Every strip was integrated.
    Full,
    /// Some strips were skipped; the score is a partial sum.
    Low,
}

/// The probability mass of a neighbour's position density inside the safety octagon.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RiskScore {
    /// The integrated mass, in [0, 1].
    pub value: f64,
    /// The mass rounded for reporting.
    pub rounded: f64,
    pub confidence: Confidence,
    /// Indices of strips that were skipped.
    pub skipped: SmallVec<[usize; 2]>,
}

impl RiskScore {
    /// The degenerate strips, as errors.
    pub fn diagnostics(&self) -> impl Iterator<Item = RiskError> + '_ {
        self.skipped
            .iter()
            .map(|&index| RiskError::DegenerateOctagonStrip { index })
    }
}

/// Integrates an isotropic Gaussian over safety octagons.
#[derive(Clone, Copy, Debug)]
pub struct RiskIntegrator {
    sigma: f64,
    precision: u32,
    outer: AdaptiveSimpson,
    inner: AdaptiveSimpson,
}

impl RiskIntegrator {
    /// Creates an integrator with the default tolerances.
    pub fn new(sigma: f64) -> Result<Self> {
        Self::from_config(&RiskConfig {
            sigma,
            ..Default::default()
        })
    }

    /// Creates an integrator from the estimator configuration.
    pub fn from_config(config: &RiskConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            sigma: config.sigma,
            precision: config.precision,
            outer: config.outer_quadrature(),
            inner: config.inner_quadrature(),
        })
    }

    /// The standard deviation of the neighbour's position density.
    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// Computes the risk that a neighbour centred at `neighbour` (ego frame)
    /// lies within the octagon.
    pub fn risk(&self, octagon: &SafetyOctagon, neighbour: Point2d) -> RiskScore {
        self.risk_over_strips(&decompose(octagon), neighbour)
    }

    /// Like [RiskIntegrator::risk], but gives up as soon as `cancelled` returns
    /// true, even part way through a strip.
    pub fn risk_or_cancel(
        &self,
        octagon: &SafetyOctagon,
        neighbour: Point2d,
        cancelled: &dyn Fn() -> bool,
    ) -> Option<RiskScore> {
        let score = self.score(&decompose(octagon), neighbour, cancelled);
        (!cancelled()).then_some(score)
    }

    /// Sums the Gaussian mass over each strip.
    ///
    /// Strips with inverted or non-finite bounds are skipped and reported in
    /// the score's diagnostics rather than failing the whole computation.
    pub fn risk_over_strips(&self, strips: &[Strip], neighbour: Point2d) -> RiskScore {
        self.score(strips, neighbour, &|| false)
    }

    fn score(
        &self,
        strips: &[Strip],
        neighbour: Point2d,
        cancelled: &dyn Fn() -> bool,
    ) -> RiskScore {
        let density = Gaussian2d::new(neighbour, self.sigma);
        let mut skipped = SmallVec::new();
        let mut total = 0.0;

        for (index, strip) in strips.iter().enumerate() {
            if cancelled() {
                break;
            }
            if !strip.is_usable() {
                log::warn!("skipping degenerate octagon strip {index}: {strip:?}");
                skipped.push(index);
                continue;
            }
            total += self.integrate_strip(strip, &density, cancelled);
        }

        let value = if total.is_finite() {
            total.clamp(0.0, 1.0)
        } else {
            0.0
        };
        RiskScore {
            value,
            rounded: round_to(value, self.precision),
            confidence: if skipped.is_empty() {
                Confidence::Full
            } else {
                Confidence::Low
            },
            skipped,
        }
    }

    fn integrate_strip(
        &self,
        strip: &Strip,
        density: &Gaussian2d,
        cancelled: &dyn Fn() -> bool,
    ) -> f64 {
        let reach = CUTOFF_SIGMAS * self.sigma;
        let mean = density.mean();
        let xs = strip.x.intersect(&Interval::new(mean.x - reach, mean.x + reach));
        let window = Interval::new(mean.y - reach, mean.y + reach);
        self.outer.integrate(
            |x| {
                // NaN stops the refinement at once.
                if cancelled() {
                    return f64::NAN;
                }
                let ys = Interval::new(strip.lower.y_at(x), strip.upper.y_at(x));
                // Crossed bounds clamp to an empty slice.
                self.inner.integrate(|y| density.density(x, y), ys.intersect(&window))
            },
            xs,
        )
    }
}
