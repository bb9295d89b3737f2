//! Per-tick risk estimation between the ego vehicle and its neighbours.

use crate::config::RiskConfig;
#[cfg(feature = "debug")]
use crate::debug::{debug_octagon, debug_point, take_debug_frame};
use crate::error::{Result, RiskError};
use crate::footprint::Footprint;
use crate::frame::{EgoFrame, LocalState};
use crate::integrator::{RiskIntegrator, RiskScore};
use crate::math::Point2d;
use crate::octagon::SafetyOctagon;
use crate::snapshot::{ActorId, ActorState, TickSnapshot};
use serde::{Serialize, Serializer};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Estimates collision risk for every neighbour of the ego vehicle, once per tick.
pub struct RiskEstimator {
    config: RiskConfig,
    integrator: RiskIntegrator,
    pool: rayon::ThreadPool,
}

/// The result of evaluating one neighbour.
#[derive(Debug, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum RiskOutcome {
    /// The risk was computed.
    Scored(RiskScore),
    /// The neighbour could not be evaluated.
    Rejected(#[serde(serialize_with = "serialize_display")] RiskError),
    /// No result arrived before the tick's deadline.
    Stale,
}

/// What the driver gets back for one neighbour.
#[derive(Debug, Serialize)]
pub struct NeighbourReport {
    pub id: ActorId,
    /// Position, velocity and heading in the ego frame.
    pub local: LocalState,
    /// The safety octagon the score was integrated over.
    pub octagon: Option<SafetyOctagon>,
    pub outcome: RiskOutcome,
}

/// Everything computed for one tick.
#[derive(Debug, Serialize)]
pub struct TickReport {
    pub frame: u64,
    pub ego: ActorId,
    /// The ego's own state in its frame; its velocity is the useful part.
    pub ego_local: LocalState,
    /// The neighbours within the configured radius, in snapshot order.
    pub neighbours: Vec<NeighbourReport>,
    /// The number of neighbours beyond the radius.
    pub out_of_range: usize,
    /// The debug frame recorded during this tick.
    #[cfg(feature = "debug")]
    pub debug: serde_json::Value,
}

/// The inputs shared by every neighbour evaluation within a tick.
#[derive(Clone, Copy)]
struct TickContext {
    frame: EgoFrame,
    ego_footprint: Footprint,
    default_footprint: Footprint,
    integrator: RiskIntegrator,
}

impl RiskOutcome {
    /// The score, if there is one.
    pub fn score(&self) -> Option<&RiskScore> {
        match self {
            RiskOutcome::Scored(score) => Some(score),
            _ => None,
        }
    }
}

impl NeighbourReport {
    /// The reported risk, rounded, if the neighbour was scored.
    pub fn risk(&self) -> Option<f64> {
        self.outcome.score().map(|score| score.rounded)
    }
}

impl TickReport {
    /// Gets the report for the given neighbour.
    pub fn get(&self, id: ActorId) -> Option<&NeighbourReport> {
        self.neighbours.iter().find(|report| report.id == id)
    }

    /// The number of neighbours with no result before the deadline.
    pub fn stale_count(&self) -> usize {
        self.neighbours
            .iter()
            .filter(|report| matches!(report.outcome, RiskOutcome::Stale))
            .count()
    }

    /// The neighbour with the highest risk.
    pub fn riskiest(&self) -> Option<(ActorId, f64)> {
        self.neighbours
            .iter()
            .filter_map(|report| Some((report.id, report.outcome.score()?.value)))
            .max_by(|a, b| a.1.total_cmp(&b.1))
    }
}

impl RiskEstimator {
    /// Creates an estimator, starting its worker pool.
    pub fn new(config: RiskConfig) -> Result<Self> {
        let integrator = RiskIntegrator::from_config(&config)?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.workers)
            .thread_name(|idx| format!("risk-worker-{idx}"))
            .build()?;
        Ok(Self {
            config,
            integrator,
            pool,
        })
    }

    /// Gets the configuration.
    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    /// Evaluates every neighbour in range on the calling thread.
    ///
    /// Fails only if the ego is missing or its pose cannot be inverted;
    /// problems with a single neighbour are reported in that neighbour's outcome.
    pub fn assess(&self, snapshot: &TickSnapshot) -> Result<TickReport> {
        let (ctx, ego_local, in_range, out_of_range) = self.prepare(snapshot)?;
        let neighbours = in_range
            .into_iter()
            .map(|actor| evaluate(&ctx, actor, &|| false))
            .collect();
        Ok(self.finish(snapshot, ego_local, neighbours, out_of_range))
    }

    /// Evaluates every neighbour in range on the worker pool.
    ///
    /// Waits at most [RiskConfig::deadline]; neighbours without a result by
    /// then are reported as [RiskOutcome::Stale].
    pub fn assess_parallel(&self, snapshot: &TickSnapshot) -> Result<TickReport> {
        self.assess_parallel_within(snapshot, self.config.deadline())
    }

    /// Like [RiskEstimator::assess_parallel], with an explicit time budget.
    ///
    /// Evaluations still running when the budget runs out are abandoned, so
    /// they do not hold workers needed by the next tick.
    pub fn assess_parallel_within(
        &self,
        snapshot: &TickSnapshot,
        budget: Duration,
    ) -> Result<TickReport> {
        let started = Instant::now();
        let deadline = started + budget;
        let (ctx, ego_local, in_range, out_of_range) = self.prepare(snapshot)?;

        let expired = Arc::new(AtomicBool::new(false));
        let (tx, rx) = mpsc::channel();
        for (slot, actor) in in_range.iter().enumerate() {
            let tx = tx.clone();
            let expired = expired.clone();
            let actor = (*actor).clone();
            self.pool.spawn(move || {
                let cancelled = || expired.load(Ordering::Relaxed) || Instant::now() >= deadline;
                if cancelled() {
                    return;
                }
                let _ = tx.send((slot, evaluate(&ctx, &actor, &cancelled)));
            });
        }
        drop(tx);

        let mut results = in_range.iter().map(|_| None).collect::<Vec<_>>();
        let mut pending = in_range.len();
        while pending > 0 {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match rx.recv_timeout(remaining) {
                Ok((slot, report)) => {
                    results[slot] = Some(report);
                    pending -= 1;
                }
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        expired.store(true, Ordering::Relaxed);

        let neighbours: Vec<NeighbourReport> = results
            .into_iter()
            .zip(&in_range)
            .map(|(result, actor)| {
                result.unwrap_or_else(|| NeighbourReport {
                    id: actor.id,
                    local: ctx.frame.localize(actor),
                    octagon: None,
                    outcome: RiskOutcome::Stale,
                })
            })
            .collect();
        let stale = neighbours
            .iter()
            .filter(|report| matches!(report.outcome, RiskOutcome::Stale))
            .count();
        if stale > 0 {
            log::warn!(
                "frame {}: {} of {} neighbours missed the {:?} deadline",
                snapshot.frame,
                stale,
                in_range.len(),
                budget
            );
        }
        log::debug!("frame {} assessed in {:?}", snapshot.frame, started.elapsed());
        Ok(self.finish(snapshot, ego_local, neighbours, out_of_range))
    }

    /// Locates the ego, builds its frame and selects the neighbours in range.
    fn prepare<'a>(
        &self,
        snapshot: &'a TickSnapshot,
    ) -> Result<(TickContext, LocalState, Vec<&'a ActorState>, usize)> {
        let ego = snapshot
            .ego_state()
            .ok_or(RiskError::MissingEgo(snapshot.ego))?;
        let frame = EgoFrame::new(&ego.pose).map_err(|err| {
            log::warn!("frame {}: skipping tick: {err}", snapshot.frame);
            err
        })?;

        let ego_local = frame.localize(ego);
        log::debug!(
            "frame {}: ego {} location {:?} velocity {:?}",
            snapshot.frame,
            ego.id,
            ego_local.position,
            ego_local.velocity
        );

        let radius2 = self.config.radius * self.config.radius;
        let (in_range, out_of_range): (Vec<_>, Vec<_>) = snapshot
            .neighbours()
            .partition(|actor| actor.pose.planar_distance2(&ego.pose) <= radius2);
        log::info!(
            "frame {}: {} neighbours within {} m",
            snapshot.frame,
            in_range.len(),
            self.config.radius
        );

        let ctx = TickContext {
            frame,
            ego_footprint: ego.footprint_or(self.config.default_footprint),
            default_footprint: self.config.default_footprint,
            integrator: self.integrator,
        };
        Ok((ctx, ego_local, in_range, out_of_range.len()))
    }

    fn finish(
        &self,
        snapshot: &TickSnapshot,
        ego_local: LocalState,
        neighbours: Vec<NeighbourReport>,
        out_of_range: usize,
    ) -> TickReport {
        #[cfg(feature = "debug")]
        for report in &neighbours {
            let p = report.local.position;
            debug_point(&format!("neighbour {}", report.id), Point2d::new(p.x, p.y));
            if let Some(octagon) = &report.octagon {
                debug_octagon(&format!("octagon {}", report.id), octagon);
            }
        }

        TickReport {
            frame: snapshot.frame,
            ego: snapshot.ego,
            ego_local,
            neighbours,
            out_of_range,
            #[cfg(feature = "debug")]
            debug: take_debug_frame(),
        }
    }
}

/// Runs the full pipeline for one neighbour: local frame, octagon, integral.
/// The neighbour is stale if `cancelled` fires before the integral completes.
fn evaluate(
    ctx: &TickContext,
    actor: &ActorState,
    cancelled: &dyn Fn() -> bool,
) -> NeighbourReport {
    let local = ctx.frame.localize(actor);
    let footprint = actor.footprint_or(ctx.default_footprint);
    let (octagon, outcome) =
        match SafetyOctagon::build(&ctx.ego_footprint, &footprint, local.heading_rad()) {
            Ok(octagon) => {
                let position = Point2d::new(local.position.x, local.position.y);
                match ctx.integrator.risk_or_cancel(&octagon, position, cancelled) {
                    Some(score) => {
                        for diagnostic in score.diagnostics() {
                            log::warn!("neighbour {}: low confidence: {diagnostic}", actor.id);
                        }
                        (Some(octagon), RiskOutcome::Scored(score))
                    }
                    None => (Some(octagon), RiskOutcome::Stale),
                }
            }
            Err(err) => {
                log::warn!("neighbour {}: rejected: {err}", actor.id);
                (None, RiskOutcome::Rejected(err))
            }
        };

    if let RiskOutcome::Scored(score) = &outcome {
        log::debug!(
            "id: {} location: {:.3} {:.3} {:.3} velocity: {:.3} {:.3} {:.3} heading: {:.1} risk: {}",
            actor.id,
            local.position.x,
            local.position.y,
            local.position.z,
            local.velocity.x,
            local.velocity.y,
            local.velocity.z,
            local.heading_deg,
            score.rounded
        );
    }

    NeighbourReport {
        id: actor.id,
        local,
        octagon,
        outcome,
    }
}

fn serialize_display<S: Serializer>(err: &RiskError, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.collect_str(err)
}
