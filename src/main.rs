use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal, Uniform};
use traffic_risk::math::Vector3d;
use traffic_risk::{
    find_by_role, ActorId, ActorState, Footprint, Pose, RiskConfig, RiskEstimator, RiskOutcome,
    TickSnapshot,
};

/// Fixed simulation step in seconds.
const STEP: f64 = 0.05;

/// Estimates collision risk around a hero vehicle in a randomly populated scene.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Number of vehicles in the scene, including the hero.
    #[arg(short = 'n', long, default_value_t = 30)]
    number_of_vehicles: usize,

    /// Seed for scattering the vehicles.
    #[arg(short, long, default_value_t = 4)]
    seed: u64,

    /// Number of ticks to simulate.
    #[arg(short, long, default_value_t = 20)]
    ticks: u64,

    /// JSON estimator configuration.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Overrides the position spread of each neighbour, in m.
    #[arg(long)]
    sigma: Option<f64>,

    /// Overrides the neighbour search radius, in m.
    #[arg(long)]
    radius: Option<f64>,

    /// Evaluates neighbours on the worker pool with the configured deadline.
    #[arg(long)]
    parallel: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    if let Err(err) = run(&args) {
        log::error!("{err}");
        std::process::exit(1);
    }
}

fn run(args: &Args) -> traffic_risk::Result<()> {
    let mut config = match &args.config {
        Some(path) => RiskConfig::load(path)?,
        None => RiskConfig::default(),
    };
    if let Some(sigma) = args.sigma {
        config.sigma = sigma;
    }
    if let Some(radius) = args.radius {
        config.radius = radius;
    }
    let estimator = RiskEstimator::new(config)?;

    let mut rng = StdRng::seed_from_u64(args.seed);
    let mut actors = scatter(&mut rng, args.number_of_vehicles);
    let Some(hero) = find_by_role(&actors, "hero") else {
        log::warn!("no hero vehicle spawned");
        return Ok(());
    };
    log::info!("spawned {} vehicles, hero is {hero}", actors.len());

    for frame in 0..args.ticks {
        let snapshot = TickSnapshot::new(frame, hero, actors.clone());
        let start = Instant::now();
        let report = if args.parallel {
            estimator.assess_parallel(&snapshot)
        } else {
            estimator.assess(&snapshot)
        };
        let elapsed = start.elapsed();

        match report {
            Ok(report) => {
                for neighbour in &report.neighbours {
                    let (p, v) = (neighbour.local.position, neighbour.local.velocity);
                    let status = match &neighbour.outcome {
                        RiskOutcome::Scored(score) => format!("risk {}", score.rounded),
                        RiskOutcome::Rejected(err) => format!("rejected ({err})"),
                        RiskOutcome::Stale => "stale".to_string(),
                    };
                    log::info!(
                        "[{frame}] id: {} location: ({:.2}, {:.2}, {:.2}) velocity: ({:.2}, {:.2}, {:.2}) heading: {:.1} {status}",
                        neighbour.id,
                        p.x,
                        p.y,
                        p.z,
                        v.x,
                        v.y,
                        v.z,
                        neighbour.local.heading_deg,
                    );
                }
                if let Some((id, risk)) = report.riskiest() {
                    log::info!("[{frame}] riskiest neighbour {id}: {risk:.4} in {elapsed:?}");
                }
            }
            Err(err) => log::warn!("[{frame}] tick skipped: {err}"),
        }

        advance(&mut actors, STEP);
    }
    Ok(())
}

/// Places vehicles on a square patch of road around the origin.
/// The first one is the hero.
fn scatter(rng: &mut StdRng, count: usize) -> Vec<ActorState> {
    let position = Uniform::new(-60.0, 60.0);
    let heading = Uniform::new(-180.0, 180.0);
    // Speeds are clamped to non-negative; a few parked cars are fine.
    let speed = Normal::new(8.0_f64, 4.0).unwrap();
    let length = Uniform::new(3.8, 5.6);
    let width = Uniform::new(1.6, 2.1);

    (0..count)
        .map(|i| {
            let yaw: f64 = heading.sample(rng);
            let speed = speed.sample(rng).max(0.0);
            let velocity = Vector3d::new(
                speed * yaw.to_radians().cos(),
                speed * yaw.to_radians().sin(),
                0.0,
            );
            let pose = Pose::planar(position.sample(rng), position.sample(rng), yaw);
            let actor = ActorState::new(ActorId(i as u32 + 1), pose, velocity);
            match i {
                0 => actor.with_role("hero"),
                // Leave some vehicles on the configured default footprint.
                _ if rng.gen_bool(0.3) => actor,
                _ => match Footprint::new(length.sample(rng), width.sample(rng)) {
                    Ok(footprint) => actor.with_footprint(footprint),
                    Err(_) => actor,
                },
            }
        })
        .collect()
}

/// Moves every actor along its velocity.
fn advance(actors: &mut [ActorState], dt: f64) {
    for actor in actors {
        actor.pose.location += actor.velocity * dt;
    }
}
