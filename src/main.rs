mod cli_options;

use std::time::Instant;

use geometry::bvh::BBox;
use geometry::ray::Ray;
use indicatif::ProgressBar;
use lbvh::{LbvhConfig, TraversalStats};
use log::{debug, error, info, warn};
use math::hcm::{Point3, Vec3};
use radiometry::color::Color;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use scene::AcceleratedScene;

use cli_options::CliOptions;

const BATCH_SIZE: usize = 4096;
/// One in this many rays is re-traced with the linear scan.
const CHECK_EVERY: usize = 64;
/// Shadowed light weaker than this counts as blocked.
const LIT_THRESHOLD: f32 = 0.01;
const LIGHT_COLOR: Color = Color::white();

/// Where rays come from and aim at.
struct Frame {
    bounds: BBox,
    center: Point3,
    radius: f32,
    light: Point3,
}

impl Frame {
    fn around(bounds: BBox) -> Self {
        let bounds = if bounds.is_empty() || !bounds.is_finite() {
            BBox::new(Point3::splat(-1.0), Point3::splat(1.0))
        } else {
            bounds
        };
        let center = bounds.midpoint();
        let radius = bounds.diag().norm() * 0.5 + 1.0;
        Frame {
            bounds,
            center,
            radius,
            light: center + Vec3::Y * (2.0 * radius),
        }
    }

    /// A ray from outside the bounds towards a random point inside them.
    fn random_ray(&self, rng: &mut StdRng) -> Ray {
        let on_sphere = loop {
            let v = Vec3::new(
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
            );
            if let Some(v) = v.try_hat() {
                break v;
            }
        };
        let origin = self.center + on_sphere * (1.5 * self.radius);
        let (lo, hi) = (self.bounds.min(), self.bounds.max());
        let target = Point3::new(
            lo.x + rng.gen::<f32>() * (hi.x - lo.x),
            lo.y + rng.gen::<f32>() * (hi.y - lo.y),
            lo.z + rng.gen::<f32>() * (hi.z - lo.z),
        );
        Ray::new(origin, target - origin)
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Tally {
    rays: usize,
    hits: usize,
    lit: usize,
    occluded: usize,
    checked: usize,
    mismatches: usize,
    failures: usize,
    stats: TraversalStats,
}

impl std::ops::Add for Tally {
    type Output = Tally;
    fn add(mut self, rhs: Tally) -> Tally {
        self.rays += rhs.rays;
        self.hits += rhs.hits;
        self.lit += rhs.lit;
        self.occluded += rhs.occluded;
        self.checked += rhs.checked;
        self.mismatches += rhs.mismatches;
        self.failures += rhs.failures;
        self.stats += rhs.stats;
        self
    }
}

/// Traces `count` rays drawn from a generator seeded by `seed` and the batch index, so that the
/// result does not depend on how batches are spread over threads.
fn trace_batch(
    accel: &AcceleratedScene,
    frame: &Frame,
    seed: u64,
    batch: usize,
    count: usize,
) -> Tally {
    let mut rng = StdRng::seed_from_u64(seed.wrapping_add(batch as u64));
    let mut tally = Tally::default();
    for i in 0..count {
        let r = frame.random_ray(&mut rng);
        tally.rays += 1;
        let hit = match accel.nearest_intersection_with_stats(&r, &mut tally.stats) {
            Ok(hit) => hit,
            Err(e) => {
                debug!("ray {}: {}", r, e);
                tally.failures += 1;
                continue;
            }
        };
        if (batch * BATCH_SIZE + i) % CHECK_EVERY == 0 {
            tally.checked += 1;
            let reference = accel.scene().linear_nearest(&r);
            if hit.map(|h| h.isect.distance) != reference.map(|h| h.isect.distance) {
                warn!(
                    "ray {}: hierarchy found {:?}, linear scan found {:?}",
                    r,
                    hit.map(|h| h.isect.distance),
                    reference.map(|h| h.isect.distance)
                );
                tally.mismatches += 1;
            }
        }
        let hit = match hit {
            Some(hit) => hit,
            None => continue,
        };
        tally.hits += 1;

        let to_light = frame.light - hit.isect.point;
        let distance = to_light.norm();
        let feeler = Ray::new(hit.isect.point, to_light / distance).with_extent(distance);
        match accel.occluded(&feeler) {
            Ok(true) => tally.occluded += 1,
            Ok(false) => (),
            Err(e) => {
                debug!("shadow feeler {}: {}", feeler, e);
                tally.failures += 1;
            }
        }
        match accel.shadow_transmittance(&feeler, LIGHT_COLOR) {
            Ok(light) if light.magnitude() > LIT_THRESHOLD => tally.lit += 1,
            Ok(_) => (),
            Err(e) => {
                debug!("shadow feeler {}: {}", feeler, e);
                tally.failures += 1;
            }
        }
    }
    tally
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let options = match cli_options::parse_args(std::env::args().collect()) {
        Ok(options) => options,
        Err(message) => {
            error!("{}", message);
            eprintln!("usage: {}", CliOptions::message());
            std::process::exit(1);
        }
    };
    if options.show_help {
        println!("usage: {}", CliOptions::message());
        return;
    }

    let scene = match scene::preset::by_name(&options.scene_name, options.seed) {
        Some(scene) => scene,
        None => {
            error!("Unknown scene {}", options.scene_name);
            eprintln!("usage: {}", CliOptions::message());
            std::process::exit(1);
        }
    };
    let mut config = LbvhConfig::default().with_visit_budget(options.visit_budget);
    if let Some(capacity) = options.stack_capacity {
        config = config.with_stack_capacity(capacity);
    }

    let build_start = Instant::now();
    let accel = scene.build_accel(config);
    info!("Built {} in {:.2?}", options.scene_name, build_start.elapsed());

    let frame = Frame::around(scene.bounds());
    let num_batches = (options.num_rays + BATCH_SIZE - 1) / BATCH_SIZE;
    let progress = ProgressBar::new(options.num_rays as u64);
    let trace_batch_at = |batch: usize| {
        let count = BATCH_SIZE.min(options.num_rays - batch * BATCH_SIZE);
        let tally = trace_batch(&accel, &frame, options.seed, batch, count);
        progress.inc(count as u64);
        tally
    };

    let trace_start = Instant::now();
    let tally = if options.use_multi_thread {
        (0..num_batches)
            .into_par_iter()
            .map(trace_batch_at)
            .reduce(Tally::default, |a, b| a + b)
    } else {
        (0..num_batches)
            .map(trace_batch_at)
            .fold(Tally::default(), |a, b| a + b)
    };
    progress.finish_and_clear();
    let elapsed = trace_start.elapsed();

    let per_ray = |count: usize| count as f64 / tally.rays.max(1) as f64;
    info!(
        "Traced {} rays in {:.2?} ({:.2} Mrays/s, {})",
        tally.rays,
        elapsed,
        tally.rays as f64 / elapsed.as_secs_f64().max(1e-9) * 1e-6,
        if options.use_multi_thread {
            "multi-threaded"
        } else {
            "single-threaded"
        }
    );
    info!(
        "{} hits, {} lit, {} in shadow",
        tally.hits, tally.lit, tally.occluded
    );
    info!(
        "Per primary ray: {:.2} box tests, {:.2} primitive tests, {:.2} nodes visited",
        per_ray(tally.stats.box_tests),
        per_ray(tally.stats.primitive_tests),
        per_ray(tally.stats.nodes_visited)
    );
    if tally.failures > 0 {
        warn!(
            "{} queries aborted (stack capacity {}, visit budget {:?})",
            tally.failures,
            accel.lbvh().config().stack_capacity,
            accel.lbvh().config().visit_budget
        );
    }
    if tally.mismatches > 0 {
        error!(
            "{} of {} checked rays disagree with the linear scan",
            tally.mismatches, tally.checked
        );
        std::process::exit(2);
    }
    info!("{} rays agree with the linear scan", tally.checked);
}
