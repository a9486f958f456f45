//! PolishSim headless runner — scripted polish-to-celebration session.
//!
//! Drives synthetic pointer strokes against the polishable proxy until the
//! completion threshold fires, then steps the confetti until every particle
//! lands. Useful for tuning parameters and soak-testing without a renderer.

use std::path::Path;
use std::time::Instant;

use polishsim_confetti::ParticleState;
use polishsim_core::ray::RayQuery;
use polishsim_core::scene::{CollisionProxySet, ProxyScene, ProxyShape};
use polishsim_core::{Isometry3, ObjectId, Point3, Vector3};
use polishsim_session::{PolishSession, SessionConfig};

/// Frame rate for the scripted run.
const TICK_DT: f64 = 1.0 / 60.0;
/// Pointer samples per stroke.
const MOVES_PER_STROKE: usize = 40;

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        eprintln!("Usage: polishsim-headless [options]");
        eprintln!();
        eprintln!("Options:");
        eprintln!("  --config <path>   Config file (default: config.toml)");
        eprintln!("  --seed <n>        Deterministic run with the given seed");
        eprintln!("  --strokes <n>     Maximum polishing strokes (default: 1000)");
        std::process::exit(0);
    }

    let config_path = find_arg(&args, "--config").unwrap_or_else(|| "config.toml".to_string());
    let seed: Option<u64> = find_arg(&args, "--seed").and_then(|s| s.parse().ok());
    let max_strokes: usize = find_arg(&args, "--strokes")
        .and_then(|s| s.parse().ok())
        .unwrap_or(1000);

    let config = SessionConfig::from_file(Path::new(&config_path));

    eprintln!("PolishSim headless runner");
    eprintln!(
        "  Wear map:   {}x{}, threshold {}",
        config.wear.width, config.wear.height, config.wear.polish_threshold
    );
    eprintln!(
        "  Confetti:   {} particles, ground y = {:.1}",
        config.confetti.count, config.confetti.ground_y
    );
    eprintln!(
        "  Session:    celebrate at {:.0}%, measure p = {:.2}",
        config.session.completion_threshold * 100.0,
        config.session.measure_probability
    );

    let (scene, body) = build_scene(&config);

    let mut session = match seed {
        Some(s) => PolishSession::with_seed(&config, s),
        None => PolishSession::new(&config),
    };
    session.set_on_progress(Box::new(|p| {
        log::info!("progress measured: {:.1}%", p * 100.0);
    }));

    // --- Polishing phase: orbiting strokes until the celebration fires ---
    let pick_set = CollisionProxySet::from_ids(vec![body]);
    let t0 = Instant::now();
    let mut strokes = 0usize;
    let mut interactions = 0usize;
    let mut texture_uploads = 0usize;

    while !session.state().celebrated && strokes < max_strokes {
        let stroke_phase = strokes as f64 * 0.37;
        session.pointer_down(pick_uv(&scene, &pick_set, stroke_phase, 0));
        for step in 1..MOVES_PER_STROKE {
            session.pointer_move(pick_uv(&scene, &pick_set, stroke_phase, step));
        }
        session.pointer_up();
        strokes += 1;
        interactions += MOVES_PER_STROKE;

        // Where a renderer would re-upload the roughness texture
        if let Some(wear) = session.wear_mut() {
            if wear.buffer_mut().take_dirty() {
                texture_uploads += 1;
            }
        }

        if strokes % 50 == 0 {
            eprintln!(
                "  Polishing: {} strokes, last measure {:.1}% ({:.2}s)",
                strokes,
                session.progress() * 100.0,
                t0.elapsed().as_secs_f64()
            );
        }
    }

    if !session.state().celebrated {
        eprintln!(
            "  Gave up after {} strokes at {:.1}% — raise --strokes or lower the threshold",
            strokes,
            session.progress() * 100.0
        );
        std::process::exit(1);
    }
    eprintln!(
        "  Polished: {} strokes, {} interactions, {} texture uploads, {:.1}% ({:.2}s)",
        strokes,
        interactions,
        texture_uploads,
        session.progress() * 100.0,
        t0.elapsed().as_secs_f64()
    );

    // --- Celebration phase: tick until the whole pool lands ---
    let t0 = Instant::now();
    let mut ticks = 0usize;
    // Particles that miss everything keep falling forever; cap the run
    let max_ticks = (120.0 / TICK_DT) as usize;
    while ticks < max_ticks {
        session.frame(TICK_DT, &scene);
        ticks += 1;
        if session.confetti().all_landed() {
            break;
        }
    }

    let (attached, free) = landing_breakdown(&session);
    eprintln!(
        "  Confetti:   {} landed on proxies, {} on the ground after {} ticks ({:.1}s simulated, {:.2}s wall)",
        attached,
        free,
        ticks,
        ticks as f64 * TICK_DT,
        t0.elapsed().as_secs_f64()
    );
    if !session.confetti().all_landed() {
        let falling = config.confetti.count - attached - free;
        eprintln!("  {} particles still falling at the cap (acceptable)", falling);
    }
}

/// Polishable body plus a pedestal stack, mirroring the toy scene layout.
fn build_scene(config: &SessionConfig) -> (ProxyScene, ObjectId) {
    let mut scene = ProxyScene::new();
    let body = scene.add_object(ProxyShape::Sphere { radius: 1.0 }, Isometry3::identity(), true);

    // Pedestal: widening tiers from just under the body down to the ground
    let ground = config.confetti.ground_y;
    let tiers = [
        (0.8, 0.15, ground + 1.2),
        (0.9, 0.2, ground + 0.8),
        (1.1, 0.25, ground + 0.35),
    ];
    for (half_xz, half_y, y) in tiers {
        scene.add_object(
            ProxyShape::Cuboid {
                half_extents: Vector3::new(half_xz, half_y, half_xz),
            },
            Isometry3::translation(0.0, y, 0.0),
            true,
        );
    }
    (scene, body)
}

/// Pick the surface UV under a scripted orbiting pointer position.
fn pick_uv(
    scene: &ProxyScene,
    pick_set: &CollisionProxySet,
    stroke_phase: f64,
    step: usize,
) -> Option<[f64; 2]> {
    // Slowly precessing orbit so strokes sweep the whole surface
    let theta = stroke_phase + step as f64 * 0.05;
    let phi = (stroke_phase * 0.61).sin() * 1.55;
    let eye = Point3::new(
        4.0 * phi.cos() * theta.cos(),
        4.0 * phi.sin(),
        4.0 * phi.cos() * theta.sin(),
    );
    let direction = (Point3::origin() - eye).normalize();
    scene
        .cast_segment(eye, direction, 10.0, pick_set)
        .first()
        .and_then(|hit| hit.uv)
}

fn landing_breakdown(session: &PolishSession) -> (usize, usize) {
    let mut attached = 0;
    let mut free = 0;
    for p in session.confetti().particles() {
        match p.state {
            ParticleState::LandedAttached { .. } => attached += 1,
            ParticleState::LandedFree => free += 1,
            ParticleState::Falling => {}
        }
    }
    (attached, free)
}

/// Find a command-line argument value by flag name.
fn find_arg(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1).cloned())
}
