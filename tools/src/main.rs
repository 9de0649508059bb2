//! scene-runner: headless runner for the street-scene zone engine.
//!
//! Usage:
//!   scene-runner --seed 12345 --ticks 1200 --db session.db
//!   scene-runner --config scene.json --ticks 600
//!   scene-runner --print-config        (dump the built-in scene as JSON)

use anyhow::Result;
use glam::Vec3;
use std::env;
use std::path::Path;

use streetscene_core::{
    command::SensorCommand,
    config::SceneConfig,
    engine::SimEngine,
    journal::Journal,
    scene::Scene,
    types::EntityId,
    world::ActuationSink,
};

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let ticks = parse_arg(&args, "--ticks", 1200u64);
    let db = args
        .windows(2)
        .find(|w| w[0] == "--db")
        .map(|w| w[1].as_str())
        .unwrap_or(":memory:");
    let config_path = args
        .windows(2)
        .find(|w| w[0] == "--config")
        .map(|w| w[1].as_str());

    let config = match config_path {
        Some(p) => SceneConfig::load(Path::new(p))?,
        None => SceneConfig::demo(),
    };

    if args.iter().any(|a| a == "--print-config") {
        println!("{}", config.to_json()?);
        return Ok(());
    }

    println!("street-scene — scene-runner");
    println!("  seed:   {seed}");
    println!("  ticks:  {ticks}");
    println!("  db:     {db}");
    println!("  zones:  {}", config.zones.len());
    println!();

    let journal = if db == ":memory:" {
        Journal::in_memory()?
    } else {
        Journal::open(db)?
    };

    let session_id = format!("session-{seed}-{}", unix_seconds());
    let mut engine = SimEngine::build(session_id.clone(), seed, &config, Scene::new(), journal)?;

    let cast = populate_demo_scene(&mut engine)?;

    // Phase 1: ambient wandering. Captures, escalation, rings.
    let phase = ticks / 3;
    log::info!("phase 1: ambient traffic for {phase} ticks");
    engine.run_ticks(phase)?;

    // Phase 2: a visitor walks away from the smoking sensor and back.
    log::info!("phase 2: smoking sensor drops and recovers");
    engine.apply_command(&SensorCommand::Hide {
        zone: "smoking".to_string(),
    })?;
    engine.run_ticks(phase / 2)?;
    engine.apply_command(&SensorCommand::Show {
        zone: "smoking".to_string(),
    })?;
    engine.run_ticks(phase - phase / 2)?;

    // Phase 3: carry the ending markers into the smoking and litter zones.
    log::info!("phase 3: ending markers move into the anchored zones");
    for (i, name) in ["smoking", "litter"].into_iter().enumerate() {
        let center = engine.zone(name)?.center();
        engine.world_mut().teleport(cast.ending_markers[i], center);
    }
    engine.run_ticks(ticks - 2 * phase)?;

    print_summary(&engine, &session_id, ticks, &cast)?;
    Ok(())
}

/// Entity ids the summary wants to look back at.
struct DemoCast {
    /// One movable ending marker per anchored zone, smoking then litter.
    ending_markers: [EntityId; 2],
    probe: EntityId,
}

/// People, bystanders, vehicles, and ending markers for the built-in
/// four-zone scene. Walkers ping-pong through the zone centers so every
/// behavior gets exercised without scripted choreography.
fn populate_demo_scene(engine: &mut SimEngine<Scene>) -> Result<DemoCast> {
    let smoking = engine.zone("smoking")?.center();
    let litter = engine.zone("litter")?.center();
    let congestion = engine.zone("congestion")?.center();
    let crowd = engine.zone("crowd")?.center();

    let scene = engine.world_mut();

    // Pedestrians crossing the hold-style zones.
    let probe = scene.add_walker(
        &["person"],
        smoking + Vec3::new(-20.0, 0.0, 0.0),
        vec![smoking + Vec3::new(-20.0, 0.0, 0.0), smoking + Vec3::new(20.0, 0.0, 0.0)],
        1.4,
    );
    scene.add_walker(
        &["person"],
        litter + Vec3::new(0.0, 0.0, -25.0),
        vec![litter + Vec3::new(0.0, 0.0, -25.0), litter + Vec3::new(0.0, 0.0, 25.0)],
        1.1,
    );

    // Loiterers inside the observe-style zones.
    scene.add_entity(&["person"], congestion + Vec3::new(2.0, 0.0, 1.0));
    scene.add_entity(&["person"], congestion + Vec3::new(-3.0, 0.0, 4.0));
    scene.add_entity(&["person"], crowd + Vec3::new(1.0, 0.0, -2.0));

    // Ring populations and vehicles.
    scene.add_entity(&["bystander"], smoking + Vec3::new(8.0, 0.0, 0.0));
    scene.add_entity(&["selectable"], litter + Vec3::new(5.0, 0.0, 0.0));
    scene.add_entity(&["vehicle"], congestion + Vec3::new(6.0, 0.0, 0.0));
    scene.add_entity(&["vehicle"], litter + Vec3::new(30.0, 0.0, 0.0));

    // Movable ending markers, parked far outside every trigger radius.
    let marker_a = scene.add_entity(&["ending_marker"], Vec3::new(-500.0, 0.0, 0.0));
    let marker_b = scene.add_entity(&["ending_marker"], Vec3::new(-500.0, 0.0, 50.0));

    engine.zone_mut("smoking")?.set_anchor(marker_a);
    engine.zone_mut("litter")?.set_anchor(marker_b);

    Ok(DemoCast {
        ending_markers: [marker_a, marker_b],
        probe,
    })
}

fn print_summary(
    engine: &SimEngine<Scene>,
    session_id: &str,
    ticks: u64,
    cast: &DemoCast,
) -> Result<()> {
    println!("=== SESSION SUMMARY ===");
    println!("  session_id:  {session_id}");
    println!("  ticks run:   {ticks}");
    println!("  final tick:  {}", engine.clock.current_tick);
    println!("  entities:    {}", engine.world().entity_count());
    println!("  journaled:   {}", engine.journal().event_count(session_id)?);
    println!();
    println!("=== ZONES ===");
    for zone in engine.zones() {
        let gauge = zone.gauge();
        println!(
            "  {:<12} enabled={:<5} ended={:<5} held={} gauge={:.0}%",
            zone.name(),
            zone.is_enabled(),
            zone.ending_activated(),
            zone.captured().len(),
            gauge.ratio * 100.0,
        );
    }
    println!();
    println!(
        "  probe EndCount: {}",
        engine.world().counter(cast.probe, "EndCount")
    );
    Ok(())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}

fn unix_seconds() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
