//! Presence-sensor lifecycle tests: hide, show, anchor choreography, and
//! multi-zone completion counting.

use glam::Vec3;
use streetscene_core::{
    command::SensorCommand,
    config::{SceneConfig, ZoneConfig},
    engine::SimEngine,
    journal::Journal,
    scene::Scene,
    world::{ActuationSink, SpatialQuery},
};

fn build(zones: Vec<ZoneConfig>, seed: u64) -> SimEngine<Scene> {
    let journal = Journal::in_memory().expect("in-memory journal");
    SimEngine::build(
        "test-session".to_string(),
        seed,
        &SceneConfig { zones },
        Scene::new(),
        journal,
    )
    .expect("build engine")
}

fn hide(zone: &str) -> SensorCommand {
    SensorCommand::Hide {
        zone: zone.to_string(),
    }
}

fn show(zone: &str) -> SensorCommand {
    SensorCommand::Show {
        zone: zone.to_string(),
    }
}

/// Hiding force-releases everything and suspends the zone; entities still
/// physically inside are ignored until the next show.
#[test]
fn hide_releases_and_suspends() {
    let mut engine = build(vec![ZoneConfig::litter(Vec3::ZERO)], 7);
    let person = engine
        .world_mut()
        .add_entity(&["person"], Vec3::new(1.0, 0.0, 0.0));
    engine.run_ticks(2).unwrap();
    assert!(engine.world().is_kinematic(person));

    engine.apply_command(&hide("litter")).unwrap();

    let zone = engine.zone("litter").unwrap();
    assert!(!zone.is_enabled());
    assert!(zone.captured().is_empty());
    assert!(!engine.world().is_kinematic(person));
    assert_eq!(engine.world().signal_count(person, "EventOff0"), 1);

    engine.run_ticks(10).unwrap();
    assert!(engine.zone("litter").unwrap().captured().is_empty());
    assert_eq!(engine.world().signal_count(person, "EventReact0"), 1);
}

/// Show re-arms the one-shot latches: the same zone can run a second full
/// ending, counting completions again.
#[test]
fn show_rearms_a_finished_zone() {
    let mut engine = build(vec![ZoneConfig::litter(Vec3::ZERO)], 7);
    let person = engine
        .world_mut()
        .add_entity(&["person"], Vec3::new(1.0, 0.0, 0.0));
    let marker = engine
        .world_mut()
        .add_entity(&["ending_marker"], Vec3::new(0.0, 0.0, 1.0));

    engine.run_ticks(2).unwrap();
    assert!(engine.zone("litter").unwrap().ending_activated());
    assert_eq!(engine.world().counter(person, "EndCount"), 1);

    // Park the marker away, then bring the zone back.
    engine
        .world_mut()
        .teleport(marker, Vec3::new(500.0, 0.0, 0.0));
    engine.apply_command(&show("litter")).unwrap();
    engine.run_ticks(2).unwrap();

    let zone = engine.zone("litter").unwrap();
    assert!(zone.is_enabled());
    assert!(!zone.ending_activated());
    assert_eq!(zone.captured().len(), 1);

    engine
        .world_mut()
        .teleport(marker, Vec3::new(0.0, 0.0, 1.0));
    engine.run_ticks(2).unwrap();

    assert_eq!(engine.world().counter(person, "EndCount"), 2);
}

/// Smoking-style zones pull their ending anchor onto the zone at show.
#[test]
fn show_moves_the_anchor_to_the_zone() {
    let mut engine = build(vec![ZoneConfig::smoking(Vec3::new(3.0, 0.0, 4.0))], 7);
    let anchor = engine
        .world_mut()
        .add_entity(&["ending_marker"], Vec3::new(-200.0, 0.0, 0.0));
    engine.zone_mut("smoking").unwrap().set_anchor(anchor);

    engine.apply_command(&show("smoking")).unwrap();

    assert_eq!(
        engine.world().position(anchor).unwrap(),
        Vec3::new(3.0, 0.0, 4.0)
    );
}

/// Litter-style zones relocate themselves onto their anchor at show.
#[test]
fn show_moves_the_zone_to_the_anchor() {
    let mut engine = build(vec![ZoneConfig::litter(Vec3::ZERO)], 7);
    let anchor = engine
        .world_mut()
        .add_entity(&["ending_marker"], Vec3::new(10.0, 0.0, 10.0));
    engine.zone_mut("litter").unwrap().set_anchor(anchor);

    engine.apply_command(&show("litter")).unwrap();

    assert_eq!(
        engine.zone("litter").unwrap().center(),
        Vec3::new(10.0, 0.0, 10.0)
    );
}

/// Sensor edges can repeat; hide-hide-show-show must not panic or
/// double-release.
#[test]
fn repeated_sensor_edges_are_idempotent() {
    let mut engine = build(vec![ZoneConfig::litter(Vec3::ZERO)], 7);
    let person = engine
        .world_mut()
        .add_entity(&["person"], Vec3::new(1.0, 0.0, 0.0));
    engine.run_ticks(2).unwrap();

    engine.apply_command(&hide("litter")).unwrap();
    engine.apply_command(&hide("litter")).unwrap();
    engine.apply_command(&show("litter")).unwrap();
    engine.apply_command(&show("litter")).unwrap();

    assert!(engine.zone("litter").unwrap().is_enabled());
    assert_eq!(engine.world().signal_count(person, "EventOff0"), 1);

    engine.run_ticks(2).unwrap();
    assert_eq!(engine.zone("litter").unwrap().captured().len(), 1);
}

/// Hiding while a released entity is still waiting out the post-release
/// resume delay must resume it on the spot — the suspended zone will never
/// fire that timer for it.
#[test]
fn hide_during_resume_delay_still_resumes() {
    let mut engine = build(vec![ZoneConfig::litter(Vec3::ZERO)], 7);
    let start = Vec3::new(1.0, 0.0, 0.0);
    let person = engine
        .world_mut()
        .add_walker(&["person"], start, vec![start], 0.5);
    engine.run_ticks(2).unwrap();
    assert!(engine.world().is_paused(person));

    // Exit releases the walker and schedules the 0.2 s resume.
    engine
        .world_mut()
        .teleport(person, Vec3::new(50.0, 0.0, 0.0));
    engine.run_ticks(1).unwrap();
    assert!(engine.world().is_paused(person));
    assert!(engine.zone("litter").unwrap().captured().is_empty());

    engine.apply_command(&hide("litter")).unwrap();
    assert!(!engine.world().is_paused(person));

    engine.run_ticks(50).unwrap();
    assert!(!engine.world().is_paused(person));
}

/// Commands addressed to unknown zones are an error, not a panic.
#[test]
fn unknown_zone_commands_are_rejected() {
    let mut engine = build(vec![ZoneConfig::litter(Vec3::ZERO)], 7);
    assert!(engine.apply_command(&hide("fountain")).is_err());
}

/// Overlapping zones each run their own ending: an entity standing in both
/// is counted twice.
#[test]
fn overlapping_zones_count_completions_independently() {
    let mut engine = build(
        vec![
            ZoneConfig::smoking(Vec3::ZERO),
            ZoneConfig::litter(Vec3::new(5.0, 0.0, 0.0)),
        ],
        7,
    );
    let person = engine
        .world_mut()
        .add_entity(&["person"], Vec3::new(2.5, 0.0, 0.0));

    engine.run_ticks(30).unwrap();

    engine
        .world_mut()
        .add_entity(&["ending_marker"], Vec3::new(0.0, 0.0, 1.0));
    engine
        .world_mut()
        .add_entity(&["ending_marker"], Vec3::new(5.0, 0.0, 1.0));
    engine.run_ticks(2).unwrap();

    assert!(engine.zone("smoking").unwrap().ending_activated());
    assert!(engine.zone("litter").unwrap().ending_activated());
    assert_eq!(engine.world().counter(person, "EndCount"), 2);
}
