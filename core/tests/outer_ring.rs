//! Outer ring tests: membership gated on an active capture, captured
//! exclusion, marker cadence, and the clear-signal-on-exit variant.

use glam::Vec3;
use streetscene_core::{
    config::{SceneConfig, ZoneConfig},
    engine::SimEngine,
    journal::Journal,
    scene::Scene,
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

fn smoking_with_instant_capture() -> ZoneConfig {
    let mut cfg = ZoneConfig::smoking(Vec3::ZERO);
    cfg.min_capture_delay = 0.0;
    cfg.max_capture_delay = 0.0;
    cfg
}

/// Bystanders inside radius × 2 join the ring once someone is held.
#[test]
fn ring_tracks_bystanders_while_someone_is_held() {
    let mut engine = build(vec![smoking_with_instant_capture()], 7);
    engine
        .world_mut()
        .add_entity(&["person"], Vec3::new(1.0, 0.0, 0.0));
    let bystander = engine
        .world_mut()
        .add_entity(&["bystander"], Vec3::new(8.0, 0.0, 0.0));

    engine.run_ticks(2).unwrap();

    assert_eq!(engine.zone("smoking").unwrap().ring_members(), vec![bystander]);
}

/// The ring exists only while the zone holds someone: once the smoker
/// leaves, the ring and its markers are torn down.
#[test]
fn ring_clears_when_nothing_is_captured() {
    let mut engine = build(vec![smoking_with_instant_capture()], 7);
    let person = engine
        .world_mut()
        .add_entity(&["person"], Vec3::new(1.0, 0.0, 0.0));
    engine
        .world_mut()
        .add_entity(&["bystander"], Vec3::new(8.0, 0.0, 0.0));

    engine.run_ticks(2).unwrap();
    assert!(!engine.zone("smoking").unwrap().ring_members().is_empty());

    engine
        .world_mut()
        .teleport(person, Vec3::new(100.0, 0.0, 0.0));
    engine.run_ticks(1).unwrap();

    assert!(engine.zone("smoking").unwrap().ring_members().is_empty());
    assert_eq!(engine.world().marker_count(), 0);
}

/// An entity carrying the ring classification that the zone itself holds
/// never appears in its own ring.
#[test]
fn captured_entities_are_excluded_from_the_ring() {
    let mut engine = build(vec![ZoneConfig::litter(Vec3::ZERO)], 7);
    engine
        .world_mut()
        .add_entity(&["person", "selectable"], Vec3::new(1.0, 0.0, 0.0));

    engine.run_ticks(5).unwrap();

    let zone = engine.zone("litter").unwrap();
    assert_eq!(zone.captured().len(), 1);
    assert!(zone.ring_members().is_empty());
}

/// Ring members get the periodic marker cadence.
#[test]
fn ring_members_receive_markers_on_cadence() {
    let mut engine = build(vec![smoking_with_instant_capture()], 7);
    engine.clock.dt = 1.0;
    engine
        .world_mut()
        .add_entity(&["person"], Vec3::new(1.0, 0.0, 0.0));
    let bystander = engine
        .world_mut()
        .add_entity(&["bystander"], Vec3::new(8.0, 0.0, 0.0));

    engine.run_ticks(10).unwrap();

    let ring_spawns = engine
        .journal()
        .all_events("test-session")
        .unwrap()
        .iter()
        .filter(|e| e.event_type == "marker_spawned")
        .filter(|e| {
            let v: serde_json::Value = serde_json::from_str(&e.payload).unwrap();
            v["source"] == "ring" && v["entity"].as_u64() == Some(bystander)
        })
        .count();
    // One every 3 s of ring membership.
    assert!(ring_spawns >= 2, "only {ring_spawns} ring markers");
}

/// The litter variant reuses the zone clear signal as the ring's
/// exit trigger.
#[test]
fn ring_exit_sends_the_clear_signal_when_configured() {
    let mut engine = build(vec![ZoneConfig::litter(Vec3::ZERO)], 7);
    engine
        .world_mut()
        .add_entity(&["person"], Vec3::new(1.0, 0.0, 0.0));
    let onlooker = engine
        .world_mut()
        .add_entity(&["selectable"], Vec3::new(5.0, 0.0, 0.0));

    engine.run_ticks(3).unwrap();
    assert_eq!(engine.zone("litter").unwrap().ring_members(), vec![onlooker]);

    engine
        .world_mut()
        .teleport(onlooker, Vec3::new(100.0, 0.0, 0.0));
    engine.run_ticks(1).unwrap();

    assert!(engine.zone("litter").unwrap().ring_members().is_empty());
    assert_eq!(engine.world().signal_count(onlooker, "EventOff0"), 1);
}
