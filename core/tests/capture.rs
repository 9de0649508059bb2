//! Capture pipeline tests: entry, randomized delay, cancellation on exit,
//! the held state, and the legal-area override.

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

/// A zero-delay zone captures on the very tick the entity enters.
#[test]
fn zero_delay_capture_fires_on_the_entry_tick() {
    let mut engine = build(vec![ZoneConfig::litter(Vec3::ZERO)], 7);
    let person = engine
        .world_mut()
        .add_entity(&["person"], Vec3::new(1.0, 0.0, 0.0));

    engine.run_ticks(1).unwrap();

    assert_eq!(engine.zone("litter").unwrap().captured(), vec![person]);
    assert_eq!(engine.world().signal_count(person, "EventReact0"), 1);
    assert!(engine.world().is_kinematic(person));
}

/// The reaction signal is edge-triggered: held for fifty more ticks, the
/// entity still saw it exactly once.
#[test]
fn reaction_signal_sent_at_most_once() {
    let mut engine = build(vec![ZoneConfig::litter(Vec3::ZERO)], 7);
    let person = engine
        .world_mut()
        .add_entity(&["person"], Vec3::new(1.0, 0.0, 0.0));

    engine.run_ticks(51).unwrap();

    assert_eq!(engine.world().signal_count(person, "EventReact0"), 1);
}

/// The smoking preset draws its capture delay from [0, 2); the journaled
/// delay must land in that range and the capture must complete.
#[test]
fn randomized_delay_draws_within_range() {
    let mut engine = build(vec![ZoneConfig::smoking(Vec3::ZERO)], 0xDEAD_BEEF);
    let person = engine
        .world_mut()
        .add_entity(&["person"], Vec3::new(2.0, 0.0, 0.0));

    engine.run_ticks(30).unwrap();

    assert_eq!(engine.zone("smoking").unwrap().captured(), vec![person]);
    assert_eq!(engine.world().signal_count(person, "SmokingOn"), 1);

    let scheduled: Vec<f64> = engine
        .journal()
        .all_events("test-session")
        .unwrap()
        .iter()
        .filter(|e| e.event_type == "capture_scheduled")
        .map(|e| {
            let v: serde_json::Value = serde_json::from_str(&e.payload).unwrap();
            v["delay"].as_f64().unwrap()
        })
        .collect();
    assert_eq!(scheduled.len(), 1);
    assert!((0.0..2.0).contains(&scheduled[0]), "delay {}", scheduled[0]);
}

/// Leaving before the delay elapses cancels the capture with no signals.
#[test]
fn exit_before_delay_cancels_capture() {
    let mut cfg = ZoneConfig::smoking(Vec3::ZERO);
    cfg.min_capture_delay = 1.0;
    cfg.max_capture_delay = 1.0;
    let mut engine = build(vec![cfg], 3);
    let person = engine
        .world_mut()
        .add_entity(&["person"], Vec3::new(1.0, 0.0, 0.0));

    engine.run_ticks(3).unwrap(); // 0.3 s, well short of the 1 s delay
    engine
        .world_mut()
        .teleport(person, Vec3::new(100.0, 0.0, 0.0));
    engine.run_ticks(20).unwrap();

    let zone = engine.zone("smoking").unwrap();
    assert!(zone.captured().is_empty() && zone.pending().is_empty());
    assert_eq!(engine.world().signal_count(person, "SmokingOn"), 0);

    let cancelled = engine
        .journal()
        .all_events("test-session")
        .unwrap()
        .iter()
        .filter(|e| e.event_type == "capture_cancelled")
        .count();
    assert_eq!(cancelled, 1);
}

/// A held entity's vertical coordinate is pinned to its value at capture
/// time, whatever the scene does to it.
#[test]
fn held_entities_keep_their_frozen_height() {
    use streetscene_core::world::SpatialQuery;

    let mut engine = build(vec![ZoneConfig::litter(Vec3::ZERO)], 7);
    let person = engine
        .world_mut()
        .add_entity(&["person"], Vec3::new(1.0, 0.0, 0.0));

    engine.run_ticks(1).unwrap();
    engine
        .world_mut()
        .teleport(person, Vec3::new(1.0, 5.0, 1.0));
    engine.run_ticks(1).unwrap();

    assert_eq!(engine.world().position(person).unwrap().y, 0.0);
}

/// Exit releases with the clear signal; a later re-entry captures again
/// from scratch.
#[test]
fn exit_releases_and_reentry_recaptures() {
    let mut engine = build(vec![ZoneConfig::litter(Vec3::ZERO)], 7);
    let person = engine
        .world_mut()
        .add_entity(&["person"], Vec3::new(1.0, 0.0, 0.0));

    engine.run_ticks(2).unwrap();
    engine
        .world_mut()
        .teleport(person, Vec3::new(100.0, 0.0, 0.0));
    engine.run_ticks(5).unwrap();

    assert!(engine.zone("litter").unwrap().captured().is_empty());
    assert!(!engine.world().is_kinematic(person));
    assert_eq!(engine.world().signal_count(person, "EventOff0"), 1);

    engine
        .world_mut()
        .teleport(person, Vec3::new(1.0, 0.0, 0.0));
    engine.run_ticks(2).unwrap();

    assert_eq!(engine.zone("litter").unwrap().captured(), vec![person]);
    assert_eq!(engine.world().signal_count(person, "EventReact0"), 2);
}

/// A sanctioned smoking area inside the radius force-releases everyone and
/// keeps the zone from capturing while it is present.
#[test]
fn legal_area_overrides_the_zone() {
    let mut engine = build(vec![ZoneConfig::smoking(Vec3::ZERO)], 11);
    let person = engine
        .world_mut()
        .add_entity(&["person"], Vec3::new(1.0, 0.0, 0.0));

    engine.run_ticks(30).unwrap();
    assert_eq!(engine.zone("smoking").unwrap().captured(), vec![person]);

    engine
        .world_mut()
        .add_entity(&["smoking_area"], Vec3::new(0.0, 0.0, 2.0));
    engine.run_ticks(1).unwrap();

    assert!(engine.zone("smoking").unwrap().captured().is_empty());
    assert_eq!(engine.world().signal_count(person, "SmokingOff"), 1);

    engine.run_ticks(30).unwrap();
    assert_eq!(engine.world().signal_count(person, "SmokingOn"), 1);

    let overrides = engine
        .journal()
        .all_events("test-session")
        .unwrap()
        .iter()
        .filter(|e| e.event_type == "legal_area_override")
        .count();
    assert_eq!(overrides, 1);
}

/// An entity destroyed while held vanishes without signals or panics.
#[test]
fn stale_entities_are_dropped_silently() {
    let mut engine = build(vec![ZoneConfig::litter(Vec3::ZERO)], 7);
    let person = engine
        .world_mut()
        .add_entity(&["person"], Vec3::new(1.0, 0.0, 0.0));

    engine.run_ticks(2).unwrap();
    engine.world_mut().remove_entity(person);
    engine.run_ticks(5).unwrap();

    assert!(engine.zone("litter").unwrap().captured().is_empty());
}
