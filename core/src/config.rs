//! Zone and scene configuration.
//!
//! Every constant the four production zones were tuned with lives here,
//! serde-serializable so a scene file can override any of it. Malformed
//! values (non-positive radii, empty signal names) never error: the
//! affected detector simply degrades to "never triggers".

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::EngineResult;

/// How a zone escalates discomfort while entities are held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationMode {
    /// One timer per captured entity; the gauge shows the maximum.
    PerEntity,
    /// A single shared timer, running while occupancy is non-empty.
    ZoneGlobal,
}

/// What happens to the ending anchor when the show sensor fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorMode {
    /// No anchor choreography.
    None,
    /// The anchor entity is moved to the zone's position (smoking).
    AnchorToZone,
    /// The zone relocates to the anchor's position (litter, congestion).
    ZoneToAnchor,
}

/// Secondary larger-radius detector with its own classification and cadence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OuterRingConfig {
    pub tag: String,
    /// Multiplied with the zone radius. Non-positive disables the ring.
    pub radius_multiplier: f32,
    /// Marker cadence for ring members, seconds.
    pub spawn_delay: f32,
    /// Send the zone clear signal to members leaving the ring (litter).
    #[serde(default)]
    pub send_clear_on_exit: bool,
}

/// Extra classification reached by the ending broadcast.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndLayerConfig {
    pub tag: String,
    pub radius_multiplier: f32,
}

/// Litter-variant: flip the horn signal on all vehicles after the ending.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HornConfig {
    pub enable_delay: f32,
    pub vehicle_tag: String,
    pub signal: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneConfig {
    pub name: String,
    pub position: [f32; 3],

    // ── Detection ─────────────────────────────────
    pub radius: f32,
    pub person_tag: String,

    // ── Capture ───────────────────────────────────
    /// Reaction trigger sent at capture. Empty disables the signal.
    pub react_signal: String,
    /// Clear trigger sent at release. Empty disables the signal.
    pub clear_signal: String,
    pub min_capture_delay: f32,
    pub max_capture_delay: f32,
    /// Hold-style zones pause locomotion and pin the vertical coordinate;
    /// observe-style zones (congestion, crowd) only track membership.
    pub hold_captives: bool,
    /// Warp a released entity to the nearest valid position (litter).
    #[serde(default)]
    pub warp_on_release: bool,
    /// Pause between release and locomotion resume, seconds (litter: 0.2).
    #[serde(default)]
    pub release_resume_delay: f32,

    // ── Escalation / markers ──────────────────────
    pub escalation: EscalationMode,
    pub max_discomfort_duration: f32,
    /// Marker cadence for held entities, seconds. Non-positive disables.
    pub marker_spawn_delay: f32,
    /// Marker lifetime, seconds. Non-positive means "until release".
    pub marker_lifetime: f32,
    pub marker_offset_y: f32,

    // ── Outer ring / overrides ────────────────────
    #[serde(default)]
    pub outer: Option<OuterRingConfig>,
    /// Presence of this classification in the zone radius force-releases
    /// everyone and suppresses capture for the tick (smoking).
    #[serde(default)]
    pub legal_area_tag: Option<String>,

    // ── Ending ────────────────────────────────────
    pub end_radius: f32,
    pub ending_tag: String,
    pub end_signal: String,
    pub end_off_signal: String,
    pub resume_walk_delay: f32,
    /// Primary ending broadcast reaches radius × this.
    pub end_broadcast_multiplier: f32,
    #[serde(default)]
    pub extra_end_layer: Option<EndLayerConfig>,
    /// Named per-entity counter incremented once per activation.
    pub completion_counter: String,
    #[serde(default)]
    pub horn: Option<HornConfig>,
    pub anchor_mode: AnchorMode,
}

impl ZoneConfig {
    pub fn position_vec(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }

    /// Baseline all presets share; fields the variants disagree on are
    /// overwritten by the preset constructors below.
    fn base(name: &str, position: Vec3) -> Self {
        Self {
            name: name.to_string(),
            position: position.to_array(),
            radius: 5.0,
            person_tag: "person".to_string(),
            react_signal: String::new(),
            clear_signal: String::new(),
            min_capture_delay: 0.0,
            max_capture_delay: 0.0,
            hold_captives: true,
            warp_on_release: false,
            release_resume_delay: 0.0,
            escalation: EscalationMode::PerEntity,
            max_discomfort_duration: 30.0,
            marker_spawn_delay: 3.0,
            marker_lifetime: 5.0,
            marker_offset_y: 11.0,
            outer: None,
            legal_area_tag: None,
            end_radius: 3.0,
            ending_tag: "ending_marker".to_string(),
            end_signal: String::new(),
            end_off_signal: String::new(),
            resume_walk_delay: 7.0,
            end_broadcast_multiplier: 1.3,
            extra_end_layer: None,
            completion_counter: "EndCount".to_string(),
            horn: None,
            anchor_mode: AnchorMode::None,
        }
    }

    /// Smoking zone: randomized capture delay, outer annoyance ring on its
    /// own tag, legal smoking-area override, anchor comes to the zone.
    pub fn smoking(position: Vec3) -> Self {
        Self {
            radius: 5.0,
            react_signal: "SmokingOn".to_string(),
            clear_signal: "SmokingOff".to_string(),
            min_capture_delay: 0.0,
            max_capture_delay: 2.0,
            // Smokers themselves get no markers; bystanders in the ring do.
            marker_spawn_delay: 0.0,
            outer: Some(OuterRingConfig {
                tag: "bystander".to_string(),
                radius_multiplier: 2.0,
                spawn_delay: 3.0,
                send_clear_on_exit: false,
            }),
            legal_area_tag: Some("smoking_area".to_string()),
            end_signal: "EventEnd2".to_string(),
            end_off_signal: "EventOff2".to_string(),
            extra_end_layer: Some(EndLayerConfig {
                tag: "bystander".to_string(),
                radius_multiplier: 2.0,
            }),
            anchor_mode: AnchorMode::AnchorToZone,
            ..Self::base("smoking", position)
        }
    }

    /// Litter zone: immediate capture, warp-on-release, same-radius
    /// "selectable" ring that also gets the clear signal, very wide ending
    /// broadcast, delayed horn enablement.
    pub fn litter(position: Vec3) -> Self {
        Self {
            radius: 7.2,
            react_signal: "EventReact0".to_string(),
            clear_signal: "EventOff0".to_string(),
            warp_on_release: true,
            release_resume_delay: 0.2,
            marker_lifetime: 2.0,
            outer: Some(OuterRingConfig {
                tag: "selectable".to_string(),
                radius_multiplier: 1.0,
                spawn_delay: 3.0,
                send_clear_on_exit: true,
            }),
            end_signal: "EventEnd0".to_string(),
            end_off_signal: "EventOff0".to_string(),
            // Scene-specific tuning: the primary broadcast is far wider
            // than the secondary. Kept as two independent constants.
            end_broadcast_multiplier: 14.0,
            extra_end_layer: Some(EndLayerConfig {
                tag: "selectable".to_string(),
                radius_multiplier: 3.0,
            }),
            horn: Some(HornConfig {
                enable_delay: 10.0,
                vehicle_tag: "vehicle".to_string(),
                signal: "HornOn".to_string(),
            }),
            anchor_mode: AnchorMode::ZoneToAnchor,
            ..Self::base("litter", position)
        }
    }

    /// Car-congestion zone: observe-style, one shared discomfort timer,
    /// an extra ending layer for the stuck vehicles.
    pub fn congestion(position: Vec3) -> Self {
        Self {
            radius: 15.0,
            hold_captives: false,
            escalation: EscalationMode::ZoneGlobal,
            end_signal: "EventEnd1".to_string(),
            end_off_signal: "EventOff1".to_string(),
            extra_end_layer: Some(EndLayerConfig {
                tag: "vehicle".to_string(),
                radius_multiplier: 1.3,
            }),
            anchor_mode: AnchorMode::ZoneToAnchor,
            ..Self::base("congestion", position)
        }
    }

    /// Generic crowd zone: observe-style, shared timer, slightly widened
    /// ending broadcast, no extras.
    pub fn crowd(position: Vec3) -> Self {
        Self {
            radius: 15.0,
            hold_captives: false,
            escalation: EscalationMode::ZoneGlobal,
            marker_offset_y: 2.5,
            end_signal: "EventEnd1".to_string(),
            end_off_signal: "EventOff1".to_string(),
            end_broadcast_multiplier: 4.0 / 3.0,
            ..Self::base("crowd", position)
        }
    }
}

/// A whole scene: the zones in their fixed execution order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneConfig {
    pub zones: Vec<ZoneConfig>,
}

impl SceneConfig {
    /// The four production zones at their installed positions.
    pub fn demo() -> Self {
        Self {
            zones: vec![
                ZoneConfig::smoking(Vec3::new(0.0, 0.0, 0.0)),
                ZoneConfig::litter(Vec3::new(40.0, 0.0, 0.0)),
                ZoneConfig::congestion(Vec3::new(0.0, 0.0, 60.0)),
                ZoneConfig::crowd(Vec3::new(40.0, 0.0, 60.0)),
            ],
        }
    }

    pub fn load(path: &Path) -> EngineResult<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("reading scene config {}: {e}", path.display()))?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn to_json(&self) -> EngineResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_round_trips_through_json() {
        let demo = SceneConfig::demo();
        let json = demo.to_json().unwrap();
        let back: SceneConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.zones.len(), 4);
        assert_eq!(back.zones[1].name, "litter");
        assert_eq!(back.zones[1].end_broadcast_multiplier, 14.0);
        assert_eq!(
            back.zones[1].extra_end_layer.as_ref().unwrap().radius_multiplier,
            3.0
        );
    }
}
