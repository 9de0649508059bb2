use serde::{Deserialize, Serialize};

/// All externally-issued commands. The presence sensor's edge detector
/// delivers `Hide`/`Show`; the operator console delivers clock control.
/// Variants are appended, never removed or reordered.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum SensorCommand {
    // ── Clock control ─────────────────────────────
    Pause,
    Resume,

    // ── Presence sensor edges ─────────────────────
    /// Sensor A edge: force-suspend a zone (release everything, go dark).
    Hide { zone: String },
    /// Sensor B edge: reset a zone's one-shot latches and re-enable it,
    /// relocating its ending anchor according to the zone's anchor mode.
    Show { zone: String },
}

impl SensorCommand {
    pub fn kind(&self) -> &'static str {
        match self {
            SensorCommand::Pause     => "pause",
            SensorCommand::Resume    => "resume",
            SensorCommand::Hide { .. } => "hide",
            SensorCommand::Show { .. } => "show",
        }
    }
}
