//! The simulation engine — ties zones, world, clock, and journal together.
//!
//! EXECUTION ORDER (fixed, documented, never reordered):
//!   1. World motion step (walkers, marker lifetimes)
//!   2. Each zone's pipeline, in registration order
//!
//! RULES:
//!   - Zones execute in registration order, every tick.
//!   - Zones never call each other; overlap coordination happens through
//!     the shared world state they each observe.
//!   - All randomness flows through the per-zone RNG streams.
//!   - All state changes are recorded in the event journal.
//!   - Sensor commands apply between ticks, never mid-pipeline.

use crate::{
    clock::SimClock,
    command::SensorCommand,
    config::SceneConfig,
    error::{EngineError, EngineResult},
    event::{event_type_name, EventLogEntry, SimEvent},
    journal::Journal,
    rng::{RngBank, StreamRng},
    snapshot::{SimSnapshot, SNAPSHOT_INTERVAL},
    types::{SessionId, Tick},
    world::World,
    zone::Zone,
};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

pub struct SimEngine<W: World> {
    pub session_id: SessionId,
    pub clock: SimClock,
    seed: u64,
    zones: Vec<(Zone, StreamRng)>,
    world: W,
    journal: Journal,
}

impl<W: World> SimEngine<W> {
    pub fn new(session_id: SessionId, seed: u64, world: W, journal: Journal) -> Self {
        Self {
            clock: SimClock::new(session_id.clone()),
            seed,
            zones: Vec::new(),
            world,
            journal,
            session_id,
        }
    }

    /// Build a fully wired engine: migrated journal, session row, one zone
    /// per scene config entry in declaration order.
    pub fn build(
        session_id: SessionId,
        seed: u64,
        config: &SceneConfig,
        world: W,
        journal: Journal,
    ) -> EngineResult<Self> {
        journal.migrate()?;
        journal.insert_session(&session_id, seed, ENGINE_VERSION)?;
        let mut engine = SimEngine::new(session_id, seed, world, journal);
        let bank = RngBank::new(seed);
        for cfg in &config.zones {
            engine.register(Zone::new(cfg.clone()), &bank);
        }
        Ok(engine)
    }

    /// Register a zone. Registration order fixes both the tick order and
    /// the RNG stream slot, so zones must only ever be appended.
    pub fn register(&mut self, zone: Zone, bank: &RngBank) {
        let slot = self.zones.len() as u64;
        let rng = bank.for_zone(slot, zone.name());
        self.zones.push((zone, rng));
    }

    /// Advance one tick. This is the core simulation step.
    pub fn tick(&mut self) -> EngineResult<Vec<SimEvent>> {
        assert!(!self.clock.paused, "tick() called on paused engine");

        let current_tick = self.clock.advance();
        let dt = self.clock.dt;
        let mut tick_events: Vec<SimEvent> = vec![SimEvent::TickStarted { tick: current_tick }];

        self.world.advance(dt);

        // Each zone runs its full pipeline in registration order.
        for (zone, rng) in &mut self.zones {
            let new_events = zone.tick(current_tick, dt, &mut self.world, rng);
            for event in &new_events {
                Self::journal_event(
                    &self.journal,
                    &self.session_id,
                    current_tick,
                    zone.name(),
                    event,
                )?;
            }
            tick_events.extend(new_events);
        }

        tick_events.push(SimEvent::TickCompleted { tick: current_tick });

        if current_tick % SNAPSHOT_INTERVAL == 0 {
            self.take_snapshot(current_tick)?;
        }

        Ok(tick_events)
    }

    /// Run n ticks in a loop. Used for testing and fast-forward.
    pub fn run_ticks(&mut self, n: u64) -> EngineResult<()> {
        // Emit SessionInitialized at tick 0 so seed differences are
        // observable in the journal.
        if self.clock.current_tick == 0 {
            let init = SimEvent::SessionInitialized {
                session_id: self.session_id.clone(),
                seed: self.seed,
            };
            Self::journal_event(&self.journal, &self.session_id, 0, "engine", &init)?;
        }
        self.clock.resume();
        for _ in 0..n {
            self.tick()?;
        }
        self.clock.pause();
        Ok(())
    }

    /// Apply a sensor command. Commands land between ticks; a command that
    /// arrives mid-show is the host's problem to queue.
    pub fn apply_command(&mut self, command: &SensorCommand) -> EngineResult<Vec<SimEvent>> {
        let tick = self.clock.current_tick;
        let received = SimEvent::SensorCommandReceived {
            tick,
            zone: match command {
                SensorCommand::Hide { zone } | SensorCommand::Show { zone } => zone.clone(),
                _ => String::new(),
            },
            command: command.kind().to_string(),
        };
        Self::journal_event(&self.journal, &self.session_id, tick, "engine", &received)?;

        let mut events = vec![received];
        match command {
            SensorCommand::Pause => self.clock.pause(),
            SensorCommand::Resume => self.clock.resume(),
            SensorCommand::Hide { zone } => {
                let idx = self.zone_index(zone)?;
                let target = &mut self.zones[idx].0;
                let new_events = target.hide(tick, &mut self.world);
                for event in &new_events {
                    Self::journal_event(&self.journal, &self.session_id, tick, zone, event)?;
                }
                events.extend(new_events);
            }
            SensorCommand::Show { zone } => {
                let idx = self.zone_index(zone)?;
                let target = &mut self.zones[idx].0;
                let new_events = target.show(tick, &mut self.world);
                for event in &new_events {
                    Self::journal_event(&self.journal, &self.session_id, tick, zone, event)?;
                }
                events.extend(new_events);
            }
        }
        Ok(events)
    }

    fn journal_event(
        journal: &Journal,
        session_id: &str,
        tick: Tick,
        zone: &str,
        event: &SimEvent,
    ) -> EngineResult<()> {
        journal.append_event(&EventLogEntry {
            id: None,
            session_id: session_id.to_string(),
            tick,
            zone: zone.to_string(),
            event_type: event_type_name(event).to_string(),
            payload: serde_json::to_string(event)?,
        })
    }

    fn take_snapshot(&self, tick: Tick) -> EngineResult<()> {
        let snapshot = SimSnapshot {
            session_id: self.session_id.clone(),
            tick,
            clock: self.clock.clone(),
            zones: self.zones.iter().map(|(z, _)| z.snapshot()).collect(),
        };
        self.journal
            .save_snapshot(&self.session_id, tick, &serde_json::to_string(&snapshot)?)
    }

    fn zone_index(&self, name: &str) -> EngineResult<usize> {
        self.zones
            .iter()
            .position(|(z, _)| z.name() == name)
            .ok_or_else(|| EngineError::ZoneNotFound {
                name: name.to_string(),
            })
    }

    // ── Observation ────────────────────────────────────────────

    pub fn world(&self) -> &W {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut W {
        &mut self.world
    }

    pub fn zone(&self, name: &str) -> EngineResult<&Zone> {
        self.zones
            .iter()
            .map(|(z, _)| z)
            .find(|z| z.name() == name)
            .ok_or_else(|| EngineError::ZoneNotFound {
                name: name.to_string(),
            })
    }

    pub fn zone_mut(&mut self, name: &str) -> EngineResult<&mut Zone> {
        let idx = self.zone_index(name)?;
        Ok(&mut self.zones[idx].0)
    }

    pub fn zones(&self) -> impl Iterator<Item = &Zone> {
        self.zones.iter().map(|(z, _)| z)
    }

    pub fn journal(&self) -> &Journal {
        &self.journal
    }
}
