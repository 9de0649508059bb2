//! streetscene-core — the zone interaction engine behind an interactive
//! street installation.
//!
//! Stationary zones watch a 3D scene for nearby people and vehicles, hold
//! them in a scripted reaction (stop, react, accumulate a discomfort gauge,
//! spawn floating markers), and eventually fire a one-shot ending sequence
//! that hands control to the next zone through an external presence sensor.
//!
//! The engine is a pure in-process simulation component: entities are owned
//! by an external [`world::World`] and referenced only by id. Everything
//! runs on a single-threaded, fixed-order, fixed-timestep tick.

pub mod clock;
pub mod command;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod journal;
pub mod rng;
pub mod scene;
pub mod scheduler;
pub mod snapshot;
pub mod types;
pub mod world;
pub mod zone;
