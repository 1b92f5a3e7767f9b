//! Conway's Game of Life on a bounded grid, with still-life and oscillator
//! detection and a runtime-adjustable generation loop.
//!
//! [`engine::SimulationEngine`] is a plain state machine; [`controller`] runs
//! it on a worker thread and exposes the command surface. Displays and other
//! consumers receive [`events::SimulationEvent`]s through an
//! [`events::EventSink`].

pub mod config;
pub mod controller;
pub mod controls;
pub mod engine;
pub mod error;
pub mod events;
pub mod fingerprint;
pub mod grid;
pub mod history;
pub mod patterns;

pub use config::{EngineConfig, GenerationCap};
pub use controller::{spawn, Controller, SimulationThread};
pub use engine::{EngineStatus, RunState, SimulationEngine};
pub use error::{EngineError, SinkError};
pub use events::{EventSink, ReseedReason, SimulationEvent};
pub use fingerprint::Fingerprint;
pub use grid::Grid;
pub use history::History;
