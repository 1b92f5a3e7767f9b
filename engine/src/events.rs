//! Outbound events and the collaborator interfaces that consume them.
//!
//! The engine only produces [`SimulationEvent`]s. Displays, web handlers and
//! statistics stores implement [`EventSink`] (directly, or through
//! [`DisplayAdapter`] / [`StatsAdapter`]) and never reach into the engine.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;

use crate::error::SinkError;
use crate::fingerprint::Fingerprint;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReseedReason {
    /// First universe after `start`.
    Initial,
    /// The generation cap was reached.
    GenerationCap,
    /// The universe settled into a still life or oscillator.
    CycleLimit,
    /// Every cell died.
    Extinction,
    /// A pattern was supplied through `seed`.
    Injected,
    /// A fresh random universe was asked for.
    Requested,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimulationEvent {
    GenerationAdvanced {
        generation: u64,
        fingerprint: Fingerprint,
        /// Live interior cells, 0-based `(x, y)`.
        live_cells: BTreeSet<(usize, usize)>,
    },
    CycleDetected {
        generation: u64,
        period: usize,
        /// Fingerprint of the universe at its genesis.
        start_fingerprint: Fingerprint,
    },
    Reseeded {
        generation: u64,
        reason: ReseedReason,
    },
}

pub trait EventSink {
    fn handle(&mut self, event: &SimulationEvent) -> Result<(), SinkError>;
}

impl<S: EventSink + ?Sized> EventSink for Box<S> {
    fn handle(&mut self, event: &SimulationEvent) -> Result<(), SinkError> {
        (**self).handle(event)
    }
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn handle(&mut self, event: &SimulationEvent) -> Result<(), SinkError> {
        (**self).handle(event)
    }
}

/// Fan-out: every sink sees every event; the first failure is reported.
impl<S: EventSink> EventSink for Vec<S> {
    fn handle(&mut self, event: &SimulationEvent) -> Result<(), SinkError> {
        let mut first_error = None;
        for sink in self.iter_mut() {
            if let Err(err) = sink.handle(event) {
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

impl EventSink for Sender<SimulationEvent> {
    fn handle(&mut self, event: &SimulationEvent) -> Result<(), SinkError> {
        self.send(event.clone()).map_err(|_| SinkError::Disconnected)
    }
}

/// Delivers `event`, logging instead of propagating a consumer failure.
pub(crate) fn deliver<S: EventSink + ?Sized>(sink: &mut S, event: &SimulationEvent) {
    if let Err(err) = sink.handle(event) {
        log::warn!("event consumer failed, simulation continues: {err}");
    }
}

/// Reports events through the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl EventSink for LogSink {
    fn handle(&mut self, event: &SimulationEvent) -> Result<(), SinkError> {
        match event {
            SimulationEvent::GenerationAdvanced {
                generation,
                fingerprint,
                live_cells,
            } => log::trace!("generation {generation}: {} live, id {fingerprint}", live_cells.len()),
            SimulationEvent::CycleDetected {
                generation, period, ..
            } => log::info!("oscillator period {period} at generation {generation}"),
            SimulationEvent::Reseeded { reason, .. } => log::info!("universe reseeded ({reason:?})"),
        }
        Ok(())
    }
}

/// Capability a pixel display offers. Coordinates are 0-based interior cells.
pub trait PixelSink {
    fn clear(&mut self) -> Result<(), SinkError>;
    fn set_pixel(&mut self, x: usize, y: usize, on: bool) -> Result<(), SinkError>;
    fn write_display(&mut self) -> Result<(), SinkError>;

    fn set_brightness(&mut self, _level: u8) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Shared brightness level, adjustable from any thread.
#[derive(Debug, Clone, Default)]
pub struct Brightness(Arc<AtomicU8>);

impl Brightness {
    pub fn new(level: u8) -> Self {
        Self(Arc::new(AtomicU8::new(level)))
    }

    pub fn set(&self, level: u8) {
        self.0.store(level, Ordering::Relaxed);
    }

    pub fn get(&self) -> u8 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Draws each `GenerationAdvanced` onto a [`PixelSink`].
///
/// Display failures are transient: they are logged and counted, and the
/// adapter always reports success so the universe keeps evolving.
pub struct DisplayAdapter<P> {
    pixels: P,
    brightness: Option<Brightness>,
    failures: u64,
}

impl<P: PixelSink> DisplayAdapter<P> {
    pub fn new(pixels: P) -> Self {
        Self {
            pixels,
            brightness: None,
            failures: 0,
        }
    }

    pub fn with_brightness(mut self, brightness: Brightness) -> Self {
        self.brightness = Some(brightness);
        self
    }

    pub fn failures(&self) -> u64 {
        self.failures
    }

    pub fn pixels(&self) -> &P {
        &self.pixels
    }

    fn draw(&mut self, live_cells: &BTreeSet<(usize, usize)>) -> Result<(), SinkError> {
        if let Some(brightness) = &self.brightness {
            self.pixels.set_brightness(brightness.get())?;
        }
        self.pixels.clear()?;
        for &(x, y) in live_cells {
            self.pixels.set_pixel(x, y, true)?;
        }
        self.pixels.write_display()
    }
}

impl<P: PixelSink> EventSink for DisplayAdapter<P> {
    fn handle(&mut self, event: &SimulationEvent) -> Result<(), SinkError> {
        if let SimulationEvent::GenerationAdvanced {
            generation, live_cells, ..
        } = event
        {
            if let Err(err) = self.draw(live_cells) {
                self.failures += 1;
                log::warn!("display failed at generation {generation}, life goes on: {err}");
            }
        }
        Ok(())
    }
}

/// One settled universe, as handed to a statistics store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleRecord {
    pub start_fingerprint: Fingerprint,
    pub generations: u64,
    pub period: usize,
}

pub trait StatsSink {
    fn record(&mut self, record: CycleRecord) -> Result<(), SinkError>;
}

impl StatsSink for Vec<CycleRecord> {
    fn record(&mut self, record: CycleRecord) -> Result<(), SinkError> {
        self.push(record);
        Ok(())
    }
}

/// Forwards `CycleDetected` events to a [`StatsSink`].
pub struct StatsAdapter<S> {
    stats: S,
}

impl<S: StatsSink> StatsAdapter<S> {
    pub fn new(stats: S) -> Self {
        Self { stats }
    }

    pub fn into_inner(self) -> S {
        self.stats
    }
}

impl<S: StatsSink> EventSink for StatsAdapter<S> {
    fn handle(&mut self, event: &SimulationEvent) -> Result<(), SinkError> {
        if let SimulationEvent::CycleDetected {
            generation,
            period,
            start_fingerprint,
        } = event
        {
            self.stats.record(CycleRecord {
                start_fingerprint: start_fingerprint.clone(),
                generations: *generation,
                period: *period,
            })?;
        }
        Ok(())
    }
}
