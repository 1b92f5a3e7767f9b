//! Threaded driver and the command surface external collaborators use.
//!
//! One worker thread owns the tick loop. The engine sits behind a mutex, so a
//! command is applied either wholly before or wholly after a step, and a
//! condition variable lets commands cut the inter-tick wait short.

use std::io;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::config::GenerationCap;
use crate::engine::{EngineStatus, RunState, SimulationEngine};
use crate::error::Result;
use crate::events::{deliver, EventSink};

struct Inner {
    engine: SimulationEngine,
    shutdown: bool,
}

struct Shared {
    inner: Mutex<Inner>,
    signal: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Cloneable handle for sending commands to a running simulation.
#[derive(Clone)]
pub struct Controller {
    shared: Arc<Shared>,
}

/// Owns the worker thread; dropping it shuts the simulation down.
pub struct SimulationThread {
    shared: Arc<Shared>,
    handle: Option<JoinHandle<()>>,
}

/// Moves `engine` onto a worker thread that reports to `sink`.
///
/// The engine keeps whatever state it had; call [`Controller::start`] to
/// begin ticking.
pub fn spawn<S>(engine: SimulationEngine, sink: S) -> io::Result<(Controller, SimulationThread)>
where
    S: EventSink + Send + 'static,
{
    let shared = Arc::new(Shared {
        inner: Mutex::new(Inner {
            engine,
            shutdown: false,
        }),
        signal: Condvar::new(),
    });

    let worker_shared = Arc::clone(&shared);
    let handle = thread::Builder::new()
        .name("life-engine".into())
        .spawn(move || run(&worker_shared, sink))?;

    Ok((
        Controller {
            shared: Arc::clone(&shared),
        },
        SimulationThread {
            shared,
            handle: Some(handle),
        },
    ))
}

fn run<S: EventSink>(shared: &Shared, mut sink: S) {
    let mut last_tick: Option<Instant> = None;
    loop {
        let events = {
            let mut inner = shared.lock();
            if inner.shutdown {
                log::debug!("simulation thread exiting");
                return;
            }

            let now = Instant::now();
            // The delay is read on every pass so a new rate applies mid-wait.
            // `None` is a deadline past the end of time: wait for a command.
            let due = match last_tick {
                None => Some(now),
                Some(at) => at.checked_add(inner.engine.tick_delay()),
            };
            let running = inner.engine.state() == RunState::Running;

            if running && due.is_some_and(|due| now >= due) {
                last_tick = Some(now);
                inner.engine.tick()
            } else if inner.engine.has_events() {
                inner.engine.take_events()
            } else {
                // Commands notify the condvar, so pause/stop/seed cut this short.
                match due.filter(|_| running) {
                    Some(due) => drop(
                        shared
                            .signal
                            .wait_timeout(inner, due.saturating_duration_since(now))
                            .unwrap_or_else(PoisonError::into_inner),
                    ),
                    None => drop(shared.signal.wait(inner).unwrap_or_else(PoisonError::into_inner)),
                }
                continue;
            }
        };

        // Delivery happens outside the lock; a slow consumer never blocks commands.
        for event in &events {
            deliver(&mut sink, event);
        }
    }
}

impl Controller {
    fn command<R>(&self, apply: impl FnOnce(&mut SimulationEngine) -> R) -> R {
        let result = apply(&mut self.shared.lock().engine);
        self.shared.signal.notify_all();
        result
    }

    pub fn start(&self) {
        self.command(SimulationEngine::start);
    }

    pub fn pause(&self) {
        self.command(SimulationEngine::pause);
    }

    pub fn resume(&self) {
        self.command(SimulationEngine::resume);
    }

    pub fn stop(&self) {
        self.command(SimulationEngine::stop);
    }

    /// Swaps in a new universe; never interleaved with a step.
    pub fn seed(&self, rows: &[Vec<bool>]) -> Result<()> {
        self.command(|engine| engine.seed(rows))
    }

    pub fn randomize(&self) {
        self.command(SimulationEngine::randomize);
    }

    pub fn set_generation_cap(&self, cap: GenerationCap) {
        self.command(|engine| engine.set_generation_cap(cap));
    }

    pub fn set_tick_delay(&self, delay: Duration) {
        self.command(|engine| engine.set_tick_delay(delay));
    }

    pub fn set_auto_restart(&self, auto_restart: bool) {
        self.command(|engine| engine.set_auto_restart(auto_restart));
    }

    pub fn set_max_cycles(&self, max_cycles: u32) {
        self.command(|engine| engine.set_max_cycles(max_cycles));
    }

    pub fn status(&self) -> EngineStatus {
        self.shared.lock().engine.status()
    }
}

impl SimulationThread {
    /// Stops the worker and waits for it to exit.
    pub fn shutdown(mut self) {
        self.join();
    }

    fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.shared.lock().shutdown = true;
            self.shared.signal.notify_all();
            if handle.join().is_err() {
                log::error!("simulation thread panicked");
            }
        }
    }
}

impl Drop for SimulationThread {
    fn drop(&mut self) {
        self.join();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::events::SimulationEvent;
    use crate::patterns::{self, BLOCK};
    use std::sync::mpsc;

    fn engine(tick_delay_secs: f64) -> SimulationEngine {
        SimulationEngine::new(&EngineConfig {
            seed: Some(11),
            tick_delay_secs,
            max_cycles: 0,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_commands_reach_worker() {
        let (tx, rx) = mpsc::channel();
        let (controller, thread) = spawn(engine(0.0), tx).unwrap();
        controller.start();
        let event = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(matches!(event, SimulationEvent::Reseeded { .. }));
        controller.stop();
        assert_eq!(controller.status().state, RunState::Stopped);
        thread.shutdown();
    }

    fn next_generation(rx: &mpsc::Receiver<SimulationEvent>, timeout: Duration) -> Option<u64> {
        let deadline = Instant::now() + timeout;
        while let Some(remaining) = deadline.checked_duration_since(Instant::now()) {
            match rx.recv_timeout(remaining) {
                Ok(SimulationEvent::GenerationAdvanced { generation, .. }) => return Some(generation),
                Ok(_) => continue,
                Err(_) => return None,
            }
        }
        None
    }

    #[test]
    fn test_shorter_delay_applies_mid_wait() {
        let (tx, rx) = mpsc::channel();
        let (controller, thread) = spawn(engine(3600.0), tx).unwrap();
        controller.seed(&patterns::place(16, 16, BLOCK.cells, (2, 2))).unwrap();
        controller.start();
        assert_eq!(next_generation(&rx, Duration::from_secs(5)), Some(2));
        // The worker is now an hour into its wait.
        controller.set_tick_delay(Duration::from_millis(1));
        assert_eq!(next_generation(&rx, Duration::from_secs(5)), Some(3));
        thread.shutdown();
    }

    #[test]
    fn test_huge_delay_keeps_worker_alive() {
        let (tx, rx) = mpsc::channel();
        let (controller, thread) = spawn(engine(0.0), tx).unwrap();
        controller.start();
        assert!(next_generation(&rx, Duration::from_secs(5)).is_some());

        controller.set_tick_delay(Duration::MAX);
        thread::sleep(Duration::from_millis(200));
        while rx.try_recv().is_ok() {}

        controller.set_tick_delay(Duration::from_millis(1));
        assert!(next_generation(&rx, Duration::from_secs(5)).is_some());
        assert_eq!(controller.status().state, RunState::Running);
        thread.shutdown();
    }

    #[test]
    fn test_pause_interrupts_long_delay() {
        let (tx, rx) = mpsc::channel();
        let (controller, thread) = spawn(engine(3600.0), tx).unwrap();
        controller.seed(&patterns::place(16, 16, BLOCK.cells, (2, 2))).unwrap();
        controller.start();
        // First tick is immediate, the next one is an hour away.
        let generation_two = rx
            .iter()
            .find(|event| matches!(event, SimulationEvent::GenerationAdvanced { .. }));
        assert!(generation_two.is_some());
        controller.pause();
        assert_eq!(controller.status().state, RunState::Paused);
        assert_eq!(controller.status().generation, 2);
        // Shutdown must not wait out the delay either.
        let started = Instant::now();
        thread.shutdown();
        assert!(started.elapsed() < Duration::from_secs(60));
    }
}
