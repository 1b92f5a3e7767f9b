use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::{EngineConfig, GenerationCap, MAX_TICK_DELAY_SECS};
use crate::error::Result;
use crate::events::{deliver, EventSink, ReseedReason, SimulationEvent};
use crate::fingerprint::Fingerprint;
use crate::grid::Grid;
use crate::history::History;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Stopped,
    Running,
    Paused,
}

/// Consistent view of the engine for collaborators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineStatus {
    pub state: RunState,
    pub generation: u64,
    pub cycle_count: u32,
    pub auto_restart: bool,
    pub generation_cap: GenerationCap,
    /// `None` before the first genesis.
    pub grid: Option<Grid>,
}

/// The generation loop as a single-threaded state machine.
///
/// Commands and [`SimulationEngine::tick`] mutate the state; events are queued
/// and handed back by `tick` / [`SimulationEngine::take_events`], so nothing
/// here blocks or talks to a consumer directly. See
/// [`crate::controller`] for the threaded driver.
pub struct SimulationEngine {
    width: usize,
    height: usize,
    fill_percent: f64,
    grid: Option<Grid>,
    history: History,
    generation: u64,
    cycle_count: u32,
    start_fingerprint: Fingerprint,
    state: RunState,
    auto_restart: bool,
    max_cycles: u32,
    generation_cap: GenerationCap,
    tick_delay: Duration,
    reseed_on_extinction: bool,
    rng: StdRng,
    pending: Vec<SimulationEvent>,
}

impl SimulationEngine {
    pub fn new(config: &EngineConfig) -> Result<Self> {
        config.validate()?;
        let rng = config.seed.map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
        Ok(Self {
            width: config.width,
            height: config.height,
            fill_percent: config.fill_percent,
            grid: None,
            history: History::new(config.history_capacity)?,
            generation: 1,
            cycle_count: 0,
            start_fingerprint: Fingerprint::zero(),
            state: RunState::Stopped,
            auto_restart: config.auto_restart,
            max_cycles: config.max_cycles,
            generation_cap: config.generation_cap(),
            tick_delay: config.tick_delay(),
            reseed_on_extinction: config.reseed_on_extinction,
            rng,
            pending: Vec::new(),
        })
    }

    /// Stopped -> Running. The first start creates a random universe.
    pub fn start(&mut self) {
        if self.state != RunState::Stopped {
            log::debug!("start ignored, engine is {:?}", self.state);
            return;
        }
        if self.grid.is_none() {
            self.genesis(None, ReseedReason::Initial);
        }
        self.state = RunState::Running;
        log::info!("simulation started at generation {}", self.generation);
    }

    pub fn pause(&mut self) {
        if self.state == RunState::Running {
            self.state = RunState::Paused;
            log::debug!("paused at generation {}", self.generation);
        }
    }

    pub fn resume(&mut self) {
        if self.state == RunState::Paused {
            self.state = RunState::Running;
            log::debug!("resumed at generation {}", self.generation);
        }
    }

    /// Any state -> Stopped. The universe is kept for the next `start`.
    pub fn stop(&mut self) {
        if self.state != RunState::Stopped {
            self.state = RunState::Stopped;
            log::info!("simulation stopped at generation {}", self.generation);
        }
    }

    /// Replaces the universe with `rows` (row-major, `height` rows of `width`).
    ///
    /// A mismatched pattern is rejected and the engine is left untouched.
    /// While paused or running the swap is atomic and leaves the engine
    /// running; while stopped the pattern is staged for the next `start`.
    pub fn seed(&mut self, rows: &[Vec<bool>]) -> Result<()> {
        let grid = Grid::from_pattern(self.width, self.height, rows)?;
        self.genesis(Some(grid), ReseedReason::Injected);
        if self.state == RunState::Paused {
            self.state = RunState::Running;
        }
        Ok(())
    }

    /// Discards the universe for a fresh random one.
    pub fn randomize(&mut self) {
        self.genesis(None, ReseedReason::Requested);
    }

    pub fn set_generation_cap(&mut self, cap: GenerationCap) {
        self.generation_cap = cap;
    }

    /// Clamped to [`MAX_TICK_DELAY_SECS`], the same ceiling the config enforces.
    pub fn set_tick_delay(&mut self, delay: Duration) {
        self.tick_delay = delay.min(Duration::from_secs_f64(MAX_TICK_DELAY_SECS));
    }

    pub fn set_auto_restart(&mut self, auto_restart: bool) {
        self.auto_restart = auto_restart;
    }

    /// 0 disables acting on repeats.
    pub fn set_max_cycles(&mut self, max_cycles: u32) {
        self.max_cycles = max_cycles;
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn cycle_count(&self) -> u32 {
        self.cycle_count
    }

    pub fn grid(&self) -> Option<&Grid> {
        self.grid.as_ref()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn tick_delay(&self) -> Duration {
        self.tick_delay
    }

    pub fn status(&self) -> EngineStatus {
        EngineStatus {
            state: self.state,
            generation: self.generation,
            cycle_count: self.cycle_count,
            auto_restart: self.auto_restart,
            generation_cap: self.generation_cap,
            grid: self.grid.clone(),
        }
    }

    pub fn has_events(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Events queued by commands since the last drain.
    pub fn take_events(&mut self) -> Vec<SimulationEvent> {
        std::mem::take(&mut self.pending)
    }

    /// Advances one generation if running and returns every queued event.
    pub fn tick(&mut self) -> Vec<SimulationEvent> {
        if self.state == RunState::Running {
            self.advance();
        }
        self.take_events()
    }

    /// [`SimulationEngine::tick`], delivering to `sink`. Consumer failures are
    /// logged and never interrupt the simulation.
    pub fn tick_into<S: EventSink + ?Sized>(&mut self, sink: &mut S) {
        for event in self.tick() {
            deliver(sink, &event);
        }
    }

    fn advance(&mut self) {
        if self.generation_cap.reached(self.generation) {
            log::info!("universe lived long enough at generation {}", self.generation);
            self.genesis(None, ReseedReason::GenerationCap);
        }
        let next = match &self.grid {
            Some(grid) => grid.step(),
            None => {
                self.genesis(None, ReseedReason::Initial);
                return;
            }
        };
        self.generation += 1;
        let fingerprint = next.fingerprint();

        if self.reseed_on_extinction && next.is_empty() {
            log::info!("universe died at generation {}", self.generation);
            self.genesis(None, ReseedReason::Extinction);
            return;
        }

        if self.history.contains(&fingerprint) {
            self.cycle_count += 1;
            if self.max_cycles != 0 && self.cycle_count > self.max_cycles {
                self.settle(next, &fingerprint);
                return;
            }
        }

        // Genesis recorded the seed; every stepped state follows it.
        self.history.push(fingerprint.clone());
        log::trace!("generation {} id {fingerprint}", self.generation);
        self.pending.push(SimulationEvent::GenerationAdvanced {
            generation: self.generation,
            live_cells: next.live_cells(),
            fingerprint,
        });
        self.grid = Some(next);
    }

    /// The universe has repeated more than `max_cycles` times.
    fn settle(&mut self, next: Grid, fingerprint: &Fingerprint) {
        if !fingerprint.is_zero() {
            let period = self.history.period_of(fingerprint);
            log::info!("oscillator period {period} at generation {}", self.generation);
            self.pending.push(SimulationEvent::CycleDetected {
                generation: self.generation,
                period,
                start_fingerprint: self.start_fingerprint.clone(),
            });
        }
        self.grid = Some(next);
        if self.auto_restart {
            self.genesis(None, ReseedReason::CycleLimit);
        } else {
            self.state = RunState::Paused;
            log::info!("universe settled at generation {}, pausing", self.generation);
        }
    }

    fn genesis(&mut self, pattern: Option<Grid>, reason: ReseedReason) {
        self.history.clear();
        self.generation = 1;
        self.cycle_count = 0;
        let grid = pattern.unwrap_or_else(|| Grid::create(self.width, self.height, self.fill_percent, &mut self.rng));
        self.start_fingerprint = grid.fingerprint();
        self.history.push(self.start_fingerprint.clone());
        log::info!(
            "genesis ({reason:?}): {} live cells, id {}",
            grid.population(),
            self.start_fingerprint
        );
        self.grid = Some(grid);
        self.pending.push(SimulationEvent::Reseeded {
            generation: 1,
            reason,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::{self, BLINKER, BLOCK};

    fn config() -> EngineConfig {
        EngineConfig {
            seed: Some(1),
            max_cycles: 2,
            ..Default::default()
        }
    }

    fn engine() -> SimulationEngine {
        SimulationEngine::new(&config()).unwrap()
    }

    fn block() -> Vec<Vec<bool>> {
        patterns::place(16, 16, BLOCK.cells, (4, 4))
    }

    #[test]
    fn test_new_rejects_bad_config() {
        let config = EngineConfig {
            history_capacity: 0,
            ..Default::default()
        };
        assert!(SimulationEngine::new(&config).is_err());
    }

    #[test]
    fn test_start_performs_initial_genesis() {
        let mut engine = engine();
        assert_eq!(engine.state(), RunState::Stopped);
        assert!(engine.grid().is_none());
        engine.start();
        assert_eq!(engine.state(), RunState::Running);
        assert_eq!(engine.generation(), 1);
        assert_eq!(engine.history().len(), 1);
        assert_eq!(
            engine.take_events(),
            vec![SimulationEvent::Reseeded {
                generation: 1,
                reason: ReseedReason::Initial
            }]
        );
    }

    #[test]
    fn test_tick_does_nothing_unless_running() {
        let mut engine = engine();
        assert!(engine.tick().is_empty());
        engine.start();
        engine.pause();
        engine.take_events();
        assert!(engine.tick().is_empty());
        assert_eq!(engine.generation(), 1);
    }

    #[test]
    fn test_pause_resume_without_tick_changes_nothing() {
        let mut engine = engine();
        engine.start();
        engine.tick();
        let (generation, grid) = (engine.generation(), engine.grid().cloned());
        engine.pause();
        engine.resume();
        assert_eq!(engine.state(), RunState::Running);
        assert_eq!(engine.generation(), generation);
        assert_eq!(engine.grid().cloned(), grid);
    }

    #[test]
    fn test_genesis_emits_no_generation_event() {
        let mut engine = engine();
        engine.start();
        engine.seed(&block()).unwrap();
        let events = engine.take_events();
        assert!(events
            .iter()
            .all(|event| matches!(event, SimulationEvent::Reseeded { .. })));
        assert_eq!(
            events.last(),
            Some(&SimulationEvent::Reseeded {
                generation: 1,
                reason: ReseedReason::Injected
            })
        );
    }

    #[test]
    fn test_seed_rejects_mismatched_pattern() {
        let mut engine = engine();
        engine.start();
        engine.tick();
        let before = engine.status();
        assert!(engine.seed(&[vec![true; 3]]).is_err());
        assert_eq!(engine.status(), before);
    }

    #[test]
    fn test_seed_while_paused_resumes() {
        let mut engine = engine();
        engine.start();
        engine.pause();
        engine.seed(&block()).unwrap();
        assert_eq!(engine.state(), RunState::Running);
        assert_eq!(engine.generation(), 1);
        assert_eq!(engine.cycle_count(), 0);
        assert_eq!(engine.history().len(), 1);
    }

    #[test]
    fn test_seed_while_stopped_is_staged() {
        let mut engine = engine();
        engine.seed(&block()).unwrap();
        assert_eq!(engine.state(), RunState::Stopped);
        engine.start();
        assert_eq!(engine.grid().map(Grid::population), Some(4));
    }

    #[test]
    fn test_still_life_settles_with_period_one() {
        let mut engine = engine();
        engine.seed(&block()).unwrap();
        engine.start();
        engine.take_events();

        let mut cycles = Vec::new();
        for _ in 0..3 {
            for event in engine.tick() {
                if let SimulationEvent::CycleDetected { period, .. } = event {
                    cycles.push(period);
                }
            }
        }
        assert_eq!(cycles, vec![1]);
        assert_eq!(engine.cycle_count(), 3);
        assert_eq!(engine.state(), RunState::Paused);
    }

    #[test]
    fn test_blinker_auto_restart() {
        let mut engine = engine();
        engine.set_auto_restart(true);
        engine.seed(&patterns::place(16, 16, BLINKER.cells, (6, 6))).unwrap();
        engine.start();
        engine.take_events();

        let mut events = Vec::new();
        for _ in 0..4 {
            events.extend(engine.tick());
        }
        assert!(events.contains(&SimulationEvent::Reseeded {
            generation: 1,
            reason: ReseedReason::CycleLimit
        }));
        assert!(events
            .iter()
            .any(|event| matches!(event, SimulationEvent::CycleDetected { period: 2, .. })));
        assert_eq!(engine.state(), RunState::Running);
        assert_eq!(engine.generation(), 1);
    }

    #[test]
    fn test_generation_cap_reseeds_before_step() {
        let mut engine = engine();
        engine.set_max_cycles(0);
        engine.set_generation_cap(GenerationCap::Limit(3));
        engine.seed(&block()).unwrap();
        engine.start();
        engine.take_events();
        engine.tick();
        engine.tick();
        assert_eq!(engine.generation(), 3);
        let events = engine.tick();
        assert_eq!(
            events.first(),
            Some(&SimulationEvent::Reseeded {
                generation: 1,
                reason: ReseedReason::GenerationCap
            })
        );
        assert!(matches!(
            events.last(),
            Some(SimulationEvent::GenerationAdvanced { generation: 2, .. })
        ));
    }

    #[test]
    fn test_extinction_reseed() {
        let mut engine = SimulationEngine::new(&EngineConfig {
            reseed_on_extinction: true,
            seed: Some(3),
            ..Default::default()
        })
        .unwrap();
        engine.seed(&patterns::place(16, 16, &[(0, 0)], (0, 0))).unwrap();
        engine.start();
        engine.take_events();
        assert_eq!(
            engine.tick(),
            vec![SimulationEvent::Reseeded {
                generation: 1,
                reason: ReseedReason::Extinction
            }]
        );
    }

    #[test]
    fn test_zero_max_cycles_never_settles() {
        let mut engine = engine();
        engine.set_max_cycles(0);
        engine.seed(&block()).unwrap();
        engine.start();
        for _ in 0..50 {
            engine.tick();
        }
        assert_eq!(engine.state(), RunState::Running);
        assert_eq!(engine.generation(), 51);
        assert!(engine.history().len() <= engine.history().capacity());
    }

    #[test]
    fn test_tick_delay_setter_is_clamped() {
        let mut engine = engine();
        engine.set_tick_delay(Duration::MAX);
        assert_eq!(engine.tick_delay(), Duration::from_secs_f64(MAX_TICK_DELAY_SECS));
        engine.set_tick_delay(Duration::from_millis(5));
        assert_eq!(engine.tick_delay(), Duration::from_millis(5));
    }

    #[test]
    fn test_stop_keeps_universe_for_restart() {
        let mut engine = engine();
        engine.start();
        engine.tick();
        let grid = engine.grid().cloned();
        engine.stop();
        engine.start();
        assert_eq!(engine.grid().cloned(), grid);
        assert_eq!(engine.generation(), 2);
    }
}
