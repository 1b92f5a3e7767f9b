use std::path::PathBuf;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use life_engine::events::{EventSink, LogSink};
use life_engine::{patterns, spawn, EngineConfig, SimulationEngine, SimulationEvent};

#[derive(Parser, Debug)]
#[command(author, version, about = "Run the Game of Life engine without a display", long_about = None)]
struct Args {
    /// TOML engine configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Plain-text pattern file to seed instead of a random universe
    #[arg(short, long, conflicts_with = "named")]
    pattern: Option<PathBuf>,

    /// Built-in pattern (block, blinker, glider, toad, beacon), placed at the centre
    #[arg(long)]
    named: Option<String>,

    /// Seconds to run before shutting down
    #[arg(short, long, default_value_t = 10.0)]
    seconds: f64,

    /// Override the generation cap (0 = unlimited)
    #[arg(long)]
    max_generations: Option<u64>,

    /// Reseed settled universes instead of pausing
    #[arg(long)]
    auto_restart: bool,
}

fn load_config(args: &Args) -> anyhow::Result<EngineConfig> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path).with_context(|| format!("load config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(cap) = args.max_generations {
        config.max_generations = (cap > 0).then_some(cap);
    }
    config.auto_restart |= args.auto_restart;
    config.validate().context("validate config")?;
    Ok(config)
}

fn load_pattern(args: &Args, config: &EngineConfig) -> anyhow::Result<Option<Vec<Vec<bool>>>> {
    if let Some(path) = &args.pattern {
        let text = std::fs::read_to_string(path).with_context(|| format!("read pattern {}", path.display()))?;
        let rows = patterns::parse_rows(&text).with_context(|| format!("parse pattern {}", path.display()))?;
        return Ok(Some(rows));
    }
    if let Some(name) = &args.named {
        let pattern = patterns::find(name).with_context(|| format!("unknown pattern {name:?}"))?;
        let offset = ((config.width / 2).saturating_sub(1), (config.height / 2).saturating_sub(1));
        return Ok(Some(patterns::place(config.width, config.height, pattern.cells, offset)));
    }
    Ok(None)
}

fn run_until(start: Instant, seconds: f64) -> anyhow::Result<Instant> {
    let run_for =
        Duration::try_from_secs_f64(seconds.max(0.0)).with_context(|| format!("invalid --seconds {seconds}"))?;
    start
        .checked_add(run_for)
        .with_context(|| format!("--seconds {seconds} is too far in the future"))
}

#[derive(Default)]
struct Summary {
    generations: u64,
    cycles: u64,
    reseeds: u64,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = load_config(&args)?;
    let pattern = load_pattern(&args, &config)?;
    let engine = SimulationEngine::new(&config).context("create engine")?;

    let (tx, rx) = mpsc::channel();
    let sinks: Vec<Box<dyn EventSink + Send>> = vec![Box::new(LogSink), Box::new(tx)];
    let (controller, thread) = spawn(engine, sinks).context("spawn simulation thread")?;

    if let Some(rows) = pattern {
        controller.seed(&rows).context("seed pattern")?;
    }
    controller.start();
    log::info!(
        "running {}x{} universe for {:.1}s (cap {:?})",
        config.width,
        config.height,
        args.seconds,
        config.generation_cap()
    );

    let mut summary = Summary::default();
    let deadline = run_until(Instant::now(), args.seconds)?;
    while let Some(remaining) = deadline.checked_duration_since(Instant::now()) {
        match rx.recv_timeout(remaining) {
            Ok(SimulationEvent::GenerationAdvanced { .. }) => summary.generations += 1,
            Ok(SimulationEvent::CycleDetected { .. }) => summary.cycles += 1,
            Ok(SimulationEvent::Reseeded { .. }) => summary.reseeds += 1,
            Err(mpsc::RecvTimeoutError::Timeout) => break,
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }

    controller.stop();
    let status = controller.status();
    thread.shutdown();

    log::info!(
        "done: {} generations, {} cycles detected, {} reseeds; final generation {} with {} live cells",
        summary.generations,
        summary.cycles,
        summary.reseeds,
        status.generation,
        status.grid.map_or(0, |grid| grid.population())
    );
    Ok(())
}
