//! lot-demo: traditional vs congestion-aware A* on the reference lot.
//!
//! Admits the same 20 agents, in the same order, to the same shuffled
//! spaces under both cost modes (the two runs execute in parallel), then
//! compares the mean travel time of the first and last ten admissions.
//!
//! ```text
//! cargo run -p lot-demo --release                 # built-in config
//! cargo run -p lot-demo --release -- run.json     # SimConfig as JSON
//! RUST_LOG=lot_motion=debug cargo run -p lot-demo # per-agent detail
//! ```

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use lot_core::{AgentClass, AgentId, CostMode, ObstructionSpec, Pos, SimConfig, SimRng};
use lot_grid::{CellKind, GridBuilder};
use lot_motion::TravelRecord;
use lot_output::{AssignmentLog, CohortMetric, cohort_average, render, write_completion_stats};
use lot_planner::AStarPlanner;
use lot_sim::SimBuilder;

// ── Constants ─────────────────────────────────────────────────────────────────

const AGENT_COUNT:          usize = 20;
const COHORT:               usize = 10;
const ADMIT_INTERVAL_TICKS: u32   = 2;
const SETTLE_LIMIT_TICKS:   u32   = 2_000;
const OUTPUT_DIR:           &str  = "output";

// ── Config ────────────────────────────────────────────────────────────────────

fn default_config() -> SimConfig {
    SimConfig {
        tick_quantum_ms: 50,
        entrance: Pos::new(0, 4),
        exit: Pos::new(0, 4),
        // One random closure part-way through the admission sequence.
        obstructions: vec![ObstructionSpec { delay_ticks: 25, cell: None }],
        ..SimConfig::default()
    }
}

fn load_config() -> Result<SimConfig> {
    let Some(path) = std::env::args().nth(1) else {
        return Ok(default_config());
    };
    let text = fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
    let config: SimConfig =
        serde_json::from_str(&text).with_context(|| format!("parsing {path}"))?;
    info!(%path, "loaded config");
    Ok(config)
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .with_target(false)
        .init();
}

// ── One run ───────────────────────────────────────────────────────────────────

struct RunSummary {
    mode:       CostMode,
    records:    Vec<TravelRecord>,
    unsolvable: Vec<AgentId>,
    settled:    bool,
    final_grid: String,
}

fn run(mode: CostMode, base: &SimConfig, log: Arc<AssignmentLog>) -> Result<RunSummary> {
    let config = SimConfig { cost_mode: mode, ..base.clone() };
    let quantum = config.tick_quantum();

    // Same seed in both modes → same spaces and classes.
    let grid = GridBuilder::reference_lot();
    let mut rng = SimRng::new(config.seed);
    let mut spaces = grid.positions_of(CellKind::ParkingSpace);
    rng.shuffle(&mut spaces);
    let classes: Vec<AgentClass> = (0..AGENT_COUNT)
        .map(|_| if rng.gen_bool(0.5) { AgentClass::Privileged } else { AgentClass::Exempt })
        .collect();

    let mut sim = SimBuilder::new(config, grid, AStarPlanner::new(mode))
        .observer(log)
        .build()?;

    for (i, (&space, &class)) in spaces.iter().zip(&classes).enumerate() {
        let agent = AgentId(i as u32);
        if let Err(e) = sim.admit_agent(space, agent, class) {
            warn!(%agent, %space, mode = mode.as_str(), "not admitted: {e}");
        }
        thread::sleep(quantum * ADMIT_INTERVAL_TICKS);
    }

    let settled = sim.wait_settled(quantum * SETTLE_LIMIT_TICKS);
    if !settled {
        warn!(mode = mode.as_str(), active = sim.active_agents(), "run did not settle");
    }
    let summary = RunSummary {
        mode,
        records: sim.travel_records(),
        unsolvable: sim.unsolvable_agents(),
        settled,
        final_grid: render(&sim.snapshot()),
    };
    sim.shutdown();
    Ok(summary)
}

// ── Report ────────────────────────────────────────────────────────────────────

fn print_comparison(runs: &[&RunSummary]) {
    let front = 0..COHORT;
    let back = COHORT..AGENT_COUNT;
    println!();
    println!(
        "{:<18} {:>9} {:>9} {:>9} {:>9} {:>6} {:>11}",
        "mode", "front", "back", "front-dly", "back-dly", "done", "unsolvable"
    );
    for run in runs {
        let r = &run.records;
        println!(
            "{:<18} {:>9.2} {:>9.2} {:>9.2} {:>9.2} {:>6} {:>11}{}",
            run.mode.as_str(),
            cohort_average(r, front.clone(), CohortMetric::Elapsed),
            cohort_average(r, back.clone(), CohortMetric::Elapsed),
            cohort_average(r, front.clone(), CohortMetric::Delay),
            cohort_average(r, back.clone(), CohortMetric::Delay),
            r.len(),
            run.unsolvable.len(),
            if run.settled { "" } else { "  (timed out)" },
        );
    }
    println!(
        "(front/back = mean ticks for admissions 0-{} / {}-{})",
        COHORT - 1,
        COHORT,
        AGENT_COUNT - 1
    );
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    init_logging();
    let config = load_config()?;
    config.validate()?;

    println!("=== lot-demo: congestion-aware parking ===");
    println!(
        "Agents: {AGENT_COUNT}  |  Seed: {}  |  Tick: {} ms  |  Closures: {}",
        config.seed,
        config.tick_quantum_ms,
        config.obstructions.len()
    );

    let out = Path::new(OUTPUT_DIR);
    fs::create_dir_all(out).with_context(|| format!("creating {OUTPUT_DIR}/"))?;

    // Open both logs up front so only the first writes the header.
    let stamp = SystemTime::now().duration_since(UNIX_EPOCH).map_or(0, |d| d.as_secs());
    let log_path = out.join("assignments.csv");
    let trad_log = Arc::new(AssignmentLog::open(&log_path, format!("{stamp}-traditional"))?);
    let aware_log = Arc::new(AssignmentLog::open(&log_path, format!("{stamp}-congestion-aware"))?);

    let t0 = Instant::now();
    let (trad, aware) = rayon::join(
        || run(CostMode::Traditional, &config, trad_log.clone()),
        || run(CostMode::CongestionAware, &config, aware_log.clone()),
    );
    let (trad, aware) = (trad?, aware?);
    println!("Both runs finished in {:.2?}", t0.elapsed());

    for (log, name) in [(&trad_log, "traditional"), (&aware_log, "congestion-aware")] {
        if let Some(e) = log.take_error() {
            eprintln!("assignment log ({name}): {e}");
        }
    }
    for run in [&trad, &aware] {
        let path = out.join(format!("completion_{}.csv", run.mode.as_str()));
        write_completion_stats(&path, &run.records)?;
        println!("Wrote {}", path.display());
    }

    print_comparison(&[&trad, &aware]);
    println!();
    println!("Final congestion-aware lot:");
    print!("{}", aware.final_grid);
    Ok(())
}
