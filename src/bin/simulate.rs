use chrono::Utc;
use clap::Parser;
use maze_chase::constants::{DEFAULT_MAZE_FILE, STARTING_LIVES};
use maze_chase::engine::{EngineOptions, GameEngine};
use maze_chase::input::input_channel;
use maze_chase::logging::{self, LogSink};
use maze_chase::maze::{load_maze, LoadedMaze};
use maze_chase::render::Renderer;
use maze_chase::rng::Rng;
use maze_chase::types::{Cell, Direction, Intent, Outcome, Position, RuntimeEvent, Snapshot};
use serde::Serialize;
use serde_json::json;
use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[arg(long, default_value = DEFAULT_MAZE_FILE)]
    maze_file: PathBuf,
    #[arg(long, default_value_t = 4)]
    enemies: usize,
    #[arg(long)]
    seed: Option<u32>,
    #[arg(long, default_value_t = 3)]
    runs: u32,
    /// Power mode length for headless runs, in milliseconds.
    #[arg(long, default_value_t = 40)]
    power_ms: u64,
    #[arg(long, default_value_t = 20_000)]
    max_ticks: u64,
    #[arg(long)]
    match_id: Option<String>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
}

#[derive(Clone, Debug, Serialize)]
struct Scenario {
    name: String,
    seed: u32,
    enemies: usize,
    #[serde(rename = "powerMs")]
    power_ms: u64,
    #[serde(rename = "maxTicks")]
    max_ticks: u64,
}

#[derive(Clone, Debug, Serialize)]
struct ScenarioResultLine {
    scenario: String,
    seed: u32,
    enemies: usize,
    outcome: Option<Outcome>,
    ticks: u64,
    score: u32,
    #[serde(rename = "livesLeft")]
    lives_left: u32,
    #[serde(rename = "pelletsLeft")]
    pellets_left: usize,
    #[serde(rename = "pelletsEaten")]
    pellets_eaten: u32,
    #[serde(rename = "powerPellets")]
    power_pellets: u32,
    #[serde(rename = "enemiesCaught")]
    enemies_caught: u32,
    deaths: u32,
    anomalies: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
struct AnomalyRecord {
    tick: u64,
    message: String,
}

#[derive(Clone, Debug)]
struct ScenarioRunResult {
    result: ScenarioResultLine,
    anomaly_records: Vec<AnomalyRecord>,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    #[serde(rename = "matchId")]
    match_id: String,
    #[serde(rename = "startedAtMs")]
    started_at_ms: u64,
    #[serde(rename = "finishedAtMs")]
    finished_at_ms: u64,
    #[serde(rename = "scenarioCount")]
    scenario_count: usize,
    #[serde(rename = "anomalyCount")]
    anomaly_count: usize,
    #[serde(rename = "averageTicks")]
    average_ticks: u64,
    #[serde(rename = "outcomeCounts")]
    outcome_counts: BTreeMap<String, usize>,
    scenarios: Vec<ScenarioResultLine>,
}

/// Keeps the most recent frame so the run loop can inspect it after each tick.
#[derive(Default)]
struct SnapshotRecorder {
    last: Option<Snapshot>,
    deaths_drawn: u32,
}

impl Renderer for SnapshotRecorder {
    fn render(&mut self, snapshot: &Snapshot) -> io::Result<()> {
        self.last = Some(snapshot.clone());
        Ok(())
    }

    fn render_death(&mut self, _at: Position, _lives_left: u32) -> io::Result<()> {
        self.deaths_drawn += 1;
        Ok(())
    }

    fn render_restart(&mut self, _seconds_left: u64) -> io::Result<()> {
        Ok(())
    }

    fn render_outcome(&mut self, _snapshot: &Snapshot, _outcome: Outcome) -> io::Result<()> {
        Ok(())
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(LogSink::Stderr);

    let scenarios = resolve_scenarios(&cli);
    let run_started_at_ms = now_ms();
    let seed_hint = scenarios.first().map(|scenario| scenario.seed).unwrap_or(0);
    let match_id = cli
        .match_id
        .clone()
        .unwrap_or_else(|| default_match_id(seed_hint, run_started_at_ms));

    let mut has_anomaly = false;
    let mut scenario_results = Vec::new();
    let mut outcome_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut total_ticks = 0u64;
    let mut total_anomalies = 0usize;

    for scenario in scenarios {
        logging::info(
            "scenario_started",
            json!({
                "matchId": match_id,
                "scenario": scenario.name,
                "seed": scenario.seed,
                "enemies": scenario.enemies,
                "powerMs": scenario.power_ms,
            }),
        );

        let maze = match load_maze(&cli.maze_file, scenario.enemies) {
            Ok(maze) => maze,
            Err(error) => {
                logging::error(
                    "load_failed",
                    json!({ "matchId": match_id, "error": error.to_string() }),
                );
                return ExitCode::from(2);
            }
        };

        let scenario_run = match run_scenario(&scenario, maze).await {
            Ok(run) => run,
            Err(error) => {
                logging::error(
                    "scenario_failed",
                    json!({
                        "matchId": match_id,
                        "scenario": scenario.name,
                        "error": error.to_string(),
                    }),
                );
                return ExitCode::from(2);
            }
        };

        for anomaly in &scenario_run.anomaly_records {
            logging::warn(
                "anomaly_detected",
                json!({
                    "matchId": match_id,
                    "scenario": scenario.name,
                    "seed": scenario.seed,
                    "tick": anomaly.tick,
                    "message": anomaly.message,
                }),
            );
        }

        if !scenario_run.result.anomalies.is_empty() {
            has_anomaly = true;
        }
        total_anomalies += scenario_run.anomaly_records.len();
        total_ticks += scenario_run.result.ticks;
        *outcome_counts
            .entry(outcome_key(scenario_run.result.outcome))
            .or_insert(0) += 1;

        logging::info(
            "scenario_finished",
            json!({
                "matchId": match_id,
                "scenario": scenario.name,
                "seed": scenario.seed,
                "outcome": scenario_run.result.outcome,
                "ticks": scenario_run.result.ticks,
                "anomalyCount": scenario_run.anomaly_records.len(),
            }),
        );

        match serde_json::to_string(&scenario_run.result) {
            Ok(line) => println!("{line}"),
            Err(error) => {
                logging::error("result_serialize_failed", json!({ "error": error.to_string() }));
                return ExitCode::from(2);
            }
        }
        scenario_results.push(scenario_run.result);
    }

    let summary = build_run_summary(
        match_id.clone(),
        run_started_at_ms,
        now_ms(),
        scenario_results,
        outcome_counts,
        total_anomalies,
        total_ticks,
    );

    let mut summary_out_written: Option<String> = None;
    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(error) = write_summary(path, &summary) {
            logging::error(
                "summary_write_failed",
                json!({
                    "matchId": match_id,
                    "path": path.to_string_lossy(),
                    "error": error.to_string(),
                }),
            );
            return ExitCode::from(2);
        }
        summary_out_written = Some(path.to_string_lossy().to_string());
    }

    logging::info(
        "run_finished",
        json!({
            "matchId": match_id,
            "scenarioCount": summary.scenario_count,
            "anomalyCount": summary.anomaly_count,
            "averageTicks": summary.average_ticks,
            "outcomeCounts": summary.outcome_counts,
            "summaryOut": summary_out_written,
        }),
    );

    if has_anomaly {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Plays one game to completion with an autopilot offering a random move
/// every tick. A full slot just drops the offer, as a held key would.
async fn run_scenario(scenario: &Scenario, maze: LoadedMaze) -> io::Result<ScenarioRunResult> {
    let (sender, receiver) = input_channel();
    let options = EngineOptions::unpaced(Duration::from_millis(scenario.power_ms), scenario.seed);
    let mut engine = GameEngine::new(maze, receiver, options);
    let mut autopilot = Rng::new(scenario.seed ^ 0x9e37_79b9);
    let mut recorder = SnapshotRecorder::default();

    let mut pellets_eaten = 0;
    let mut power_pellets = 0;
    let mut enemies_caught = 0;
    let mut deaths = 0;
    let mut anomalies = Vec::new();
    let mut anomaly_records = Vec::new();
    let mut anomaly_seen = HashSet::new();
    let mut previous: Option<Snapshot> = None;

    let outcome = loop {
        if let Some(outcome) = engine.outcome() {
            break Some(outcome);
        }
        if engine.tick() >= scenario.max_ticks {
            push_anomaly(
                &mut anomalies,
                &mut anomaly_records,
                &mut anomaly_seen,
                engine.tick(),
                "tick safety limit exceeded".to_string(),
            );
            break None;
        }

        let dir = Direction::ALL[autopilot.below(4) as usize];
        let _ = sender.try_send(Intent::Move(dir));
        let decided = engine.step(&mut recorder).await?;

        if let Some(snapshot) = recorder.last.take() {
            for message in collect_snapshot_anomalies(&snapshot, previous.as_ref()) {
                push_anomaly(
                    &mut anomalies,
                    &mut anomaly_records,
                    &mut anomaly_seen,
                    snapshot.tick,
                    message,
                );
            }
            for event in &snapshot.events {
                match event {
                    RuntimeEvent::PelletEaten { .. } => pellets_eaten += 1,
                    RuntimeEvent::PowerPelletEaten { .. } => power_pellets += 1,
                    RuntimeEvent::EnemyCaught { .. } => enemies_caught += 1,
                    RuntimeEvent::PlayerCaught { .. } => deaths += 1,
                    RuntimeEvent::QuitRequested => {}
                }
            }
            previous = Some(snapshot);
        }

        if let Some(outcome) = decided {
            break Some(outcome);
        }
        // Let the power countdown task observe time passing between ticks.
        tokio::task::yield_now().await;
    };
    engine.power().shutdown().await;

    let final_tick = engine.tick();
    if recorder.deaths_drawn + u32::from(engine.lives() == 0 && deaths > 0) != deaths {
        push_anomaly(
            &mut anomalies,
            &mut anomaly_records,
            &mut anomaly_seen,
            final_tick,
            format!(
                "death pauses out of step with catches: {} drawn for {deaths} catches",
                recorder.deaths_drawn
            ),
        );
    }

    Ok(ScenarioRunResult {
        result: ScenarioResultLine {
            scenario: scenario.name.clone(),
            seed: scenario.seed,
            enemies: scenario.enemies,
            outcome,
            ticks: final_tick,
            score: engine.score(),
            lives_left: engine.lives(),
            pellets_left: engine.pellets_left(),
            pellets_eaten,
            power_pellets,
            enemies_caught,
            deaths,
            anomalies,
        },
        anomaly_records,
    })
}

fn collect_snapshot_anomalies(snapshot: &Snapshot, previous: Option<&Snapshot>) -> Vec<String> {
    let mut anomalies = Vec::new();
    let on_wall = |pos: Position| {
        snapshot
            .grid
            .get(pos.row)
            .and_then(|row| row.get(pos.col))
            .map_or(true, |cell| *cell == Cell::Wall)
    };

    if on_wall(snapshot.player) {
        anomalies.push(format!(
            "player off the walkable grid at ({}, {})",
            snapshot.player.row, snapshot.player.col
        ));
    }
    for (idx, enemy) in snapshot.enemies.iter().enumerate() {
        if on_wall(enemy.position) {
            anomalies.push(format!(
                "enemy {idx} off the walkable grid at ({}, {})",
                enemy.position.row, enemy.position.col
            ));
        }
    }
    if snapshot.lives > STARTING_LIVES {
        anomalies.push(format!("lives above starting count: {}", snapshot.lives));
    }

    if let Some(previous) = previous {
        if snapshot.score < previous.score {
            anomalies.push(format!(
                "score decreased: {} -> {}",
                previous.score, snapshot.score
            ));
        }
        if snapshot.pellets_left > previous.pellets_left {
            anomalies.push(format!(
                "pellet count increased: {} -> {}",
                previous.pellets_left, snapshot.pellets_left
            ));
        }
        if snapshot.enemies.len() != previous.enemies.len() {
            anomalies.push(format!(
                "enemy count changed: {} -> {}",
                previous.enemies.len(),
                snapshot.enemies.len()
            ));
        }
    }
    anomalies
}

fn resolve_scenarios(cli: &Cli) -> Vec<Scenario> {
    let seed = cli.seed.unwrap_or_else(rand::random::<u32>);
    (0..cli.runs.max(1))
        .map(|run| Scenario {
            name: format!("autopilot-{}", run + 1),
            seed: seed.wrapping_add(run),
            enemies: cli.enemies,
            power_ms: cli.power_ms,
            max_ticks: cli.max_ticks,
        })
        .collect()
}

fn push_anomaly(
    anomalies: &mut Vec<String>,
    anomaly_records: &mut Vec<AnomalyRecord>,
    anomaly_seen: &mut HashSet<String>,
    tick: u64,
    message: String,
) {
    anomaly_records.push(AnomalyRecord {
        tick,
        message: message.clone(),
    });
    if anomaly_seen.insert(message.clone()) {
        anomalies.push(message);
    }
}

fn default_match_id(seed: u32, timestamp_ms: u64) -> String {
    format!("sim-{seed}-{timestamp_ms}")
}

fn build_run_summary(
    match_id: String,
    started_at_ms: u64,
    finished_at_ms: u64,
    scenarios: Vec<ScenarioResultLine>,
    outcome_counts: BTreeMap<String, usize>,
    anomaly_count: usize,
    total_ticks: u64,
) -> RunSummary {
    let scenario_count = scenarios.len();
    let average_ticks = if scenario_count == 0 {
        0
    } else {
        total_ticks / scenario_count as u64
    };
    RunSummary {
        match_id,
        started_at_ms,
        finished_at_ms,
        scenario_count,
        anomaly_count,
        average_ticks,
        outcome_counts,
        scenarios,
    }
}

fn outcome_key(outcome: Option<Outcome>) -> String {
    match outcome {
        Some(Outcome::Win) => "win",
        Some(Outcome::Loss) => "loss",
        None => "undecided",
    }
    .to_string()
}

fn now_ms() -> u64 {
    u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default()
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary)?;
    std::fs::write(path, summary_text)
}
