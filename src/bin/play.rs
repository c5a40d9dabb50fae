use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use maze_chase::config::{load_config, parse_enemy_count};
use maze_chase::constants::{
    DEATH_PAUSE_MS, DEFAULT_CONFIG_FILE, DEFAULT_MAZE_FILE, ENEMY_STEP_DELAY_MS, TICK_MS,
};
use maze_chase::engine::{EngineOptions, GameEngine};
use maze_chase::input::{input_channel, spawn_input_reader};
use maze_chase::logging::{self, LogSink};
use maze_chase::maze::load_maze;
use maze_chase::render::{TerminalGuard, TerminalRenderer};
use maze_chase::types::Outcome;
use serde_json::json;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config_file: PathBuf,
    #[arg(long, default_value = DEFAULT_MAZE_FILE)]
    maze_file: PathBuf,
    /// Number of enemies (1-12). Prompted for when omitted.
    #[arg(long)]
    enemies: Option<String>,
    #[arg(long)]
    seed: Option<u32>,
    #[arg(long, default_value_t = TICK_MS)]
    tick_ms: u64,
    #[arg(long, default_value_t = ENEMY_STEP_DELAY_MS)]
    enemy_step_ms: u64,
    #[arg(long, default_value_t = DEATH_PAUSE_MS)]
    death_pause_ms: u64,
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let sink = match cli.log_file.as_deref() {
        Some(path) => match LogSink::file(path) {
            Ok(sink) => sink,
            Err(error) => {
                eprintln!("[maze-chase] cannot open log file {}: {error}", path.display());
                return ExitCode::FAILURE;
            }
        },
        None => LogSink::Disabled,
    };
    logging::init(sink);

    let raw_count = match cli.enemies.clone() {
        Some(raw) => raw,
        None => match prompt_enemy_count() {
            Ok(raw) => raw,
            Err(error) => {
                eprintln!("[maze-chase] failed to read enemy count: {error}");
                return ExitCode::FAILURE;
            }
        },
    };
    let enemy_count = match parse_enemy_count(&raw_count) {
        Ok(count) => count,
        Err(error) => {
            eprintln!("[maze-chase] {error}");
            return ExitCode::FAILURE;
        }
    };

    let maze = match load_maze(&cli.maze_file, enemy_count) {
        Ok(maze) => maze,
        Err(error) => {
            logging::error("load_failed", json!({ "error": error.to_string() }));
            eprintln!("[maze-chase] failed to load maze: {error}");
            return ExitCode::FAILURE;
        }
    };
    let config = match load_config(&cli.config_file) {
        Ok(config) => config,
        Err(error) => {
            logging::error("load_failed", json!({ "error": error.to_string() }));
            eprintln!("[maze-chase] failed to load configuration: {error}");
            return ExitCode::FAILURE;
        }
    };

    let options = EngineOptions {
        tick_interval: Duration::from_millis(cli.tick_ms),
        enemy_step_delay: Duration::from_millis(cli.enemy_step_ms),
        death_pause: Duration::from_millis(cli.death_pause_ms),
        power_duration: config.power_duration(),
        seed: cli.seed,
    };

    let guard = match TerminalGuard::enter() {
        Ok(guard) => guard,
        Err(error) => {
            eprintln!("[maze-chase] unable to switch terminal to raw mode: {error}");
            return ExitCode::FAILURE;
        }
    };

    let (sender, receiver) = input_channel();
    if let Err(error) = spawn_input_reader(io::stdin(), sender) {
        drop(guard);
        eprintln!("[maze-chase] failed to start input reader: {error}");
        return ExitCode::FAILURE;
    }

    let mut renderer = TerminalRenderer::new(io::stdout(), config);
    let mut engine = GameEngine::new(maze, receiver, options);
    let result = engine.run(&mut renderer).await;
    drop(guard);

    match result {
        Ok(summary) => {
            let verdict = match summary.outcome {
                Outcome::Win => "You win",
                Outcome::Loss => "Game over",
            };
            println!("{verdict}. Score: {}", summary.score);
            ExitCode::SUCCESS
        }
        Err(error) => {
            logging::error("game_aborted", json!({ "error": error.to_string() }));
            eprintln!("[maze-chase] terminal error: {error}");
            ExitCode::FAILURE
        }
    }
}

fn prompt_enemy_count() -> io::Result<String> {
    let mut stdout = io::stdout();
    writeln!(stdout, "Enter the number of ghosts 1-12:")?;
    stdout.flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line)
}
