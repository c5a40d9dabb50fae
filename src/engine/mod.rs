use std::io;
use std::time::Duration;

use serde_json::json;
use tokio::sync::mpsc;

use crate::constants::{
    DEATH_PAUSE_MS, DEFAULT_POWER_DURATION_SECS, ENEMY_STEP_DELAY_MS, PELLET_SCORE,
    POWER_PELLET_SCORE, STARTING_LIVES, TICK_MS,
};
use crate::entities::{enemy_views, set_all_modes, shared_enemies, Actor, SharedEnemies};
use crate::logging;
use crate::maze::{Grid, LoadedMaze};
use crate::power::PowerController;
use crate::render::Renderer;
use crate::rng::Rng;
use crate::types::{
    Cell, Direction, GameSummary, Intent, Mode, Outcome, Position, RuntimeEvent, Snapshot,
};

mod collision_system;
mod movement_system;
mod utils;

use self::utils::pick_enemy_direction;

#[derive(Clone, Debug)]
pub struct EngineOptions {
    pub tick_interval: Duration,
    pub enemy_step_delay: Duration,
    pub death_pause: Duration,
    pub power_duration: Duration,
    pub seed: Option<u32>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(TICK_MS),
            enemy_step_delay: Duration::from_millis(ENEMY_STEP_DELAY_MS),
            death_pause: Duration::from_millis(DEATH_PAUSE_MS),
            power_duration: Duration::from_secs(DEFAULT_POWER_DURATION_SECS),
            seed: None,
        }
    }
}

impl EngineOptions {
    /// No pacing sleeps at all; used by headless runs.
    pub fn unpaced(power_duration: Duration, seed: u32) -> Self {
        Self {
            tick_interval: Duration::ZERO,
            enemy_step_delay: Duration::ZERO,
            death_pause: Duration::ZERO,
            power_duration,
            seed: Some(seed),
        }
    }
}

/// The tick engine. Owns the grid, the player, score, lives and the pellet
/// count outright; enemies are shared with the power controller.
pub struct GameEngine {
    grid: Grid,
    player: Actor,
    enemies: SharedEnemies,
    power: PowerController,
    intents: mpsc::Receiver<Intent>,
    rng: Rng,
    options: EngineOptions,

    score: u32,
    lives: u32,
    pellets_left: usize,
    tick_counter: u64,
    events: Vec<RuntimeEvent>,
}

impl GameEngine {
    pub fn new(maze: LoadedMaze, intents: mpsc::Receiver<Intent>, options: EngineOptions) -> Self {
        let enemies = shared_enemies(&maze.enemy_spawns);
        let power = PowerController::new(enemies.clone(), options.power_duration);
        let rng = options.seed.map(Rng::new).unwrap_or_else(Rng::from_entropy);
        Self {
            grid: maze.grid,
            player: Actor::at_spawn(maze.player_spawn),
            enemies,
            power,
            intents,
            rng,
            options,
            score: 0,
            lives: STARTING_LIVES,
            pellets_left: maze.pellets,
            tick_counter: 0,
            events: Vec::new(),
        }
    }

    pub fn power(&self) -> &PowerController {
        &self.power
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn player_position(&self) -> Position {
        self.player.position
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn lives(&self) -> u32 {
        self.lives
    }

    pub fn pellets_left(&self) -> usize {
        self.pellets_left
    }

    pub fn tick(&self) -> u64 {
        self.tick_counter
    }

    /// Pellets running out wins even if the last life went in the same tick.
    pub fn outcome(&self) -> Option<Outcome> {
        if self.pellets_left == 0 {
            Some(Outcome::Win)
        } else if self.lives == 0 {
            Some(Outcome::Loss)
        } else {
            None
        }
    }

    /// Runs ticks until the game is decided, then renders the outcome.
    pub async fn run<R>(&mut self, renderer: &mut R) -> io::Result<GameSummary>
    where
        R: Renderer + ?Sized,
    {
        logging::info(
            "game_started",
            json!({
                "rows": self.grid.rows(),
                "cols": self.grid.cols(),
                "enemies": self.enemies.read().await.len(),
                "pellets": self.pellets_left,
                "powerDurationMs": self.power.duration().as_millis() as u64,
            }),
        );

        let played = self.play(renderer).await;
        self.power.shutdown().await;
        let outcome = played?;

        let snapshot = self.build_snapshot(false).await;
        renderer.render_outcome(&snapshot, outcome)?;

        let summary = self.build_summary(outcome);
        logging::info(
            "game_finished",
            json!({
                "outcome": summary.outcome,
                "ticks": summary.ticks,
                "score": summary.score,
                "lives": summary.lives,
                "pelletsLeft": summary.pellets_left,
            }),
        );
        Ok(summary)
    }

    async fn play<R>(&mut self, renderer: &mut R) -> io::Result<Outcome>
    where
        R: Renderer + ?Sized,
    {
        loop {
            if let Some(outcome) = self.outcome() {
                return Ok(outcome);
            }
            if let Some(outcome) = self.step(renderer).await? {
                return Ok(outcome);
            }
            if !self.options.tick_interval.is_zero() {
                tokio::time::sleep(self.options.tick_interval).await;
            }
        }
    }

    /// One tick: drain at most one intent, move the player, move every enemy,
    /// resolve collisions, then hand a snapshot to the renderer.
    pub async fn step<R>(&mut self, renderer: &mut R) -> io::Result<Option<Outcome>>
    where
        R: Renderer + ?Sized,
    {
        self.tick_counter += 1;

        let dir = self.drain_intent();
        self.advance_player(dir).await;
        self.advance_enemies().await;
        self.resolve_collisions(renderer).await?;

        let snapshot = self.build_snapshot(true).await;
        renderer.render(&snapshot)?;
        Ok(self.outcome())
    }

    fn drain_intent(&mut self) -> Option<Direction> {
        match self.intents.try_recv() {
            Ok(Intent::Move(dir)) => Some(dir),
            Ok(Intent::Quit) => {
                self.lives = 0;
                self.events.push(RuntimeEvent::QuitRequested);
                None
            }
            Err(_) => None,
        }
    }

    pub async fn build_snapshot(&mut self, drain_events: bool) -> Snapshot {
        let power_active = self.power.is_active().await;
        let enemies = enemy_views(&self.enemies).await;
        let events = if drain_events {
            std::mem::take(&mut self.events)
        } else {
            self.events.clone()
        };
        Snapshot {
            tick: self.tick_counter,
            grid: self.grid.cells().to_vec(),
            player: self.player.position,
            enemies,
            score: self.score,
            lives: self.lives,
            pellets_left: self.pellets_left,
            power_active,
            events,
        }
    }

    pub fn build_summary(&self, outcome: Outcome) -> GameSummary {
        GameSummary {
            outcome,
            ticks: self.tick_counter,
            score: self.score,
            lives: self.lives,
            pellets_left: self.pellets_left,
        }
    }
}
