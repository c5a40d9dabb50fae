use crate::types::Direction;

pub const TICK_MS: u64 = 200;
pub const DEATH_PAUSE_MS: u64 = 3_000;
pub const ENEMY_STEP_DELAY_MS: u64 = 25;
pub const DEFAULT_POWER_DURATION_SECS: u64 = 10;

pub const STARTING_LIVES: u32 = 3;
pub const MIN_ENEMIES: usize = 1;
pub const MAX_ENEMIES: usize = 12;

pub const PELLET_SCORE: u32 = 1;
pub const POWER_PELLET_SCORE: u32 = 10;

pub const INPUT_CHANNEL_CAPACITY: usize = 1;
pub const INPUT_BUFFER_LEN: usize = 100;

pub const DEFAULT_CONFIG_FILE: &str = "assets/config.json";
pub const DEFAULT_MAZE_FILE: &str = "assets/maze01.txt";

/// Up-biased enemy direction table: every direction is possible, Up is most likely.
pub const ENEMY_DIRECTION_WEIGHTS: [(Direction, u32); 4] = [
    (Direction::Up, 5),
    (Direction::Down, 3),
    (Direction::Right, 3),
    (Direction::Left, 3),
];
