use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    /// Final byte of an ANSI cursor sequence (`ESC [ A..D`).
    pub fn from_arrow_byte(byte: u8) -> Option<Self> {
        match byte {
            b'A' => Some(Self::Up),
            b'B' => Some(Self::Down),
            b'C' => Some(Self::Right),
            b'D' => Some(Self::Left),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Intent {
    Move(Direction),
    Quit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Cell {
    Wall,
    Pellet,
    PowerPellet,
    Blank,
}

impl Cell {
    pub fn from_maze_char(value: char) -> Self {
        match value {
            '#' => Self::Wall,
            '.' => Self::Pellet,
            'X' => Self::PowerPellet,
            _ => Self::Blank,
        }
    }

    pub fn is_wall(self) -> bool {
        self == Self::Wall
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Normal,
    Vulnerable,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Win,
    Loss,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct EnemyView {
    pub position: Position,
    pub mode: Mode,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuntimeEvent {
    PelletEaten {
        row: usize,
        col: usize,
    },
    PowerPelletEaten {
        row: usize,
        col: usize,
    },
    PlayerCaught {
        enemy: usize,
        #[serde(rename = "livesLeft")]
        lives_left: u32,
    },
    EnemyCaught {
        enemy: usize,
    },
    QuitRequested,
}

#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    pub grid: Vec<Vec<Cell>>,
    pub player: Position,
    pub enemies: Vec<EnemyView>,
    pub score: u32,
    pub lives: u32,
    #[serde(rename = "pelletsLeft")]
    pub pellets_left: usize,
    #[serde(rename = "powerActive")]
    pub power_active: bool,
    pub events: Vec<RuntimeEvent>,
}

#[derive(Clone, Debug, Serialize)]
pub struct GameSummary {
    pub outcome: Outcome,
    pub ticks: u64,
    pub score: u32,
    pub lives: u32,
    #[serde(rename = "pelletsLeft")]
    pub pellets_left: usize,
}
