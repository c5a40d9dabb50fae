use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid configuration in {}: {source}", .path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("maze is empty")]
    EmptyMaze,
    #[error("maze row {row} has {found} columns, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("maze has no player spawn ('P')")]
    MissingPlayer,
    #[error("maze has no enemy spawn ('G')")]
    MissingEnemies,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnemyCountError {
    #[error("enemy count must be a whole number, got {0:?}")]
    NotANumber(String),
    #[error("enemy count must be between 1 and 12, got {0}")]
    OutOfRange(i64),
}
