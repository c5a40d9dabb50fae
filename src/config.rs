use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::constants::{DEFAULT_POWER_DURATION_SECS, MAX_ENEMIES, MIN_ENEMIES};
use crate::error::{EnemyCountError, LoadError};

/// Display glyphs plus the power-pellet duration, read from a JSON file.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GameConfig {
    pub player: String,
    pub ghost: String,
    pub ghost_blue: String,
    pub wall: String,
    pub dot: String,
    pub pill: String,
    pub death: String,
    pub space: String,
    pub use_emoji: bool,
    #[serde(alias = "pillTime")]
    pub pill_duration_secs: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            player: "P".to_string(),
            ghost: "G".to_string(),
            ghost_blue: "g".to_string(),
            wall: " ".to_string(),
            dot: ".".to_string(),
            pill: "X".to_string(),
            death: "*".to_string(),
            space: " ".to_string(),
            use_emoji: false,
            pill_duration_secs: DEFAULT_POWER_DURATION_SECS,
        }
    }
}

impl GameConfig {
    pub fn power_duration(&self) -> Duration {
        Duration::from_secs(self.pill_duration_secs)
    }
}

pub fn load_config(path: &Path) -> Result<GameConfig, LoadError> {
    let raw = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&raw).map_err(|source| LoadError::Config {
        path: path.to_path_buf(),
        source,
    })
}

pub fn parse_config(raw: &str) -> Result<GameConfig, serde_json::Error> {
    serde_json::from_str(raw)
}

pub fn parse_enemy_count(raw: &str) -> Result<usize, EnemyCountError> {
    let trimmed = raw.trim();
    let value = trimmed
        .parse::<i64>()
        .map_err(|_| EnemyCountError::NotANumber(trimmed.to_string()))?;
    if value < MIN_ENEMIES as i64 || value > MAX_ENEMIES as i64 {
        return Err(EnemyCountError::OutOfRange(value));
    }
    Ok(value as usize)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn full_config_parses() {
        let config = parse_config(
            r#"{
                "player": "😋", "ghost": "👻", "ghost_blue": "💀", "wall": "  ",
                "dot": "•", "pill": "💊", "death": "💥", "space": " ",
                "use_emoji": true, "pill_duration_secs": 7
            }"#,
        )
        .expect("config should parse");
        assert_eq!(config.ghost_blue, "💀");
        assert!(config.use_emoji);
        assert_eq!(config.power_duration(), Duration::from_secs(7));
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config = parse_config(r#"{"player": "@"}"#).expect("config should parse");
        assert_eq!(config.player, "@");
        assert_eq!(config.ghost, GameConfig::default().ghost);
        assert_eq!(config.pill_duration_secs, DEFAULT_POWER_DURATION_SECS);
    }

    #[test]
    fn pill_time_alias_is_accepted() {
        let config = parse_config(r#"{"pillTime": 3}"#).expect("config should parse");
        assert_eq!(config.pill_duration_secs, 3);
    }

    #[test]
    fn malformed_config_is_an_error() {
        assert!(parse_config("{").is_err());
        assert!(parse_config(r#"{"use_emoji": "yes"}"#).is_err());
    }

    #[test]
    fn missing_config_file_reports_path() {
        let err = load_config(Path::new("does/not/exist.json")).expect_err("should fail");
        assert!(matches!(err, LoadError::Io { .. }));
        assert!(err.to_string().contains("does/not/exist.json"));
    }

    #[test]
    fn enemy_count_must_be_integer_in_range() {
        assert_eq!(parse_enemy_count("1"), Ok(1));
        assert_eq!(parse_enemy_count(" 12 \n"), Ok(12));
        assert_eq!(parse_enemy_count("0"), Err(EnemyCountError::OutOfRange(0)));
        assert_eq!(parse_enemy_count("13"), Err(EnemyCountError::OutOfRange(13)));
        assert_eq!(parse_enemy_count("-2"), Err(EnemyCountError::OutOfRange(-2)));
        assert_eq!(
            parse_enemy_count("four"),
            Err(EnemyCountError::NotANumber("four".to_string()))
        );
    }
}
