use std::fs;
use std::path::Path;

use crate::constants::MAX_ENEMIES;
use crate::error::LoadError;
use crate::types::{Cell, Direction, Position};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<Vec<Cell>>,
}

impl Grid {
    pub fn from_rows(cells: Vec<Vec<Cell>>) -> Result<Self, LoadError> {
        let rows = cells.len();
        let cols = cells.first().map(Vec::len).unwrap_or(0);
        if rows == 0 || cols == 0 {
            return Err(LoadError::EmptyMaze);
        }
        if let Some((row, found)) = cells
            .iter()
            .enumerate()
            .map(|(row, line)| (row, line.len()))
            .find(|(_, len)| *len != cols)
        {
            return Err(LoadError::RaggedRow {
                row,
                expected: cols,
                found,
            });
        }
        Ok(Self { rows, cols, cells })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn cell(&self, pos: Position) -> Cell {
        self.cells[pos.row][pos.col]
    }

    pub fn set_cell(&mut self, pos: Position, cell: Cell) {
        self.cells[pos.row][pos.col] = cell;
    }

    pub fn is_walkable(&self, pos: Position) -> bool {
        pos.row < self.rows && pos.col < self.cols && !self.cell(pos).is_wall()
    }

    pub fn cells(&self) -> &[Vec<Cell>] {
        &self.cells
    }

    pub fn count(&self, kind: Cell) -> usize {
        self.cells
            .iter()
            .flat_map(|row| row.iter())
            .filter(|cell| **cell == kind)
            .count()
    }

    /// One step from `pos`, wrapping at every edge of the grid.
    ///
    /// Down wraps to row 0 once it reaches `rows`, so the last row is reachable
    /// from above like every other row. A wall on the candidate cell rejects the
    /// move and `pos` comes back unchanged.
    pub fn resolve_move(&self, pos: Position, dir: Direction) -> Position {
        let candidate = match dir {
            Direction::Up => Position::new(
                pos.row.checked_sub(1).unwrap_or(self.rows - 1),
                pos.col,
            ),
            Direction::Down => {
                let row = pos.row + 1;
                Position::new(if row >= self.rows { 0 } else { row }, pos.col)
            }
            Direction::Right => {
                let col = pos.col + 1;
                Position::new(pos.row, if col >= self.cols { 0 } else { col })
            }
            Direction::Left => Position::new(
                pos.row,
                pos.col.checked_sub(1).unwrap_or(self.cols - 1),
            ),
        };

        if self.cell(candidate).is_wall() {
            pos
        } else {
            candidate
        }
    }
}

#[derive(Clone, Debug)]
pub struct LoadedMaze {
    pub grid: Grid,
    pub player_spawn: Position,
    pub enemy_spawns: Vec<Position>,
    pub pellets: usize,
}

pub fn load_maze(path: &Path, enemy_count: usize) -> Result<LoadedMaze, LoadError> {
    let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_maze(&text, enemy_count)
}

pub fn parse_maze(text: &str, enemy_count: usize) -> Result<LoadedMaze, LoadError> {
    let enemy_limit = enemy_count.min(MAX_ENEMIES);
    let mut lines: Vec<&str> = text
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect();
    while lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }

    let mut player_spawn = None;
    let mut enemy_spawns = Vec::new();
    let mut cells = Vec::with_capacity(lines.len());

    for (row, line) in lines.iter().enumerate() {
        let mut cell_row = Vec::with_capacity(line.len());
        for (col, ch) in line.chars().enumerate() {
            match ch {
                'P' => player_spawn = Some(Position::new(row, col)),
                'G' if enemy_spawns.len() < enemy_limit => {
                    enemy_spawns.push(Position::new(row, col));
                }
                _ => {}
            }
            cell_row.push(Cell::from_maze_char(ch));
        }
        cells.push(cell_row);
    }

    let grid = Grid::from_rows(cells)?;
    let player_spawn = player_spawn.ok_or(LoadError::MissingPlayer)?;
    if enemy_spawns.is_empty() {
        return Err(LoadError::MissingEnemies);
    }
    let pellets = grid.count(Cell::Pellet);

    Ok(LoadedMaze {
        grid,
        player_spawn,
        enemy_spawns,
        pellets,
    })
}

#[cfg(test)]
mod tests {
    use super::{parse_maze, Grid};
    use crate::error::LoadError;
    use crate::types::{Cell, Direction, Position};

    const BOX: &str = "\
#####
#P.X#
#. G#
#####
";

    fn open_grid(rows: usize, cols: usize) -> Grid {
        Grid::from_rows(vec![vec![Cell::Blank; cols]; rows]).expect("valid grid")
    }

    #[test]
    fn parse_collects_spawns_and_counts_only_plain_pellets() {
        let maze = parse_maze(BOX, 4).expect("maze should parse");
        assert_eq!(maze.grid.rows(), 4);
        assert_eq!(maze.grid.cols(), 5);
        assert_eq!(maze.player_spawn, Position::new(1, 1));
        assert_eq!(maze.enemy_spawns, vec![Position::new(2, 3)]);
        assert_eq!(maze.pellets, 2);
        assert_eq!(maze.grid.cell(Position::new(1, 3)), Cell::PowerPellet);
        assert_eq!(maze.grid.cell(Position::new(1, 1)), Cell::Blank);
        assert_eq!(maze.grid.cell(Position::new(2, 3)), Cell::Blank);
    }

    #[test]
    fn enemy_spawns_are_capped_by_request_and_hard_limit() {
        let row: String = "G".repeat(20);
        let text = format!("P{row}\n");
        assert_eq!(parse_maze(&text, 3).expect("parse").enemy_spawns.len(), 3);
        assert_eq!(parse_maze(&text, 50).expect("parse").enemy_spawns.len(), 12);
        let spawns = parse_maze(&text, 2).expect("parse").enemy_spawns;
        assert_eq!(spawns, vec![Position::new(0, 1), Position::new(0, 2)]);
    }

    #[test]
    fn crlf_and_trailing_blank_lines_are_tolerated() {
        let maze = parse_maze("P.G\r\n...\r\n\r\n", 1).expect("parse");
        assert_eq!(maze.grid.rows(), 2);
        assert_eq!(maze.pellets, 4);
    }

    #[test]
    fn invalid_mazes_are_rejected() {
        assert!(matches!(parse_maze("", 1), Err(LoadError::EmptyMaze)));
        assert!(matches!(
            parse_maze("P.G\n..\n", 1),
            Err(LoadError::RaggedRow {
                row: 1,
                expected: 3,
                found: 2
            })
        ));
        assert!(matches!(parse_maze("..G\n", 1), Err(LoadError::MissingPlayer)));
        assert!(matches!(parse_maze("P..\n", 1), Err(LoadError::MissingEnemies)));
    }

    #[test]
    fn down_wraps_to_first_row_from_last_row() {
        let grid = open_grid(4, 3);
        assert_eq!(
            grid.resolve_move(Position::new(2, 1), Direction::Down),
            Position::new(3, 1)
        );
        assert_eq!(
            grid.resolve_move(Position::new(3, 1), Direction::Down),
            Position::new(0, 1)
        );
    }

    #[test]
    fn up_left_right_wrap_at_grid_edges() {
        let grid = open_grid(4, 3);
        assert_eq!(
            grid.resolve_move(Position::new(0, 1), Direction::Up),
            Position::new(3, 1)
        );
        assert_eq!(
            grid.resolve_move(Position::new(1, 0), Direction::Left),
            Position::new(1, 2)
        );
        assert_eq!(
            grid.resolve_move(Position::new(1, 2), Direction::Right),
            Position::new(1, 0)
        );
    }

    #[test]
    fn wrap_into_wall_is_rejected() {
        let maze = parse_maze("P.G\n###\n", 1).expect("parse");
        let start = Position::new(0, 1);
        assert_eq!(maze.grid.resolve_move(start, Direction::Up), start);
        assert_eq!(maze.grid.resolve_move(start, Direction::Down), start);
    }

    #[test]
    fn moving_into_wall_keeps_position() {
        let maze = parse_maze(BOX, 1).expect("parse");
        let start = maze.player_spawn;
        assert_eq!(maze.grid.resolve_move(start, Direction::Up), start);
        assert_eq!(maze.grid.resolve_move(start, Direction::Left), start);
    }

    #[test]
    fn opposing_moves_round_trip_without_wrap() {
        let maze = parse_maze(
            "\
#######
#P....#
#.##..#
#....G#
#######
",
            1,
        )
        .expect("parse");
        let grid = &maze.grid;
        for row in 1..grid.rows() - 1 {
            for col in 1..grid.cols() - 1 {
                let start = Position::new(row, col);
                if !grid.is_walkable(start) {
                    continue;
                }
                for dir in Direction::ALL {
                    let moved = grid.resolve_move(start, dir);
                    if moved == start {
                        continue;
                    }
                    assert_eq!(grid.resolve_move(moved, dir.opposite()), start);
                }
            }
        }
    }
}
