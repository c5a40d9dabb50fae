use std::io::{self, Write};

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::style::{Color, Print, ResetColor, SetBackgroundColor};
use crossterm::terminal::{self, Clear, ClearType};
use crossterm::{execute, queue};
use unicode_width::UnicodeWidthStr;

use crate::config::GameConfig;
use crate::types::{Cell, Mode, Outcome, Position, Snapshot};

/// Receives the world once per tick. Implementations draw synchronously.
pub trait Renderer {
    fn render(&mut self, snapshot: &Snapshot) -> io::Result<()>;

    fn render_death(&mut self, at: Position, lives_left: u32) -> io::Result<()>;

    /// Called once per remaining second of the post-death pause.
    fn render_restart(&mut self, seconds_left: u64) -> io::Result<()>;

    fn render_outcome(&mut self, snapshot: &Snapshot, outcome: Outcome) -> io::Result<()>;
}

pub struct TerminalRenderer<W: Write> {
    out: W,
    config: GameConfig,
    column_stride: usize,
    maze_rows: usize,
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W, config: GameConfig) -> Self {
        let column_stride = if config.use_emoji { 2 } else { 1 };
        Self {
            out,
            config,
            column_stride,
            maze_rows: 0,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Pads `glyph` with spaces up to one maze column.
    fn fit(&self, glyph: &str) -> String {
        let width = UnicodeWidthStr::width(glyph);
        if width >= self.column_stride {
            glyph.to_string()
        } else {
            format!("{glyph}{}", " ".repeat(self.column_stride - width))
        }
    }

    fn move_to(&mut self, row: usize, col: usize) -> io::Result<()> {
        let x = u16::try_from(col * self.column_stride).unwrap_or(u16::MAX);
        let y = u16::try_from(row).unwrap_or(u16::MAX);
        queue!(self.out, MoveTo(x, y))
    }

    fn draw_at(&mut self, row: usize, col: usize, glyph: &str) -> io::Result<()> {
        let glyph = self.fit(glyph);
        self.move_to(row, col)?;
        queue!(self.out, Print(glyph))
    }

    fn lives_label(&self, lives: u32) -> String {
        if self.config.use_emoji {
            self.config.player.repeat(lives as usize)
        } else {
            lives.to_string()
        }
    }

    fn draw_banner(&mut self, text: &str) -> io::Result<()> {
        let row = self.maze_rows + 2;
        self.move_to(row, 0)?;
        queue!(self.out, Clear(ClearType::UntilNewLine), Print(text))?;
        self.move_to(row + 1, 0)
    }
}

impl<W: Write> Renderer for TerminalRenderer<W> {
    fn render(&mut self, snapshot: &Snapshot) -> io::Result<()> {
        self.maze_rows = snapshot.grid.len();
        queue!(self.out, Clear(ClearType::All))?;

        for (row, cells) in snapshot.grid.iter().enumerate() {
            self.move_to(row, 0)?;
            for cell in cells {
                match cell {
                    Cell::Wall => {
                        let glyph = self.fit(&self.config.wall);
                        queue!(
                            self.out,
                            SetBackgroundColor(Color::Blue),
                            Print(glyph),
                            ResetColor
                        )?;
                    }
                    Cell::Pellet => {
                        let glyph = self.fit(&self.config.dot);
                        queue!(self.out, Print(glyph))?;
                    }
                    Cell::PowerPellet => {
                        let glyph = self.fit(&self.config.pill);
                        queue!(self.out, Print(glyph))?;
                    }
                    Cell::Blank => {
                        let glyph = self.fit(&self.config.space);
                        queue!(self.out, Print(glyph))?;
                    }
                }
            }
        }

        let player = self.config.player.clone();
        self.draw_at(snapshot.player.row, snapshot.player.col, &player)?;
        for enemy in &snapshot.enemies {
            let glyph = match enemy.mode {
                Mode::Normal => self.config.ghost.clone(),
                Mode::Vulnerable => self.config.ghost_blue.clone(),
            };
            self.draw_at(enemy.position.row, enemy.position.col, &glyph)?;
        }

        let hud = format!(
            "Score: {}\tLives: {}",
            snapshot.score,
            self.lives_label(snapshot.lives)
        );
        self.move_to(self.maze_rows + 1, 0)?;
        queue!(self.out, Print(hud))?;
        self.out.flush()
    }

    fn render_death(&mut self, at: Position, _lives_left: u32) -> io::Result<()> {
        let death = self.config.death.clone();
        self.draw_at(at.row, at.col, &death)?;
        self.move_to(self.maze_rows + 2, 0)?;
        self.out.flush()
    }

    fn render_restart(&mut self, seconds_left: u64) -> io::Result<()> {
        self.draw_banner(&format!("RESTARTING in {seconds_left} seconds"))?;
        self.out.flush()
    }

    fn render_outcome(&mut self, snapshot: &Snapshot, outcome: Outcome) -> io::Result<()> {
        self.maze_rows = snapshot.grid.len();
        match outcome {
            Outcome::Loss => {
                let death = self.config.death.clone();
                self.draw_at(snapshot.player.row, snapshot.player.col, &death)?;
                self.draw_banner("GAME OVER")?;
            }
            Outcome::Win => self.draw_banner("YOU WIN!!")?,
        }
        self.out.flush()
    }
}

/// Raw mode plus a hidden cursor for as long as the guard lives.
pub struct TerminalGuard {
    _private: (),
}

impl TerminalGuard {
    pub fn enter() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        let mut stdout = io::stdout();
        if let Err(error) = execute!(stdout, Hide, Clear(ClearType::All)) {
            let _ = terminal::disable_raw_mode();
            return Err(error);
        }
        Ok(Self { _private: () })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let mut stdout = io::stdout();
        let _ = execute!(stdout, Show, Print("\r\n"));
        let _ = terminal::disable_raw_mode();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EnemyView;

    fn snapshot() -> Snapshot {
        Snapshot {
            tick: 4,
            grid: vec![
                vec![Cell::Wall, Cell::Wall, Cell::Wall],
                vec![Cell::Blank, Cell::Pellet, Cell::PowerPellet],
            ],
            player: Position::new(1, 0),
            enemies: vec![EnemyView {
                position: Position::new(1, 2),
                mode: Mode::Vulnerable,
            }],
            score: 17,
            lives: 2,
            pellets_left: 1,
            power_active: true,
            events: Vec::new(),
        }
    }

    fn output(renderer: TerminalRenderer<Vec<u8>>) -> String {
        String::from_utf8(renderer.into_inner()).expect("renderer writes utf8")
    }

    #[test]
    fn frame_contains_glyphs_and_hud() {
        let config = GameConfig {
            player: "@".to_string(),
            ghost_blue: "b".to_string(),
            dot: "o".to_string(),
            ..GameConfig::default()
        };
        let mut renderer = TerminalRenderer::new(Vec::new(), config);
        renderer.render(&snapshot()).expect("render into memory");
        let text = output(renderer);
        assert!(text.contains('@'));
        assert!(text.contains('b'));
        assert!(text.contains('o'));
        assert!(text.contains("Score: 17\tLives: 2"));
    }

    #[test]
    fn emoji_mode_shows_lives_as_player_glyphs() {
        let config = GameConfig {
            player: "😋".to_string(),
            use_emoji: true,
            ..GameConfig::default()
        };
        let mut renderer = TerminalRenderer::new(Vec::new(), config);
        renderer.render(&snapshot()).expect("render into memory");
        assert!(output(renderer).contains("Lives: 😋😋"));
    }

    #[test]
    fn narrow_glyphs_are_padded_to_column_stride() {
        let config = GameConfig {
            use_emoji: true,
            ..GameConfig::default()
        };
        let renderer = TerminalRenderer::new(Vec::new(), config);
        assert_eq!(renderer.fit("."), ". ");
        assert_eq!(renderer.fit("👻"), "👻");
    }

    #[test]
    fn restart_countdown_banner_sits_below_the_hud() {
        let mut renderer = TerminalRenderer::new(Vec::new(), GameConfig::default());
        renderer.render(&snapshot()).expect("render into memory");
        renderer.render_restart(2).expect("render into memory");
        let text = output(renderer);
        let hud = text.find("Lives: 2").expect("hud drawn");
        let banner = text.find("RESTARTING in 2 seconds").expect("banner drawn");
        assert!(banner > hud);
    }

    #[test]
    fn outcome_banners() {
        let mut renderer = TerminalRenderer::new(Vec::new(), GameConfig::default());
        renderer
            .render_outcome(&snapshot(), Outcome::Loss)
            .expect("render into memory");
        assert!(output(renderer).contains("GAME OVER"));

        let mut renderer = TerminalRenderer::new(Vec::new(), GameConfig::default());
        renderer
            .render_outcome(&snapshot(), Outcome::Win)
            .expect("render into memory");
        assert!(output(renderer).contains("YOU WIN!!"));
    }
}
