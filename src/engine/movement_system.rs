use super::*;

impl GameEngine {
    pub(super) async fn advance_player(&mut self, dir: Option<Direction>) {
        let Some(dir) = dir else {
            return;
        };
        let pos = self.grid.resolve_move(self.player.position, dir);
        self.player.position = pos;

        match self.grid.cell(pos) {
            Cell::Pellet => {
                self.grid.set_cell(pos, Cell::Blank);
                self.pellets_left = self.pellets_left.saturating_sub(1);
                self.score += PELLET_SCORE;
                self.events.push(RuntimeEvent::PelletEaten {
                    row: pos.row,
                    col: pos.col,
                });
            }
            Cell::PowerPellet => {
                self.grid.set_cell(pos, Cell::Blank);
                self.score += POWER_PELLET_SCORE;
                self.events.push(RuntimeEvent::PowerPelletEaten {
                    row: pos.row,
                    col: pos.col,
                });
                self.power.trigger().await;
            }
            Cell::Wall | Cell::Blank => {}
        }
    }

    /// Moves every enemy once, in spawn order, each in an independent random direction.
    pub(super) async fn advance_enemies(&mut self) {
        let count = self.enemies.read().await.len();
        for idx in 0..count {
            let dir = pick_enemy_direction(&mut self.rng);
            {
                let mut enemies = self.enemies.write().await;
                let Some(enemy) = enemies.get_mut(idx) else {
                    break;
                };
                enemy.actor.position = self.grid.resolve_move(enemy.actor.position, dir);
            }
            if idx + 1 < count && !self.options.enemy_step_delay.is_zero() {
                tokio::time::sleep(self.options.enemy_step_delay).await;
            }
        }
    }
}
