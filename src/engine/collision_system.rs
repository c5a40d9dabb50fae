use super::*;

impl GameEngine {
    /// Resolves every enemy standing on the player's cell, in spawn order.
    ///
    /// A normal enemy costs a life and ends power mode for all enemies; a
    /// vulnerable one is sent back to its spawn on its own. Once the last life
    /// is gone, further normal enemies on the cell are ignored. The enemy lock
    /// is released before rendering or pausing.
    pub(super) async fn resolve_collisions<R>(&mut self, renderer: &mut R) -> io::Result<()>
    where
        R: Renderer + ?Sized,
    {
        let count = self.enemies.read().await.len();
        for idx in 0..count {
            let caught_by_normal = {
                let mut enemies = self.enemies.write().await;
                let Some(enemy) = enemies.get_mut(idx) else {
                    break;
                };
                if enemy.actor.position != self.player.position {
                    continue;
                }
                match enemy.mode {
                    Mode::Normal if self.lives == 0 => continue,
                    Mode::Normal => true,
                    Mode::Vulnerable => {
                        enemy.mode = Mode::Normal;
                        enemy.actor.respawn();
                        false
                    }
                }
            };

            if caught_by_normal {
                self.lose_life(idx, renderer).await?;
            } else {
                self.events.push(RuntimeEvent::EnemyCaught { enemy: idx });
                logging::info("enemy_caught", json!({ "enemy": idx, "tick": self.tick_counter }));
            }
        }
        Ok(())
    }

    async fn lose_life<R>(&mut self, enemy: usize, renderer: &mut R) -> io::Result<()>
    where
        R: Renderer + ?Sized,
    {
        self.lives = self.lives.saturating_sub(1);
        self.events.push(RuntimeEvent::PlayerCaught {
            enemy,
            lives_left: self.lives,
        });
        logging::info(
            "player_caught",
            json!({
                "enemy": enemy,
                "livesLeft": self.lives,
                "row": self.player.position.row,
                "col": self.player.position.col,
                "tick": self.tick_counter,
            }),
        );
        if self.lives == 0 {
            return Ok(());
        }

        renderer.render_death(self.player.position, self.lives)?;
        set_all_modes(&self.enemies, Mode::Normal).await;
        self.count_down_restart(renderer).await?;
        self.player.respawn();
        Ok(())
    }

    /// Sleeps through the death pause one second at a time, announcing the
    /// whole seconds left before each step.
    async fn count_down_restart<R>(&mut self, renderer: &mut R) -> io::Result<()>
    where
        R: Renderer + ?Sized,
    {
        let mut remaining = self.options.death_pause;
        while !remaining.is_zero() {
            let seconds_left =
                u64::try_from(remaining.as_millis().div_ceil(1_000)).unwrap_or(u64::MAX);
            renderer.render_restart(seconds_left)?;
            let step = remaining.min(Duration::from_secs(1));
            tokio::time::sleep(step).await;
            remaining -= step;
        }
        Ok(())
    }
}
