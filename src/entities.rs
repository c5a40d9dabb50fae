use std::sync::Arc;

use tokio::sync::RwLock;

use crate::types::{EnemyView, Mode, Position};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Actor {
    pub position: Position,
    pub spawn: Position,
}

impl Actor {
    pub fn at_spawn(spawn: Position) -> Self {
        Self {
            position: spawn,
            spawn,
        }
    }

    pub fn respawn(&mut self) {
        self.position = self.spawn;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Enemy {
    pub actor: Actor,
    pub mode: Mode,
}

impl Enemy {
    pub fn new(spawn: Position) -> Self {
        Self {
            actor: Actor::at_spawn(spawn),
            mode: Mode::Normal,
        }
    }

    pub fn view(&self) -> EnemyView {
        EnemyView {
            position: self.actor.position,
            mode: self.mode,
        }
    }
}

/// Enemy collection shared between the tick engine and the power controller.
/// Every read or write of an enemy's mode goes through this single lock.
pub type SharedEnemies = Arc<RwLock<Vec<Enemy>>>;

pub fn shared_enemies(spawns: &[Position]) -> SharedEnemies {
    Arc::new(RwLock::new(spawns.iter().copied().map(Enemy::new).collect()))
}

pub async fn set_all_modes(enemies: &SharedEnemies, mode: Mode) {
    let mut guard = enemies.write().await;
    for enemy in guard.iter_mut() {
        enemy.mode = mode;
    }
}

pub async fn enemy_views(enemies: &SharedEnemies) -> Vec<EnemyView> {
    enemies.read().await.iter().map(Enemy::view).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_all_modes_is_idempotent() {
        let enemies = shared_enemies(&[Position::new(0, 0), Position::new(1, 1)]);
        set_all_modes(&enemies, Mode::Vulnerable).await;
        set_all_modes(&enemies, Mode::Normal).await;
        set_all_modes(&enemies, Mode::Normal).await;
        let views = enemy_views(&enemies).await;
        assert!(views.iter().all(|view| view.mode == Mode::Normal));
    }

    #[test]
    fn respawn_returns_actor_to_spawn() {
        let mut actor = Actor::at_spawn(Position::new(2, 3));
        actor.position = Position::new(5, 5);
        actor.respawn();
        assert_eq!(actor.position, Position::new(2, 3));
    }
}
