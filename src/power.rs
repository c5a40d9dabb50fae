use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::entities::{set_all_modes, SharedEnemies};
use crate::logging;
use crate::types::Mode;

#[derive(Debug, Default)]
struct Countdown {
    generation: u64,
    handle: Option<JoinHandle<()>>,
    expirations: u64,
}

/// Owns the single power-mode countdown.
///
/// `trigger` turns every enemy vulnerable and (re)arms the countdown; when it
/// elapses every enemy goes back to normal. Arming and expiry both run under
/// the countdown lock, and an expiry only acts if its generation is still the
/// current one, so a re-trigger always supersedes the previous window.
#[derive(Clone, Debug)]
pub struct PowerController {
    enemies: SharedEnemies,
    countdown: Arc<Mutex<Countdown>>,
    duration: Duration,
}

impl PowerController {
    pub fn new(enemies: SharedEnemies, duration: Duration) -> Self {
        Self {
            enemies,
            countdown: Arc::new(Mutex::new(Countdown::default())),
            duration,
        }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub async fn trigger(&self) {
        let mut countdown = self.countdown.lock().await;
        set_all_modes(&self.enemies, Mode::Vulnerable).await;
        let restarted = match countdown.handle.take() {
            Some(previous) => {
                previous.abort();
                true
            }
            None => false,
        };
        countdown.generation = countdown.generation.wrapping_add(1);
        let generation = countdown.generation;
        let controller = self.clone();
        countdown.handle = Some(tokio::spawn(async move {
            tokio::time::sleep(controller.duration).await;
            controller.expire(generation).await;
        }));
        drop(countdown);

        logging::info(
            "power_mode_started",
            json!({
                "generation": generation,
                "restarted": restarted,
                "durationMs": self.duration.as_millis() as u64,
            }),
        );
    }

    async fn expire(&self, generation: u64) {
        let mut countdown = self.countdown.lock().await;
        if countdown.generation != generation {
            return;
        }
        countdown.handle = None;
        countdown.expirations += 1;
        set_all_modes(&self.enemies, Mode::Normal).await;
        drop(countdown);

        logging::info("power_mode_ended", json!({ "generation": generation }));
    }

    pub async fn is_active(&self) -> bool {
        self.countdown.lock().await.handle.is_some()
    }

    /// Number of countdowns that ran to completion.
    pub async fn expirations(&self) -> u64 {
        self.countdown.lock().await.expirations
    }

    /// Cancels an armed countdown without touching enemy modes.
    pub async fn shutdown(&self) {
        let mut countdown = self.countdown.lock().await;
        if let Some(handle) = countdown.handle.take() {
            handle.abort();
        }
        countdown.generation = countdown.generation.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::PowerController;
    use crate::entities::{enemy_views, shared_enemies};
    use crate::types::{Mode, Position};

    fn controller(secs: u64) -> PowerController {
        let enemies = shared_enemies(&[Position::new(0, 0), Position::new(0, 1)]);
        PowerController::new(enemies, Duration::from_secs(secs))
    }

    async fn modes(controller: &PowerController) -> Vec<Mode> {
        enemy_views(&controller.enemies)
            .await
            .into_iter()
            .map(|view| view.mode)
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn trigger_makes_all_enemies_vulnerable_until_expiry() {
        let power = controller(10);
        power.trigger().await;
        assert_eq!(modes(&power).await, vec![Mode::Vulnerable; 2]);
        assert!(power.is_active().await);

        tokio::time::sleep(Duration::from_millis(9_900)).await;
        assert_eq!(modes(&power).await, vec![Mode::Vulnerable; 2]);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(modes(&power).await, vec![Mode::Normal; 2]);
        assert!(!power.is_active().await);
        assert_eq!(power.expirations().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn retrigger_restarts_window_and_expires_once() {
        let power = controller(10);
        power.trigger().await;
        tokio::time::sleep(Duration::from_secs(6)).await;
        power.trigger().await;

        // First window would have ended at 10s.
        tokio::time::sleep(Duration::from_secs(9)).await;
        assert_eq!(modes(&power).await, vec![Mode::Vulnerable; 2]);
        assert_eq!(power.expirations().await, 0);

        // Second window ends 10s after the re-trigger, at 16s.
        tokio::time::sleep(Duration::from_millis(1_500)).await;
        assert_eq!(modes(&power).await, vec![Mode::Normal; 2]);
        assert_eq!(power.expirations().await, 1);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(power.expirations().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn expiry_is_harmless_for_enemy_already_back_to_normal() {
        let power = controller(5);
        power.trigger().await;
        power.enemies.write().await[0].mode = Mode::Normal;

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(modes(&power).await, vec![Mode::Normal; 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_cancels_pending_expiry() {
        let power = controller(5);
        power.trigger().await;
        power.shutdown().await;
        assert!(!power.is_active().await);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(power.expirations().await, 0);
        assert_eq!(modes(&power).await, vec![Mode::Vulnerable; 2]);
    }
}
