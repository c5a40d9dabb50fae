use crate::constants::ENEMY_DIRECTION_WEIGHTS;
use crate::rng::Rng;
use crate::types::Direction;

pub(super) fn pick_enemy_direction(rng: &mut Rng) -> Direction {
    let weights = ENEMY_DIRECTION_WEIGHTS.map(|(_, weight)| weight);
    ENEMY_DIRECTION_WEIGHTS[rng.weighted_index(&weights)].0
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn every_direction_is_possible_and_up_is_favoured() {
        let mut rng = Rng::new(2024);
        let mut counts: HashMap<Direction, u32> = HashMap::new();
        for _ in 0..14_000 {
            *counts.entry(pick_enemy_direction(&mut rng)).or_insert(0) += 1;
        }
        for dir in Direction::ALL {
            assert!(counts.get(&dir).copied().unwrap_or(0) > 0, "{dir:?} never drawn");
        }
        let up = counts[&Direction::Up];
        for dir in [Direction::Down, Direction::Left, Direction::Right] {
            assert!(up > counts[&dir]);
        }
    }
}
