use rand::Rng;

use crate::ml::rl::maze::{Action, Position};
use crate::ml::rl::q_table::QTable;

/// Exploration rate that decays multiplicatively once per episode down to a floor.
#[derive(Debug, Clone, PartialEq)]
pub struct EpsilonSchedule {
    initial: f64,
    decay: f64,
    min: f64,
    current: f64,
}

impl EpsilonSchedule {
    pub fn new(initial: f64, decay: f64, min: f64) -> Self {
        EpsilonSchedule {
            initial,
            decay,
            min,
            current: initial,
        }
    }

    pub fn current(&self) -> f64 {
        self.current
    }

    /// Applies one episode's worth of decay and returns the new rate.
    pub fn decay(&mut self) -> f64 {
        self.current = self.min.max(self.current * self.decay);
        self.current
    }

    /// Rate after `episodes` decays, `max(min, initial * decay^episodes)`.
    pub fn after(&self, episodes: usize) -> f64 {
        let decays = i32::try_from(episodes).unwrap_or(i32::MAX);
        self.min.max(self.initial * self.decay.powi(decays))
    }

    pub fn reset(&mut self) {
        self.current = self.initial;
    }
}

/// Epsilon-greedy action selection over a [`QTable`].
pub struct EpsilonGreedy;

impl EpsilonGreedy {
    /// With probability `epsilon` picks one of the four actions uniformly at
    /// random, otherwise the table's greedy action for `state`.
    pub fn select_action<R: Rng + ?Sized>(
        table: &QTable,
        state: Position,
        epsilon: f64,
        rng: &mut R,
    ) -> Action {
        if rng.gen::<f64>() < epsilon {
            Action::ALL[rng.gen_range(0..Action::COUNT)]
        } else {
            table.best_action(state)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn test_decay_matches_closed_form() {
        let mut schedule = EpsilonSchedule::new(0.9, 0.995, 0.1);
        let mut previous = schedule.current();
        for k in 1..=1000 {
            let eps = schedule.decay();
            assert!(eps <= previous);
            assert_relative_eq!(eps, schedule.after(k), epsilon = 1e-9);
            previous = eps;
        }
        assert_eq!(schedule.current(), 0.1);
    }

    #[test]
    fn test_floor_and_reset() {
        let mut schedule = EpsilonSchedule::new(0.5, 0.5, 0.2);
        assert_eq!(schedule.decay(), 0.25);
        assert_eq!(schedule.decay(), 0.2);
        assert_eq!(schedule.decay(), 0.2);
        schedule.reset();
        assert_eq!(schedule.current(), 0.5);
        assert_eq!(schedule.after(0), 0.5);
    }

    #[test]
    fn test_zero_epsilon_is_greedy() {
        let mut table = QTable::new(1, 1);
        let s = Position::new(0, 0);
        table.set(s, Action::Right, 1.0);
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        for _ in 0..100 {
            assert_eq!(EpsilonGreedy::select_action(&table, s, 0.0, &mut rng), Action::Right);
        }
    }

    #[test]
    fn test_full_epsilon_explores_every_action() {
        let table = QTable::new(1, 1);
        let s = Position::new(0, 0);
        let mut rng = ChaCha20Rng::seed_from_u64(42);
        let mut counts = [0usize; Action::COUNT];
        for _ in 0..4000 {
            counts[EpsilonGreedy::select_action(&table, s, 1.0, &mut rng).index()] += 1;
        }
        for count in counts {
            assert!(count > 800, "unbalanced exploration: {:?}", counts);
        }
    }
}
