//! Tabular Q-learning on a grid maze.
//!
//! The trainer owns the value table, the exploration schedule and the random
//! source. Each episode starts from the maze's start cell and runs until the goal
//! is reached (or an optional step cap is hit); every step applies the one-step
//! Q-learning update, and epsilon decays once when the episode ends.
//!
//! # Examples
//!
//! ```
//! use qmaze::ml::rl::maze::Maze;
//! use qmaze::ml::rl::q_learning::{QLearning, QLearningConfig};
//! use qmaze::ml::rl::rollout::RolloutStatus;
//!
//! let mut agent = QLearning::with_seed(Maze::classic(), QLearningConfig::default(), 42).unwrap();
//! let report = agent.train();
//! assert_eq!(report.len(), 1000);
//!
//! let rollout = agent.rollout();
//! assert_eq!(rollout.status, RolloutStatus::ReachedGoal);
//! assert_eq!(rollout.final_state(), agent.maze().goal());
//! ```

use log::{debug, info, warn};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

use crate::error::{Error, Result};
use crate::ml::rl::epsilon_greedy::{EpsilonGreedy, EpsilonSchedule};
use crate::ml::rl::maze::{Action, Maze, Position};
use crate::ml::rl::q_table::QTable;
use crate::ml::rl::rollout::{greedy_rollout, Rollout};

/// Hyper-parameters for [`QLearning`].
#[derive(Debug, Clone, PartialEq)]
pub struct QLearningConfig {
    /// Step size α, in (0, 1]
    pub learning_rate: f64,
    /// Discount factor γ, in [0, 1)
    pub gamma: f64,
    /// Exploration rate for the first episode
    pub initial_epsilon: f64,
    /// Multiplicative decay applied after every episode
    pub epsilon_decay: f64,
    /// Floor for the exploration rate
    pub min_epsilon: f64,
    /// Number of training episodes
    pub episodes: usize,
    /// Step cap for the greedy rollout
    pub max_rollout_steps: usize,
    /// Optional step cap for a single training episode
    pub max_episode_steps: Option<usize>,
    /// Episodes between progress lines
    pub report_interval: usize,
}

impl Default for QLearningConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            gamma: 0.9,
            initial_epsilon: 0.9,
            epsilon_decay: 0.995,
            min_epsilon: 0.1,
            episodes: 1000,
            max_rollout_steps: 50,
            max_episode_steps: None,
            report_interval: 100,
        }
    }
}

impl QLearningConfig {
    pub fn validate(&self) -> Result<()> {
        fn invalid(name: &'static str, value: f64, reason: &'static str) -> Result<()> {
            Err(Error::InvalidParameter {
                name,
                value,
                reason,
            })
        }

        if !(self.learning_rate > 0.0 && self.learning_rate <= 1.0) {
            return invalid("learning_rate", self.learning_rate, "must be in (0, 1]");
        }
        if !(0.0..1.0).contains(&self.gamma) {
            return invalid("gamma", self.gamma, "must be in [0, 1)");
        }
        if !(0.0..=1.0).contains(&self.initial_epsilon) {
            return invalid("initial_epsilon", self.initial_epsilon, "must be in [0, 1]");
        }
        if !(0.0..=self.initial_epsilon).contains(&self.min_epsilon) {
            return invalid(
                "min_epsilon",
                self.min_epsilon,
                "must be in [0, initial_epsilon]",
            );
        }
        if !(self.epsilon_decay > 0.0 && self.epsilon_decay <= 1.0) {
            return invalid("epsilon_decay", self.epsilon_decay, "must be in (0, 1]");
        }
        if self.episodes == 0 {
            return invalid("episodes", 0.0, "must be positive");
        }
        if self.max_rollout_steps == 0 {
            return invalid("max_rollout_steps", 0.0, "must be positive");
        }
        if self.report_interval == 0 {
            return invalid("report_interval", 0.0, "must be positive");
        }
        match self.max_episode_steps {
            Some(0) => invalid("max_episode_steps", 0.0, "must be positive"),
            None if self.min_epsilon == 0.0 => invalid(
                "min_epsilon",
                self.min_epsilon,
                "a zero floor needs max_episode_steps, otherwise an episode may never end",
            ),
            _ => Ok(()),
        }
    }
}

/// Summary of one training episode.
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeStats {
    /// Zero-based episode index
    pub episode: usize,
    pub total_reward: f64,
    pub steps: usize,
    /// Exploration rate used during the episode
    pub epsilon: f64,
    pub reached_goal: bool,
}

/// Per-episode statistics collected by [`QLearning::train`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingReport {
    pub episodes: Vec<EpisodeStats>,
}

impl TrainingReport {
    pub fn len(&self) -> usize {
        self.episodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.episodes.is_empty()
    }

    /// `(episode number, total reward)` for every `interval`-th episode, counting
    /// from 1.
    pub fn progress(&self, interval: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let interval = interval.max(1);
        self.episodes
            .iter()
            .filter(move |stats| (stats.episode + 1) % interval == 0)
            .map(|stats| (stats.episode + 1, stats.total_reward))
    }

    /// Fraction of episodes that ended at the goal.
    pub fn success_rate(&self) -> f64 {
        if self.episodes.is_empty() {
            return 0.0;
        }
        let reached = self.episodes.iter().filter(|s| s.reached_goal).count();
        reached as f64 / self.episodes.len() as f64
    }

    /// Mean total reward over the last `n` episodes.
    pub fn mean_reward(&self, n: usize) -> f64 {
        let tail = &self.episodes[self.episodes.len().saturating_sub(n)..];
        if tail.is_empty() {
            return 0.0;
        }
        tail.iter().map(|s| s.total_reward).sum::<f64>() / tail.len() as f64
    }
}

/// Q-learning agent for a single maze.
pub struct QLearning<R = ChaCha20Rng> {
    maze: Maze,
    config: QLearningConfig,
    q_table: QTable,
    schedule: EpsilonSchedule,
    rng: R,
}

impl QLearning<ChaCha20Rng> {
    /// Creates an agent with an entropy-seeded random source.
    pub fn new(maze: Maze, config: QLearningConfig) -> Result<Self> {
        Self::with_rng(maze, config, ChaCha20Rng::from_entropy())
    }

    /// Creates an agent whose exploration is reproducible from `seed`.
    pub fn with_seed(maze: Maze, config: QLearningConfig, seed: u64) -> Result<Self> {
        Self::with_rng(maze, config, ChaCha20Rng::seed_from_u64(seed))
    }
}

impl<R: Rng> QLearning<R> {
    pub fn with_rng(maze: Maze, config: QLearningConfig, rng: R) -> Result<Self> {
        config.validate()?;
        let schedule = EpsilonSchedule::new(
            config.initial_epsilon,
            config.epsilon_decay,
            config.min_epsilon,
        );
        Ok(QLearning {
            q_table: QTable::for_maze(&maze),
            maze,
            config,
            schedule,
            rng,
        })
    }

    /// Epsilon-greedy action for `state` at the current exploration rate.
    pub fn select_action(&mut self, state: Position) -> Action {
        EpsilonGreedy::select_action(&self.q_table, state, self.schedule.current(), &mut self.rng)
    }

    /// Applies the Q-learning update with the configured α and γ.
    pub fn update(
        &mut self,
        state: Position,
        action: Action,
        reward: f64,
        next_state: Position,
    ) -> f64 {
        self.q_table.update(
            state,
            action,
            reward,
            next_state,
            self.config.learning_rate,
            self.config.gamma,
        )
    }

    /// Runs one episode from the start cell and decays epsilon afterwards.
    pub fn run_episode(&mut self, episode: usize) -> EpisodeStats {
        let epsilon = self.schedule.current();
        let mut state = self.maze.start();
        let mut total_reward = 0.0;
        let mut steps = 0;

        while !self.maze.is_goal(state) {
            if self.config.max_episode_steps.is_some_and(|cap| steps >= cap) {
                warn!(
                    "Episode {} hit the step cap of {} without reaching the goal",
                    episode + 1,
                    steps
                );
                break;
            }

            let action = self.select_action(state);
            let (next_state, reward) = self.maze.step(state, action);
            self.update(state, action, reward, next_state);

            state = next_state;
            total_reward += reward;
            steps += 1;
        }

        self.schedule.decay();

        let stats = EpisodeStats {
            episode,
            total_reward,
            steps,
            epsilon,
            reached_goal: self.maze.is_goal(state),
        };
        debug!(
            "Episode {}: reward = {}, steps = {}, epsilon = {:.4}",
            episode + 1,
            stats.total_reward,
            stats.steps,
            stats.epsilon
        );
        stats
    }

    /// Runs the configured number of episodes.
    pub fn train(&mut self) -> TrainingReport {
        self.train_with(|_| {})
    }

    /// Like [`QLearning::train`], calling `on_episode` as soon as each episode
    /// finishes.
    pub fn train_with<F>(&mut self, mut on_episode: F) -> TrainingReport
    where
        F: FnMut(&EpisodeStats),
    {
        let mut report = TrainingReport {
            episodes: Vec::with_capacity(self.config.episodes),
        };

        for episode in 0..self.config.episodes {
            let stats = self.run_episode(episode);
            if (episode + 1) % self.config.report_interval == 0 {
                info!("Episode {}: Total Reward = {}", episode + 1, stats.total_reward);
            }
            on_episode(&stats);
            report.episodes.push(stats);
        }

        info!(
            "Training completed: {} episodes, success rate {:.3}, final epsilon {:.4}",
            report.len(),
            report.success_rate(),
            self.schedule.current()
        );
        report
    }

    /// Greedy replay of the learned table from the start cell.
    pub fn rollout(&self) -> Rollout {
        greedy_rollout(&self.maze, &self.q_table, self.config.max_rollout_steps)
    }

    pub fn maze(&self) -> &Maze {
        &self.maze
    }

    pub fn config(&self) -> &QLearningConfig {
        &self.config
    }

    pub fn q_table(&self) -> &QTable {
        &self.q_table
    }

    pub fn q_table_mut(&mut self) -> &mut QTable {
        &mut self.q_table
    }

    pub fn epsilon(&self) -> f64 {
        self.schedule.current()
    }
}
