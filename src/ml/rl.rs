pub mod epsilon_greedy;
pub mod maze;
pub mod q_learning;
pub mod q_table;
pub mod rollout;

// Re-export public types and functions
pub use epsilon_greedy::{EpsilonGreedy, EpsilonSchedule};
pub use maze::{Action, Cell, Maze, Position, Rewards};
pub use q_learning::{EpisodeStats, QLearning, QLearningConfig, TrainingReport};
pub use q_table::QTable;
pub use rollout::{greedy_rollout, render_policy, Rollout, RolloutStatus};
