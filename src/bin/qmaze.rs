//! # Maze Q-learning CLI
//!
//! Train a tabular Q-learning agent on a grid maze and replay the learned policy.
//!
//! ## Usage
//!
//! ```bash
//! # Train on the built-in 5x5 maze
//! cargo run --bin qmaze
//!
//! # Reproducible run with more episodes
//! cargo run --bin qmaze -- --seed 42 --episodes 2000
//!
//! # Train on a maze drawn with . # S G
//! cargo run --bin qmaze -- --maze mazes/corridor.txt --episode-step-cap 500
//! ```

use std::path::PathBuf;

use clap::Parser;
use qmaze::rl::{render_policy, Maze, QLearning, QLearningConfig};

/// Maze Q-learning trainer
#[derive(Parser, Debug)]
#[command(name = "qmaze")]
#[command(about = "Train a Q-learning agent on a grid maze and replay its greedy path")]
struct Args {
    /// Number of training episodes
    #[arg(long, short = 'e', default_value = "1000")]
    episodes: usize,

    /// Learning rate, in (0, 1]
    #[arg(long, default_value = "0.1")]
    alpha: f64,

    /// Discount factor, in [0, 1)
    #[arg(long, default_value = "0.9")]
    gamma: f64,

    /// Initial exploration rate
    #[arg(long, default_value = "0.9")]
    epsilon: f64,

    /// Multiplicative epsilon decay applied after every episode
    #[arg(long, default_value = "0.995")]
    epsilon_decay: f64,

    /// Floor for the exploration rate
    #[arg(long, default_value = "0.1")]
    min_epsilon: f64,

    /// Step cap for the greedy replay
    #[arg(long, default_value = "50")]
    max_steps: usize,

    /// Step cap for a single training episode (unbounded when omitted)
    #[arg(long)]
    episode_step_cap: Option<usize>,

    /// Episodes between progress lines
    #[arg(long, default_value = "100")]
    report_interval: usize,

    /// Seed for reproducible exploration
    #[arg(long, short = 's')]
    seed: Option<u64>,

    /// Maze file drawn with `.` (free), `#` (obstacle), `S` (start) and `G` (goal)
    #[arg(long, short = 'm')]
    maze: Option<PathBuf>,

    /// Skip the per-step replay snapshots
    #[arg(long, short = 'q')]
    quiet: bool,
}

impl Args {
    fn agent_config(&self) -> QLearningConfig {
        QLearningConfig {
            learning_rate: self.alpha,
            gamma: self.gamma,
            initial_epsilon: self.epsilon,
            epsilon_decay: self.epsilon_decay,
            min_epsilon: self.min_epsilon,
            episodes: self.episodes,
            max_rollout_steps: self.max_steps,
            max_episode_steps: self.episode_step_cap,
            report_interval: self.report_interval,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    let maze = match &args.maze {
        Some(path) => Maze::from_file(path)?,
        None => Maze::classic(),
    };
    let config = args.agent_config();
    let report_interval = config.report_interval;

    println!("Maze:");
    println!("{}", maze);
    println!();

    let mut agent = match args.seed {
        Some(seed) => QLearning::with_seed(maze, config, seed)?,
        None => QLearning::new(maze, config)?,
    };

    agent.train_with(|stats| {
        if (stats.episode + 1) % report_interval == 0 {
            println!("Episode {}: Total Reward = {}", stats.episode + 1, stats.total_reward);
        }
    });
    println!("\nTraining completed!");

    let rollout = agent.rollout();
    if !args.quiet {
        for snapshot in rollout.snapshots(agent.maze()) {
            println!("\n{}", snapshot);
        }
    }

    println!("\n{}", rollout.status);
    if rollout.reached_goal() {
        println!("{}", rollout.render(agent.maze()));
    }

    println!("\nGreedy policy:");
    println!("{}", render_policy(agent.maze(), agent.q_table()));

    Ok(())
}
