//! Greedy replay of a learned value table.
//!
//! The rollout follows the table's greedy action from the start cell, refusing
//! to revisit a cell and giving up after a fixed number of steps. The three ways
//! it can end are reported separately so callers can tell a policy that cycles
//! from one that wanders past the step budget.

use std::fmt;

use log::{debug, warn};
use ndarray::Array2;

use crate::ml::rl::maze::{Cell, Maze, Position};
use crate::ml::rl::q_table::QTable;

const VISITED_MARK: char = 'A';
const GOAL_MARK: char = 'G';
const OBSTACLE_MARK: char = '#';
const EMPTY_MARK: char = '.';

/// How a greedy rollout ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RolloutStatus {
    ReachedGoal,
    StuckInLoop,
    StepLimitExceeded,
}

impl RolloutStatus {
    pub fn message(self) -> &'static str {
        match self {
            RolloutStatus::ReachedGoal => "Optimal Path Found by the Agent:",
            RolloutStatus::StuckInLoop => "No route found. The agent is stuck in a loop.",
            RolloutStatus::StepLimitExceeded => "No route found. The agent did not reach the goal.",
        }
    }
}

impl fmt::Display for RolloutStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Trace of a greedy rollout.
#[derive(Debug, Clone, PartialEq)]
pub struct Rollout {
    pub status: RolloutStatus,
    /// States in visiting order, starting with the start cell
    pub path: Vec<Position>,
    /// Moves taken
    pub steps: usize,
}

impl Rollout {
    pub fn reached_goal(&self) -> bool {
        self.status == RolloutStatus::ReachedGoal
    }

    /// Last state reached by the rollout.
    pub fn final_state(&self) -> Position {
        // `path` always holds the start cell
        self.path[self.path.len() - 1]
    }

    /// Grid after each move, with every cell left so far marked `A`.
    pub fn snapshots<'a>(&'a self, maze: &'a Maze) -> impl Iterator<Item = String> + 'a {
        (1..=self.steps).map(move |step| render_marks(maze, &self.path[..step], false))
    }

    /// Final grid: departed cells marked `A`, plus `G` on the goal when it was
    /// reached.
    pub fn render(&self, maze: &Maze) -> String {
        render_marks(maze, &self.path[..self.steps], self.reached_goal())
    }
}

/// Follows the greedy action of `table` from the maze's start cell.
///
/// Ends with [`RolloutStatus::ReachedGoal`] at the goal, with
/// [`RolloutStatus::StuckInLoop`] as soon as a cell would be left a second time,
/// and with [`RolloutStatus::StepLimitExceeded`] after `max_steps` moves.
///
/// # Examples
///
/// ```
/// use qmaze::ml::rl::maze::{Action, Maze, Position};
/// use qmaze::ml::rl::q_table::QTable;
/// use qmaze::ml::rl::rollout::{greedy_rollout, RolloutStatus};
///
/// let maze = Maze::parse("S.G").unwrap();
/// let mut table = QTable::for_maze(&maze);
/// table.set(Position::new(0, 0), Action::Right, 1.0);
/// table.set(Position::new(0, 1), Action::Right, 1.0);
///
/// let rollout = greedy_rollout(&maze, &table, 10);
/// assert_eq!(rollout.status, RolloutStatus::ReachedGoal);
/// assert_eq!(rollout.render(&maze), "AAG");
/// ```
pub fn greedy_rollout(maze: &Maze, table: &QTable, max_steps: usize) -> Rollout {
    let mut visited = Array2::from_elem((maze.rows(), maze.cols()), false);
    let mut state = maze.start();
    let mut path = vec![state];
    let mut steps = 0;

    while !maze.is_goal(state) && steps < max_steps {
        if visited[[state.row, state.col]] {
            warn!("Greedy policy revisits {} after {} steps", state, steps);
            return Rollout {
                status: RolloutStatus::StuckInLoop,
                path,
                steps,
            };
        }
        visited[[state.row, state.col]] = true;

        let action = table.best_action(state);
        let next_state = maze.transition(state, action);
        debug!("Rollout step {}: {} --{}--> {}", steps + 1, state, action, next_state);

        state = next_state;
        path.push(state);
        steps += 1;
    }

    let status = if maze.is_goal(state) {
        RolloutStatus::ReachedGoal
    } else {
        warn!("Greedy policy did not reach the goal within {} steps", max_steps);
        RolloutStatus::StepLimitExceeded
    };
    Rollout {
        status,
        path,
        steps,
    }
}

/// Greedy action per cell as arrows; obstacles are `#` and the goal `G`.
pub fn render_policy(maze: &Maze, table: &QTable) -> String {
    let grid = Array2::from_shape_fn((maze.rows(), maze.cols()), |(row, col)| {
        let pos = Position::new(row, col);
        match maze.cell(pos) {
            Cell::Obstacle => OBSTACLE_MARK,
            Cell::Goal => GOAL_MARK,
            Cell::Free => table.best_action(pos).arrow(),
        }
    });
    grid_to_string(&grid)
}

fn render_marks(maze: &Maze, marked: &[Position], show_goal: bool) -> String {
    let mut grid = maze.grid().mapv(|cell| match cell {
        Cell::Obstacle => OBSTACLE_MARK,
        Cell::Free | Cell::Goal => EMPTY_MARK,
    });
    for pos in marked {
        grid[[pos.row, pos.col]] = VISITED_MARK;
    }
    if show_goal {
        let goal = maze.goal();
        grid[[goal.row, goal.col]] = GOAL_MARK;
    }
    grid_to_string(&grid)
}

fn grid_to_string(grid: &Array2<char>) -> String {
    grid.outer_iter()
        .map(|row| row.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}
