use ndarray::{Array3, ArrayView1};

use crate::ml::rl::maze::{Action, Maze, Position};

/// Dense action-value table indexed by `[row, col, action]`.
///
/// Every grid cell has a row of values, obstacles included, so any position on
/// the grid is a valid index.
#[derive(Debug, Clone, PartialEq)]
pub struct QTable {
    values: Array3<f64>,
}

impl QTable {
    /// Creates a zero-initialised table for a `rows` x `cols` grid.
    pub fn new(rows: usize, cols: usize) -> Self {
        QTable {
            values: Array3::zeros((rows, cols, Action::COUNT)),
        }
    }

    pub fn for_maze(maze: &Maze) -> Self {
        Self::new(maze.rows(), maze.cols())
    }

    /// `(rows, cols, actions)`
    pub fn shape(&self) -> (usize, usize, usize) {
        self.values.dim()
    }

    pub fn get(&self, state: Position, action: Action) -> f64 {
        self.values[[state.row, state.col, action.index()]]
    }

    pub fn set(&mut self, state: Position, action: Action, value: f64) {
        self.values[[state.row, state.col, action.index()]] = value;
    }

    /// Values of all actions in `state`, in [`Action::ALL`] order.
    pub fn row(&self, state: Position) -> ArrayView1<'_, f64> {
        self.values.slice(ndarray::s![state.row, state.col, ..])
    }

    pub fn max_value(&self, state: Position) -> f64 {
        self.row(state).fold(f64::NEG_INFINITY, |a, &b| a.max(b))
    }

    /// Greedy action for `state`. Ties go to the first action in
    /// [`Action::ALL`] order.
    pub fn best_action(&self, state: Position) -> Action {
        let mut best_action = Action::Up;
        let mut max_q = f64::NEG_INFINITY;

        for action in Action::ALL {
            let q_value = self.get(state, action);
            if q_value > max_q {
                max_q = q_value;
                best_action = action;
            }
        }

        best_action
    }

    /// One-step Q-learning update, returning the temporal-difference error.
    ///
    /// Q(s,a) = Q(s,a) + α[r + γ max_a' Q(s',a') - Q(s,a)]
    pub fn update(
        &mut self,
        state: Position,
        action: Action,
        reward: f64,
        next_state: Position,
        learning_rate: f64,
        gamma: f64,
    ) -> f64 {
        let current_q = self.get(state, action);
        let next_max_q = self.max_value(next_state);
        let td_error = reward + gamma * next_max_q - current_q;

        self.set(state, action, current_q + learning_rate * td_error);
        td_error
    }
}
