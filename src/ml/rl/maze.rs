//! Grid maze environment.
//!
//! A maze is an immutable grid of free cells, obstacles and a single goal. The
//! agent moves one cell per action; moves off the edge are clamped and moves into
//! an obstacle leave the agent where it was. Rewards are evaluated on the cell the
//! agent lands on.
//!
//! # Examples
//!
//! ```
//! use qmaze::ml::rl::maze::{Action, Maze, Position};
//!
//! let maze = Maze::parse(
//!     "S.#
//!      ..G",
//! )
//! .unwrap();
//!
//! let next = maze.transition(Position::new(0, 0), Action::Right);
//! assert_eq!(next, Position::new(0, 1));
//! // (0, 2) is an obstacle, so the agent stays put
//! assert_eq!(maze.transition(next, Action::Right), next);
//! assert_eq!(maze.reward(Position::new(1, 2)), 10.0);
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::fs;
use std::path::Path;

use ndarray::Array2;

use crate::error::{Error, Result};

/// Kind of a single grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cell {
    Free,
    Obstacle,
    Goal,
}

impl Cell {
    fn symbol(self) -> char {
        match self {
            Cell::Free => '.',
            Cell::Obstacle => '#',
            Cell::Goal => 'G',
        }
    }
}

/// A `(row, col)` coordinate on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub const fn new(row: usize, col: usize) -> Self {
        Position { row, col }
    }
}

impl From<(usize, usize)> for Position {
    fn from((row, col): (usize, usize)) -> Self {
        Position { row, col }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// The four moves available in every state.
///
/// The order of [`Action::ALL`] is the action index used by the value table and
/// decides ties when several actions share the best value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Up,
    Down,
    Left,
    Right,
}

impl Action {
    pub const ALL: [Action; 4] = [Action::Up, Action::Down, Action::Left, Action::Right];
    pub const COUNT: usize = Self::ALL.len();

    pub fn index(self) -> usize {
        match self {
            Action::Up => 0,
            Action::Down => 1,
            Action::Left => 2,
            Action::Right => 3,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Action::Up => "up",
            Action::Down => "down",
            Action::Left => "left",
            Action::Right => "right",
        }
    }

    pub fn arrow(self) -> char {
        match self {
            Action::Up => '^',
            Action::Down => 'v',
            Action::Left => '<',
            Action::Right => '>',
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reward values handed out by [`Maze::reward`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rewards {
    /// Reward for landing on the goal
    pub goal: f64,
    /// Reward for landing on an obstacle (never happens with the clamping transition)
    pub obstacle: f64,
    /// Cost of every other step
    pub step: f64,
}

impl Default for Rewards {
    fn default() -> Self {
        Self {
            goal: 10.0,
            obstacle: -10.0,
            step: -1.0,
        }
    }
}

// 0 = free, 1 = obstacle, 2 = goal
const CLASSIC_LAYOUT: [[u8; 5]; 5] = [
    [0, 0, 0, 1, 0],
    [0, 1, 1, 1, 0],
    [0, 1, 0, 0, 0],
    [0, 0, 1, 1, 0],
    [1, 0, 0, 0, 2],
];

/// Immutable maze with a start and a goal cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Maze {
    grid: Array2<Cell>,
    start: Position,
    goal: Position,
    rewards: Rewards,
}

impl Maze {
    /// Builds a maze from rows of cells.
    ///
    /// The goal cell is marked [`Cell::Goal`] regardless of what `cells` holds
    /// there. Fails if the grid is empty or ragged, if start or goal are outside
    /// the grid or on an obstacle, if a `Goal` cell sits anywhere but `goal`, or if
    /// the goal cannot be reached from the start.
    pub fn new(cells: Vec<Vec<Cell>>, start: Position, goal: Position) -> Result<Self> {
        let rows = cells.len();
        let cols = cells.first().map_or(0, Vec::len);
        if rows == 0 || cols == 0 {
            return Err(Error::EmptyMaze);
        }
        for (row, line) in cells.iter().enumerate() {
            if line.len() != cols {
                return Err(Error::RaggedRow {
                    row,
                    expected: cols,
                    found: line.len(),
                });
            }
        }

        for (what, pos) in [("start", start), ("goal", goal)] {
            if pos.row >= rows || pos.col >= cols {
                return Err(Error::OutOfBounds {
                    what,
                    row: pos.row,
                    col: pos.col,
                    rows,
                    cols,
                });
            }
            if cells[pos.row][pos.col] == Cell::Obstacle {
                return Err(Error::Blocked {
                    what,
                    row: pos.row,
                    col: pos.col,
                });
            }
        }

        let mut grid = Array2::from_shape_fn((rows, cols), |(r, c)| cells[r][c]);
        for ((row, col), cell) in grid.indexed_iter() {
            if *cell == Cell::Goal && Position::new(row, col) != goal {
                return Err(Error::GoalMismatch { row, col });
            }
        }
        grid[[goal.row, goal.col]] = Cell::Goal;

        let maze = Maze {
            grid,
            start,
            goal,
            rewards: Rewards::default(),
        };
        if !maze.is_reachable(start, goal) {
            return Err(Error::Unreachable {
                start_row: start.row,
                start_col: start.col,
                goal_row: goal.row,
                goal_col: goal.col,
            });
        }
        Ok(maze)
    }

    /// Parses a maze drawn with `.` (free), `#` (obstacle), `S` (start) and `G`
    /// (goal). Leading whitespace on each line and blank lines are ignored.
    pub fn parse(text: &str) -> Result<Self> {
        let mut cells = Vec::new();
        let mut start = None;
        let mut goal = None;

        for (line_no, line) in text
            .lines()
            .map(str::trim)
            .enumerate()
            .filter(|(_, line)| !line.is_empty())
        {
            let row = cells.len();
            let mut cells_row = Vec::with_capacity(line.len());
            for (col, ch) in line.chars().enumerate() {
                let cell = match ch {
                    '.' => Cell::Free,
                    '#' => Cell::Obstacle,
                    'S' => {
                        if start.replace(Position::new(row, col)).is_some() {
                            return Err(Error::DuplicateMarker('S'));
                        }
                        Cell::Free
                    }
                    'G' => {
                        if goal.replace(Position::new(row, col)).is_some() {
                            return Err(Error::DuplicateMarker('G'));
                        }
                        Cell::Goal
                    }
                    _ => {
                        return Err(Error::InvalidCell {
                            ch,
                            line: line_no + 1,
                            col: col + 1,
                        })
                    }
                };
                cells_row.push(cell);
            }
            cells.push(cells_row);
        }

        if cells.is_empty() {
            return Err(Error::EmptyMaze);
        }
        let start = start.ok_or(Error::MissingMarker('S'))?;
        let goal = goal.ok_or(Error::MissingMarker('G'))?;
        Self::new(cells, start, goal)
    }

    /// Reads a maze in the [`Maze::parse`] format from a file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// The 5x5 maze with start (0, 0) and goal (4, 4):
    ///
    /// ```text
    /// S..#.
    /// .###.
    /// .#...
    /// ..##.
    /// #...G
    /// ```
    pub fn classic() -> Self {
        let grid = Array2::from_shape_fn((5, 5), |(r, c)| match CLASSIC_LAYOUT[r][c] {
            1 => Cell::Obstacle,
            2 => Cell::Goal,
            _ => Cell::Free,
        });
        Maze {
            grid,
            start: Position::new(0, 0),
            goal: Position::new(4, 4),
            rewards: Rewards::default(),
        }
    }

    pub fn with_rewards(mut self, rewards: Rewards) -> Self {
        self.rewards = rewards;
        self
    }

    pub fn rows(&self) -> usize {
        self.grid.nrows()
    }

    pub fn cols(&self) -> usize {
        self.grid.ncols()
    }

    pub fn start(&self) -> Position {
        self.start
    }

    pub fn goal(&self) -> Position {
        self.goal
    }

    pub fn rewards(&self) -> Rewards {
        self.rewards
    }

    pub fn grid(&self) -> &Array2<Cell> {
        &self.grid
    }

    pub fn cell(&self, pos: Position) -> Cell {
        self.grid[[pos.row, pos.col]]
    }

    pub fn is_obstacle(&self, pos: Position) -> bool {
        self.cell(pos) == Cell::Obstacle
    }

    pub fn is_goal(&self, pos: Position) -> bool {
        pos == self.goal
    }

    /// Every position on the grid in row-major order, obstacles included.
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.rows())
            .flat_map(move |row| (0..self.cols()).map(move |col| Position::new(row, col)))
    }

    /// Moves one cell in the direction of `action`.
    ///
    /// Moving off the grid is a no-op along that axis, and a move that would land
    /// on an obstacle returns `state` unchanged. `state` must lie on the grid.
    pub fn transition(&self, state: Position, action: Action) -> Position {
        let Position { mut row, mut col } = state;
        match action {
            Action::Up if row > 0 => row -= 1,
            Action::Down if row + 1 < self.rows() => row += 1,
            Action::Left if col > 0 => col -= 1,
            Action::Right if col + 1 < self.cols() => col += 1,
            _ => {}
        }

        let candidate = Position::new(row, col);
        if self.is_obstacle(candidate) {
            state
        } else {
            candidate
        }
    }

    /// Reward for arriving at `state`.
    pub fn reward(&self, state: Position) -> f64 {
        if self.is_goal(state) {
            self.rewards.goal
        } else if self.is_obstacle(state) {
            self.rewards.obstacle
        } else {
            self.rewards.step
        }
    }

    /// Applies `action` and returns the resulting state with its reward.
    pub fn step(&self, state: Position, action: Action) -> (Position, f64) {
        let next = self.transition(state, action);
        (next, self.reward(next))
    }

    // Breadth-first search over `transition`.
    fn is_reachable(&self, from: Position, to: Position) -> bool {
        let mut seen = Array2::from_elem(self.grid.dim(), false);
        let mut queue = VecDeque::new();
        seen[[from.row, from.col]] = true;
        queue.push_back(from);

        while let Some(pos) = queue.pop_front() {
            if pos == to {
                return true;
            }
            for action in Action::ALL {
                let next = self.transition(pos, action);
                if !seen[[next.row, next.col]] {
                    seen[[next.row, next.col]] = true;
                    queue.push_back(next);
                }
            }
        }
        false
    }
}

impl Default for Maze {
    fn default() -> Self {
        Self::classic()
    }
}

impl fmt::Display for Maze {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (row, line) in self.grid.outer_iter().enumerate() {
            if row > 0 {
                writeln!(f)?;
            }
            for (col, cell) in line.iter().enumerate() {
                let symbol = if Position::new(row, col) == self.start {
                    'S'
                } else {
                    cell.symbol()
                };
                write!(f, "{}", symbol)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLASSIC_TEXT: &str = "
        S..#.
        .###.
        .#...
        ..##.
        #...G
    ";

    #[test]
    fn test_classic_matches_parsed_layout() {
        let parsed = Maze::parse(CLASSIC_TEXT).unwrap();
        assert_eq!(parsed, Maze::classic());
        assert_eq!(Maze::classic().to_string(), "S..#.\n.###.\n.#...\n..##.\n#...G");
    }

    #[test]
    fn test_transition_never_enters_obstacle() {
        let maze = Maze::classic();
        for pos in maze.positions() {
            for action in Action::ALL {
                let next = maze.transition(pos, action);
                assert!(
                    !maze.is_obstacle(next) || next == pos,
                    "{} --{}--> {} entered an obstacle",
                    pos,
                    action,
                    next
                );
            }
        }
        // Starting from any free cell, the result is always free
        for pos in maze.positions().filter(|p| !maze.is_obstacle(*p)) {
            for action in Action::ALL {
                assert!(!maze.is_obstacle(maze.transition(pos, action)));
            }
        }
    }

    #[test]
    fn test_transition_clamps_at_boundary() {
        let maze = Maze::parse("S...\n....\n...G").unwrap();
        for col in 0..maze.cols() {
            let top = Position::new(0, col);
            assert_eq!(maze.transition(top, Action::Up), top);
            let bottom = Position::new(maze.rows() - 1, col);
            assert_eq!(maze.transition(bottom, Action::Down), bottom);
        }
        for row in 0..maze.rows() {
            let left = Position::new(row, 0);
            assert_eq!(maze.transition(left, Action::Left), left);
            let right = Position::new(row, maze.cols() - 1);
            assert_eq!(maze.transition(right, Action::Right), right);
        }
    }

    #[test]
    fn test_transition_moves_one_cell() {
        let maze = Maze::classic();
        assert_eq!(maze.transition(Position::new(0, 0), Action::Down), Position::new(1, 0));
        assert_eq!(maze.transition(Position::new(0, 0), Action::Right), Position::new(0, 1));
        assert_eq!(maze.transition(Position::new(4, 3), Action::Right), Position::new(4, 4));
        // (1, 1) is a wall
        assert_eq!(maze.transition(Position::new(1, 0), Action::Right), Position::new(1, 0));
        assert_eq!(maze.transition(Position::new(2, 2), Action::Up), Position::new(2, 2));
    }

    #[test]
    fn test_rewards() {
        let maze = Maze::classic();
        assert_eq!(maze.reward(maze.goal()), 10.0);
        assert_eq!(maze.reward(Position::new(0, 0)), -1.0);
        assert_eq!(maze.reward(Position::new(2, 3)), -1.0);
        // Unreachable through `transition`, but still defined
        assert_eq!(maze.reward(Position::new(1, 1)), -10.0);

        let (next, reward) = maze.step(Position::new(4, 3), Action::Right);
        assert_eq!(next, maze.goal());
        assert_eq!(reward, 10.0);
    }

    #[test]
    fn test_custom_rewards() {
        let maze = Maze::classic().with_rewards(Rewards {
            goal: 1.0,
            obstacle: -5.0,
            step: 0.0,
        });
        assert_eq!(maze.reward(maze.goal()), 1.0);
        assert_eq!(maze.reward(Position::new(0, 0)), 0.0);
    }

    #[test]
    fn test_new_validates_positions() {
        let cells = vec![vec![Cell::Free, Cell::Obstacle], vec![Cell::Free, Cell::Free]];

        let err = Maze::new(cells.clone(), Position::new(2, 0), Position::new(1, 1)).unwrap_err();
        assert!(matches!(err, Error::OutOfBounds { what: "start", .. }));

        let err = Maze::new(cells.clone(), Position::new(0, 0), Position::new(0, 5)).unwrap_err();
        assert!(matches!(err, Error::OutOfBounds { what: "goal", .. }));

        let err = Maze::new(cells.clone(), Position::new(0, 0), Position::new(0, 1)).unwrap_err();
        assert!(matches!(err, Error::Blocked { what: "goal", .. }));

        let maze = Maze::new(cells, Position::new(0, 0), Position::new(1, 1)).unwrap();
        assert_eq!(maze.cell(Position::new(1, 1)), Cell::Goal);
    }

    #[test]
    fn test_new_rejects_bad_shapes() {
        assert!(matches!(
            Maze::new(vec![], Position::new(0, 0), Position::new(0, 0)),
            Err(Error::EmptyMaze)
        ));
        let ragged = vec![vec![Cell::Free, Cell::Free], vec![Cell::Free]];
        assert!(matches!(
            Maze::new(ragged, Position::new(0, 0), Position::new(0, 1)),
            Err(Error::RaggedRow { row: 1, expected: 2, found: 1 })
        ));
    }

    #[test]
    fn test_new_rejects_stray_goal() {
        let cells = vec![vec![Cell::Free, Cell::Goal], vec![Cell::Free, Cell::Free]];
        assert!(matches!(
            Maze::new(cells, Position::new(0, 0), Position::new(1, 1)),
            Err(Error::GoalMismatch { row: 0, col: 1 })
        ));
    }

    #[test]
    fn test_unreachable_goal() {
        let err = Maze::parse("S#.\n##.\n..G").unwrap_err();
        assert!(matches!(err, Error::Unreachable { .. }));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(Maze::parse(""), Err(Error::EmptyMaze)));
        assert!(matches!(Maze::parse("..G"), Err(Error::MissingMarker('S'))));
        assert!(matches!(Maze::parse("S.."), Err(Error::MissingMarker('G'))));
        assert!(matches!(Maze::parse("SSG"), Err(Error::DuplicateMarker('S'))));
        assert!(matches!(
            Maze::parse("S.\n.x\n.G"),
            Err(Error::InvalidCell { ch: 'x', line: 2, col: 2 })
        ));
    }

    #[test]
    fn test_from_file_loads_corridor() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/mazes/corridor.txt");
        let maze = Maze::from_file(path).unwrap();
        assert_eq!((maze.rows(), maze.cols()), (5, 10));
        assert_eq!(maze.start(), Position::new(0, 0));
        assert_eq!(maze.goal(), Position::new(4, 9));
        assert_eq!(maze.cell(maze.goal()), Cell::Goal);
        assert!(maze.is_obstacle(Position::new(1, 0)));
        assert!(maze.is_obstacle(Position::new(4, 8)));
        assert_eq!(maze.to_string().lines().next(), Some("S.....#..."));
    }

    #[test]
    fn test_from_missing_file() {
        let err = Maze::from_file("/nonexistent/qmaze/maze.txt").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_action_indices() {
        for (i, action) in Action::ALL.iter().enumerate() {
            assert_eq!(action.index(), i);
            assert_eq!(Action::from_index(i), Some(*action));
        }
        assert_eq!(Action::from_index(4), None);
    }
}
