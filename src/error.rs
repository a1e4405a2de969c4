use thiserror::Error;

/// Errors raised while building a maze or configuring a learner.
#[derive(Debug, Error)]
pub enum Error {
    #[error("maze has no cells")]
    EmptyMaze,

    #[error("row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("{what} ({row}, {col}) lies outside the {rows}x{cols} grid")]
    OutOfBounds {
        what: &'static str,
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("{what} ({row}, {col}) is an obstacle")]
    Blocked {
        what: &'static str,
        row: usize,
        col: usize,
    },

    #[error("goal cell at ({row}, {col}) does not match the configured goal")]
    GoalMismatch { row: usize, col: usize },

    #[error("unknown maze character {ch:?} at line {line}, column {col}")]
    InvalidCell { ch: char, line: usize, col: usize },

    #[error("maze has no {0} marker")]
    MissingMarker(char),

    #[error("maze has more than one {0} marker")]
    DuplicateMarker(char),

    #[error(
        "goal ({goal_row}, {goal_col}) cannot be reached from start ({start_row}, {start_col})"
    )]
    Unreachable {
        start_row: usize,
        start_col: usize,
        goal_row: usize,
        goal_col: usize,
    },

    #[error("invalid {name} = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
