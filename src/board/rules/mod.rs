//! Game rules: win and draw evaluation.

mod draw;
mod win;

pub use draw::is_full;
pub use win::{Win, check_winner};

use super::types::{Board, Mark};
use tracing::instrument;

/// Outcome of evaluating a board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// No winner yet and at least one vacant cell.
    InProgress,
    /// A line is complete.
    Won(Win),
    /// Every cell occupied with no winner.
    Draw,
}

impl Outcome {
    /// True when the game has ended in a win or a draw.
    pub fn is_decided(&self) -> bool {
        !matches!(self, Outcome::InProgress)
    }

    /// The winning mark, if any.
    pub fn winner(&self) -> Option<Mark> {
        match self {
            Outcome::Won(win) => Some(win.mark),
            _ => None,
        }
    }
}

/// Evaluates a board: winner first, then draw, else in progress.
///
/// Stateless; safe to call arbitrarily often, on locally-built boards and
/// on boards flattened from remote payloads alike.
#[instrument(skip(board), fields(size = board.size()))]
pub fn evaluate(board: &Board) -> Outcome {
    if let Some(win) = check_winner(board) {
        return Outcome::Won(win);
    }
    if is_full(board) {
        return Outcome::Draw;
    }
    Outcome::InProgress
}
