//! Win detection over arbitrary board sizes.

use super::super::types::{Board, Mark, Square};
use tracing::instrument;

/// A completed winning line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Win {
    /// Mark that owns the line.
    pub mark: Mark,
    /// Cell indices of the line, in scan order. Always `size` entries.
    pub line: Vec<usize>,
}

/// Candidate lines for a board of the given size, `2 * size + 2` in total.
///
/// Rows top to bottom, then columns left to right, then the main diagonal,
/// then the anti-diagonal. This order is the tie-break if more than one
/// line were complete at once.
fn candidate_lines(size: usize) -> Vec<Vec<usize>> {
    let mut lines = Vec::with_capacity(2 * size + 2);
    for row in 0..size {
        lines.push((0..size).map(|col| row * size + col).collect());
    }
    for col in 0..size {
        lines.push((0..size).map(|row| row * size + col).collect());
    }
    lines.push((0..size).map(|i| i * size + i).collect());
    lines.push((0..size).map(|i| i * size + (size - 1 - i)).collect());
    lines
}

/// Checks if there is a winner on the board.
///
/// Returns the winning mark together with its line, scanning candidates
/// in the fixed order documented on [`candidate_lines`].
#[instrument(skip(board), fields(size = board.size()))]
pub fn check_winner(board: &Board) -> Option<Win> {
    for line in candidate_lines(board.size()) {
        let Some(Square::Occupied(mark)) = board.get(line[0]) else {
            continue;
        };
        if line
            .iter()
            .all(|&pos| board.get(pos) == Some(Square::Occupied(mark)))
        {
            return Some(Win { mark, line });
        }
    }
    None
}
