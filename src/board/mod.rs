//! N-by-N board types and rules.

mod rules;
mod types;

pub use rules::{Outcome, Win, check_winner, evaluate, is_full};
pub use types::{Board, MIN_SIZE, Mark, SUPPORTED_SIZES, Square};
