//! Win tally with duplicate-safe scoring.

use std::collections::{HashMap, HashSet};

use tracing::{debug, instrument};

use crate::board::{Mark, Outcome};

/// Identifier ensuring a finished game is scored at most once.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ScoreKey {
    /// Networked game, keyed by its match id.
    Match(String),
    /// Local game, keyed by a monotonic per-session counter.
    LocalGame(u64),
}

/// Accumulates win counts across successive games within one session.
///
/// Outcome evaluation is side-effect free and may observe the same
/// finished game many times (re-renders, repeated polls); the seen-key
/// set guarantees each game scores at most once.
#[derive(Debug, Clone, Default)]
pub struct ScoreKeeper {
    tally: HashMap<Mark, u32>,
    seen: HashSet<ScoreKey>,
}

impl ScoreKeeper {
    /// Creates an empty score keeper.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a decided outcome at most once per key.
    ///
    /// Returns `true` when the tally changed. A draw marks the key as
    /// seen without changing the tally. An undecided outcome leaves the
    /// key unconsumed, so the game can still score once it finishes.
    #[instrument(skip(self, outcome))]
    pub fn record_if_decided(&mut self, outcome: &Outcome, key: ScoreKey) -> bool {
        if !outcome.is_decided() {
            return false;
        }
        if !self.seen.insert(key) {
            debug!("score already applied for this game");
            return false;
        }
        match outcome.winner() {
            Some(mark) => {
                let count = self.tally.entry(mark).or_insert(0);
                *count += 1;
                debug!(mark = %mark, count = *count, "win recorded");
                true
            }
            None => {
                debug!("draw recorded, tally unchanged");
                false
            }
        }
    }

    /// Win count for the given mark.
    pub fn wins(&self, mark: Mark) -> u32 {
        self.tally.get(&mark).copied().unwrap_or(0)
    }

    /// The full tally, one entry per mark that has won at least once.
    pub fn tally(&self) -> &HashMap<Mark, u32> {
        &self.tally
    }

    /// Zeroes the tally and forgets seen keys.
    ///
    /// Callers gate this against games still in progress; see
    /// `SessionController::reset_scores`.
    #[instrument(skip(self))]
    pub fn reset(&mut self) {
        self.tally.clear();
        self.seen.clear();
    }
}
