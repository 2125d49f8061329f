//! Tests for duplicate-safe score accounting.

use gridmatch::{Mark, Outcome, ScoreKeeper, ScoreKey, Win};

fn won(mark: Mark) -> Outcome {
    Outcome::Won(Win {
        mark,
        line: vec![0, 1, 2],
    })
}

#[test]
fn test_same_key_scores_once() {
    let mut scores = ScoreKeeper::new();
    assert!(scores.record_if_decided(&won(Mark::X), ScoreKey::Match("m-7".into())));
    assert!(!scores.record_if_decided(&won(Mark::X), ScoreKey::Match("m-7".into())));
    assert_eq!(scores.wins(Mark::X), 1);
    assert_eq!(scores.tally().len(), 1);
}

#[test]
fn test_match_and_local_keys_are_distinct() {
    let mut scores = ScoreKeeper::new();
    scores.record_if_decided(&won(Mark::O), ScoreKey::Match("3".into()));
    scores.record_if_decided(&won(Mark::O), ScoreKey::LocalGame(3));
    assert_eq!(scores.wins(Mark::O), 2);
}

#[test]
fn test_draws_and_undecided_games_never_score() {
    let mut scores = ScoreKeeper::new();
    assert!(!scores.record_if_decided(&Outcome::Draw, ScoreKey::LocalGame(0)));
    assert!(!scores.record_if_decided(&Outcome::InProgress, ScoreKey::LocalGame(1)));
    assert_eq!(scores.wins(Mark::X), 0);
    assert_eq!(scores.wins(Mark::O), 0);

    // The drawn game's key is spent; the in-progress game's is not.
    assert!(!scores.record_if_decided(&won(Mark::X), ScoreKey::LocalGame(0)));
    assert!(scores.record_if_decided(&won(Mark::X), ScoreKey::LocalGame(1)));
}
