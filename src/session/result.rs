use crate::engine::game::{Game, LossReason, Outcome};
use crate::engine::scoring::ScoreEntry;

/// Summary of one finished card, kept after the session moves on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CardResult {
    pub title: String,
    pub outcome: Outcome,
    pub score: i64,
    pub hints: u32,
    pub errors: u32,
    pub got_high_score: bool,
    pub top_scores: Vec<ScoreEntry>,
}

pub const TOP_SCORES_SHOWN: usize = 5;

impl CardResult {
    pub fn from_game(title: &str, game: &Game) -> Option<Self> {
        let outcome = game.outcome()?;
        let scoring = game.scoring();
        Some(Self {
            title: title.to_string(),
            outcome,
            score: scoring.current_score(),
            hints: scoring.hint_count(),
            errors: scoring.error_count(),
            got_high_score: scoring.got_high_score(),
            top_scores: scoring.top_entries(TOP_SCORES_SHOWN),
        })
    }

    /// Score as shown to the player; never below zero.
    pub fn display_score(&self) -> i64 {
        self.score.max(0)
    }

    pub fn headline(&self) -> String {
        let score = format!("Final score: {}", self.display_score());
        match self.outcome {
            Outcome::Won => format!("Card complete! {score}"),
            Outcome::Lost(LossReason::Revealed) => format!("Card revealed with CTRL-R! {score}"),
            Outcome::Lost(LossReason::TimeExpired) => format!("Time's up! {score}"),
            Outcome::Lost(LossReason::ScoreCollapsed | LossReason::Quit) => {
                format!("Game over! {score}")
            }
        }
    }
}
