pub mod result;

use anyhow::{Result, bail};
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use tracing::{debug, info};

use crate::cards::Card;
use crate::engine::game::{Game, GameOptions, Input, LossReason, Outcome, Transition};
use crate::engine::scoring::{ScoreTable, Scoring};
use crate::engine::timer::TimerSetting;
use crate::session::result::CardResult;
use crate::store::ScoreLedger;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionSettings {
    pub options: GameOptions,
    pub score_table: ScoreTable,
    pub randomize: bool,
}

/// The time pool shared by every card in a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeBudget {
    pub total: u32,
    pub remaining: u32,
}

impl TimeBudget {
    pub fn for_cards(setting: TimerSetting, cards: &[Card]) -> Option<Self> {
        let total = match setting {
            TimerSetting::Off => return None,
            TimerSetting::Fixed(secs) => secs,
            TimerSetting::Auto => cards
                .iter()
                .fold(0u32, |sum, card| sum.saturating_add(card.auto_time_limit())),
        };
        Some(Self {
            total,
            remaining: total,
        })
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }

    /// True once two thirds of the pool are spent.
    pub fn is_running_low(&self) -> bool {
        u64::from(self.remaining) * 3 <= u64::from(self.total)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionEnd {
    Completed,
    TimeExpired,
    ScoreCollapsed,
    Quit,
    /// The next card could not be set up.
    Aborted,
}

/// Plays a list of cards in order, one game at a time.
pub struct Session<L: ScoreLedger> {
    cards: Vec<Card>,
    index: usize,
    game: Game,
    settings: SessionSettings,
    ledger: L,
    rng: SmallRng,
    total_score: i64,
    budget: Option<TimeBudget>,
    ending: Option<SessionEnd>,
    results: Vec<CardResult>,
}

impl<L: ScoreLedger> Session<L> {
    pub fn new(
        mut cards: Vec<Card>,
        settings: SessionSettings,
        ledger: L,
        mut rng: SmallRng,
    ) -> Result<Self> {
        if cards.is_empty() {
            bail!("a session needs at least one card");
        }
        if settings.randomize && cards.len() > 1 {
            cards.shuffle(&mut rng);
        }

        let budget = TimeBudget::for_cards(settings.options.timer, &cards);
        let game = build_game(&cards[0], &settings, budget.as_ref(), &ledger, &mut rng)?;
        info!(
            cards = cards.len(),
            randomized = settings.randomize,
            budget = ?budget.map(|b| b.total),
            "session started"
        );

        Ok(Self {
            cards,
            index: 0,
            game,
            settings,
            ledger,
            rng,
            total_score: 0,
            budget,
            ending: None,
            results: Vec::new(),
        })
    }

    /// Feeds one input to the current game and reacts if it ended.
    ///
    /// State is always updated before an error is returned, so a failed save
    /// never leaves the session stuck on a finished game.
    pub fn handle_input(&mut self, input: Input) -> Result<()> {
        if self.ending.is_some() {
            return Ok(());
        }

        let transition = self.game.handle_input(input);
        self.sync_budget();
        let Transition::Ended(outcome) = transition else {
            return Ok(());
        };

        let saved = if outcome.should_persist() {
            self.game.scoring().record_completion(&mut self.ledger)
        } else {
            Ok(())
        };
        let title = self.cards[self.index].display_title();
        self.results.extend(CardResult::from_game(&title, &self.game));

        let moved = match outcome {
            Outcome::Won => {
                self.total_score += self.game.scoring().current_score();
                self.advance()
            }
            Outcome::Lost(LossReason::Revealed) => self.advance(),
            Outcome::Lost(LossReason::TimeExpired) => {
                self.finish(SessionEnd::TimeExpired);
                Ok(())
            }
            Outcome::Lost(LossReason::ScoreCollapsed) => {
                self.finish(SessionEnd::ScoreCollapsed);
                Ok(())
            }
            Outcome::Lost(LossReason::Quit) => {
                self.finish(SessionEnd::Quit);
                Ok(())
            }
        };
        saved?;
        moved
    }

    fn sync_budget(&mut self) {
        let remaining = self.game.time_remaining();
        if let (Some(budget), Some(remaining)) = (self.budget.as_mut(), remaining) {
            budget.remaining = remaining;
        }
    }

    fn advance(&mut self) -> Result<()> {
        if self.index + 1 >= self.cards.len() {
            self.index = self.cards.len();
            self.finish(SessionEnd::Completed);
            return Ok(());
        }
        if self.budget.is_some_and(|b| b.is_exhausted()) {
            self.finish(SessionEnd::TimeExpired);
            return Ok(());
        }

        let next = build_game(
            &self.cards[self.index + 1],
            &self.settings,
            self.budget.as_ref(),
            &self.ledger,
            &mut self.rng,
        );
        let game = match next {
            Ok(game) => game,
            Err(err) => {
                self.finish(SessionEnd::Aborted);
                return Err(err);
            }
        };
        self.index += 1;
        self.game = game;
        debug!(
            index = self.index,
            total_score = self.total_score,
            remaining = ?self.budget.map(|b| b.remaining),
            "next card"
        );
        Ok(())
    }

    fn finish(&mut self, end: SessionEnd) {
        self.ending = Some(end);
        info!(
            ?end,
            total_score = self.total_score,
            cards_played = self.results.len(),
            "session ended"
        );
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// The card being played; the last one once the session is finished.
    pub fn current_card(&self) -> &Card {
        &self.cards[self.index.min(self.cards.len() - 1)]
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn card_count(&self) -> usize {
        self.cards.len()
    }

    pub fn total_score(&self) -> i64 {
        self.total_score
    }

    pub fn budget(&self) -> Option<TimeBudget> {
        self.budget
    }

    pub fn ending(&self) -> Option<SessionEnd> {
        self.ending
    }

    pub fn results(&self) -> &[CardResult] {
        &self.results
    }

    pub fn last_result(&self) -> Option<&CardResult> {
        self.results.last()
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn is_over(&self) -> bool {
        self.ending.is_some()
    }

    /// Every card has been played through.
    pub fn is_finished(&self) -> bool {
        self.index >= self.cards.len()
    }

    pub fn is_session_loss(&self) -> bool {
        matches!(
            self.ending,
            Some(SessionEnd::TimeExpired | SessionEnd::ScoreCollapsed)
        )
    }

    pub fn is_last_card(&self) -> bool {
        self.index + 1 >= self.cards.len()
    }

    pub fn is_batch(&self) -> bool {
        self.cards.len() > 1
    }
}

/// Each card's countdown starts from whatever is left of the shared pool.
fn build_game<L: ScoreLedger>(
    card: &Card,
    settings: &SessionSettings,
    budget: Option<&TimeBudget>,
    ledger: &L,
    rng: &mut SmallRng,
) -> Result<Game> {
    let title = card.display_title();
    let scoring = Scoring::load(&card.content, &title, settings.score_table.clone(), ledger)?;
    let options = GameOptions {
        timer: budget.map_or(TimerSetting::Off, |b| TimerSetting::Fixed(b.remaining)),
        ..settings.options.clone()
    };
    Ok(Game::new(&card.content, scoring, &options, rng))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::engine::scoring::{ScoreEntry, content_hash};
    use crate::store::MemoryLedger;
    use chrono::Utc;
    use rand::SeedableRng;

    fn card(content: &str) -> Card {
        Card {
            content: content.to_string(),
            source: PathBuf::from("cards.txt"),
            title: None,
            part_index: 1,
            total_parts: 1,
        }
    }

    fn settings(timer: TimerSetting) -> SessionSettings {
        SessionSettings {
            options: GameOptions {
                timer,
                ..GameOptions::default()
            },
            ..SessionSettings::default()
        }
    }

    fn session(contents: &[&str], settings: SessionSettings) -> Session<MemoryLedger> {
        let cards = contents.iter().map(|c| card(c)).collect();
        Session::new(
            cards,
            settings,
            MemoryLedger::default(),
            SmallRng::seed_from_u64(9),
        )
        .unwrap()
    }

    fn type_str(session: &mut Session<MemoryLedger>, text: &str) {
        for ch in text.chars() {
            session.handle_input(Input::Char(ch)).unwrap();
        }
    }

    #[test]
    fn test_empty_session_is_refused() {
        let result = Session::new(
            Vec::new(),
            SessionSettings::default(),
            MemoryLedger::default(),
            SmallRng::seed_from_u64(1),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_single_card_win_completes_session() {
        let mut s = session(&["ab"], SessionSettings::default());
        assert!(!s.is_batch());
        assert!(s.is_last_card());

        type_str(&mut s, "ab");
        assert_eq!(s.ending(), Some(SessionEnd::Completed));
        assert!(s.is_finished());
        assert!(!s.is_session_loss());
        assert_eq!(s.total_score(), 1050);
        assert_eq!(s.ledger().entries().len(), 1);
        assert_eq!(s.ledger().save_count(), 1);
        assert_eq!(s.current_card().content, "ab");
        assert!(s.game().is_won());
    }

    #[test]
    fn test_win_advances_and_accumulates() {
        let mut s = session(&["ab", "cd"], SessionSettings::default());
        assert!(s.is_batch());
        type_str(&mut s, "ab");
        assert_eq!(s.index(), 1);
        assert!(s.is_last_card());
        assert!(!s.is_over());
        assert_eq!(s.game().mask_string(), "__");

        type_str(&mut s, "cd");
        assert_eq!(s.total_score(), 2100);
        assert_eq!(s.results().len(), 2);
        assert_eq!(s.ledger().entries().len(), 2);
    }

    #[test]
    fn test_reveal_all_advances_without_score() {
        let mut s = session(&["ab", "cd"], SessionSettings::default());
        s.handle_input(Input::RevealAll).unwrap();
        assert_eq!(s.index(), 1);
        assert_eq!(s.total_score(), 0);
        assert_eq!(s.ledger().save_count(), 1);
        let result = s.last_result().unwrap();
        assert_eq!(result.outcome, Outcome::Lost(LossReason::Revealed));
    }

    #[test]
    fn test_quit_ends_without_saving() {
        let mut s = session(&["ab", "cd"], SessionSettings::default());
        s.handle_input(Input::Quit).unwrap();
        assert_eq!(s.ending(), Some(SessionEnd::Quit));
        assert_eq!(s.ledger().save_count(), 0);
        assert!(!s.is_finished());
    }

    #[test]
    fn test_score_collapse_ends_session() {
        let mut s = session(&["ab", "cd"], SessionSettings::default());
        s.handle_input(Input::Char('x')).unwrap();
        assert_eq!(s.ending(), Some(SessionEnd::ScoreCollapsed));
        assert!(s.is_session_loss());
        assert_eq!(s.index(), 0);
        assert_eq!(s.ledger().entries()[0].score, -50);

        s.handle_input(Input::Char('a')).unwrap();
        assert_eq!(s.ledger().save_count(), 1);
    }

    #[test]
    fn test_timer_carries_over_between_cards() {
        let mut s = session(&["ab", "cd"], settings(TimerSetting::Fixed(30)));
        assert_eq!(s.budget(), Some(TimeBudget { total: 30, remaining: 30 }));
        assert_eq!(s.game().time_limit(), Some(30));

        for _ in 0..5 {
            s.handle_input(Input::Tick).unwrap();
        }
        assert_eq!(s.budget().map(|b| b.remaining), Some(25));

        type_str(&mut s, "ab");
        assert_eq!(s.index(), 1);
        assert_eq!(s.game().time_limit(), Some(25));
        assert_eq!(s.budget().map(|b| b.total), Some(30));
        // 50 for letters, 1000 for the card, 250 for the seconds left.
        assert_eq!(s.total_score(), 1300);
    }

    #[test]
    fn test_timer_expiry_ends_session() {
        let mut s = session(&["ab", "cd"], settings(TimerSetting::Fixed(2)));
        s.handle_input(Input::Tick).unwrap();
        assert!(!s.is_over());
        s.handle_input(Input::Tick).unwrap();
        assert_eq!(s.ending(), Some(SessionEnd::TimeExpired));
        assert!(s.is_session_loss());
        assert_eq!(s.ledger().save_count(), 1);

        s.handle_input(Input::Tick).unwrap();
        assert_eq!(s.ledger().save_count(), 1);
    }

    #[test]
    fn test_auto_budget_sums_card_limits() {
        let long = "x".repeat(90);
        let s = session(&[long.as_str(), "short"], settings(TimerSetting::Auto));
        assert_eq!(s.budget().map(|b| b.total), Some(40));
    }

    #[test]
    fn test_no_budget_without_timer() {
        let s = session(&["ab"], SessionSettings::default());
        assert_eq!(s.budget(), None);
        assert!(!s.game().timer_enabled());
    }

    #[test]
    fn test_budget_running_low() {
        let budget = TimeBudget {
            total: 30,
            remaining: 10,
        };
        assert!(budget.is_running_low());
        assert!(!TimeBudget { total: 30, remaining: 11 }.is_running_low());
    }

    #[test]
    fn test_randomize_keeps_every_card() {
        let contents = ["a", "b", "c", "d", "e", "f"];
        let s = session(
            &contents,
            SessionSettings {
                randomize: true,
                ..SessionSettings::default()
            },
        );
        let mut seen: Vec<&str> = s.cards().iter().map(|c| c.content.as_str()).collect();
        seen.sort();
        assert_eq!(seen, contents);
    }

    #[test]
    fn test_history_is_loaded_per_card() {
        let entries = vec![ScoreEntry {
            hash: content_hash("cd"),
            score: 4000,
            timestamp: Utc::now(),
            title: "old".into(),
        }];
        let mut s = Session::new(
            vec![card("ab"), card("cd")],
            SessionSettings::default(),
            MemoryLedger::with_entries(entries),
            SmallRng::seed_from_u64(3),
        )
        .unwrap();
        assert_eq!(s.game().scoring().attempts(), 0);
        type_str(&mut s, "ab");
        assert_eq!(s.game().scoring().attempts(), 1);
        assert_eq!(s.game().scoring().high_score().map(|e| e.score), Some(4000));
    }

    #[test]
    fn test_failed_save_is_reported_after_state_update() {
        let mut s = session(&["ab"], SessionSettings::default());
        // Swap in a broken ledger once the game is running.
        s.ledger = MemoryLedger::failing();
        s.handle_input(Input::Char('a')).unwrap();
        assert!(s.handle_input(Input::Char('b')).is_err());
        assert_eq!(s.ending(), Some(SessionEnd::Completed));
    }

    #[test]
    fn test_exhausted_budget_stops_before_next_card() {
        let mut s = session(&["ab", "cd"], settings(TimerSetting::Fixed(0)));
        type_str(&mut s, "ab");
        assert_eq!(s.ending(), Some(SessionEnd::TimeExpired));
        assert!(s.is_session_loss());
        assert_eq!(s.index(), 0);
        assert_eq!(s.game().mask_string(), "ab");
        assert_eq!(s.ledger().save_count(), 1);
    }

    #[test]
    fn test_failed_history_load_ends_session() {
        // First card's load, then the save's reload; the next card's load fails.
        let mut s = Session::new(
            vec![card("ab"), card("cd")],
            SessionSettings::default(),
            MemoryLedger::failing_loads_after(2),
            SmallRng::seed_from_u64(5),
        )
        .unwrap();
        s.handle_input(Input::Char('a')).unwrap();
        assert!(s.handle_input(Input::Char('b')).is_err());

        assert_eq!(s.ending(), Some(SessionEnd::Aborted));
        assert!(s.is_over());
        assert_eq!(s.index(), 0);
        assert_eq!(s.current_card().content, "ab");
        assert_eq!(s.ledger().save_count(), 1);

        s.handle_input(Input::Char('c')).unwrap();
        assert_eq!(s.game().mask_string(), "ab");
    }
}
