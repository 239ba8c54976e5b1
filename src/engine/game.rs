use std::collections::BTreeSet;

use rand::Rng;
use tracing::{debug, info};

use crate::engine::scoring::{ScoreEvent, Scoring};
use crate::engine::secret::{self, Board, HINT_CHAR, chars_match, is_ignorable};
use crate::engine::timer::{Countdown, TimerSetting};

/// One discrete event fed to the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Input {
    Char(char),
    RevealAll,
    Quit,
    Tick,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LossReason {
    Quit,
    Revealed,
    TimeExpired,
    ScoreCollapsed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Won,
    Lost(LossReason),
}

impl Outcome {
    /// Quitting is the only ending that leaves no trace in the ledger.
    pub fn should_persist(self) -> bool {
        !matches!(self, Outcome::Lost(LossReason::Quit))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Ended(Outcome),
}

/// What a single input did to the game.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    Stayed,
    /// Reported exactly once, on the input that ended the game.
    Ended(Outcome),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GameOptions {
    pub timer: TimerSetting,
    pub first_letter: bool,
    pub random_letters: usize,
    pub random_words: usize,
}

/// The per-card state machine.
pub struct Game {
    board: Board,
    cursor: usize,
    phase: Phase,
    wrong_at: Option<usize>,
    typo_flags: BTreeSet<usize>,
    scoring: Scoring,
    countdown: Option<Countdown>,
}

impl Game {
    pub fn new<R: Rng + ?Sized>(
        text: &str,
        scoring: Scoring,
        options: &GameOptions,
        rng: &mut R,
    ) -> Self {
        let mut board = Board::new(secret::prepare(text));

        if options.first_letter {
            board.reveal_first_letters();
        }
        if options.random_letters > 0 {
            board.reveal_random_letters(options.random_letters, rng);
        }
        if options.random_words > 0 {
            board.reveal_random_words(options.random_words, rng);
        }

        let countdown = options
            .timer
            .limit_for(text.chars().count())
            .map(Countdown::new);

        let mut game = Self {
            board,
            cursor: 0,
            phase: Phase::Idle,
            wrong_at: None,
            typo_flags: BTreeSet::new(),
            scoring,
            countdown,
        };
        game.skip_revealed();
        debug!(
            len = game.board.len(),
            hidden = game.board.hidden_count(),
            cursor = game.cursor,
            time_limit = ?game.time_limit(),
            "game ready"
        );
        game
    }

    pub fn handle_input(&mut self, input: Input) -> Transition {
        if self.is_over() {
            return Transition::Stayed;
        }

        match input {
            Input::Tick => self.tick(),
            _ if self.board.is_complete() => self.win(),
            Input::Quit => self.end(Outcome::Lost(LossReason::Quit)),
            _ if self.scoring.current_score() < 0 => {
                self.end(Outcome::Lost(LossReason::ScoreCollapsed))
            }
            Input::RevealAll => {
                self.board.reveal_all();
                self.end(Outcome::Lost(LossReason::Revealed))
            }
            Input::Char(ch) => self.process_char(ch),
        }
    }

    fn tick(&mut self) -> Transition {
        let Some(countdown) = self.countdown.as_mut() else {
            return Transition::Stayed;
        };
        if countdown.tick() {
            return self.end(Outcome::Lost(LossReason::TimeExpired));
        }
        Transition::Stayed
    }

    fn process_char(&mut self, ch: char) -> Transition {
        self.skip_revealed();

        if self.cursor >= self.board.len() {
            if self.board.is_complete() {
                return self.win();
            }
            return Transition::Stayed;
        }

        // A correct letter always counts, even if it also matches the run behind the cursor.
        if self.is_correct(ch) {
            return self.check(ch);
        }
        if self.types_through(ch) {
            debug!(?ch, cursor = self.cursor, "typed through revealed text");
            return Transition::Stayed;
        }
        if is_ignorable(ch) {
            return Transition::Stayed;
        }
        if ch == HINT_CHAR {
            return self.hint();
        }
        self.check(ch)
    }

    /// Moves the cursor over ignorable, pre-revealed and already revealed cells.
    fn skip_revealed(&mut self) {
        while self.cursor < self.board.len() && self.board.is_skippable(self.cursor) {
            self.board.reveal(self.cursor);
            self.cursor += 1;
        }
    }

    fn is_correct(&self, ch: char) -> bool {
        self.board
            .secret()
            .get(self.cursor)
            .is_some_and(|&expected| chars_match(expected, ch))
    }

    /// True when `ch` matches the revealed run of word characters right behind the cursor.
    fn types_through(&self, ch: char) -> bool {
        let secret = self.board.secret();
        (0..self.cursor)
            .rev()
            .take_while(|&i| self.board.is_revealed(i) && !is_ignorable(secret[i]))
            .any(|i| chars_match(secret[i], ch))
    }

    fn hint(&mut self) -> Transition {
        let next = (self.cursor..self.board.len())
            .find(|&i| !self.board.is_revealed(i) && !is_ignorable(self.board.secret()[i]));
        let Some(pos) = next else {
            return Transition::Stayed;
        };
        self.board.reveal(pos);
        if self.wrong_at == Some(pos) {
            self.wrong_at = None;
        }
        self.scoring.score_event(ScoreEvent::Hint);
        debug!(pos, score = self.scoring.current_score(), "hint used");
        self.settle()
    }

    fn check(&mut self, ch: char) -> Transition {
        if self.is_correct(ch) {
            self.wrong_at = None;
            return self.matched();
        }
        // One penalty per position until it is answered.
        if self.is_wrong_letter() {
            return Transition::Stayed;
        }
        self.wrong_at = Some(self.cursor);
        self.typo_flags.insert(self.cursor);
        self.scoring.score_event(ScoreEvent::WrongLetter);
        debug!(?ch, cursor = self.cursor, score = self.scoring.current_score(), "wrong letter");
        self.settle()
    }

    fn matched(&mut self) -> Transition {
        self.board.reveal(self.cursor);
        self.scoring.score_event(ScoreEvent::RightLetter);

        let completes_word = self
            .board
            .secret()
            .get(self.cursor + 1)
            .is_some_and(|&next| is_ignorable(next));
        if completes_word {
            self.scoring.score_event(ScoreEvent::WordBonus);
        }

        if self.board.is_complete() {
            return self.win();
        }

        self.cursor += 1;
        self.settle()
    }

    fn settle(&mut self) -> Transition {
        if self.scoring.current_score() < 0 {
            return self.end(Outcome::Lost(LossReason::ScoreCollapsed));
        }
        Transition::Stayed
    }

    fn win(&mut self) -> Transition {
        self.scoring.score_event(ScoreEvent::MessageBonus);
        if let Some(countdown) = self.countdown {
            self.scoring.add_time_bonus(countdown.remaining());
        }
        if self.scoring.current_score() < 0 {
            return self.end(Outcome::Lost(LossReason::ScoreCollapsed));
        }
        self.end(Outcome::Won)
    }

    fn end(&mut self, outcome: Outcome) -> Transition {
        self.phase = Phase::Ended(outcome);
        info!(
            ?outcome,
            score = self.scoring.current_score(),
            hints = self.scoring.hint_count(),
            errors = self.scoring.error_count(),
            "game ended"
        );
        Transition::Ended(outcome)
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn mask_string(&self) -> String {
        self.board.mask_string()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn outcome(&self) -> Option<Outcome> {
        match self.phase {
            Phase::Ended(outcome) => Some(outcome),
            Phase::Idle => None,
        }
    }

    pub fn is_over(&self) -> bool {
        matches!(self.phase, Phase::Ended(_))
    }

    pub fn is_won(&self) -> bool {
        self.outcome() == Some(Outcome::Won)
    }

    pub fn is_lost(&self) -> bool {
        matches!(self.outcome(), Some(Outcome::Lost(_)))
    }

    /// The player gave up and asked for the whole text.
    pub fn is_revealed_by_player(&self) -> bool {
        self.outcome() == Some(Outcome::Lost(LossReason::Revealed))
    }

    /// The last input at the current cursor was wrong and has not been corrected.
    pub fn is_wrong_letter(&self) -> bool {
        self.wrong_at == Some(self.cursor)
    }

    pub fn typo_positions(&self) -> &BTreeSet<usize> {
        &self.typo_flags
    }

    pub fn scoring(&self) -> &Scoring {
        &self.scoring
    }

    pub fn timer_enabled(&self) -> bool {
        self.countdown.is_some()
    }

    pub fn time_remaining(&self) -> Option<u32> {
        self.countdown.map(|c| c.remaining())
    }

    pub fn time_limit(&self) -> Option<u32> {
        self.countdown.map(|c| c.limit())
    }
}
