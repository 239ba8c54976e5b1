use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::info;

use crate::store::ScoreLedger;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScoreEvent {
    RightLetter,
    WrongLetter,
    Hint,
    WordBonus,
    MessageBonus,
}

/// Point values for every scoring event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreTable {
    #[serde(default = "default_right_letter")]
    pub right_letter: i64,
    #[serde(default = "default_wrong_letter")]
    pub wrong_letter: i64,
    #[serde(default = "default_hint")]
    pub hint: i64,
    #[serde(default = "default_word_bonus")]
    pub word_bonus: i64,
    #[serde(default = "default_message_bonus")]
    pub message_bonus: i64,
    #[serde(default = "default_time_bonus_per_second")]
    pub time_bonus_per_second: i64,
    #[serde(default)]
    pub starting_score: i64,
}

fn default_right_letter() -> i64 {
    25
}
fn default_wrong_letter() -> i64 {
    -50
}
fn default_hint() -> i64 {
    -100
}
fn default_word_bonus() -> i64 {
    250
}
fn default_message_bonus() -> i64 {
    1000
}
fn default_time_bonus_per_second() -> i64 {
    10
}

impl Default for ScoreTable {
    fn default() -> Self {
        Self {
            right_letter: default_right_letter(),
            wrong_letter: default_wrong_letter(),
            hint: default_hint(),
            word_bonus: default_word_bonus(),
            message_bonus: default_message_bonus(),
            time_bonus_per_second: default_time_bonus_per_second(),
            starting_score: 0,
        }
    }
}

impl ScoreTable {
    pub fn value(&self, event: ScoreEvent) -> i64 {
        match event {
            ScoreEvent::RightLetter => self.right_letter,
            ScoreEvent::WrongLetter => self.wrong_letter,
            ScoreEvent::Hint => self.hint,
            ScoreEvent::WordBonus => self.word_bonus,
            ScoreEvent::MessageBonus => self.message_bonus,
        }
    }
}

/// One attempt at one text, as persisted in the score ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub hash: String,
    pub score: i64,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub title: String,
}

/// Lowercase hex SHA-256 of the card text; identifies a text across runs.
pub fn content_hash(text: &str) -> String {
    format!("{:x}", Sha256::digest(text.as_bytes()))
}

/// Prior attempts at one text plus the attempt in progress.
#[derive(Clone, Debug)]
pub struct ScoreHistory {
    // Sorted by score, best first.
    entries: Vec<ScoreEntry>,
    current: ScoreEntry,
}

impl ScoreHistory {
    pub fn new(mut entries: Vec<ScoreEntry>, current: ScoreEntry) -> Self {
        entries.sort_by(|a, b| b.score.cmp(&a.score));
        Self { entries, current }
    }

    pub fn entries(&self) -> &[ScoreEntry] {
        &self.entries
    }

    pub fn current(&self) -> &ScoreEntry {
        &self.current
    }

    pub fn attempts(&self) -> usize {
        self.entries.len()
    }

    pub fn high_score_entry(&self) -> Option<&ScoreEntry> {
        self.entries.first()
    }

    /// Vacuously true when there is nothing to beat.
    pub fn got_high_score(&self) -> bool {
        self.high_score_entry()
            .is_none_or(|best| self.current.score >= best.score)
    }

    pub fn top_entries(&self, n: usize) -> Vec<ScoreEntry> {
        let mut all: Vec<ScoreEntry> = self.entries.clone();
        all.push(self.current.clone());
        all.sort_by(|a, b| b.score.cmp(&a.score));
        all.truncate(n);
        all
    }
}

/// Running score for one attempt at one card.
#[derive(Clone, Debug)]
pub struct Scoring {
    table: ScoreTable,
    current_score: i64,
    hint_count: u32,
    error_count: u32,
    text_hash: String,
    history: ScoreHistory,
}

impl Scoring {
    /// Builds scoring for `text` from every entry in the ledger, keeping only
    /// those that belong to this text.
    pub fn new(text: &str, title: &str, table: ScoreTable, ledger_entries: &[ScoreEntry]) -> Self {
        let text_hash = content_hash(text);
        let prior: Vec<ScoreEntry> = ledger_entries
            .iter()
            .filter(|e| e.hash == text_hash)
            .cloned()
            .collect();
        let current_score = table.starting_score;
        let current = ScoreEntry {
            hash: text_hash.clone(),
            score: current_score,
            timestamp: Utc::now(),
            title: title.to_string(),
        };
        Self {
            table,
            current_score,
            hint_count: 0,
            error_count: 0,
            text_hash,
            history: ScoreHistory::new(prior, current),
        }
    }

    pub fn load(
        text: &str,
        title: &str,
        table: ScoreTable,
        ledger: &dyn ScoreLedger,
    ) -> Result<Self> {
        let entries = ledger.load_all().context("could not load score history")?;
        Ok(Self::new(text, title, table, &entries))
    }

    pub fn score_event(&mut self, event: ScoreEvent) {
        match event {
            ScoreEvent::Hint => self.hint_count += 1,
            ScoreEvent::WrongLetter => self.error_count += 1,
            _ => {}
        }
        self.add(self.table.value(event));
    }

    pub fn add_time_bonus(&mut self, seconds: u32) {
        self.add(i64::from(seconds) * self.table.time_bonus_per_second);
    }

    fn add(&mut self, delta: i64) {
        self.current_score += delta;
        self.history.current.score = self.current_score;
    }

    /// Appends this attempt to the ledger, keeping every earlier entry as is.
    pub fn record_completion(&self, ledger: &mut dyn ScoreLedger) -> Result<()> {
        let mut entries = ledger
            .load_all()
            .context("could not load scores for saving")?;
        entries.push(self.history.current.clone());
        ledger.save_all(&entries)?;
        info!(
            hash = %self.text_hash,
            score = self.current_score,
            total_entries = entries.len(),
            "recorded attempt"
        );
        Ok(())
    }

    pub fn current_score(&self) -> i64 {
        self.current_score
    }

    pub fn hint_count(&self) -> u32 {
        self.hint_count
    }

    pub fn error_count(&self) -> u32 {
        self.error_count
    }

    pub fn text_hash(&self) -> &str {
        &self.text_hash
    }

    pub fn current_entry(&self) -> &ScoreEntry {
        self.history.current()
    }

    pub fn high_score(&self) -> Option<&ScoreEntry> {
        self.history.high_score_entry()
    }

    pub fn attempts(&self) -> usize {
        self.history.attempts()
    }

    pub fn got_high_score(&self) -> bool {
        self.history.got_high_score()
    }

    pub fn top_entries(&self, n: usize) -> Vec<ScoreEntry> {
        self.history.top_entries(n)
    }
}
