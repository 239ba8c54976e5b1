use serde::{Deserialize, Serialize};

use crate::engine::scoring::ScoreEntry;

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScoreLedgerData {
    pub schema_version: u32,
    #[serde(default)]
    pub entries: Vec<ScoreEntry>,
}

impl Default for ScoreLedgerData {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            entries: Vec::new(),
        }
    }
}

impl ScoreLedgerData {
    pub fn new(entries: Vec<ScoreEntry>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            entries,
        }
    }

    /// Files written by a newer build are refused rather than silently rewritten.
    pub fn is_supported(&self) -> bool {
        self.schema_version <= SCHEMA_VERSION
    }
}
