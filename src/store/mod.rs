pub mod json_store;
pub mod schema;

use anyhow::Result;

use crate::engine::scoring::ScoreEntry;

/// Whole-ledger persistence for score entries. `save_all` replaces everything.
pub trait ScoreLedger {
    fn load_all(&self) -> Result<Vec<ScoreEntry>>;
    fn save_all(&mut self, entries: &[ScoreEntry]) -> Result<()>;
}

#[cfg(test)]
pub use memory::MemoryLedger;
