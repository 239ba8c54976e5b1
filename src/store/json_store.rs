use std::fs;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use serde::Serialize;
use tracing::debug;

use crate::engine::scoring::ScoreEntry;
use crate::store::ScoreLedger;
use crate::store::schema::ScoreLedgerData;

pub const SCORES_FILE: &str = "scores.json";

/// Score ledger kept as a single pretty-printed JSON file.
pub struct JsonStore {
    base_dir: PathBuf,
}

impl JsonStore {
    pub fn new() -> Result<Self> {
        Self::with_base_dir(default_data_dir())
    }

    pub fn with_base_dir(base_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&base_dir)
            .with_context(|| format!("could not create data dir {}", base_dir.display()))?;
        Ok(Self { base_dir })
    }

    fn file_path(&self, name: &str) -> PathBuf {
        self.base_dir.join(name)
    }

    pub fn scores_path(&self) -> PathBuf {
        self.file_path(SCORES_FILE)
    }

    /// Missing and empty files read as an empty ledger; anything unparseable is an error.
    fn load_ledger(&self) -> Result<ScoreLedgerData> {
        let path = self.scores_path();
        if !path.exists() {
            return Ok(ScoreLedgerData::default());
        }
        let content = fs::read_to_string(&path)
            .with_context(|| format!("could not read {}", path.display()))?;
        if content.trim().is_empty() {
            return Ok(ScoreLedgerData::default());
        }
        let data: ScoreLedgerData = serde_json::from_str(&content)
            .with_context(|| format!("corrupt score ledger {}", path.display()))?;
        if !data.is_supported() {
            bail!(
                "Unsupported score ledger version: {} in {}",
                data.schema_version,
                path.display()
            );
        }
        Ok(data)
    }

    /// Writes to a sibling temp file and renames it into place, so a failed
    /// write leaves the previous file untouched.
    fn save<T: Serialize>(&self, name: &str, data: &T) -> Result<()> {
        let path = self.file_path(name);
        let tmp_path = path.with_extension("json.tmp");

        let json = serde_json::to_string_pretty(data)?;
        let write = || -> Result<()> {
            let mut file = fs::File::create(&tmp_path)?;
            file.write_all(json.as_bytes())?;
            file.sync_all()?;
            fs::rename(&tmp_path, &path)?;
            Ok(())
        };
        if let Err(e) = write() {
            let _ = fs::remove_file(&tmp_path);
            return Err(e.context(format!("could not write {}", path.display())));
        }
        Ok(())
    }
}

impl ScoreLedger for JsonStore {
    fn load_all(&self) -> Result<Vec<ScoreEntry>> {
        Ok(self.load_ledger()?.entries)
    }

    fn save_all(&mut self, entries: &[ScoreEntry]) -> Result<()> {
        self.save(SCORES_FILE, &ScoreLedgerData::new(entries.to_vec()))?;
        debug!(count = entries.len(), path = %self.scores_path().display(), "saved score ledger");
        Ok(())
    }
}

pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("recite")
}
