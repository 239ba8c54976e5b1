use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::engine::timer;

const TITLE_PREFIX: &str = "NAME:";

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("could not access {}: {source}", .path.display())]
    Access {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("could not list directory {}: {source}", .path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("could not read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("no cards found in the given paths")]
    NoCards,
}

/// One secret text, cut out of a card file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Card {
    pub content: String,
    pub source: PathBuf,
    pub title: Option<String>,
    /// 1-based position of this card within its file.
    pub part_index: usize,
    pub total_parts: usize,
}

impl Card {
    pub fn display_title(&self) -> String {
        if let Some(title) = &self.title {
            return title.clone();
        }
        let stem = self
            .source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.source.display().to_string());
        if self.total_parts > 1 {
            format!("{stem} #{}", self.part_index)
        } else {
            stem
        }
    }

    pub fn char_count(&self) -> usize {
        self.content.chars().count()
    }

    pub fn auto_time_limit(&self) -> u32 {
        timer::auto_limit(self.char_count())
    }
}

/// Loads every card from the given files and directories, in order.
pub fn load_cards<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<Card>, LoadError> {
    let mut cards = Vec::new();
    for path in paths {
        let path = path.as_ref();
        let meta = fs::metadata(path).map_err(|source| LoadError::Access {
            path: path.to_path_buf(),
            source,
        })?;
        if meta.is_dir() {
            for file in dir_files(path)? {
                cards.extend(load_file(&file)?);
            }
        } else {
            cards.extend(load_file(path)?);
        }
    }

    if cards.is_empty() {
        return Err(LoadError::NoCards);
    }
    debug!(count = cards.len(), "loaded cards");
    Ok(cards)
}

fn dir_files(dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
    let read_dir_err = |source| LoadError::ReadDir {
        path: dir.to_path_buf(),
        source,
    };
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_dir_err)? {
        let entry = entry.map_err(read_dir_err)?;
        if entry.file_type().map_err(read_dir_err)?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

fn load_file(path: &Path) -> Result<Vec<Card>, LoadError> {
    let text = fs::read_to_string(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let parts: Vec<(Option<String>, String)> = split_cards(&text)
        .into_iter()
        .filter_map(|part| extract_title(&part))
        .collect();
    let total_parts = parts.len();

    Ok(parts
        .into_iter()
        .enumerate()
        .map(|(i, (title, content))| Card {
            content,
            source: path.to_path_buf(),
            title,
            part_index: i + 1,
            total_parts,
        })
        .collect())
}

/// A separator is a line of three or more dashes, optionally followed by spaces or tabs.
fn is_separator(line: &str) -> bool {
    let dashes = line.trim_end_matches([' ', '\t']);
    dashes.len() >= 3 && dashes.chars().all(|c| c == '-')
}

/// Splits file text on separator lines, trimming each part and dropping empty ones.
pub fn split_cards(text: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    for line in text.lines() {
        if is_separator(line) {
            parts.push(std::mem::take(&mut current));
            continue;
        }
        current.push_str(line);
        current.push('\n');
    }
    parts.push(current);

    parts
        .into_iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}

/// Pulls a leading `NAME:` line off a part. Parts left empty are dropped.
fn extract_title(part: &str) -> Option<(Option<String>, String)> {
    let (first, rest) = part.split_once('\n').unwrap_or((part, ""));
    let Some(name) = first.strip_prefix(TITLE_PREFIX) else {
        return Some((None, part.to_string()));
    };
    let content = rest.trim();
    if content.is_empty() {
        return None;
    }
    let name = name.trim();
    let title = (!name.is_empty()).then(|| name.to_string());
    Some((title, content.to_string()))
}
