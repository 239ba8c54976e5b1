use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::engine::game::GameOptions;
use crate::engine::scoring::ScoreTable;
use crate::engine::timer::TimerSetting;

/// Random reveal counts above this are clamped; no card needs more.
pub const MAX_RANDOM_REVEALS: usize = 10_000;
/// Fixed timers are capped at 24 hours.
pub const MAX_TIMER_SECS: u32 = 24 * 60 * 60;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_timer")]
    pub timer: TimerSetting,
    #[serde(default)]
    pub first_letter: bool,
    #[serde(default)]
    pub random_letters: usize,
    #[serde(default)]
    pub random_words: usize,
    #[serde(default)]
    pub randomize_cards: bool,
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default)]
    pub scoring: ScoreTable,
}

fn default_timer() -> TimerSetting {
    TimerSetting::Auto
}
fn default_theme() -> String {
    "catppuccin-mocha".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timer: default_timer(),
            first_letter: false,
            random_letters: 0,
            random_words: 0,
            randomize_cards: false,
            theme: default_theme(),
            scoring: ScoreTable::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// A missing file is the default config; a malformed one is an error.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("could not read config {}", path.display()))?;
        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("invalid config {}", path.display()))?;
        config.validate();
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("recite")
            .join("config.toml")
    }

    /// Clamps values that would make a session unplayable.
    pub fn validate(&mut self) {
        if let TimerSetting::Fixed(secs) = self.timer
            && secs > MAX_TIMER_SECS
        {
            warn!(secs, "timer too long, clamping");
            self.timer = TimerSetting::Fixed(MAX_TIMER_SECS);
        }
        self.random_letters = self.random_letters.min(MAX_RANDOM_REVEALS);
        self.random_words = self.random_words.min(MAX_RANDOM_REVEALS);
        if self.theme.trim().is_empty() {
            self.theme = default_theme();
        }
    }

    pub fn game_options(&self) -> GameOptions {
        GameOptions {
            timer: self.timer,
            first_letter: self.first_letter,
            random_letters: self.random_letters,
            random_words: self.random_words,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_serde_defaults_from_empty() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.timer, TimerSetting::Auto);
        assert_eq!(config.scoring.right_letter, 25);
    }

    #[test]
    fn test_partial_config_keeps_other_defaults() {
        let toml_str = r#"
timer = "1:30"
random_words = 2

[scoring]
hint = -10
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.timer, TimerSetting::Fixed(90));
        assert_eq!(config.random_words, 2);
        assert!(!config.first_letter);
        assert_eq!(config.scoring.hint, -10);
        assert_eq!(config.scoring.wrong_letter, -50);
        assert_eq!(config.theme, "catppuccin-mocha");
    }

    #[test]
    fn test_bad_timer_is_rejected() {
        let result: Result<Config, _> = toml::from_str(r#"timer = "later""#);
        assert!(result.is_err());
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let config = Config {
            timer: TimerSetting::Fixed(45),
            first_letter: true,
            ..Config::default()
        };
        let serialized = toml::to_string_pretty(&config).unwrap();
        let deserialized: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_validate_clamps() {
        let mut config = Config {
            timer: TimerSetting::Fixed(MAX_TIMER_SECS + 1),
            random_letters: usize::MAX,
            theme: "  ".into(),
            ..Config::default()
        };
        config.validate();
        assert_eq!(config.timer, TimerSetting::Fixed(MAX_TIMER_SECS));
        assert_eq!(config.random_letters, MAX_RANDOM_REVEALS);
        assert_eq!(config.theme, "catppuccin-mocha");
    }

    #[test]
    fn test_load_and_save_paths() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        assert_eq!(Config::load_from(&path).unwrap(), Config::default());

        let config = Config {
            random_letters: 3,
            ..Config::default()
        };
        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);

        fs::write(&path, "timer = [").unwrap();
        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("invalid config"));
    }

    #[test]
    fn test_game_options_mirror_config() {
        let config = Config {
            first_letter: true,
            random_words: 1,
            ..Config::default()
        };
        let options = config.game_options();
        assert!(options.first_letter);
        assert_eq!(options.random_words, 1);
        assert_eq!(options.timer, TimerSetting::Auto);
    }
}
