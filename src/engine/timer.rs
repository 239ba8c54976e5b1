use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Auto-computed limits never drop below this many seconds.
pub const AUTO_FLOOR_SECS: u32 = 10;
/// Auto mode budgets one second for every this many characters of card text.
pub const AUTO_CHARS_PER_SEC: usize = 3;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TimerParseError {
    #[error("invalid timer format: {0:?} (use 'auto', 'off', seconds or 'MM:SS')")]
    Invalid(String),
    #[error("seconds must be below 60 in {0:?}")]
    SecondsOutOfRange(String),
}

/// How the countdown for a card (or a whole session) is configured.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TimerSetting {
    #[default]
    Off,
    Fixed(u32),
    Auto,
}

impl TimerSetting {
    /// Countdown length for a text of `char_count` characters, or `None` when disabled.
    pub fn limit_for(self, char_count: usize) -> Option<u32> {
        match self {
            TimerSetting::Off => None,
            TimerSetting::Fixed(secs) => Some(secs),
            TimerSetting::Auto => Some(auto_limit(char_count)),
        }
    }
}

pub fn auto_limit(char_count: usize) -> u32 {
    let secs = u32::try_from(char_count / AUTO_CHARS_PER_SEC).unwrap_or(u32::MAX);
    secs.max(AUTO_FLOOR_SECS)
}

impl FromStr for TimerSetting {
    type Err = TimerParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim().to_ascii_lowercase();
        match value.as_str() {
            "auto" | "true" | "on" => return Ok(TimerSetting::Auto),
            "off" | "false" | "none" | "0" => return Ok(TimerSetting::Off),
            _ => {}
        }

        if let Ok(secs) = value.parse::<u32>() {
            return Ok(TimerSetting::Fixed(secs));
        }

        let invalid = || TimerParseError::Invalid(s.to_string());
        let (mins, secs) = value.split_once(':').ok_or_else(invalid)?;
        let mins: u32 = mins.parse().map_err(|_| invalid())?;
        let secs: u32 = secs.parse().map_err(|_| invalid())?;
        if secs >= 60 {
            return Err(TimerParseError::SecondsOutOfRange(s.to_string()));
        }
        match mins.checked_mul(60).and_then(|m| m.checked_add(secs)) {
            Some(0) => Ok(TimerSetting::Off),
            Some(total) => Ok(TimerSetting::Fixed(total)),
            None => Err(invalid()),
        }
    }
}

impl TryFrom<String> for TimerSetting {
    type Error = TimerParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimerSetting> for String {
    fn from(value: TimerSetting) -> Self {
        value.to_string()
    }
}

impl fmt::Display for TimerSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimerSetting::Off => f.write_str("off"),
            TimerSetting::Auto => f.write_str("auto"),
            TimerSetting::Fixed(secs) => write!(f, "{secs}"),
        }
    }
}

/// A per-game countdown, decremented once per tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Countdown {
    limit: u32,
    remaining: u32,
}

impl Countdown {
    pub fn new(limit: u32) -> Self {
        Self {
            limit,
            remaining: limit,
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Returns true once the countdown has run out.
    pub fn tick(&mut self) -> bool {
        self.remaining = self.remaining.saturating_sub(1);
        self.remaining == 0
    }
}

/// Formats seconds as `MM:SS`.
pub fn format_clock(secs: u32) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
