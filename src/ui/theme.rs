use std::fs;

use ratatui::style::Color;
use rust_embed::Embed;
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const DEFAULT_THEME: &str = "catppuccin-mocha";

#[derive(Embed)]
#[folder = "assets/themes/"]
struct ThemeAssets;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Theme {
    pub name: String,
    pub colors: ThemeColors,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ThemeColors {
    pub bg: String,
    pub fg: String,
    pub text_revealed: String,
    pub text_hidden: String,
    pub text_pre_revealed: String,
    pub text_incorrect: String,
    pub text_incorrect_bg: String,
    pub text_cursor_bg: String,
    pub text_cursor_fg: String,
    pub accent: String,
    pub border: String,
    pub header_bg: String,
    pub header_fg: String,
    pub score: String,
    pub error: String,
    pub warning: String,
    pub success: String,
}

impl Theme {
    /// Looks in `<config_dir>/recite/themes/` first, then the bundled themes.
    pub fn load(name: &str) -> Option<Self> {
        if let Some(config_dir) = dirs::config_dir() {
            let user_theme_path = config_dir
                .join("recite")
                .join("themes")
                .join(format!("{name}.toml"));
            if let Ok(content) = fs::read_to_string(&user_theme_path) {
                match toml::from_str::<Theme>(&content) {
                    Ok(theme) => return Some(theme),
                    Err(e) => warn!(path = %user_theme_path.display(), "bad theme file: {e}"),
                }
            }
        }

        let file = ThemeAssets::get(&format!("{name}.toml"))?;
        let content = std::str::from_utf8(file.data.as_ref()).ok()?;
        toml::from_str::<Theme>(content).ok()
    }

    pub fn available_themes() -> Vec<String> {
        let mut names: Vec<String> = ThemeAssets::iter()
            .filter_map(|f| f.strip_suffix(".toml").map(|n| n.to_string()))
            .collect();
        names.sort();
        names
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::load(DEFAULT_THEME).unwrap_or_else(|| Self {
            name: "default".to_string(),
            colors: ThemeColors::default(),
        })
    }
}

impl Default for ThemeColors {
    fn default() -> Self {
        Self {
            bg: "#1e1e2e".to_string(),
            fg: "#cdd6f4".to_string(),
            text_revealed: "#a6e3a1".to_string(),
            text_hidden: "#585b70".to_string(),
            text_pre_revealed: "#cdd6f4".to_string(),
            text_incorrect: "#f38ba8".to_string(),
            text_incorrect_bg: "#45273a".to_string(),
            text_cursor_bg: "#f5e0dc".to_string(),
            text_cursor_fg: "#1e1e2e".to_string(),
            accent: "#89b4fa".to_string(),
            border: "#45475a".to_string(),
            header_bg: "#313244".to_string(),
            header_fg: "#cdd6f4".to_string(),
            score: "#f9e2af".to_string(),
            error: "#f38ba8".to_string(),
            warning: "#fab387".to_string(),
            success: "#a6e3a1".to_string(),
        }
    }
}

impl ThemeColors {
    pub fn parse_color(hex: &str) -> Color {
        let hex = hex.trim_start_matches('#');
        if hex.len() == 6
            && let (Ok(r), Ok(g), Ok(b)) = (
                u8::from_str_radix(&hex[0..2], 16),
                u8::from_str_radix(&hex[2..4], 16),
                u8::from_str_radix(&hex[4..6], 16),
            )
        {
            return Color::Rgb(r, g, b);
        }
        Color::White
    }

    pub fn bg(&self) -> Color { Self::parse_color(&self.bg) }
    pub fn fg(&self) -> Color { Self::parse_color(&self.fg) }
    pub fn text_revealed(&self) -> Color { Self::parse_color(&self.text_revealed) }
    pub fn text_hidden(&self) -> Color { Self::parse_color(&self.text_hidden) }
    pub fn text_pre_revealed(&self) -> Color { Self::parse_color(&self.text_pre_revealed) }
    pub fn text_incorrect(&self) -> Color { Self::parse_color(&self.text_incorrect) }
    pub fn text_incorrect_bg(&self) -> Color { Self::parse_color(&self.text_incorrect_bg) }
    pub fn text_cursor_bg(&self) -> Color { Self::parse_color(&self.text_cursor_bg) }
    pub fn text_cursor_fg(&self) -> Color { Self::parse_color(&self.text_cursor_fg) }
    pub fn accent(&self) -> Color { Self::parse_color(&self.accent) }
    pub fn border(&self) -> Color { Self::parse_color(&self.border) }
    pub fn header_bg(&self) -> Color { Self::parse_color(&self.header_bg) }
    pub fn header_fg(&self) -> Color { Self::parse_color(&self.header_fg) }
    pub fn score(&self) -> Color { Self::parse_color(&self.score) }
    pub fn error(&self) -> Color { Self::parse_color(&self.error) }
    pub fn warning(&self) -> Color { Self::parse_color(&self.warning) }
    pub fn success(&self) -> Color { Self::parse_color(&self.success) }
}
