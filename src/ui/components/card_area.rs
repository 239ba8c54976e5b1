use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget, Wrap};

use crate::engine::game::Game;
use crate::engine::secret::PLACEHOLDER;
use crate::ui::theme::Theme;

const TAB_WIDTH: usize = 4;

/// The masked card text with the cursor on it.
pub struct CardArea<'a> {
    game: &'a Game,
    title: &'a str,
    theme: &'a Theme,
}

impl<'a> CardArea<'a> {
    pub fn new(game: &'a Game, title: &'a str, theme: &'a Theme) -> Self {
        Self { game, title, theme }
    }
}

/// A render token maps a single secret position to what is drawn for it.
#[derive(Debug, PartialEq, Eq)]
struct RenderToken {
    idx: usize,
    display: String,
    is_line_break: bool,
}

/// Turns mask cells into tokens; hidden cells draw as the placeholder.
fn build_render_tokens(cells: &[Option<char>]) -> Vec<RenderToken> {
    let mut tokens = Vec::with_capacity(cells.len());
    let mut col = 0usize;

    for (idx, cell) in cells.iter().enumerate() {
        let (display, is_line_break) = match cell {
            Some('\n') => {
                col = 0;
                (String::new(), true)
            }
            Some('\t') => {
                let width = TAB_WIDTH - (col % TAB_WIDTH);
                col += width;
                (" ".repeat(width), false)
            }
            Some(ch) => {
                col += 1;
                (ch.to_string(), false)
            }
            None => {
                col += 1;
                (PLACEHOLDER.to_string(), false)
            }
        };
        tokens.push(RenderToken {
            idx,
            display,
            is_line_break,
        });
    }

    tokens
}

impl Widget for CardArea<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let board = self.game.board();
        let cells: Vec<Option<char>> = (0..board.len()).map(|i| board.cell(i)).collect();
        let show_cursor = !self.game.is_over();

        let mut lines: Vec<Vec<Span>> = vec![Vec::new()];
        for token in build_render_tokens(&cells) {
            let idx = token.idx;
            let mut style = if !board.is_revealed(idx) {
                Style::default().fg(colors.text_hidden())
            } else if board.is_pre_revealed(idx) {
                Style::default()
                    .fg(colors.text_pre_revealed())
                    .add_modifier(Modifier::BOLD)
            } else if self.game.typo_positions().contains(&idx) {
                Style::default().fg(colors.text_incorrect())
            } else {
                Style::default().fg(colors.text_revealed())
            };

            if show_cursor && idx == self.game.cursor() {
                style = if self.game.is_wrong_letter() {
                    Style::default()
                        .fg(colors.text_cursor_fg())
                        .bg(colors.text_incorrect())
                } else {
                    Style::default()
                        .fg(colors.text_cursor_fg())
                        .bg(colors.text_cursor_bg())
                };
            }

            if token.is_line_break {
                // Keep the cursor visible when it sits on a newline.
                if show_cursor && idx == self.game.cursor()
                    && let Some(line) = lines.last_mut()
                {
                    line.push(Span::styled(" ", style));
                }
                lines.push(Vec::new());
            } else if let Some(line) = lines.last_mut() {
                line.push(Span::styled(token.display, style));
            }
        }

        let ratatui_lines: Vec<Line> = lines.into_iter().map(Line::from).collect();

        let block = Block::bordered()
            .title(format!(" {} ", self.title))
            .border_style(Style::default().fg(colors.border()))
            .style(Style::default().bg(colors.bg()));

        Paragraph::new(ratatui_lines)
            .block(block)
            .wrap(Wrap { trim: false })
            .render(area, buf);
    }
}
