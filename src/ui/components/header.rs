use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::cards::Card;
use crate::ui::theme::Theme;

/// Banner naming the card being played and where it came from.
pub struct Header<'a> {
    card: &'a Card,
    theme: &'a Theme,
}

impl<'a> Header<'a> {
    pub fn new(card: &'a Card, theme: &'a Theme) -> Self {
        Self { card, theme }
    }
}

impl Widget for Header<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let line = Line::from(vec![
            Span::styled(" CARD: ", Style::default().fg(colors.header_fg())),
            Span::styled(
                self.card.display_title(),
                Style::default()
                    .fg(colors.accent())
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled("  |  LOC: ", Style::default().fg(colors.header_fg())),
            Span::styled(
                self.card.source.display().to_string(),
                Style::default().fg(colors.header_fg()),
            ),
        ]);

        let block = Block::bordered()
            .border_style(Style::default().fg(colors.accent()))
            .style(Style::default().bg(colors.header_bg()));
        Paragraph::new(line).block(block).render(area, buf);
    }
}
