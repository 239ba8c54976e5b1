use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::engine::game::Outcome;
use crate::session::Session;
use crate::session::result::CardResult;
use crate::store::ScoreLedger;
use crate::ui::theme::Theme;

/// Shown once every card has been played.
pub struct SessionSummary<'a, L: ScoreLedger> {
    session: &'a Session<L>,
    theme: &'a Theme,
}

impl<'a, L: ScoreLedger> SessionSummary<'a, L> {
    pub fn new(session: &'a Session<L>, theme: &'a Theme) -> Self {
        Self { session, theme }
    }
}

pub fn summary_lines<L: ScoreLedger>(session: &Session<L>) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(last) = session.last_result() {
        lines.push(format!("Congratulations! Final score: {}", last.display_score()));
        lines.extend(high_score_lines(last));
    }
    if session.is_batch() {
        let won = session
            .results()
            .iter()
            .filter(|r| r.outcome == Outcome::Won)
            .count();
        lines.push(String::new());
        lines.push(format!(
            "Batch complete! {won}/{} cards recalled. Total score: {}",
            session.card_count(),
            session.total_score()
        ));
    }
    lines
}

fn high_score_lines(result: &CardResult) -> Vec<String> {
    if !result.got_high_score {
        return Vec::new();
    }
    let mut lines = vec![format!(
        "You got a high score! Top {} scores:",
        result.top_scores.len()
    )];
    lines.extend(result.top_scores.iter().map(|entry| {
        format!(
            "  * {} on {}",
            entry.score,
            entry.timestamp.format("%Y-%m-%d %H:%M")
        )
    }));
    lines
}

impl<L: ScoreLedger> Widget for SessionSummary<'_, L> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .title(" Session Complete ")
            .border_style(Style::default().fg(colors.accent()))
            .style(Style::default().bg(colors.bg()));

        let mut lines: Vec<Line> = summary_lines(self.session)
            .into_iter()
            .enumerate()
            .map(|(i, text)| {
                let style = if i == 0 {
                    Style::default()
                        .fg(colors.success())
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(colors.fg())
                };
                Line::from(Span::styled(text, style))
            })
            .collect();
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Press any key to exit",
            Style::default().fg(colors.text_hidden()),
        )));

        Paragraph::new(lines)
            .block(block)
            .alignment(Alignment::Center)
            .render(area, buf);
    }
}
