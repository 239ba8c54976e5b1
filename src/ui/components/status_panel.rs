use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Widget, Wrap};

use crate::engine::game::Game;
use crate::engine::timer::format_clock;
use crate::session::Session;
use crate::store::ScoreLedger;
use crate::ui::theme::Theme;

/// Score line, attempt line and the latest end-of-card message.
pub struct StatusPanel<'a, L: ScoreLedger> {
    session: &'a Session<L>,
    theme: &'a Theme,
}

impl<'a, L: ScoreLedger> StatusPanel<'a, L> {
    pub fn new(session: &'a Session<L>, theme: &'a Theme) -> Self {
        Self { session, theme }
    }
}

/// Everything on the status line except the clock.
pub fn status_text<L: ScoreLedger>(session: &Session<L>) -> String {
    let scoring = session.game().scoring();
    let mut parts = vec![
        format!("SCORE: {}", scoring.current_score().max(0)),
        format!("HINTS: {}", scoring.hint_count()),
        format!("ERRORS: {}", scoring.error_count()),
    ];
    if session.is_batch() {
        let shown = (session.index() + 1).min(session.card_count());
        if session.is_last_card() && !session.is_over() {
            parts.push(format!("CARD {shown}/{} (last)", session.card_count()));
        } else {
            parts.push(format!("CARD {shown}/{}", session.card_count()));
        }
        parts.push(format!("TOTAL: {}", session.total_score()));
    }
    parts.join(" | ")
}

pub fn attempt_text(game: &Game) -> String {
    let scoring = game.scoring();
    match scoring.high_score() {
        Some(best) => format!(
            "Attempt: {} | High score (this text): {}",
            scoring.attempts() + 1,
            best.score
        ),
        None => "This is your first try with this text! Good luck!".to_string(),
    }
}

/// The end message for the current card, or a note about the card just left behind.
pub fn message_text<L: ScoreLedger>(session: &Session<L>) -> Option<String> {
    let result = session.last_result()?;
    if session.game().is_over() {
        return Some(result.headline());
    }
    Some(format!("Previous card ({}): {}", result.title, result.headline()))
}

impl<L: ScoreLedger> Widget for StatusPanel<'_, L> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let game = self.session.game();

        let mut status = vec![Span::styled(
            status_text(self.session),
            Style::default().fg(colors.score()),
        )];
        if let (Some(remaining), Some(budget)) = (game.time_remaining(), self.session.budget()) {
            let time_color = if budget.is_running_low() {
                colors.warning()
            } else {
                colors.score()
            };
            status.push(Span::styled(" | TIME: ", Style::default().fg(colors.score())));
            status.push(Span::styled(
                format_clock(remaining),
                Style::default()
                    .fg(time_color)
                    .add_modifier(Modifier::BOLD),
            ));
        }

        let mut lines = vec![
            Line::from(status),
            Line::from(""),
            Line::from(Span::styled(
                attempt_text(game),
                Style::default().fg(colors.fg()),
            )),
        ];

        if let Some(message) = message_text(self.session) {
            let color = if game.is_won() || !game.is_over() {
                colors.success()
            } else {
                colors.error()
            };
            lines.push(Line::from(Span::styled(
                message,
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )));
        }

        Paragraph::new(lines)
            .style(Style::default().bg(colors.bg()))
            .wrap(Wrap { trim: false })
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::cards::Card;
    use crate::engine::game::Input;
    use crate::session::SessionSettings;
    use crate::store::MemoryLedger;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn session(contents: &[&str]) -> Session<MemoryLedger> {
        let cards = contents
            .iter()
            .map(|c| Card {
                content: c.to_string(),
                source: PathBuf::from("deck.txt"),
                title: None,
                part_index: 1,
                total_parts: contents.len(),
            })
            .collect();
        Session::new(
            cards,
            SessionSettings::default(),
            MemoryLedger::default(),
            SmallRng::seed_from_u64(5),
        )
        .unwrap()
    }

    #[test]
    fn test_single_card_status() {
        let s = session(&["ab"]);
        assert_eq!(status_text(&s), "SCORE: 0 | HINTS: 0 | ERRORS: 0");
        assert_eq!(
            attempt_text(s.game()),
            "This is your first try with this text! Good luck!"
        );
        assert!(message_text(&s).is_none());
    }

    #[test]
    fn test_batch_status_and_previous_card_note() {
        let mut s = session(&["ab", "cd"]);
        assert_eq!(
            status_text(&s),
            "SCORE: 0 | HINTS: 0 | ERRORS: 0 | CARD 1/2 | TOTAL: 0"
        );
        s.handle_input(Input::Char('a')).unwrap();
        s.handle_input(Input::Char('b')).unwrap();
        assert_eq!(
            status_text(&s),
            "SCORE: 0 | HINTS: 0 | ERRORS: 0 | CARD 2/2 (last) | TOTAL: 1050"
        );
        assert_eq!(
            message_text(&s).unwrap(),
            "Previous card (deck #1): Card complete! Final score: 1050"
        );
    }

    #[test]
    fn test_negative_score_is_clamped_on_status() {
        let mut s = session(&["ab"]);
        s.handle_input(Input::Char('x')).unwrap();
        assert!(status_text(&s).starts_with("SCORE: 0 |"));
        assert_eq!(message_text(&s).unwrap(), "Game over! Final score: 0");
    }
}
