use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tracing::error;

use crate::engine::game::Input;
use crate::session::{Session, SessionEnd};
use crate::store::ScoreLedger;
use crate::ui::theme::Theme;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppScreen {
    Card,
    Summary,
}

pub struct App<L: ScoreLedger> {
    pub session: Session<L>,
    pub theme: Theme,
    pub should_quit: bool,
    /// Last persistence failure, shown in the footer.
    pub last_error: Option<String>,
}

/// Translates a terminal key into an engine input.
pub fn map_key(key: &KeyEvent) -> Option<Input> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Esc => Some(Input::Quit),
        KeyCode::Char('c') if ctrl => Some(Input::Quit),
        KeyCode::Char('r') if ctrl => Some(Input::RevealAll),
        KeyCode::Char(_) if ctrl => None,
        KeyCode::Char(ch) => Some(Input::Char(ch)),
        KeyCode::Enter => Some(Input::Char('\n')),
        KeyCode::Tab => Some(Input::Char('\t')),
        _ => None,
    }
}

impl<L: ScoreLedger> App<L> {
    pub fn new(session: Session<L>, theme: Theme) -> Self {
        Self {
            session,
            theme,
            should_quit: false,
            last_error: None,
        }
    }

    pub fn screen(&self) -> AppScreen {
        match self.session.ending() {
            Some(SessionEnd::Completed) => AppScreen::Summary,
            _ => AppScreen::Card,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        // Only process Press events; Repeat and Release would double up input.
        if key.kind != KeyEventKind::Press {
            return;
        }

        // Once the session is over, the next key leaves.
        if self.session.is_over() {
            self.should_quit = true;
            return;
        }

        let Some(input) = map_key(&key) else {
            return;
        };
        self.feed(input);
        if input == Input::Quit {
            self.should_quit = true;
        }
    }

    pub fn handle_tick(&mut self) {
        if self.session.game().timer_enabled() && !self.session.is_over() {
            self.feed(Input::Tick);
        }
    }

    fn feed(&mut self, input: Input) {
        if let Err(e) = self.session.handle_input(input) {
            error!("{e:#}");
            self.last_error = Some(format!("{e:#}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::cards::Card;
    use crate::engine::game::GameOptions;
    use crate::engine::timer::TimerSetting;
    use crate::session::SessionSettings;
    use crate::store::MemoryLedger;
    use crate::ui::theme::ThemeColors;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(ch: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(ch), KeyModifiers::CONTROL)
    }

    fn app(
        contents: &[&str],
        settings: SessionSettings,
        ledger: MemoryLedger,
    ) -> App<MemoryLedger> {
        let cards = contents
            .iter()
            .map(|c| Card {
                content: c.to_string(),
                source: PathBuf::from("deck.txt"),
                title: None,
                part_index: 1,
                total_parts: 1,
            })
            .collect();
        let session = Session::new(cards, settings, ledger, SmallRng::seed_from_u64(4)).unwrap();
        let theme = Theme {
            name: "test".into(),
            colors: ThemeColors::default(),
        };
        App::new(session, theme)
    }

    #[test]
    fn test_key_mapping() {
        assert_eq!(map_key(&press(KeyCode::Esc)), Some(Input::Quit));
        assert_eq!(map_key(&ctrl('c')), Some(Input::Quit));
        assert_eq!(map_key(&ctrl('r')), Some(Input::RevealAll));
        assert_eq!(map_key(&ctrl('x')), None);
        assert_eq!(map_key(&press(KeyCode::Enter)), Some(Input::Char('\n')));
        assert_eq!(map_key(&press(KeyCode::Tab)), Some(Input::Char('\t')));
        assert_eq!(map_key(&press(KeyCode::Char('?'))), Some(Input::Char('?')));
        assert_eq!(
            map_key(&KeyEvent::new(KeyCode::Char('A'), KeyModifiers::SHIFT)),
            Some(Input::Char('A'))
        );
        assert_eq!(map_key(&press(KeyCode::Left)), None);
    }

    #[test]
    fn test_win_then_any_key_quits() {
        let mut app = app(&["ab"], SessionSettings::default(), MemoryLedger::default());
        app.handle_key(press(KeyCode::Char('a')));
        app.handle_key(press(KeyCode::Char('b')));
        assert_eq!(app.screen(), AppScreen::Summary);
        assert!(!app.should_quit);
        app.handle_key(press(KeyCode::Char('z')));
        assert!(app.should_quit);
    }

    #[test]
    fn test_escape_quits_immediately() {
        let mut app = app(&["ab"], SessionSettings::default(), MemoryLedger::default());
        app.handle_key(press(KeyCode::Esc));
        assert!(app.should_quit);
        assert_eq!(app.session.ledger().save_count(), 0);
    }

    #[test]
    fn test_release_events_are_ignored() {
        let mut app = app(&["ab"], SessionSettings::default(), MemoryLedger::default());
        let mut key = press(KeyCode::Char('a'));
        key.kind = KeyEventKind::Release;
        app.handle_key(key);
        assert_eq!(app.session.game().cursor(), 0);
    }

    #[test]
    fn test_ticks_only_reach_timed_games() {
        let mut untimed = app(&["ab"], SessionSettings::default(), MemoryLedger::default());
        untimed.handle_tick();
        assert_eq!(untimed.session.game().time_remaining(), None);

        let settings = SessionSettings {
            options: GameOptions {
                timer: TimerSetting::Fixed(5),
                ..Default::default()
            },
            ..SessionSettings::default()
        };
        let mut timed = app(&["ab"], settings, MemoryLedger::default());
        timed.handle_tick();
        assert_eq!(timed.session.game().time_remaining(), Some(4));
    }

    #[test]
    fn test_save_failure_is_surfaced() {
        let mut app = app(&["ab"], SessionSettings::default(), MemoryLedger::failing_saves());
        app.handle_key(press(KeyCode::Char('a')));
        assert!(app.last_error.is_none());
        app.handle_key(press(KeyCode::Char('b')));
        assert!(app.last_error.as_deref().is_some_and(|e| e.contains("ledger unavailable")));
        assert_eq!(app.screen(), AppScreen::Summary);
    }
}
