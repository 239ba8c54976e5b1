use std::fs::{self, OpenOptions};
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use recite::app::{App, AppScreen};
use recite::cards::load_cards;
use recite::config::Config;
use recite::engine::timer::TimerSetting;
use recite::event::{AppEvent, EventHandler};
use recite::session::{Session, SessionEnd, SessionSettings};
use recite::store::ScoreLedger;
use recite::store::json_store::{JsonStore, default_data_dir};
use recite::ui::components::card_area::CardArea;
use recite::ui::components::header::Header;
use recite::ui::components::status_panel::StatusPanel;
use recite::ui::components::summary::SessionSummary;
use recite::ui::layout::{AppLayout, centered_rect};
use recite::ui::theme::Theme;

const TICK_RATE: Duration = Duration::from_secs(1);

#[derive(Parser, Debug)]
#[command(
    name = "recite",
    version,
    about = "Memorize text by typing it back, letter by letter, from a hidden card"
)]
struct Cli {
    #[arg(required = true, help = "Card files or directories of card files")]
    paths: Vec<PathBuf>,

    #[arg(
        short,
        long,
        value_name = "auto|off|SECONDS|MM:SS",
        help = "Countdown for the whole session"
    )]
    timer: Option<TimerSetting>,

    #[arg(long, conflicts_with = "timer", help = "Disable the countdown")]
    no_timer: bool,

    #[arg(long, help = "Show the first letter of every word")]
    first_letter: bool,

    #[arg(long, value_name = "N", help = "Show N random letters")]
    random_letters: Option<usize>,

    #[arg(long, value_name = "N", help = "Show N random words")]
    random_words: Option<usize>,

    #[arg(long, help = "Shuffle the cards before playing")]
    random_cards: bool,

    #[arg(long, help = "Theme name")]
    theme: Option<String>,
}

impl Cli {
    /// Flags win over the config file.
    fn apply(&self, config: &mut Config) {
        if let Some(timer) = self.timer {
            config.timer = timer;
        }
        if self.no_timer {
            config.timer = TimerSetting::Off;
        }
        if self.first_letter {
            config.first_letter = true;
        }
        if let Some(n) = self.random_letters {
            config.random_letters = n;
        }
        if let Some(n) = self.random_words {
            config.random_words = n;
        }
        if self.random_cards {
            config.randomize_cards = true;
        }
        if let Some(theme) = &self.theme {
            config.theme = theme.clone();
        }
        config.validate();
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let log_path = default_data_dir().join("recite.log");
    let file = log_path
        .parent()
        .map_or(Ok(()), fs::create_dir_all)
        .and_then(|()| OpenOptions::new().create(true).append(true).open(&log_path));

    match file {
        Ok(file) => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
                .with(env_filter)
                .init();
            info!(path = %log_path.display(), "logging initialized");
        }
        // Without a log file, stay silent rather than writing over the TUI.
        Err(_) => tracing_subscriber::registry().with(env_filter).init(),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let mut config = Config::load().context("could not load config")?;
    cli.apply(&mut config);

    let cards = load_cards(&cli.paths)?;
    let store = JsonStore::new().context("could not open score storage")?;
    let settings = SessionSettings {
        options: config.game_options(),
        score_table: config.scoring.clone(),
        randomize: config.randomize_cards,
    };
    let session = Session::new(cards, settings, store, SmallRng::from_entropy())?;

    let theme = Theme::load(&config.theme).unwrap_or_else(|| {
        warn!(theme = %config.theme, "unknown theme, using default");
        Theme::default()
    });
    let mut app = App::new(session, theme);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let events = EventHandler::new(TICK_RATE);
    let result = run_app(&mut terminal, &mut app, &events);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        eprintln!("Error: {err:?}");
    }
    print_outcome(&app);

    Ok(())
}

fn run_app<L: ScoreLedger>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App<L>,
    events: &EventHandler,
) -> Result<()> {
    loop {
        terminal.draw(|frame| render(frame, app))?;

        match events.next()? {
            AppEvent::Key(key) => app.handle_key(key),
            AppEvent::Tick => app.handle_tick(),
            AppEvent::Resize => {}
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn print_outcome<L: ScoreLedger>(app: &App<L>) {
    let session = &app.session;
    match session.ending() {
        Some(SessionEnd::Completed) => {
            println!("Session complete. Total score: {}", session.total_score());
        }
        Some(SessionEnd::TimeExpired) => {
            println!("Time's up! Total score: {}", session.total_score());
        }
        Some(SessionEnd::ScoreCollapsed) => {
            println!("Game over! Total score: {}", session.total_score());
        }
        Some(SessionEnd::Aborted) => {
            eprintln!("Session stopped early. Total score: {}", session.total_score());
        }
        Some(SessionEnd::Quit) | None => {}
    }
    if let Some(err) = &app.last_error {
        eprintln!("Warning: {err}");
    }
}

fn render<L: ScoreLedger>(frame: &mut ratatui::Frame, app: &App<L>) {
    let area = frame.area();
    let colors = &app.theme.colors;

    let bg = Block::default().style(Style::default().bg(colors.bg()));
    frame.render_widget(bg, area);

    match app.screen() {
        AppScreen::Card => render_card(frame, app),
        AppScreen::Summary => {
            let centered = centered_rect(70, 60, area);
            frame.render_widget(SessionSummary::new(&app.session, &app.theme), centered);
        }
    }
}

fn render_card<L: ScoreLedger>(frame: &mut ratatui::Frame, app: &App<L>) {
    let layout = AppLayout::new(frame.area());
    let colors = &app.theme.colors;
    let session = &app.session;
    let card = session.current_card();
    let title = card.display_title();

    frame.render_widget(Header::new(card, &app.theme), layout.header);
    frame.render_widget(CardArea::new(session.game(), &title, &app.theme), layout.card);
    frame.render_widget(StatusPanel::new(session, &app.theme), layout.status);

    let footer = if let Some(err) = &app.last_error {
        Line::from(Span::styled(
            format!(" {err}"),
            Style::default().fg(colors.error()),
        ))
    } else if session.is_over() {
        Line::from(Span::styled(
            " Press any key to exit",
            Style::default().fg(colors.accent()),
        ))
    } else {
        Line::from(Span::styled(
            " [?] Hint  [Ctrl-R] Reveal  [Esc] Quit",
            Style::default().fg(colors.text_hidden()),
        ))
    };
    frame.render_widget(Paragraph::new(footer), layout.footer);
}
