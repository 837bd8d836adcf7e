mod ui;
mod widgets;

use std::collections::BTreeSet;
use std::io;
use std::time::Duration;

use chrono::Utc;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::config::Config;
use crate::db::Database;
use crate::error::{AppError, AppResult};
use crate::local_store::{DailyMission, LocalStore};
use crate::models::{SessionType, Stats, StudySession};
use crate::study::{AnswerOutcome, StudyRun};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Dashboard,
    Areas,
    Themes,
    Study,
}

impl View {
    fn next(&self) -> Self {
        match self {
            View::Dashboard => View::Areas,
            View::Areas => View::Dashboard,
            View::Themes => View::Areas,
            View::Study => View::Study,
        }
    }

    fn prev(&self) -> Self {
        match self {
            View::Dashboard => View::Areas,
            View::Areas => View::Dashboard,
            View::Themes => View::Areas,
            View::Study => View::Study,
        }
    }
}

pub struct StatefulList<T> {
    pub items: Vec<T>,
    pub selected: Option<usize>,
}

impl<T> StatefulList<T> {
    fn with_items(items: Vec<T>) -> Self {
        let selected = if items.is_empty() { None } else { Some(0) };
        Self { items, selected }
    }

    fn next(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let i = match self.selected {
            Some(i) if i + 1 < self.items.len() => i + 1,
            _ => 0,
        };
        self.selected = Some(i);
    }

    fn previous(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let i = match self.selected {
            Some(0) | None => self.items.len() - 1,
            Some(i) => i - 1,
        };
        self.selected = Some(i);
    }

    fn selected_item(&self) -> Option<&T> {
        self.selected.and_then(|i| self.items.get(i))
    }
}

pub struct App {
    db: Database,
    store: LocalStore,
    config: Config,
    pub view: View,
    pub areas: StatefulList<String>,
    pub themes: StatefulList<String>,
    pub selected_area: Option<String>,
    pub selected_themes: BTreeSet<String>,
    pub session_type: SessionType,
    pub run: Option<StudyRun>,
    pub revealed: bool,
    pub last_answer: Option<AnswerOutcome>,
    pub stats: Stats,
    pub recent_sessions: Vec<StudySession>,
    pub mission: DailyMission,
    pub status: Option<String>,
    pub should_quit: bool,
}

impl App {
    pub fn new(db: Database, mut store: LocalStore, config: Config) -> AppResult<Self> {
        let mission = store
            .mission(&config.user, Utc::now().date_naive(), config.daily_goal)
            .clone();
        let mut app = Self {
            db,
            store,
            config,
            view: View::Dashboard,
            areas: StatefulList::with_items(Vec::new()),
            themes: StatefulList::with_items(Vec::new()),
            selected_area: None,
            selected_themes: BTreeSet::new(),
            session_type: SessionType::Normal,
            run: None,
            revealed: false,
            last_answer: None,
            stats: Stats::default(),
            recent_sessions: Vec::new(),
            mission,
            status: None,
            should_quit: false,
        };
        app.refresh_data()?;
        Ok(app)
    }

    pub fn user(&self) -> &str {
        &self.config.user
    }

    pub fn refresh_data(&mut self) -> AppResult<()> {
        let db = &self.db;
        self.stats = db.get_stats(&self.config.user)?;
        self.recent_sessions = db.list_sessions(&self.config.user, 5)?;
        let areas = self
            .config
            .retry
            .run("areas", || db.list_areas().map_err(AppError::from))?;
        self.areas = StatefulList::with_items(areas);
        self.mission = self
            .store
            .mission(&self.config.user, Utc::now().date_naive(), self.config.daily_goal)
            .clone();
        self.status = None;
        Ok(())
    }

    fn select_area(&mut self) -> AppResult<()> {
        if let Some(area) = self.areas.selected_item().cloned() {
            let db = &self.db;
            let themes = self
                .config
                .retry
                .run("themes", || db.list_themes(&area).map_err(AppError::from))?;
            self.themes = StatefulList::with_items(themes);
            self.selected_themes.clear();
            self.selected_area = Some(area);
            self.view = View::Themes;
        }
        Ok(())
    }

    fn toggle_theme(&mut self) {
        if let Some(theme) = self.themes.selected_item().cloned() {
            if !self.selected_themes.remove(&theme) {
                self.selected_themes.insert(theme);
            }
        }
    }

    fn cycle_session_type(&mut self) {
        self.session_type = match self.session_type {
            SessionType::Normal => SessionType::Review,
            SessionType::Review => SessionType::Random,
            SessionType::Random => SessionType::Normal,
        };
    }

    fn start_study(&mut self) -> AppResult<()> {
        let Some(area) = self.selected_area.clone() else {
            return Ok(());
        };
        let themes: Vec<String> = self.selected_themes.iter().cloned().collect();
        let run = StudyRun::start(
            &self.db,
            &self.store,
            &self.config,
            &area,
            &themes,
            self.session_type,
            Utc::now(),
        )?;
        if run.resumed {
            self.status = Some(format!("Resumed at card {}", run.index + 1));
        }
        self.run = Some(run);
        self.revealed = false;
        self.last_answer = None;
        self.view = View::Study;
        Ok(())
    }

    fn answer(&mut self, correct: bool) -> AppResult<()> {
        if !self.revealed {
            return Ok(());
        }
        if let Some(run) = self.run.as_mut() {
            if run.is_finished() {
                return Ok(());
            }
            let outcome = run.answer(&self.db, &mut self.store, &self.config, correct, Utc::now())?;
            self.mission = outcome.mission.clone();
            self.last_answer = Some(outcome);
            self.revealed = false;
        }
        Ok(())
    }

    fn leave_study(&mut self) -> AppResult<()> {
        if let Some(run) = self.run.take() {
            run.save_position(&mut self.store, Utc::now())?;
            if run.is_finished() {
                self.view = View::Dashboard;
                return self.refresh_data();
            }
        }
        self.view = View::Themes;
        Ok(())
    }

    fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) -> AppResult<()> {
        if self.view == View::Study {
            return self.handle_study_key(key);
        }

        match key {
            KeyCode::Char('q') => self.should_quit = true,

            KeyCode::Char('r') if modifiers.contains(KeyModifiers::CONTROL) => {
                self.refresh_data()?;
            }

            KeyCode::Esc => {
                if self.view == View::Themes {
                    self.view = View::Areas;
                }
            }

            KeyCode::Char('h') | KeyCode::Left => self.view = self.view.prev(),
            KeyCode::Char('l') | KeyCode::Right => match self.view {
                View::Areas => self.select_area()?,
                _ => self.view = self.view.next(),
            },

            KeyCode::Tab => self.view = self.view.next(),
            KeyCode::BackTab => self.view = self.view.prev(),

            KeyCode::Char('j') | KeyCode::Down => match self.view {
                View::Areas => self.areas.next(),
                View::Themes => self.themes.next(),
                _ => {}
            },
            KeyCode::Char('k') | KeyCode::Up => match self.view {
                View::Areas => self.areas.previous(),
                View::Themes => self.themes.previous(),
                _ => {}
            },

            KeyCode::Char('g') => match self.view {
                View::Areas if !self.areas.items.is_empty() => self.areas.selected = Some(0),
                View::Themes if !self.themes.items.is_empty() => self.themes.selected = Some(0),
                _ => {}
            },
            KeyCode::Char('G') => match self.view {
                View::Areas if !self.areas.items.is_empty() => {
                    self.areas.selected = Some(self.areas.items.len() - 1);
                }
                View::Themes if !self.themes.items.is_empty() => {
                    self.themes.selected = Some(self.themes.items.len() - 1);
                }
                _ => {}
            },

            KeyCode::Char(' ') if self.view == View::Themes => self.toggle_theme(),
            KeyCode::Char('t') if self.view == View::Themes => self.cycle_session_type(),

            KeyCode::Enter => match self.view {
                View::Areas => self.select_area()?,
                View::Themes => self.start_study()?,
                _ => {}
            },

            _ => {}
        }
        Ok(())
    }

    fn handle_study_key(&mut self, key: KeyCode) -> AppResult<()> {
        let finished = self.run.as_ref().map_or(true, StudyRun::is_finished);
        match key {
            KeyCode::Esc | KeyCode::Char('h') | KeyCode::Char('q') => self.leave_study()?,
            KeyCode::Enter if finished => self.leave_study()?,
            KeyCode::Char(' ') | KeyCode::Enter => self.revealed = !self.revealed,
            KeyCode::Char('c') | KeyCode::Char('y') => self.answer(true)?,
            KeyCode::Char('x') | KeyCode::Char('n') => self.answer(false)?,
            _ => {}
        }
        Ok(())
    }
}

pub fn run(db: Database, store: LocalStore, config: Config) -> Result<(), Box<dyn std::error::Error>> {
    // Load before touching the terminal so startup errors print normally
    let mut app = App::new(db, store, config)?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                // Failures stay on screen; ^r retries
                if let Err(e) = app.handle_key(key.code, key.modifiers) {
                    tracing::error!(error = %e, "tui action failed");
                    app.status = Some(format!("Error: {} (^r to retry)", e));
                }
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}
