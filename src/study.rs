//! A running study sequence: loads cards for a selection, resumes where the
//! user left off and pushes every answer through the progress rules, the
//! session record and the daily mission.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::config::Config;
use crate::db::Database;
use crate::error::{AppError, AppResult};
use crate::local_store::{DailyMission, LocalStore};
use crate::mapper;
use crate::models::{Flashcard, ProgressRecord, SessionType};
use crate::progress::AttemptResult;
use crate::session::{self, ResumeState};

#[derive(Debug, Clone, Serialize)]
pub struct StudyRun {
    pub session_id: i64,
    pub user_id: String,
    pub area: String,
    pub themes: Vec<String>,
    pub session_type: SessionType,
    pub cards: Vec<Flashcard>,
    pub index: usize,
    pub reviewed: u32,
    pub resumed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnswerOutcome {
    pub flashcard_id: i64,
    pub attempt: AttemptResult,
    pub mission: DailyMission,
    pub finished: bool,
}

/// Cards for a selection with the user's progress folded in.
pub fn load_cards(
    db: &Database,
    config: &Config,
    area: Option<&str>,
    themes: &[String],
) -> AppResult<Vec<Flashcard>> {
    load_selection(db, config, area, themes).map(|(cards, _)| cards)
}

fn load_selection(
    db: &Database,
    config: &Config,
    area: Option<&str>,
    themes: &[String],
) -> AppResult<(Vec<Flashcard>, HashMap<i64, ProgressRecord>)> {
    let rows = config.retry.run("flashcards", || {
        db.flashcards_filtered(area, themes).map_err(AppError::from)
    })?;
    let progress = db.progress_map(&config.user)?;

    let mut cards = mapper::to_flashcards(&rows);
    for card in &mut cards {
        if let Some(p) = progress.get(&card.id) {
            card.apply_progress(p);
        }
    }
    Ok((cards, progress))
}

impl StudyRun {
    pub fn start(
        db: &Database,
        store: &LocalStore,
        config: &Config,
        area: &str,
        themes: &[String],
        session_type: SessionType,
        now: DateTime<Utc>,
    ) -> AppResult<Self> {
        let (cards, progress) = load_selection(db, config, Some(area), themes)?;
        let cards = session::build_sequence(cards, &progress, session_type, &mut rand::thread_rng());

        if cards.is_empty() {
            return Err(AppError::InvalidInput(format!(
                "no cards to study for '{}' ({})",
                area,
                session_type.as_str()
            )));
        }

        // Random and review orders are rebuilt every time, so only normal runs resume
        if session_type == SessionType::Normal {
            if let Some(mut run) = Self::resume(db, store, config, area, themes, &cards, now)? {
                run.cards = cards;
                return Ok(run);
            }
        }

        let session_id = db.create_session(
            &config.user,
            area,
            themes,
            cards.len() as u32,
            session_type,
        )?;
        tracing::info!(session_id, cards = cards.len(), "started study session");

        Ok(Self {
            session_id,
            user_id: config.user.clone(),
            area: area.to_string(),
            themes: themes.to_vec(),
            session_type,
            cards,
            index: 0,
            reviewed: 0,
            resumed: false,
        })
    }

    /// Finds an unfinished run of this user for the selection. The local
    /// resume point wins; without one the latest open session row is used.
    fn resume(
        db: &Database,
        store: &LocalStore,
        config: &Config,
        area: &str,
        themes: &[String],
        cards: &[Flashcard],
        now: DateTime<Utc>,
    ) -> AppResult<Option<Self>> {
        let window = Duration::try_days(config.resume_window_days).ok_or_else(|| {
            AppError::InvalidInput(format!(
                "resume window of {} days is out of range",
                config.resume_window_days
            ))
        })?;

        let saved = match store.resume_state(&config.user, area, themes) {
            Some(saved) => Some(saved.clone()),
            None => db
                .latest_open_session(&config.user, area, themes)?
                .map(|s| ResumeState::from(&s)),
        };
        let index = session::resume_index(saved.as_ref(), area, themes, now, window);
        if index == 0 || index >= cards.len() {
            return Ok(None);
        }

        let existing = match saved.and_then(|s| s.session_id) {
            Some(id) => db.get_session(id)?,
            None => db.latest_open_session(&config.user, area, themes)?,
        };
        let Some(existing) = existing.filter(|s| !s.completed && s.user_id == config.user) else {
            return Ok(None);
        };

        tracing::info!(session_id = existing.id, index, "resuming study session");
        Ok(Some(Self {
            session_id: existing.id,
            user_id: existing.user_id,
            area: area.to_string(),
            themes: themes.to_vec(),
            session_type: SessionType::Normal,
            cards: Vec::new(),
            index,
            reviewed: existing.cards_reviewed,
            resumed: true,
        }))
    }

    pub fn current(&self) -> Option<&Flashcard> {
        self.cards.get(self.index)
    }

    pub fn is_finished(&self) -> bool {
        self.index >= self.cards.len()
    }

    pub fn position(&self) -> (usize, usize) {
        ((self.index + 1).min(self.cards.len()), self.cards.len())
    }

    pub fn answer(
        &mut self,
        db: &Database,
        store: &mut LocalStore,
        config: &Config,
        correct: bool,
        now: DateTime<Utc>,
    ) -> AppResult<AnswerOutcome> {
        let card_id = self
            .current()
            .map(|c| c.id)
            .ok_or_else(|| AppError::InvalidInput("study session already finished".into()))?;

        let attempt = db.record_attempt(&config.user, card_id, correct, now, &config.thresholds)?;
        let record = attempt.clone().into_record(&config.user, card_id);
        if let Some(card) = self.cards.get_mut(self.index) {
            card.apply_progress(&record);
        }

        self.index += 1;
        self.reviewed += 1;
        let finished = self.is_finished();

        db.update_session_progress(
            self.session_id,
            self.index as u32,
            self.reviewed,
            finished,
        )?;

        let mission = store.record_answer(&config.user, now.date_naive(), config.daily_goal, correct);
        self.save_position(store, now)?;

        Ok(AnswerOutcome {
            flashcard_id: card_id,
            attempt,
            mission,
            finished,
        })
    }

    /// Writes the resume point; a finished run clears it instead.
    pub fn save_position(&self, store: &mut LocalStore, now: DateTime<Utc>) -> AppResult<()> {
        if self.is_finished() {
            store.clear_resume_state(&self.user_id, &self.area, &self.themes);
        } else if self.session_type == SessionType::Normal {
            store.set_resume_state(ResumeState {
                user_id: self.user_id.clone(),
                area: self.area.clone(),
                themes: self.themes.clone(),
                current_index: self.index,
                last_studied: now,
                completed: false,
                session_id: Some(self.session_id),
            });
        }
        store.save()
    }
}
