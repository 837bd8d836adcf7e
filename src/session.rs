use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Duration, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::models::{Flashcard, ProgressRecord, SessionType, StudySession};

/// Where a study sequence stopped, as saved client-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeState {
    #[serde(default)]
    pub user_id: String,
    pub area: String,
    pub themes: Vec<String>,
    pub current_index: usize,
    pub last_studied: DateTime<Utc>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub session_id: Option<i64>,
}

impl From<&StudySession> for ResumeState {
    fn from(s: &StudySession) -> Self {
        Self {
            user_id: s.user_id.clone(),
            area: s.area.clone(),
            themes: s.themes.clone(),
            current_index: s.last_card_index as usize,
            last_studied: s.updated_at,
            completed: s.completed,
            session_id: Some(s.id),
        }
    }
}

pub fn is_resumable(
    saved: &ResumeState,
    area: &str,
    themes: &[String],
    now: DateTime<Utc>,
    window: Duration,
) -> bool {
    !saved.completed
        && saved.area == area
        && theme_set(&saved.themes) == theme_set(themes)
        && now.signed_duration_since(saved.last_studied) <= window
        && saved.current_index > 0
}

/// Index to start from: the saved one when resumable, else 0.
pub fn resume_index(
    saved: Option<&ResumeState>,
    area: &str,
    themes: &[String],
    now: DateTime<Utc>,
    window: Duration,
) -> usize {
    match saved {
        Some(s) if is_resumable(s, area, themes, now, window) => s.current_index,
        _ => 0,
    }
}

/// Local-storage key for an area and theme selection; theme order is ignored.
pub fn composite_key(area: &str, themes: &[String]) -> String {
    let sorted: Vec<&str> = theme_set(themes).into_iter().collect();
    format!("{}::{}", area, sorted.join("|"))
}

fn theme_set(themes: &[String]) -> BTreeSet<&str> {
    themes.iter().map(String::as_str).collect()
}

pub fn build_sequence<R: Rng + ?Sized>(
    cards: Vec<Flashcard>,
    progress: &HashMap<i64, ProgressRecord>,
    session_type: SessionType,
    rng: &mut R,
) -> Vec<Flashcard> {
    match session_type {
        SessionType::Normal => cards,
        SessionType::Review => cards
            .into_iter()
            .filter(|c| progress.get(&c.id).is_some_and(|p| p.needs_review))
            .collect(),
        SessionType::Random => {
            let mut cards = cards;
            cards.shuffle(rng);
            cards
        }
    }
}
