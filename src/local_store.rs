//! Client-side key-value state kept in a JSON file: resume points per user
//! and area/theme selection, plus each user's daily mission counters.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::session::{composite_key, ResumeState};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyMission {
    pub date: NaiveDate,
    pub goal: u32,
    pub answered: u32,
    pub correct: u32,
}

impl DailyMission {
    pub fn new(date: NaiveDate, goal: u32) -> Self {
        Self {
            date,
            goal,
            answered: 0,
            correct: 0,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.answered >= self.goal
    }

    pub fn remaining(&self) -> u32 {
        self.goal.saturating_sub(self.answered)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LocalState {
    #[serde(default)]
    resume: HashMap<String, ResumeState>,
    #[serde(default)]
    missions: HashMap<String, DailyMission>,
}

/// Resume points are namespaced by user, then by selection.
fn resume_key(user_id: &str, area: &str, themes: &[String]) -> String {
    format!("{}::{}", user_id, composite_key(area, themes))
}

pub struct LocalStore {
    path: PathBuf,
    state: LocalState,
}

impl LocalStore {
    pub fn open<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let path = path.as_ref().to_path_buf();
        let state = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(state) => state,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "ignoring corrupt local state");
                    LocalState::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => LocalState::default(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, state })
    }

    pub fn save(&self) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_string_pretty(&self.state)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    pub fn resume_state(&self, user_id: &str, area: &str, themes: &[String]) -> Option<&ResumeState> {
        self.state.resume.get(&resume_key(user_id, area, themes))
    }

    pub fn set_resume_state(&mut self, state: ResumeState) {
        let key = resume_key(&state.user_id, &state.area, &state.themes);
        self.state.resume.insert(key, state);
    }

    pub fn clear_resume_state(&mut self, user_id: &str, area: &str, themes: &[String]) -> bool {
        self.state
            .resume
            .remove(&resume_key(user_id, area, themes))
            .is_some()
    }

    /// Today's mission for a user; a mission from an earlier day is replaced.
    pub fn mission(&mut self, user_id: &str, today: NaiveDate, goal: u32) -> &mut DailyMission {
        let mission = self
            .state
            .missions
            .entry(user_id.to_string())
            .or_insert_with(|| DailyMission::new(today, goal));
        if mission.date != today {
            *mission = DailyMission::new(today, goal);
        }
        mission
    }

    pub fn record_answer(
        &mut self,
        user_id: &str,
        today: NaiveDate,
        goal: u32,
        correct: bool,
    ) -> DailyMission {
        let mission = self.mission(user_id, today, goal);
        let was_complete = mission.is_complete();
        mission.answered += 1;
        if correct {
            mission.correct += 1;
        }
        if !was_complete && mission.is_complete() {
            tracing::info!(user_id, goal = mission.goal, "daily mission complete");
        }
        mission.clone()
    }

    /// Drops a user's resume points and mission; other users are untouched.
    pub fn clear_user(&mut self, user_id: &str) -> usize {
        let before = self.state.resume.len();
        self.state.resume.retain(|_, s| s.user_id != user_id);
        self.state.missions.remove(user_id);
        before - self.state.resume.len()
    }
}
