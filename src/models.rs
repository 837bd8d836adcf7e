use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A flashcard row as stored by the backend. Column names follow the
/// backend schema (`pergunta`, `resposta`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashcardRow {
    pub id: i64,
    pub area: String,
    #[serde(rename = "tema", default)]
    pub theme: Option<String>,
    #[serde(rename = "pergunta")]
    pub question: String,
    #[serde(rename = "resposta")]
    pub answer: String,
    #[serde(rename = "explicacao", default)]
    pub explanation: Option<String>,
}

// The backend has no per-card difficulty, every mapped card is Medium
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn label(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Fácil",
            Difficulty::Medium => "Médio",
            Difficulty::Hard => "Difícil",
        }
    }
}

/// Display model for a single card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flashcard {
    pub id: i64,
    pub question: String,
    pub answer: String,
    pub category: String,
    pub theme: Option<String>,
    pub difficulty: Difficulty,
    pub studied: bool,
    pub correct_answers: u32,
    pub total_attempts: u32,
    pub last_studied: Option<DateTime<Utc>>,
}

impl Flashcard {
    pub fn apply_progress(&mut self, progress: &ProgressRecord) {
        self.studied = progress.total_attempts > 0;
        self.correct_answers = progress.correct_answers;
        self.total_attempts = progress.total_attempts;
        self.last_studied = Some(progress.last_studied);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MasteryLevel {
    Beginner,
    Intermediate,
    Advanced,
    Mastered,
}

impl MasteryLevel {
    pub const ALL: [MasteryLevel; 4] = [
        MasteryLevel::Beginner,
        MasteryLevel::Intermediate,
        MasteryLevel::Advanced,
        MasteryLevel::Mastered,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MasteryLevel::Beginner => "beginner",
            MasteryLevel::Intermediate => "intermediate",
            MasteryLevel::Advanced => "advanced",
            MasteryLevel::Mastered => "mastered",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "beginner" => Some(MasteryLevel::Beginner),
            "intermediate" => Some(MasteryLevel::Intermediate),
            "advanced" => Some(MasteryLevel::Advanced),
            "mastered" => Some(MasteryLevel::Mastered),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MasteryLevel::Beginner => "Beginner",
            MasteryLevel::Intermediate => "Intermediate",
            MasteryLevel::Advanced => "Advanced",
            MasteryLevel::Mastered => "Mastered",
        }
    }

    // Bar width used by the dashboard and card list
    pub fn rank(&self) -> usize {
        *self as usize + 1
    }
}

/// Progress of one user on one flashcard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub user_id: String,
    pub flashcard_id: i64,
    pub correct_answers: u32,
    pub total_attempts: u32,
    pub streak: u32,
    pub last_studied: DateTime<Utc>,
    pub needs_review: bool,
    pub mastery_level: MasteryLevel,
}

impl ProgressRecord {
    pub fn accuracy(&self) -> f64 {
        if self.total_attempts == 0 {
            0.0
        } else {
            self.correct_answers as f64 / self.total_attempts as f64
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionType {
    Normal,
    Review,
    Random,
}

impl SessionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionType::Normal => "normal",
            SessionType::Review => "review",
            SessionType::Random => "random",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "normal" | "n" => Some(SessionType::Normal),
            "review" | "r" => Some(SessionType::Review),
            "random" | "shuffle" => Some(SessionType::Random),
            _ => None,
        }
    }
}

// A study sequence over one area/theme selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudySession {
    pub id: i64,
    pub user_id: String,
    pub area: String,
    pub themes: Vec<String>,
    pub total_cards: u32,
    pub cards_reviewed: u32,
    pub last_card_index: u32,
    pub session_type: SessionType,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AreaStats {
    pub area: String,
    pub total_cards: i64,
    pub studied_cards: i64,
    pub total_attempts: i64,
    pub total_correct: i64,
}

impl AreaStats {
    pub fn accuracy(&self) -> f64 {
        if self.total_attempts == 0 {
            0.0
        } else {
            self.total_correct as f64 / self.total_attempts as f64
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Stats {
    pub total_cards: i64,
    pub studied_cards: i64,
    pub total_attempts: i64,
    pub total_correct: i64,
    pub needs_review: i64,
    pub beginner: i64,
    pub intermediate: i64,
    pub advanced: i64,
    pub mastered: i64,
    pub by_area: Vec<AreaStats>,
}

impl Stats {
    pub fn accuracy(&self) -> f64 {
        if self.total_attempts == 0 {
            0.0
        } else {
            self.total_correct as f64 / self.total_attempts as f64
        }
    }

    pub fn count_for(&self, level: MasteryLevel) -> i64 {
        match level {
            MasteryLevel::Beginner => self.beginner,
            MasteryLevel::Intermediate => self.intermediate,
            MasteryLevel::Advanced => self.advanced,
            MasteryLevel::Mastered => self.mastered,
        }
    }
}

pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

// JSON output wrapper for CLI
#[derive(Debug, Serialize)]
pub struct JsonOutput<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> JsonOutput<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}
