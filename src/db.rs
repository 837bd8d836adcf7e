use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Result, Row};

use crate::config::Thresholds;
use crate::error::{AppError, AppResult};
use crate::models::{
    parse_timestamp, AreaStats, FlashcardRow, MasteryLevel, ProgressRecord, SessionType, Stats,
    StudySession,
};
use crate::progress::{apply_attempt, AttemptResult};

const FLASHCARD_COLUMNS: &str = "id, area, tema, pergunta, resposta, explicacao";
const PROGRESS_COLUMNS: &str = "user_id, flashcard_id, correct_answers, total_attempts, \
     streak_count, last_studied, needs_review, mastery_level";
const SESSION_COLUMNS: &str = "id, user_id, area, themes, total_cards, cards_reviewed, \
     last_card_index, session_type, completed, created_at, updated_at";

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(std::time::Duration::from_millis(500))?;
        conn.pragma_update(None, "foreign_keys", true)?;
        Ok(Self { conn })
    }

    pub fn init(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS flashcards (
                id INTEGER PRIMARY KEY,
                area TEXT NOT NULL,
                tema TEXT,
                pergunta TEXT NOT NULL,
                resposta TEXT NOT NULL,
                explicacao TEXT
            );

            -- One row per (user, flashcard)
            CREATE TABLE IF NOT EXISTS progress (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                flashcard_id INTEGER NOT NULL,
                correct_answers INTEGER NOT NULL DEFAULT 0,
                total_attempts INTEGER NOT NULL DEFAULT 0,
                streak_count INTEGER NOT NULL DEFAULT 0,
                last_studied TEXT NOT NULL,
                needs_review INTEGER NOT NULL DEFAULT 0,
                mastery_level TEXT NOT NULL DEFAULT 'beginner'
                    CHECK(mastery_level IN ('beginner', 'intermediate', 'advanced', 'mastered')),
                UNIQUE (user_id, flashcard_id),
                FOREIGN KEY (flashcard_id) REFERENCES flashcards(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS study_sessions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                area TEXT NOT NULL,
                themes TEXT NOT NULL DEFAULT '[]',
                total_cards INTEGER NOT NULL DEFAULT 0,
                cards_reviewed INTEGER NOT NULL DEFAULT 0,
                last_card_index INTEGER NOT NULL DEFAULT 0,
                session_type TEXT NOT NULL DEFAULT 'normal'
                    CHECK(session_type IN ('normal', 'review', 'random')),
                completed INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_flashcards_area ON flashcards(area);
            CREATE INDEX IF NOT EXISTS idx_flashcards_area_tema ON flashcards(area, tema);
            CREATE INDEX IF NOT EXISTS idx_progress_user ON progress(user_id);
            CREATE INDEX IF NOT EXISTS idx_progress_review ON progress(user_id, needs_review);
            CREATE INDEX IF NOT EXISTS idx_sessions_user_area ON study_sessions(user_id, area);
            "#,
        )?;
        Ok(())
    }

    // Flashcard operations
    pub fn import_rows(&self, rows: &[FlashcardRow]) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO flashcards (id, area, tema, pergunta, resposta, explicacao)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ON CONFLICT(id) DO UPDATE SET
                    area = excluded.area,
                    tema = excluded.tema,
                    pergunta = excluded.pergunta,
                    resposta = excluded.resposta,
                    explicacao = excluded.explicacao
                "#,
            )?;
            for row in rows {
                stmt.execute(params![
                    row.id,
                    row.area,
                    row.theme,
                    row.question,
                    row.answer,
                    row.explanation
                ])?;
            }
        }
        tx.commit()?;
        tracing::info!(count = rows.len(), "imported flashcards");
        Ok(rows.len())
    }

    pub fn get_flashcard(&self, id: i64) -> Result<Option<FlashcardRow>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM flashcards WHERE id = ?1", FLASHCARD_COLUMNS),
                params![id],
                row_to_flashcard,
            )
            .optional()
    }

    pub fn list_flashcards(&self) -> Result<Vec<FlashcardRow>> {
        self.flashcards_filtered(None, &[])
    }

    pub fn flashcards_filtered(
        &self,
        area: Option<&str>,
        themes: &[String],
    ) -> Result<Vec<FlashcardRow>> {
        let mut clauses = Vec::new();
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(area) = area {
            params_vec.push(Box::new(area.to_string()));
            clauses.push(format!("area = ?{}", params_vec.len()));
        }
        if !themes.is_empty() {
            let mut placeholders = Vec::new();
            for theme in themes {
                params_vec.push(Box::new(theme.clone()));
                placeholders.push(format!("?{}", params_vec.len()));
            }
            clauses.push(format!("tema IN ({})", placeholders.join(", ")));
        }

        let where_clause = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };
        let query = format!(
            "SELECT {} FROM flashcards {} ORDER BY id",
            FLASHCARD_COLUMNS, where_clause
        );

        let mut stmt = self.conn.prepare(&query)?;
        let params_refs: Vec<&dyn rusqlite::ToSql> =
            params_vec.iter().map(|b| b.as_ref()).collect();
        let rows = stmt.query_map(params_refs.as_slice(), row_to_flashcard)?;
        rows.collect()
    }

    pub fn list_areas(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT area FROM flashcards ORDER BY area")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        rows.collect()
    }

    pub fn list_themes(&self, area: &str) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT DISTINCT tema FROM flashcards
            WHERE area = ?1 AND tema IS NOT NULL AND tema != ''
            ORDER BY tema
            "#,
        )?;
        let rows = stmt.query_map(params![area], |row| row.get(0))?;
        rows.collect()
    }

    // Progress operations
    pub fn get_progress(&self, user_id: &str, flashcard_id: i64) -> Result<Option<ProgressRecord>> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {} FROM progress WHERE user_id = ?1 AND flashcard_id = ?2",
                    PROGRESS_COLUMNS
                ),
                params![user_id, flashcard_id],
                row_to_progress,
            )
            .optional()
    }

    pub fn list_progress(&self, user_id: &str) -> Result<Vec<ProgressRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM progress WHERE user_id = ?1 ORDER BY flashcard_id",
            PROGRESS_COLUMNS
        ))?;
        let rows = stmt.query_map(params![user_id], row_to_progress)?;
        rows.collect()
    }

    pub fn progress_map(&self, user_id: &str) -> Result<HashMap<i64, ProgressRecord>> {
        Ok(self
            .list_progress(user_id)?
            .into_iter()
            .map(|p| (p.flashcard_id, p))
            .collect())
    }

    pub fn upsert_progress(&self, record: &ProgressRecord) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO progress (user_id, flashcard_id, correct_answers, total_attempts,
                                  streak_count, last_studied, needs_review, mastery_level)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(user_id, flashcard_id) DO UPDATE SET
                correct_answers = excluded.correct_answers,
                total_attempts = excluded.total_attempts,
                streak_count = excluded.streak_count,
                last_studied = excluded.last_studied,
                needs_review = excluded.needs_review,
                mastery_level = excluded.mastery_level
            "#,
            params![
                record.user_id,
                record.flashcard_id,
                record.correct_answers,
                record.total_attempts,
                record.streak,
                record.last_studied.to_rfc3339(),
                record.needs_review,
                record.mastery_level.as_str(),
            ],
        )?;
        Ok(())
    }

    /// Runs the progress rules for one answer and stores the result.
    pub fn record_attempt(
        &self,
        user_id: &str,
        flashcard_id: i64,
        correct: bool,
        now: DateTime<Utc>,
        thresholds: &Thresholds,
    ) -> AppResult<AttemptResult> {
        if self.get_flashcard(flashcard_id)?.is_none() {
            return Err(AppError::FlashcardNotFound(flashcard_id));
        }

        let prior = self.get_progress(user_id, flashcard_id)?;
        let result = apply_attempt(prior.as_ref(), correct, now, thresholds);
        self.upsert_progress(&result.clone().into_record(user_id, flashcard_id))?;

        tracing::debug!(
            user_id,
            flashcard_id,
            correct,
            mastery = result.mastery_level.as_str(),
            "recorded attempt"
        );
        Ok(result)
    }

    // Study session operations
    pub fn create_session(
        &self,
        user_id: &str,
        area: &str,
        themes: &[String],
        total_cards: u32,
        session_type: SessionType,
    ) -> AppResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            r#"
            INSERT INTO study_sessions (user_id, area, themes, total_cards, session_type,
                                        created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
            "#,
            params![
                user_id,
                area,
                serde_json::to_string(themes)?,
                total_cards,
                session_type.as_str(),
                now
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn update_session_progress(
        &self,
        session_id: i64,
        last_card_index: u32,
        cards_reviewed: u32,
        completed: bool,
    ) -> AppResult<()> {
        let rows = self.conn.execute(
            r#"
            UPDATE study_sessions
            SET last_card_index = ?1, cards_reviewed = ?2, completed = ?3, updated_at = ?4
            WHERE id = ?5
            "#,
            params![
                last_card_index,
                cards_reviewed,
                completed,
                Utc::now().to_rfc3339(),
                session_id
            ],
        )?;
        if rows == 0 {
            return Err(AppError::SessionNotFound(session_id));
        }
        Ok(())
    }

    pub fn get_session(&self, session_id: i64) -> Result<Option<StudySession>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM study_sessions WHERE id = ?1", SESSION_COLUMNS),
                params![session_id],
                row_to_session,
            )
            .optional()
    }

    pub fn list_sessions(&self, user_id: &str, limit: usize) -> Result<Vec<StudySession>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM study_sessions WHERE user_id = ?1 ORDER BY updated_at DESC, id DESC LIMIT ?2",
            SESSION_COLUMNS
        ))?;
        let rows = stmt.query_map(params![user_id, limit as i64], row_to_session)?;
        rows.collect()
    }

    /// Most recently touched unfinished session for exactly this selection.
    pub fn latest_open_session(
        &self,
        user_id: &str,
        area: &str,
        themes: &[String],
    ) -> Result<Option<StudySession>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {} FROM study_sessions
            WHERE user_id = ?1 AND area = ?2 AND completed = 0
            ORDER BY updated_at DESC, id DESC
            "#,
            SESSION_COLUMNS
        ))?;
        let rows = stmt.query_map(params![user_id, area], row_to_session)?;

        let wanted = sorted(themes);
        for session in rows {
            let session = session?;
            if sorted(&session.themes) == wanted {
                return Ok(Some(session));
            }
        }
        Ok(None)
    }

    /// Deletes every progress and session record of a user.
    pub fn reset_user(&self, user_id: &str) -> Result<(usize, usize)> {
        let tx = self.conn.unchecked_transaction()?;
        let progress = tx.execute("DELETE FROM progress WHERE user_id = ?1", params![user_id])?;
        let sessions = tx.execute(
            "DELETE FROM study_sessions WHERE user_id = ?1",
            params![user_id],
        )?;
        tx.commit()?;
        tracing::info!(user_id, progress, sessions, "reset user progress");
        Ok((progress, sessions))
    }

    pub fn get_stats(&self, user_id: &str) -> Result<Stats> {
        let total_cards: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM flashcards", [], |row| row.get(0))?;

        let (studied_cards, total_attempts, total_correct, needs_review): (i64, i64, i64, i64) =
            self.conn.query_row(
                r#"
                SELECT COUNT(*),
                       COALESCE(SUM(total_attempts), 0),
                       COALESCE(SUM(correct_answers), 0),
                       COALESCE(SUM(needs_review), 0)
                FROM progress
                WHERE user_id = ?1 AND total_attempts > 0
                "#,
                params![user_id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )?;

        let mut stats = Stats {
            total_cards,
            studied_cards,
            total_attempts,
            total_correct,
            needs_review,
            ..Default::default()
        };

        let mut stmt = self.conn.prepare(
            "SELECT mastery_level, COUNT(*) FROM progress WHERE user_id = ?1 GROUP BY mastery_level",
        )?;
        let levels = stmt.query_map(params![user_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;
        for level in levels {
            let (name, count) = level?;
            match MasteryLevel::from_str(&name) {
                Some(MasteryLevel::Beginner) => stats.beginner = count,
                Some(MasteryLevel::Intermediate) => stats.intermediate = count,
                Some(MasteryLevel::Advanced) => stats.advanced = count,
                Some(MasteryLevel::Mastered) => stats.mastered = count,
                None => tracing::warn!(level = %name, "unknown mastery level in progress table"),
            }
        }

        let mut stmt = self.conn.prepare(
            r#"
            SELECT f.area,
                   COUNT(f.id),
                   COUNT(p.id),
                   COALESCE(SUM(p.total_attempts), 0),
                   COALESCE(SUM(p.correct_answers), 0)
            FROM flashcards f
            LEFT JOIN progress p ON p.flashcard_id = f.id AND p.user_id = ?1
            GROUP BY f.area
            ORDER BY f.area
            "#,
        )?;
        let areas = stmt.query_map(params![user_id], |row| {
            Ok(AreaStats {
                area: row.get(0)?,
                total_cards: row.get(1)?,
                studied_cards: row.get(2)?,
                total_attempts: row.get(3)?,
                total_correct: row.get(4)?,
            })
        })?;
        stats.by_area = areas.collect::<Result<Vec<_>>>()?;

        Ok(stats)
    }
}

fn sorted(themes: &[String]) -> Vec<&str> {
    let mut v: Vec<&str> = themes.iter().map(String::as_str).collect();
    v.sort_unstable();
    v.dedup();
    v
}

fn row_to_flashcard(row: &Row) -> Result<FlashcardRow> {
    Ok(FlashcardRow {
        id: row.get(0)?,
        area: row.get(1)?,
        theme: row.get(2)?,
        question: row.get(3)?,
        answer: row.get(4)?,
        explanation: row.get(5)?,
    })
}

fn row_to_progress(row: &Row) -> Result<ProgressRecord> {
    let level: String = row.get(7)?;
    Ok(ProgressRecord {
        user_id: row.get(0)?,
        flashcard_id: row.get(1)?,
        correct_answers: row.get(2)?,
        total_attempts: row.get(3)?,
        streak: row.get(4)?,
        last_studied: timestamp_column(row, 5)?,
        needs_review: row.get(6)?,
        mastery_level: MasteryLevel::from_str(&level).unwrap_or(MasteryLevel::Beginner),
    })
}

fn row_to_session(row: &Row) -> Result<StudySession> {
    let themes_json: String = row.get(3)?;
    let themes: Vec<String> = serde_json::from_str(&themes_json)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?;
    let session_type: String = row.get(7)?;

    Ok(StudySession {
        id: row.get(0)?,
        user_id: row.get(1)?,
        area: row.get(2)?,
        themes,
        total_cards: row.get(4)?,
        cards_reviewed: row.get(5)?,
        last_card_index: row.get(6)?,
        session_type: SessionType::from_str(&session_type).unwrap_or(SessionType::Normal),
        completed: row.get(8)?,
        created_at: timestamp_column(row, 9)?,
        updated_at: timestamp_column(row, 10)?,
    })
}

fn timestamp_column(row: &Row, idx: usize) -> Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    parse_timestamp(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            format!("invalid timestamp '{}'", raw).into(),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_db() -> Database {
        let db = Database::open(":memory:").expect("Failed to create in-memory database");
        db.init().expect("Failed to initialize database");
        db
    }

    fn row(id: i64, area: &str, theme: &str) -> FlashcardRow {
        FlashcardRow {
            id,
            area: area.to_string(),
            theme: Some(theme.to_string()),
            question: format!("Pergunta {}", id),
            answer: format!("Resposta {}", id),
            explanation: None,
        }
    }

    fn seeded_db() -> Database {
        let db = setup_db();
        db.import_rows(&[
            row(1, "Direito Civil", "Contratos"),
            row(2, "Direito Civil", "Família"),
            row(3, "Direito Penal", "Crimes contra a vida"),
            row(4, "Direito Civil", "Contratos"),
        ])
        .unwrap();
        db
    }

    fn themes(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    mod init_tests {
        use super::*;

        #[test]
        fn init_creates_tables() {
            let db = setup_db();
            for table in ["flashcards", "progress", "study_sessions"] {
                let count: i64 = db
                    .conn
                    .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                        row.get(0)
                    })
                    .unwrap();
                assert_eq!(count, 0);
            }
        }

        #[test]
        fn init_is_idempotent() {
            let db = setup_db();
            db.init().unwrap();
            db.init().unwrap();
        }
    }

    mod flashcard_tests {
        use super::*;

        #[test]
        fn import_and_get() {
            let db = seeded_db();
            let card = db.get_flashcard(3).unwrap().unwrap();
            assert_eq!(card.area, "Direito Penal");
            assert_eq!(card.theme.as_deref(), Some("Crimes contra a vida"));
            assert!(db.get_flashcard(99).unwrap().is_none());
        }

        #[test]
        fn import_upserts_by_id() {
            let db = seeded_db();
            let mut updated = row(1, "Direito Civil", "Contratos");
            updated.answer = "Nova resposta".to_string();
            db.import_rows(&[updated]).unwrap();

            assert_eq!(db.list_flashcards().unwrap().len(), 4);
            assert_eq!(db.get_flashcard(1).unwrap().unwrap().answer, "Nova resposta");
        }

        #[test]
        fn list_areas_is_distinct_and_sorted() {
            let db = seeded_db();
            assert_eq!(
                db.list_areas().unwrap(),
                vec!["Direito Civil".to_string(), "Direito Penal".to_string()]
            );
        }

        #[test]
        fn list_themes_for_area() {
            let db = seeded_db();
            assert_eq!(
                db.list_themes("Direito Civil").unwrap(),
                themes(&["Contratos", "Família"])
            );
            assert!(db.list_themes("Direito Tributário").unwrap().is_empty());
        }

        #[test]
        fn filter_by_area() {
            let db = seeded_db();
            let ids: Vec<i64> = db
                .flashcards_filtered(Some("Direito Civil"), &[])
                .unwrap()
                .iter()
                .map(|r| r.id)
                .collect();
            assert_eq!(ids, vec![1, 2, 4]);
        }

        #[test]
        fn filter_by_area_and_themes() {
            let db = seeded_db();
            let contratos = db
                .flashcards_filtered(Some("Direito Civil"), &themes(&["Contratos"]))
                .unwrap();
            assert_eq!(contratos.len(), 2);

            let both = db
                .flashcards_filtered(Some("Direito Civil"), &themes(&["Contratos", "Família"]))
                .unwrap();
            assert_eq!(both.len(), 3);
        }

        #[test]
        fn filter_by_theme_only() {
            let db = seeded_db();
            let rows = db
                .flashcards_filtered(None, &themes(&["Crimes contra a vida"]))
                .unwrap();
            assert_eq!(rows.len(), 1);
            assert_eq!(rows[0].id, 3);
        }
    }

    mod progress_tests {
        use super::*;

        #[test]
        fn first_attempt_creates_progress() {
            let db = seeded_db();
            assert!(db.get_progress("ana", 1).unwrap().is_none());

            let result = db
                .record_attempt("ana", 1, false, Utc::now(), &Thresholds::default())
                .unwrap();
            assert_eq!(result.total_attempts, 1);

            let p = db.get_progress("ana", 1).unwrap().unwrap();
            assert_eq!(p.total_attempts, 1);
            assert_eq!(p.correct_answers, 0);
            assert!(p.needs_review);
            assert_eq!(p.mastery_level, MasteryLevel::Beginner);
        }

        #[test]
        fn repeated_correct_answers_reach_mastered() {
            let db = seeded_db();
            let t = Thresholds::default();
            for _ in 0..3 {
                db.record_attempt("ana", 1, true, Utc::now(), &t).unwrap();
            }

            let p = db.get_progress("ana", 1).unwrap().unwrap();
            assert_eq!(p.correct_answers, 3);
            assert_eq!(p.streak, 3);
            assert_eq!(p.mastery_level, MasteryLevel::Mastered);
            assert!(!p.needs_review);
        }

        #[test]
        fn incorrect_answer_resets_stored_streak() {
            let db = seeded_db();
            let t = Thresholds::default();
            db.record_attempt("ana", 1, true, Utc::now(), &t).unwrap();
            db.record_attempt("ana", 1, true, Utc::now(), &t).unwrap();
            db.record_attempt("ana", 1, false, Utc::now(), &t).unwrap();

            let p = db.get_progress("ana", 1).unwrap().unwrap();
            assert_eq!(p.streak, 0);
            assert_eq!(p.total_attempts, 3);
            assert!(p.needs_review);
        }

        #[test]
        fn progress_is_per_user() {
            let db = seeded_db();
            let t = Thresholds::default();
            db.record_attempt("ana", 1, true, Utc::now(), &t).unwrap();

            assert!(db.get_progress("bruno", 1).unwrap().is_none());
            assert_eq!(db.list_progress("ana").unwrap().len(), 1);
            assert!(db.list_progress("bruno").unwrap().is_empty());
        }

        #[test]
        fn unknown_flashcard_is_rejected() {
            let db = seeded_db();
            let err = db
                .record_attempt("ana", 404, true, Utc::now(), &Thresholds::default())
                .unwrap_err();
            assert!(matches!(err, AppError::FlashcardNotFound(404)));
        }

        #[test]
        fn attempt_is_stamped_with_supplied_time() {
            let db = seeded_db();
            let at = parse_timestamp("2026-10-18T21:30:00Z").unwrap();
            let result = db
                .record_attempt("ana", 1, true, at, &Thresholds::default())
                .unwrap();
            assert_eq!(result.last_studied, at);

            let p = db.get_progress("ana", 1).unwrap().unwrap();
            assert_eq!(p.last_studied, at);
        }

        #[test]
        fn foreign_keys_are_enforced() {
            let db = seeded_db();
            let enabled: i64 = db
                .conn
                .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
                .unwrap();
            assert_eq!(enabled, 1);

            let orphan = ProgressRecord {
                user_id: "ana".to_string(),
                flashcard_id: 404,
                correct_answers: 0,
                total_attempts: 1,
                streak: 0,
                last_studied: Utc::now(),
                needs_review: true,
                mastery_level: MasteryLevel::Beginner,
            };
            assert!(db.upsert_progress(&orphan).is_err());

            db.record_attempt("ana", 1, true, Utc::now(), &Thresholds::default())
                .unwrap();
            db.conn
                .execute("DELETE FROM flashcards WHERE id = 1", [])
                .unwrap();
            assert!(db.get_progress("ana", 1).unwrap().is_none());
        }

        #[test]
        fn progress_map_is_keyed_by_flashcard() {
            let db = seeded_db();
            let t = Thresholds::default();
            db.record_attempt("ana", 2, true, Utc::now(), &t).unwrap();
            db.record_attempt("ana", 4, false, Utc::now(), &t).unwrap();

            let map = db.progress_map("ana").unwrap();
            assert_eq!(map.len(), 2);
            assert!(map[&4].needs_review);
            assert!(!map[&2].needs_review);
        }
    }

    mod session_tests {
        use super::*;

        #[test]
        fn create_and_get_session() {
            let db = seeded_db();
            let id = db
                .create_session(
                    "ana",
                    "Direito Civil",
                    &themes(&["Contratos"]),
                    2,
                    SessionType::Review,
                )
                .unwrap();

            let s = db.get_session(id).unwrap().unwrap();
            assert_eq!(s.area, "Direito Civil");
            assert_eq!(s.themes, themes(&["Contratos"]));
            assert_eq!(s.total_cards, 2);
            assert_eq!(s.session_type, SessionType::Review);
            assert!(!s.completed);
            assert_eq!(s.last_card_index, 0);
        }

        #[test]
        fn update_session_progress_persists() {
            let db = seeded_db();
            let id = db
                .create_session("ana", "Direito Civil", &[], 3, SessionType::Normal)
                .unwrap();
            db.update_session_progress(id, 2, 2, false).unwrap();

            let s = db.get_session(id).unwrap().unwrap();
            assert_eq!(s.last_card_index, 2);
            assert_eq!(s.cards_reviewed, 2);

            db.update_session_progress(id, 3, 3, true).unwrap();
            assert!(db.get_session(id).unwrap().unwrap().completed);
        }

        #[test]
        fn update_missing_session_fails() {
            let db = setup_db();
            let err = db.update_session_progress(77, 1, 1, false).unwrap_err();
            assert!(matches!(err, AppError::SessionNotFound(77)));
        }

        #[test]
        fn latest_open_session_matches_theme_set() {
            let db = seeded_db();
            let id = db
                .create_session(
                    "ana",
                    "Direito Civil",
                    &themes(&["Família", "Contratos"]),
                    3,
                    SessionType::Normal,
                )
                .unwrap();

            let found = db
                .latest_open_session("ana", "Direito Civil", &themes(&["Contratos", "Família"]))
                .unwrap()
                .unwrap();
            assert_eq!(found.id, id);

            assert!(db
                .latest_open_session("ana", "Direito Civil", &themes(&["Contratos"]))
                .unwrap()
                .is_none());
            assert!(db
                .latest_open_session("bruno", "Direito Civil", &themes(&["Contratos", "Família"]))
                .unwrap()
                .is_none());
        }

        #[test]
        fn completed_sessions_are_not_open() {
            let db = seeded_db();
            let id = db
                .create_session("ana", "Direito Penal", &[], 1, SessionType::Normal)
                .unwrap();
            db.update_session_progress(id, 1, 1, true).unwrap();

            assert!(db
                .latest_open_session("ana", "Direito Penal", &[])
                .unwrap()
                .is_none());
        }

        #[test]
        fn list_sessions_limits_results() {
            let db = seeded_db();
            for _ in 0..4 {
                db.create_session("ana", "Direito Civil", &[], 1, SessionType::Normal)
                    .unwrap();
            }
            assert_eq!(db.list_sessions("ana", 3).unwrap().len(), 3);
            assert!(db.list_sessions("bruno", 3).unwrap().is_empty());
        }
    }

    mod reset_tests {
        use super::*;

        #[test]
        fn reset_removes_only_that_user() {
            let db = seeded_db();
            let t = Thresholds::default();
            db.record_attempt("ana", 1, true, Utc::now(), &t).unwrap();
            db.record_attempt("ana", 2, true, Utc::now(), &t).unwrap();
            db.record_attempt("bruno", 1, true, Utc::now(), &t).unwrap();
            db.create_session("ana", "Direito Civil", &[], 2, SessionType::Normal)
                .unwrap();

            let (progress, sessions) = db.reset_user("ana").unwrap();
            assert_eq!(progress, 2);
            assert_eq!(sessions, 1);

            assert!(db.list_progress("ana").unwrap().is_empty());
            assert_eq!(db.list_progress("bruno").unwrap().len(), 1);
            assert_eq!(db.list_flashcards().unwrap().len(), 4);
        }
    }

    mod stats_tests {
        use super::*;

        #[test]
        fn stats_empty_database() {
            let db = setup_db();
            let stats = db.get_stats("ana").unwrap();
            assert_eq!(stats.total_cards, 0);
            assert_eq!(stats.studied_cards, 0);
            assert_eq!(stats.accuracy(), 0.0);
            assert!(stats.by_area.is_empty());
        }

        #[test]
        fn stats_aggregate_user_progress() {
            let db = seeded_db();
            let t = Thresholds::default();
            for _ in 0..3 {
                db.record_attempt("ana", 1, true, Utc::now(), &t).unwrap();
            }
            db.record_attempt("ana", 3, false, Utc::now(), &t).unwrap();
            db.record_attempt("bruno", 2, true, Utc::now(), &t).unwrap();

            let stats = db.get_stats("ana").unwrap();
            assert_eq!(stats.total_cards, 4);
            assert_eq!(stats.studied_cards, 2);
            assert_eq!(stats.total_attempts, 4);
            assert_eq!(stats.total_correct, 3);
            assert_eq!(stats.needs_review, 1);
            assert_eq!(stats.mastered, 1);
            assert_eq!(stats.beginner, 1);
            assert_eq!(stats.accuracy(), 0.75);

            let civil = &stats.by_area[0];
            assert_eq!(civil.area, "Direito Civil");
            assert_eq!(civil.total_cards, 3);
            assert_eq!(civil.studied_cards, 1);
            assert_eq!(civil.total_attempts, 3);

            let penal = &stats.by_area[1];
            assert_eq!(penal.area, "Direito Penal");
            assert_eq!(penal.total_correct, 0);
        }
    }
}
