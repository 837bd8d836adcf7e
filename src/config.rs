//! Configuration loading.
//!
//! Search order:
//! 1. `--config <path>` or `LEXCARDS_CONFIG`
//! 2. `lexcards.toml` in the current directory
//! 3. `<config dir>/lexcards/config.toml`
//!
//! Missing file means defaults. `LEXCARDS_DB` and `LEXCARDS_USER` override
//! the database path and the acting user.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::retry::RetryPolicy;

const DEFAULT_DB_NAME: &str = "lexcards.db";
const DEFAULT_STATE_NAME: &str = "state.json";

/// Product-tuning constants for the progress rules.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub mastered_accuracy: f64,
    pub mastered_attempts: u32,
    pub advanced_accuracy: f64,
    pub advanced_attempts: u32,
    pub intermediate_accuracy: f64,
    pub intermediate_attempts: u32,
    /// Cards below this accuracy are flagged for review.
    pub review_accuracy: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            mastered_accuracy: 0.90,
            mastered_attempts: 3,
            advanced_accuracy: 0.75,
            advanced_attempts: 2,
            intermediate_accuracy: 0.50,
            intermediate_attempts: 2,
            review_accuracy: 0.70,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database_path: Option<PathBuf>,
    #[serde(default)]
    pub state_path: Option<PathBuf>,
    #[serde(default = "default_user")]
    pub user: String,
    /// Saved sessions older than this are not offered for resume.
    #[serde(default = "default_resume_window_days")]
    pub resume_window_days: i64,
    #[serde(default = "default_daily_goal")]
    pub daily_goal: u32,
    #[serde(default)]
    pub thresholds: Thresholds,
    #[serde(default)]
    pub retry: RetryPolicy,
}

fn default_user() -> String {
    "local".to_string()
}
fn default_resume_window_days() -> i64 {
    7
}
fn default_daily_goal() -> u32 {
    20
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: None,
            state_path: None,
            user: default_user(),
            resume_window_days: default_resume_window_days(),
            daily_goal: default_daily_goal(),
            thresholds: Thresholds::default(),
            retry: RetryPolicy::default(),
        }
    }
}

impl Config {
    pub fn db_path(&self) -> PathBuf {
        if let Ok(path) = std::env::var("LEXCARDS_DB") {
            return PathBuf::from(path);
        }
        self.database_path
            .clone()
            .unwrap_or_else(|| data_dir().join(DEFAULT_DB_NAME))
    }

    pub fn state_path(&self) -> PathBuf {
        self.state_path
            .clone()
            .unwrap_or_else(|| data_dir().join(DEFAULT_STATE_NAME))
    }
}

fn data_dir() -> PathBuf {
    let dir = dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("lexcards");
    std::fs::create_dir_all(&dir).ok();
    dir
}

pub fn load_config(explicit: Option<&Path>) -> AppResult<Config> {
    let env_path = std::env::var("LEXCARDS_CONFIG").ok().map(PathBuf::from);

    let config_path = match explicit.map(Path::to_path_buf).or(env_path) {
        Some(p) if p.exists() => Some(p),
        Some(p) => return Err(AppError::ConfigNotFound(p.display().to_string())),
        None => {
            let local = PathBuf::from("lexcards.toml");
            let global = dirs::config_dir().map(|d| d.join("lexcards").join("config.toml"));
            if local.exists() {
                Some(local)
            } else {
                global.filter(|g| g.exists())
            }
        }
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading config");
            let content = std::fs::read_to_string(&path)?;
            parse_config(&content, &path)?
        }
        None => Config::default(),
    };

    if let Ok(user) = std::env::var("LEXCARDS_USER") {
        if !user.trim().is_empty() {
            config.user = user;
        }
    }

    Ok(config)
}

fn parse_config(content: &str, path: &Path) -> AppResult<Config> {
    toml::from_str::<Config>(content).map_err(|source| AppError::Config {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_product_constants() {
        let t = Thresholds::default();
        assert_eq!(t.mastered_accuracy, 0.90);
        assert_eq!(t.mastered_attempts, 3);
        assert_eq!(t.advanced_accuracy, 0.75);
        assert_eq!(t.intermediate_accuracy, 0.50);
        assert_eq!(t.review_accuracy, 0.70);

        let c = Config::default();
        assert_eq!(c.resume_window_days, 7);
        assert_eq!(c.user, "local");
    }

    #[test]
    fn parse_empty_config_uses_defaults() {
        let config = parse_config("", Path::new("x.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn parse_partial_thresholds() {
        let toml = r#"
            user = "ana"
            daily_goal = 50

            [thresholds]
            review_accuracy = 0.8
        "#;
        let config = parse_config(toml, Path::new("x.toml")).unwrap();
        assert_eq!(config.user, "ana");
        assert_eq!(config.daily_goal, 50);
        assert_eq!(config.thresholds.review_accuracy, 0.8);
        assert_eq!(config.thresholds.mastered_accuracy, 0.90);
    }

    #[test]
    fn parse_invalid_config_names_path() {
        let err = parse_config("user = [", Path::new("broken.toml")).unwrap_err();
        assert!(err.to_string().contains("broken.toml"));
    }

    #[test]
    fn load_explicit_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "resume_window_days = 3").unwrap();

        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.resume_window_days, 3);
    }

    #[test]
    fn load_missing_explicit_path_fails() {
        let result = load_config(Some(Path::new("/nonexistent/lexcards.toml")));
        assert!(matches!(result, Err(AppError::ConfigNotFound(_))));
    }

    #[test]
    fn explicit_database_path_is_used() {
        std::env::remove_var("LEXCARDS_DB");
        let config = Config {
            database_path: Some(PathBuf::from("/tmp/cards.db")),
            ..Default::default()
        };
        assert_eq!(config.db_path(), PathBuf::from("/tmp/cards.db"));
    }
}
