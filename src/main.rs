mod config;
mod db;
mod error;
mod local_store;
mod mapper;
mod models;
mod progress;
mod retry;
mod session;
mod study;
mod tui;
mod validator;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use chrono::Utc;
use clap::{ArgGroup, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use config::{load_config, Config};
use db::Database;
use error::AppError;
use local_store::LocalStore;
use models::{JsonOutput, SessionType};
use study::StudyRun;

#[derive(Parser)]
#[command(name = "lexcards")]
#[command(about = "Flashcard study for legal education")]
#[command(version)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Study as this user (overrides config and LEXCARDS_USER)
    #[arg(long, short, global = true)]
    user: Option<String>,

    /// Path to a config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database
    Init,

    /// Import flashcards from a JSON array of backend rows
    Import {
        /// Path to the JSON file
        file: PathBuf,
    },

    /// Export all flashcards as a JSON array in the import format
    Export {
        /// Write to this file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// List areas of law
    Areas,

    /// List themes within an area
    Themes {
        /// Area name
        area: String,
    },

    /// List flashcards with the user's progress
    Cards {
        /// Filter by area
        #[arg(long, short)]
        area: Option<String>,

        /// Filter by theme (repeatable)
        #[arg(long = "theme", short)]
        themes: Vec<String>,
    },

    /// Record an answer for a flashcard
    #[command(group(ArgGroup::new("verdict").required(true).args(["correct", "incorrect"])))]
    Answer {
        /// Flashcard ID
        id: i64,

        #[arg(long)]
        correct: bool,

        #[arg(long)]
        incorrect: bool,
    },

    /// Show progress on a flashcard
    Progress {
        /// Flashcard ID
        id: i64,
    },

    /// Show study statistics
    Stats,

    /// Study an area interactively, resuming an interrupted session
    Study {
        /// Area name
        #[arg(long, short)]
        area: String,

        /// Theme to include (repeatable, default all)
        #[arg(long = "theme", short)]
        themes: Vec<String>,

        /// Session type: normal/review/random
        #[arg(long = "type", default_value = "normal")]
        session_type: String,
    },

    /// Show today's mission
    Mission,

    /// Delete all progress and sessions of the user
    Reset {
        /// Confirm the reset
        #[arg(long)]
        yes: bool,
    },

    /// Launch interactive terminal UI
    Tui,
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("lexcards=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn print_json<T: serde::Serialize>(data: T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string(&JsonOutput::ok(data))?);
    Ok(())
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = load_config(cli.config.as_deref())?;
    if let Some(user) = cli.user {
        config.user = user;
    }

    let db_path = config.db_path();
    let db = Database::open(&db_path)?;

    match cli.command {
        Commands::Init => {
            db.init()?;
            if cli.json {
                print_json(())?;
            } else {
                println!("Database initialized at: {}", db_path.display());
            }
        }

        Commands::Import { file } => {
            db.init()?;
            let content = std::fs::read_to_string(&file)?;
            let records: Vec<serde_json::Value> = serde_json::from_str(&content)?;
            let report = validator::validate_with_report(&records);
            let imported = db.import_rows(&report.accepted)?;

            if cli.json {
                print_json(serde_json::json!({
                    "imported": imported,
                    "rejected": report.rejected,
                }))?;
            } else {
                println!("Imported {} flashcards.", imported);
                if !report.rejected.is_empty() {
                    println!("Skipped {} invalid records:", report.rejected.len());
                    for r in &report.rejected {
                        println!("  #{}: {}", r.index, r.reason);
                    }
                }
            }
        }

        Commands::Export { output } => {
            let rows = db.list_flashcards()?;
            let body = serde_json::to_string_pretty(&rows)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, body)?;
                    if cli.json {
                        print_json(serde_json::json!({ "exported": rows.len() }))?;
                    } else {
                        println!("Exported {} flashcards to {}.", rows.len(), path.display());
                    }
                }
                None => println!("{}", body),
            }
        }

        Commands::Areas => {
            let areas = config
                .retry
                .run("areas", || db.list_areas().map_err(AppError::from))?;
            if cli.json {
                print_json(&areas)?;
            } else if areas.is_empty() {
                println!("No areas found. Import some flashcards first.");
            } else {
                for area in areas {
                    println!("{}", area);
                }
            }
        }

        Commands::Themes { area } => {
            let themes = config
                .retry
                .run("themes", || db.list_themes(&area).map_err(AppError::from))?;
            if cli.json {
                print_json(&themes)?;
            } else if themes.is_empty() {
                println!("No themes found for '{}'.", area);
            } else {
                for theme in themes {
                    println!("{}", theme);
                }
            }
        }

        Commands::Cards { area, themes } => {
            let cards = study::load_cards(&db, &config, area.as_deref(), &themes)?;
            if cli.json {
                print_json(&cards)?;
            } else if cards.is_empty() {
                println!("No flashcards found.");
            } else {
                println!("{:<6} {:<50} {:<24} SCORE", "ID", "QUESTION", "THEME");
                println!("{}", "-".repeat(90));
                for card in cards {
                    let score = if card.studied {
                        format!("{}/{}", card.correct_answers, card.total_attempts)
                    } else {
                        "-".to_string()
                    };
                    println!(
                        "{:<6} {:<50} {:<24} {}",
                        card.id,
                        truncate(&card.question, 48),
                        truncate(card.theme.as_deref().unwrap_or(&card.category), 22),
                        score
                    );
                }
            }
        }

        Commands::Answer { id, correct, .. } => {
            let now = Utc::now();
            let result = db.record_attempt(&config.user, id, correct, now, &config.thresholds)?;
            let mut store = LocalStore::open(config.state_path())?;
            let mission =
                store.record_answer(&config.user, now.date_naive(), config.daily_goal, correct);
            store.save()?;

            if cli.json {
                print_json(serde_json::json!({
                    "progress": result,
                    "mission": mission,
                }))?;
            } else {
                println!(
                    "Recorded {} answer for flashcard {}.",
                    if correct { "correct" } else { "incorrect" },
                    id
                );
                println!(
                    "Mastery: {} ({:.0}% over {} attempts, streak {})",
                    result.mastery_level.label(),
                    result.accuracy * 100.0,
                    result.total_attempts,
                    result.streak
                );
                if result.needs_review {
                    println!("Marked for review.");
                }
                println!("Today: {}/{}", mission.answered, mission.goal);
            }
        }

        Commands::Progress { id } => {
            let Some(row) = db.get_flashcard(id)? else {
                if cli.json {
                    println!(
                        "{}",
                        serde_json::to_string(&JsonOutput::<()>::err("Flashcard not found"))?
                    );
                } else {
                    println!("Flashcard not found.");
                }
                return Ok(());
            };
            let mut card = mapper::to_flashcard(&row);
            let progress = db.get_progress(&config.user, id)?;
            if let Some(p) = &progress {
                card.apply_progress(p);
            }

            if cli.json {
                print_json(serde_json::json!({ "flashcard": card, "progress": progress }))?;
            } else {
                println!("Question: {}", card.question);
                println!("Answer: {}", card.answer);
                println!("Area: {}", card.category);
                if let Some(theme) = &card.theme {
                    println!("Theme: {}", theme);
                }
                match progress {
                    Some(p) => {
                        println!();
                        println!("--- Progress ---");
                        println!("Mastery: {}", p.mastery_level.label());
                        println!(
                            "Correct: {}/{} ({:.0}%)",
                            p.correct_answers,
                            p.total_attempts,
                            p.accuracy() * 100.0
                        );
                        println!("Streak: {}", p.streak);
                        println!("Needs review: {}", if p.needs_review { "yes" } else { "no" });
                        println!("Last studied: {}", p.last_studied.to_rfc3339());
                    }
                    None => println!("Not studied yet."),
                }
            }
        }

        Commands::Stats => {
            let stats = db.get_stats(&config.user)?;
            if cli.json {
                print_json(&stats)?;
            } else {
                println!("=== Study Statistics ({}) ===", config.user);
                println!("Cards: {} ({} studied)", stats.total_cards, stats.studied_cards);
                println!(
                    "Attempts: {} ({:.0}% correct)",
                    stats.total_attempts,
                    stats.accuracy() * 100.0
                );
                println!("Needs review: {}", stats.needs_review);
                println!(
                    "Mastery: {} mastered, {} advanced, {} intermediate, {} beginner",
                    stats.mastered, stats.advanced, stats.intermediate, stats.beginner
                );
                if !stats.by_area.is_empty() {
                    println!();
                    println!("{:<30} {:>10} {:>9}", "AREA", "STUDIED", "ACCURACY");
                    for a in &stats.by_area {
                        println!(
                            "{:<30} {:>10} {:>8.0}%",
                            truncate(&a.area, 28),
                            format!("{}/{}", a.studied_cards, a.total_cards),
                            a.accuracy() * 100.0
                        );
                    }
                }
            }
        }

        Commands::Study {
            area,
            themes,
            session_type,
        } => {
            let session_type = SessionType::from_str(&session_type).ok_or_else(|| {
                format!(
                    "Invalid session type '{}'. Use: normal, review, or random",
                    session_type
                )
            })?;
            let mut store = LocalStore::open(config.state_path())?;
            let mut run = StudyRun::start(
                &db,
                &store,
                &config,
                &area,
                &themes,
                session_type,
                Utc::now(),
            )?;

            if cli.json {
                // Non-interactive: report where the session stands
                print_json(serde_json::json!({
                    "session_id": run.session_id,
                    "resumed": run.resumed,
                    "index": run.index,
                    "card": run.current(),
                }))?;
            } else {
                let stdin = io::stdin();
                study_loop(&db, &mut store, &config, &mut run, stdin.lock(), io::stdout())?;
            }
        }

        Commands::Mission => {
            let mut store = LocalStore::open(config.state_path())?;
            let mission = store
                .mission(&config.user, Utc::now().date_naive(), config.daily_goal)
                .clone();
            if cli.json {
                print_json(&mission)?;
            } else {
                println!(
                    "Today ({}): {}/{} cards, {} correct",
                    mission.date, mission.answered, mission.goal, mission.correct
                );
                if mission.is_complete() {
                    println!("Mission complete!");
                } else {
                    println!("{} to go.", mission.remaining());
                }
            }
        }

        Commands::Reset { yes } => {
            if !yes {
                return Err("Refusing to reset without --yes".into());
            }
            let mut store = LocalStore::open(config.state_path())?;
            let (progress, sessions) = reset_user_data(&db, &mut store, &config.user)?;

            if cli.json {
                print_json(serde_json::json!({
                    "progress_deleted": progress,
                    "sessions_deleted": sessions,
                }))?;
            } else {
                println!(
                    "Reset {}: removed {} progress records and {} sessions.",
                    config.user, progress, sessions
                );
            }
        }

        Commands::Tui => {
            let store = LocalStore::open(config.state_path())?;
            tui::run(db, store, config)?;
        }
    }

    Ok(())
}

/// Deletes a user's progress and sessions along with their local state.
fn reset_user_data(
    db: &Database,
    store: &mut LocalStore,
    user_id: &str,
) -> Result<(usize, usize), Box<dyn std::error::Error>> {
    let counts = db.reset_user(user_id)?;
    store.clear_user(user_id);
    store.save()?;
    Ok(counts)
}

/// Line-based study loop: Enter flips the card, then c/x records the answer.
fn study_loop<R: BufRead, W: Write>(
    db: &Database,
    store: &mut LocalStore,
    config: &Config,
    run: &mut StudyRun,
    input: R,
    mut out: W,
) -> Result<(), Box<dyn std::error::Error>> {
    if run.resumed {
        writeln!(out, "Resuming at card {}.", run.index + 1)?;
    }

    let mut lines = input.lines();
    while let Some(card) = run.current() {
        let (pos, total) = run.position();
        writeln!(out)?;
        writeln!(out, "[{}/{}] {}", pos, total, card.question)?;
        write!(out, "(Enter to show answer, q to stop) ")?;
        out.flush()?;

        match lines.next().transpose()? {
            None => break,
            Some(line) if line.trim().eq_ignore_ascii_case("q") => break,
            Some(_) => {}
        }
        writeln!(out, "> {}", card.answer)?;

        let correct = loop {
            write!(out, "Correct? [c/x, q to stop] ")?;
            out.flush()?;
            match lines.next().transpose()? {
                None => return Ok(run.save_position(store, Utc::now())?),
                Some(line) => match line.trim().to_lowercase().as_str() {
                    "c" | "y" | "yes" => break true,
                    "x" | "n" | "no" => break false,
                    "q" => return Ok(run.save_position(store, Utc::now())?),
                    _ => continue,
                },
            }
        };

        let outcome = run.answer(db, store, config, correct, Utc::now())?;
        writeln!(
            out,
            "{} · streak {}{}",
            outcome.attempt.mastery_level.label(),
            outcome.attempt.streak,
            if outcome.attempt.needs_review {
                " · needs review"
            } else {
                ""
            }
        )?;
    }

    if run.is_finished() {
        writeln!(out)?;
        writeln!(out, "Session complete: {} cards reviewed.", run.reviewed)?;
    } else {
        run.save_position(store, Utc::now())?;
        writeln!(out, "Paused at card {}.", run.index + 1)?;
    }
    Ok(())
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
