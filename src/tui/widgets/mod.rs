pub mod areas;
pub mod dashboard;
pub mod study;
pub mod themes;

use crate::models::MasteryLevel;

pub fn mastery_bar(level: MasteryLevel) -> String {
    let filled = level.rank();
    let empty = MasteryLevel::ALL.len() - filled;
    format!("{}{}", "█".repeat(filled), "░".repeat(empty))
}

pub fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
