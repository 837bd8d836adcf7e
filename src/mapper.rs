use crate::models::{Difficulty, Flashcard, FlashcardRow};

/// Backend placeholder meaning the answer column was never filled in.
pub const NO_ANSWER: &str = "Resposta não disponível";
pub const NO_CATEGORY: &str = "Sem categoria";

pub fn to_flashcard(row: &FlashcardRow) -> Flashcard {
    let category = if row.area.trim().is_empty() {
        NO_CATEGORY.to_string()
    } else {
        row.area.clone()
    };

    Flashcard {
        id: row.id,
        question: row.question.clone(),
        answer: resolve_answer(row),
        category,
        theme: row.theme.clone().filter(|t| !t.trim().is_empty()),
        difficulty: Difficulty::Medium,
        studied: false,
        correct_answers: 0,
        total_attempts: 0,
        last_studied: None,
    }
}

pub fn to_flashcards(rows: &[FlashcardRow]) -> Vec<Flashcard> {
    rows.iter().map(to_flashcard).collect()
}

// answer -> explanation -> placeholder
fn resolve_answer(row: &FlashcardRow) -> String {
    let answer = row.answer.trim();
    if !answer.is_empty() && answer != NO_ANSWER {
        return row.answer.clone();
    }

    match row.explanation.as_deref() {
        Some(explanation) if !explanation.trim().is_empty() => explanation.to_string(),
        _ => NO_ANSWER.to_string(),
    }
}
