//! Filters raw backend records down to well-formed flashcard rows.
//!
//! A record is kept only when `id` is an integer and `area`, `tema`,
//! `pergunta` and `resposta` are non-empty strings. Rejected records are
//! logged and dropped; input order is preserved.

use serde::Serialize;
use serde_json::Value;

use crate::models::FlashcardRow;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejection {
    /// Position of the record in the input.
    pub index: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub accepted: Vec<FlashcardRow>,
    pub rejected: Vec<Rejection>,
}

pub fn validate_with_report(records: &[Value]) -> ValidationReport {
    let mut report = ValidationReport::default();

    for (index, record) in records.iter().enumerate() {
        match validate_record(record) {
            Ok(row) => report.accepted.push(row),
            Err(reason) => {
                tracing::warn!(index, %reason, "dropping invalid flashcard record");
                report.rejected.push(Rejection { index, reason });
            }
        }
    }

    tracing::info!(
        accepted = report.accepted.len(),
        rejected = report.rejected.len(),
        "validated flashcard records"
    );
    report
}

fn validate_record(record: &Value) -> Result<FlashcardRow, String> {
    let obj = record
        .as_object()
        .ok_or_else(|| "record is not an object".to_string())?;

    let id = obj
        .get("id")
        .and_then(Value::as_i64)
        .ok_or_else(|| "id is missing or not numeric".to_string())?;

    let area = required_text(record, "area")?;
    let theme = required_text(record, "tema")?;
    let question = required_text(record, "pergunta")?;
    let answer = required_text(record, "resposta")?;
    let explanation = obj
        .get("explicacao")
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string);

    Ok(FlashcardRow {
        id,
        area,
        theme: Some(theme),
        question,
        answer,
        explanation,
    })
}

fn required_text(record: &Value, field: &str) -> Result<String, String> {
    match record.get(field).and_then(Value::as_str) {
        Some(s) if !s.trim().is_empty() => Ok(s.to_string()),
        _ => Err(format!("{} is missing or empty", field)),
    }
}
