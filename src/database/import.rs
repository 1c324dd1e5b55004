//! Parsing and validation of question files.
//!
//! Both the shipped question banks and player uploads go through here. A file
//! is either a JSON array of questions or an object with a `questions` array.

use std::collections::HashSet;

use serde_json::Value;
use thiserror::Error;

use super::quiz::{Difficulty, Question, OPTION_COUNT};

/// Imported questions are numbered above this so they never collide with
/// the shipped banks.
pub const CUSTOM_ID_FLOOR: u32 = 1000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImportError {
    #[error("the file is not valid JSON: {0}")]
    Json(String),
    #[error("expected an array of questions or an object with a \"questions\" field")]
    NotAList,
    #[error("the file contains no questions")]
    Empty,
    #[error("question #{index}: {problem}")]
    Invalid {
        /// 1-based position in the file.
        index: usize,
        problem: QuestionProblem,
    },
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum QuestionProblem {
    #[error("missing numeric id")]
    MissingId,
    #[error("the id is already used by an earlier question")]
    DuplicateId,
    #[error("missing question text")]
    MissingText,
    #[error("there must be exactly 4 answer options")]
    OptionCount,
    #[error("correctAnswer must be a number from 0 to 3")]
    CorrectAnswer,
    #[error("missing category")]
    MissingCategory,
    #[error("difficulty must be easy, medium or hard")]
    Difficulty,
}

struct Draft {
    text: String,
    options: [String; OPTION_COUNT],
    correct_option: usize,
    category: String,
    difficulty: Difficulty,
}

impl Draft {
    fn into_question(self, id: u32) -> Question {
        Question::new(
            id,
            self.text,
            self.options,
            self.correct_option,
            self.category,
            self.difficulty,
        )
    }
}

fn entries(text: &str) -> Result<Vec<Value>, ImportError> {
    let data: Value = serde_json::from_str(text).map_err(|e| ImportError::Json(e.to_string()))?;
    let entries = match data {
        Value::Array(entries) => entries,
        Value::Object(mut fields) => match fields.remove("questions") {
            Some(Value::Array(entries)) => entries,
            _ => return Err(ImportError::NotAList),
        },
        _ => return Err(ImportError::NotAList),
    };

    if entries.is_empty() {
        return Err(ImportError::Empty);
    }
    Ok(entries)
}

fn non_empty_str<'a>(entry: &'a Value, field: &str) -> Option<&'a str> {
    entry
        .get(field)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
}

fn draft(entry: &Value) -> Result<Draft, QuestionProblem> {
    let text = non_empty_str(entry, "question").ok_or(QuestionProblem::MissingText)?;

    let options: Vec<String> = entry
        .get("options")
        .and_then(Value::as_array)
        .ok_or(QuestionProblem::OptionCount)?
        .iter()
        .map(|option| option.as_str().map(str::to_owned))
        .collect::<Option<_>>()
        .ok_or(QuestionProblem::OptionCount)?;
    let options: [String; OPTION_COUNT] = options
        .try_into()
        .map_err(|_| QuestionProblem::OptionCount)?;

    let correct_option = entry
        .get("correctAnswer")
        .and_then(Value::as_u64)
        .filter(|&index| index < OPTION_COUNT as u64)
        .ok_or(QuestionProblem::CorrectAnswer)? as usize;

    let category = non_empty_str(entry, "category").ok_or(QuestionProblem::MissingCategory)?;

    let difficulty = entry
        .get("difficulty")
        .and_then(Value::as_str)
        .and_then(Difficulty::parse)
        .ok_or(QuestionProblem::Difficulty)?;

    Ok(Draft {
        text: text.to_owned(),
        options,
        correct_option,
        category: category.to_owned(),
        difficulty,
    })
}

fn invalid(index: usize) -> impl Fn(QuestionProblem) -> ImportError {
    move |problem| ImportError::Invalid {
        index: index + 1,
        problem,
    }
}

/// Validates an uploaded file. Nothing is imported unless every entry is
/// valid. New ids continue after the player's existing custom questions.
pub fn parse_custom(text: &str, existing: &[Question]) -> Result<Vec<Question>, ImportError> {
    let drafts = entries(text)?
        .iter()
        .enumerate()
        .map(|(index, entry)| draft(entry).map_err(invalid(index)))
        .collect::<Result<Vec<_>, _>>()?;

    let last_id = existing
        .iter()
        .map(Question::id)
        .max()
        .unwrap_or(CUSTOM_ID_FLOOR)
        .max(CUSTOM_ID_FLOOR);

    Ok(drafts
        .into_iter()
        .enumerate()
        .map(|(i, draft)| draft.into_question(last_id + i as u32 + 1))
        .collect())
}

/// Parses a shipped bank file, where every entry carries its own id. Ids
/// must be unique within the file.
pub fn parse_bank(text: &str) -> Result<Vec<Question>, ImportError> {
    let mut seen = HashSet::new();
    entries(text)?
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let id = entry
                .get("id")
                .and_then(Value::as_u64)
                .and_then(|id| u32::try_from(id).ok())
                .ok_or(QuestionProblem::MissingId)
                .map_err(invalid(index))?;
            if !seen.insert(id) {
                return Err(invalid(index)(QuestionProblem::DuplicateId));
            }
            draft(entry).map(|d| d.into_question(id)).map_err(invalid(index))
        })
        .collect()
}
