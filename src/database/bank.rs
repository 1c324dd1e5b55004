use std::{
    collections::{HashMap, HashSet},
    fs,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::{info, instrument, warn};

use super::{
    import::{parse_bank, ImportError, CUSTOM_ID_FLOOR},
    quiz::Question,
};

/// Source of built-in questions for a language.
pub trait QuestionPool: Send + Sync {
    /// Unknown languages fall back to the default bank.
    fn questions(&self, language: &str) -> Vec<Question>;
}

#[derive(Debug, Error)]
pub enum BankError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("bad question bank {path}: {source}")]
    Parse { path: PathBuf, source: ImportError },
    #[error("no bank for the default language '{0}'")]
    MissingDefault(String),
    #[error("question {id} in the '{language}' bank uses an id reserved for imports")]
    ReservedId { language: String, id: u32 },
    #[error("question id {id} appears twice in the '{language}' bank")]
    DuplicateId { language: String, id: u32 },
}

/// Question banks keyed by language tag, loaded from `<dir>/<tag>.json`.
#[derive(Debug, Clone)]
pub struct QuestionBank {
    default_language: String,
    banks: HashMap<String, Vec<Question>>,
}

impl QuestionBank {
    #[instrument(level = "info")]
    pub fn load_dir(dir: &Path, default_language: &str) -> Result<Self, BankError> {
        let io_error = |source| BankError::Io {
            path: dir.to_owned(),
            source,
        };

        let mut banks = HashMap::new();
        for entry in fs::read_dir(dir).map_err(io_error)? {
            let path = entry.map_err(io_error)?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let Some(language) = path.file_stem().and_then(|stem| stem.to_str()) else {
                warn!(?path, "Skipping question bank with a non UTF-8 name");
                continue;
            };

            let text = fs::read_to_string(&path).map_err(|source| BankError::Io {
                path: path.clone(),
                source,
            })?;
            let questions = parse_bank(&text).map_err(|source| BankError::Parse {
                path: path.clone(),
                source,
            })?;
            info!(language, count = questions.len(), "Loaded question bank");
            banks.insert(language.to_owned(), questions);
        }

        Self::from_banks(default_language, banks)
    }

    /// Builds a bank set. Ids must be unique per language and stay below
    /// [`CUSTOM_ID_FLOOR`] so imported questions never share one.
    pub fn from_banks(
        default_language: &str,
        banks: HashMap<String, Vec<Question>>,
    ) -> Result<Self, BankError> {
        if !banks.contains_key(default_language) {
            return Err(BankError::MissingDefault(default_language.to_owned()));
        }
        for (language, questions) in &banks {
            let mut seen = HashSet::new();
            for id in questions.iter().map(Question::id) {
                if id >= CUSTOM_ID_FLOOR {
                    return Err(BankError::ReservedId {
                        language: language.clone(),
                        id,
                    });
                }
                if !seen.insert(id) {
                    return Err(BankError::DuplicateId {
                        language: language.clone(),
                        id,
                    });
                }
            }
        }
        Ok(Self {
            default_language: default_language.to_owned(),
            banks,
        })
    }

    pub fn default_language(&self) -> &str {
        &self.default_language
    }

    pub fn has_language(&self, language: &str) -> bool {
        self.banks.contains_key(language)
    }

    pub fn languages(&self) -> Vec<&str> {
        let mut languages: Vec<&str> = self.banks.keys().map(String::as_str).collect();
        languages.sort_unstable();
        languages
    }
}

impl QuestionPool for QuestionBank {
    fn questions(&self, language: &str) -> Vec<Question> {
        self.banks
            .get(language)
            .or_else(|| self.banks.get(&self.default_language))
            .cloned()
            .unwrap_or_default()
    }
}

/// A built-in bank with a player's imported questions appended.
pub struct MergedPool<'a, P: ?Sized> {
    pub base: &'a P,
    pub custom: &'a [Question],
}

impl<P: QuestionPool + ?Sized> QuestionPool for MergedPool<'_, P> {
    fn questions(&self, language: &str) -> Vec<Question> {
        let mut questions = self.base.questions(language);
        questions.extend_from_slice(self.custom);
        questions
    }
}
