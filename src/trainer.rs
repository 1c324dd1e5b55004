//! Per-chat state shared by the bot handlers: language choice, imported
//! questions and the running session.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use teloxide::types::ChatId;
use tracing::{debug, info, instrument};

use crate::{
    database::{
        bank::{MergedPool, QuestionBank, QuestionPool},
        connection::Connection,
        import::{parse_custom, ImportError},
        local::LocalStore,
        quiz::Question,
        Player,
    },
    engine::{EngineSettings, SessionHandle},
    reporter::ResultReporter,
};

pub type Reporter = ResultReporter<Connection, LocalStore>;

pub struct Trainer {
    bank: QuestionBank,
    settings: EngineSettings,
    reporter: Arc<Reporter>,
    languages: Mutex<HashMap<ChatId, String>>,
    custom: Mutex<HashMap<ChatId, Vec<Question>>>,
    sessions: Mutex<HashMap<ChatId, SessionHandle>>,
}

impl Trainer {
    pub fn new(bank: QuestionBank, settings: EngineSettings, reporter: Arc<Reporter>) -> Self {
        Self {
            bank,
            settings,
            reporter,
            languages: Mutex::default(),
            custom: Mutex::default(),
            sessions: Mutex::default(),
        }
    }

    pub fn reporter(&self) -> &Reporter {
        &self.reporter
    }

    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    pub fn language(&self, chat: ChatId) -> String {
        let languages = self.languages.lock().unwrap_or_else(PoisonError::into_inner);
        languages
            .get(&chat)
            .cloned()
            .unwrap_or_else(|| self.bank.default_language().to_owned())
    }

    /// Returns `false` when there is no bank for `language`.
    pub fn set_language(&self, chat: ChatId, language: &str) -> bool {
        if !self.bank.has_language(language) {
            return false;
        }
        let mut languages = self.languages.lock().unwrap_or_else(PoisonError::into_inner);
        languages.insert(chat, language.to_owned());
        true
    }

    pub fn custom_count(&self, chat: ChatId) -> usize {
        let custom = self.custom.lock().unwrap_or_else(PoisonError::into_inner);
        custom.get(&chat).map_or(0, Vec::len)
    }

    /// Appends the questions in `text` to the chat's custom set.
    #[instrument(level = "info", skip(self, text))]
    pub fn import(&self, chat: ChatId, text: &str) -> Result<usize, ImportError> {
        let mut custom = self.custom.lock().unwrap_or_else(PoisonError::into_inner);
        let questions = custom.entry(chat).or_default();
        let imported = parse_custom(text, questions)?;
        let count = imported.len();
        questions.extend(imported);
        info!(count, total = questions.len(), "Imported custom questions");
        Ok(count)
    }

    pub fn clear_custom(&self, chat: ChatId) -> usize {
        let mut custom = self.custom.lock().unwrap_or_else(PoisonError::into_inner);
        custom.remove(&chat).map_or(0, |questions| questions.len())
    }

    /// Built-in questions for the chat's language plus its imported ones.
    pub fn pool_for(&self, chat: ChatId) -> Arc<[Question]> {
        let language = self.language(chat);
        let custom = self.custom.lock().unwrap_or_else(PoisonError::into_inner);
        let merged = MergedPool {
            base: &self.bank,
            custom: custom.get(&chat).map_or(&[][..], Vec::as_slice),
        };
        merged.questions(&language).into()
    }

    pub fn session(&self, chat: ChatId) -> Option<SessionHandle> {
        let sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        sessions.get(&chat).cloned()
    }

    /// Spawns a fresh driver for the chat, stopping any previous one.
    #[instrument(level = "info", skip(self))]
    pub async fn open_session(&self, chat: ChatId, player: Player) -> SessionHandle {
        self.close_session(chat).await;

        let handle = SessionHandle::spawn(self.settings, self.reporter.for_player(player));
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        sessions.insert(chat, handle.clone());
        debug!(sessions = sessions.len(), "Session opened");
        handle
    }

    pub async fn close_session(&self, chat: ChatId) -> bool {
        let previous = {
            let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
            sessions.remove(&chat)
        };
        match previous {
            Some(handle) => {
                handle.shutdown().await;
                true
            }
            None => false,
        }
    }

    /// Stops `handle` and forgets it, unless the chat has since moved on to
    /// another session.
    #[instrument(level = "debug", skip(self, handle))]
    pub async fn release_session(&self, chat: ChatId, handle: &SessionHandle) -> bool {
        let released = {
            let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
            match sessions.get(&chat) {
                Some(current) if current.same_session(handle) => sessions.remove(&chat),
                _ => None,
            }
        };
        match released {
            Some(handle) => {
                handle.shutdown().await;
                debug!("Finished session released");
                true
            }
            None => false,
        }
    }
}
