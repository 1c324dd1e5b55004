use crate::engine::QuizMode;

#[derive(Debug, Clone, Default)]
pub enum TrainerState {
    #[default]
    Start,
    ChooseMode,
    /// A session driver and its presenter are running for the chat.
    Playing {
        mode: QuizMode,
    },
    AwaitImport,
}
