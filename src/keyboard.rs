use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup};

use crate::{
    database::quiz::OPTION_COUNT,
    engine::{Phase, SessionView},
};

pub(crate) const PLAY: &str = "Play 🎯";
pub(crate) const IMPORT: &str = "Import questions 📥";
pub(crate) const LEADERBOARD: &str = "Leaderboard 🏆";
pub(crate) const HISTORY: &str = "History 📜";
pub(crate) const CLEAR_CUSTOM: &str = "Clear my questions 🗑️";
pub(crate) const BACK: &str = "Back ↩️";

pub(crate) const OPTION_LETTERS: [char; OPTION_COUNT] = ['A', 'B', 'C', 'D'];

pub(crate) fn action_keyboard() -> KeyboardMarkup {
    let keyboard = vec![
        vec![KeyboardButton::new(PLAY), KeyboardButton::new(IMPORT)],
        vec![KeyboardButton::new(LEADERBOARD), KeyboardButton::new(HISTORY)],
    ];

    KeyboardMarkup::new(keyboard)
}

pub(crate) fn mode_keyboard() -> KeyboardMarkup {
    let keyboard = vec![vec![
        KeyboardButton::new("25 questions"),
        KeyboardButton::new("50 questions"),
    ]];

    KeyboardMarkup::new(keyboard)
}

pub(crate) fn import_keyboard() -> KeyboardMarkup {
    let keyboard = vec![vec![
        KeyboardButton::new(CLEAR_CUSTOM),
        KeyboardButton::new(BACK),
    ]];

    KeyboardMarkup::new(keyboard)
}

/// What an inline button under a question asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CallbackAction {
    Answer(usize),
    FiftyFifty,
    Swap,
    SecondChance,
    Next,
}

impl CallbackAction {
    pub(crate) fn data(self) -> String {
        match self {
            Self::Answer(option) => format!("answer:{}", option),
            Self::FiftyFifty => "lifeline:fifty".to_owned(),
            Self::Swap => "lifeline:swap".to_owned(),
            Self::SecondChance => "lifeline:second".to_owned(),
            Self::Next => "next".to_owned(),
        }
    }

    pub(crate) fn parse(data: &str) -> Option<Self> {
        match data {
            "lifeline:fifty" => Some(Self::FiftyFifty),
            "lifeline:swap" => Some(Self::Swap),
            "lifeline:second" => Some(Self::SecondChance),
            "next" => Some(Self::Next),
            other => other
                .strip_prefix("answer:")
                .and_then(|option| option.parse().ok())
                .filter(|&option| option < OPTION_COUNT)
                .map(Self::Answer),
        }
    }
}

fn button(label: impl Into<String>, action: CallbackAction) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(label, action.data())
}

fn option_label(view: &SessionView, index: usize, text: &str) -> String {
    let letter = OPTION_LETTERS[index];
    if view.answer_revealed {
        let correct = view
            .question
            .as_ref()
            .is_some_and(|question| question.is_correct(index));
        let mark = if correct {
            "✅ "
        } else if view.selected_option == Some(index) {
            "❌ "
        } else {
            ""
        };
        return format!("{}{}. {}", mark, letter, text);
    }

    if view.lifelines.second_chance_blocked == Some(index) {
        format!("✖ {}. {}", letter, text)
    } else {
        format!("{}. {}", letter, text)
    }
}

/// Inline keyboard for the current question: one row per visible option,
/// then the lifelines still available, or `Next` once revealed.
pub(crate) fn question_keyboard(view: &SessionView) -> InlineKeyboardMarkup {
    let Some(question) = &view.question else {
        return InlineKeyboardMarkup::default();
    };

    let mut keyboard: Vec<Vec<InlineKeyboardButton>> = question
        .options()
        .iter()
        .enumerate()
        .filter(|(index, _)| !view.lifelines.hidden_options.contains(index))
        .map(|(index, text)| {
            vec![button(
                option_label(view, index, text),
                CallbackAction::Answer(index),
            )]
        })
        .collect();

    match view.phase {
        Phase::Pending => {
            let mut lifelines = Vec::new();
            if view.can_use_fifty_fifty() {
                lifelines.push(button("50:50", CallbackAction::FiftyFifty));
            }
            if view.can_swap_question() {
                lifelines.push(button("Swap 🔄", CallbackAction::Swap));
            }
            if view.can_use_second_chance() {
                lifelines.push(button("Second chance 🛟", CallbackAction::SecondChance));
            }
            if !lifelines.is_empty() {
                keyboard.push(lifelines);
            }
        }
        Phase::Revealed => {
            let label = if view.is_last_question() {
                "Finish 🏁"
            } else {
                "Next ➡️"
            };
            keyboard.push(vec![button(label, CallbackAction::Next)]);
        }
        Phase::Idle | Phase::Finished => {}
    }

    InlineKeyboardMarkup::new(keyboard)
}
