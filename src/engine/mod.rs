//! The quiz engine: question selection, scoring, the session state machine
//! and the async driver that serializes clock ticks with player input.

use std::time::Duration;

pub mod clock;
pub mod driver;
pub mod scoring;
pub mod selector;
pub mod session;

pub use driver::{Command, Event, SessionHandle, SessionReport};
pub use session::{Effect, FinalStats, Lifelines, Phase, QuizSession, SessionView};

/// Seconds a player gets for each question.
pub const QUESTION_TIME: u32 = 10;
/// Delay between an answered question and the automatic move to the next one.
pub const AUTO_ADVANCE_DELAY: Duration = Duration::from_millis(2500);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum QuizMode {
    #[default]
    Short,
    Long,
}

impl QuizMode {
    pub fn question_count(self) -> usize {
        match self {
            Self::Short => 25,
            Self::Long => 50,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Short => "25",
            Self::Long => "50",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "25" => Some(Self::Short),
            "50" => Some(Self::Long),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    pub question_time: u32,
    pub tick: Duration,
    pub auto_advance: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            question_time: QUESTION_TIME,
            tick: Duration::from_secs(1),
            auto_advance: AUTO_ADVANCE_DELAY,
        }
    }
}
