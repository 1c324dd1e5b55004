use std::fmt;

/// Every question carries exactly this many answer options.
pub const OPTION_COUNT: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "easy" => Some(Self::Easy),
            "medium" => Some(Self::Medium),
            "hard" => Some(Self::Hard),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Easy => "Easy",
            Self::Medium => "Medium",
            Self::Hard => "Hard",
        };
        write!(f, "{}", label)
    }
}

/// Fields are private; bank files and uploads are validated by
/// [`super::import`] before a `Question` is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: u32,
    text: String,
    options: [String; OPTION_COUNT],
    correct_option: usize,
    category: String,
    difficulty: Difficulty,
}

impl Question {
    /// `correct_option` must index into `options`; imported data is validated
    /// before it gets here.
    pub fn new(
        id: u32,
        text: impl Into<String>,
        options: [String; OPTION_COUNT],
        correct_option: usize,
        category: impl Into<String>,
        difficulty: Difficulty,
    ) -> Self {
        debug_assert!(correct_option < OPTION_COUNT);
        Self {
            id,
            text: text.into(),
            options,
            correct_option,
            category: category.into(),
            difficulty,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn options(&self) -> &[String; OPTION_COUNT] {
        &self.options
    }

    pub fn option(&self, index: usize) -> Option<&str> {
        self.options.get(index).map(String::as_str)
    }

    pub fn correct_option(&self) -> usize {
        self.correct_option
    }

    pub fn is_correct(&self, option: usize) -> bool {
        self.correct_option == option
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }
}
