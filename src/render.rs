//! Message texts for questions, results and listings.

use std::fmt::Write;

use crate::{
    database::GameResult,
    engine::{scoring, FinalStats, Phase, SessionView},
    keyboard::OPTION_LETTERS,
    reporter::ReportOutcome,
};

pub(crate) fn result_level(percentage: u32) -> &'static str {
    if percentage >= 90 {
        "Outstanding!"
    } else if percentage >= 75 {
        "Excellent!"
    } else if percentage >= 60 {
        "Good!"
    } else if percentage >= 40 {
        "Not bad"
    } else {
        "Room to grow"
    }
}

pub(crate) fn question_text(view: &SessionView) -> String {
    let Some(question) = &view.question else {
        return String::new();
    };

    let mut text = format!(
        "Question {}/{} · {} · {}\n\n{}\n",
        view.current_index + 1,
        view.total_questions,
        question.category(),
        question.difficulty(),
        question.text()
    );

    let correct = question.correct_option();
    let answer = format!(
        "{}. {}",
        OPTION_LETTERS[correct],
        question.option(correct).unwrap_or_default()
    );
    match view.phase {
        Phase::Revealed if view.timed_out() => {
            let _ = write!(text, "\n⏰ Time's up! The answer was {}", answer);
        }
        Phase::Revealed if view.selected_option == Some(correct) => {
            let _ = write!(
                text,
                "\n✅ Correct! +{} points",
                scoring::points(view.time_remaining)
            );
        }
        Phase::Revealed => {
            let _ = write!(text, "\n❌ Wrong. The answer was {}", answer);
        }
        _ => {
            let _ = write!(text, "\n⏱ {} seconds to answer", view.question_time);
            if view.lifelines.second_chance_armed {
                text.push_str("\n🛟 Second chance is armed");
            }
            if view.lifelines.second_chance_blocked.is_some() {
                text.push_str("\n🛟 Wrong guess absorbed, try again");
            }
        }
    }

    let _ = write!(
        text,
        "\n\nScore: {} · Streak: {}",
        view.score, view.streak
    );
    text
}

pub(crate) fn result_card(stats: &FinalStats) -> String {
    format!(
        "🏁 Quiz complete! {}\n\nScore: {}\nCorrect: {}/{} ({}%)\nBest streak: {}",
        result_level(stats.percentage),
        stats.score,
        stats.correct_count,
        stats.total_questions,
        stats.percentage,
        stats.max_streak
    )
}

/// `None` means the reporter did not answer in time.
pub(crate) fn report_text(outcome: Option<ReportOutcome>) -> String {
    match outcome {
        Some(ReportOutcome {
            saved: true,
            rank: Some(rank),
            is_guest,
        }) => {
            let board = if is_guest { "guest leaderboard" } else { "leaderboard" };
            format!("You are #{} on the {}.", rank, board)
        }
        Some(ReportOutcome { saved: true, .. }) => "Your result was saved.".to_owned(),
        Some(_) => "⚠️ Your result could not be saved.".to_owned(),
        None => "⚠️ Saving your result is taking too long.".to_owned(),
    }
}

pub(crate) fn leaderboard_text(results: &[GameResult]) -> String {
    if results.is_empty() {
        return "No results yet. Be the first!".to_owned();
    }

    let mut text = String::from("🏆 Leaderboard\n");
    for (place, result) in results.iter().enumerate() {
        let _ = write!(
            text,
            "\n{}. {}: {} ({}%, {} questions)",
            place + 1,
            result.player_name,
            result.score,
            result.percentage,
            result.mode.question_count()
        );
    }
    text
}

pub(crate) fn history_text(results: &[GameResult]) -> String {
    if results.is_empty() {
        return "You have not finished a quiz yet.".to_owned();
    }

    let mut text = String::from("📜 Your games, newest first\n");
    for result in results {
        let _ = write!(
            text,
            "\n{} points · {}/{} correct · streak {}",
            result.score, result.correct_count, result.total_questions, result.max_streak
        );
    }
    text
}
