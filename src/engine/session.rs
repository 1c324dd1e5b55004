//! Quiz session state machine.
//!
//! Every transition is a guarded, synchronous state update. Calls that are
//! out of order or repeated are ignored and leave the session untouched, so
//! the presenter can replay input freely. Side effects on timers are not
//! performed here; transitions return [`Effect`]s for the driver to carry out.

use std::{
    collections::{BTreeSet, HashSet},
    sync::Arc,
};

use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use tracing::{debug, info, warn};

use super::{scoring, selector, QuizMode, QUESTION_TIME};
use crate::database::quiz::{Question, OPTION_COUNT};

/// Work a transition asks the driver to do once the new state is committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// (Re)arm the countdown for the question stamped with `generation`.
    StartClock { generation: u64 },
    StopClock,
    ScheduleAutoAdvance { generation: u64 },
    CancelAutoAdvance,
    Finished(FinalStats),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    /// A question is on screen and can still be answered.
    Pending,
    /// The current question is resolved and waits for `next`.
    Revealed,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinalStats {
    pub score: u32,
    pub correct_count: u32,
    pub incorrect_count: u32,
    pub total_questions: u32,
    pub percentage: u32,
    pub max_streak: u32,
    pub mode: QuizMode,
}

impl FinalStats {
    pub fn new(
        score: u32,
        correct_count: u32,
        incorrect_count: u32,
        total_questions: u32,
        max_streak: u32,
        mode: QuizMode,
    ) -> Self {
        Self {
            score,
            correct_count,
            incorrect_count,
            total_questions,
            percentage: percentage(correct_count, total_questions),
            max_streak,
            mode,
        }
    }
}

/// Share of correct answers, rounded half up. Zero for an empty session.
pub fn percentage(correct: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    (correct * 200 + total) / (total * 2)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lifelines {
    pub fifty_fifty_used: bool,
    pub swap_question_used: bool,
    pub second_chance_used: bool,
    /// Set between arming second chance and the question resolving or a
    /// wrong guess being absorbed.
    pub second_chance_armed: bool,
    /// The absorbed wrong guess; it may not be picked again.
    pub second_chance_blocked: Option<usize>,
    /// Options removed by fifty-fifty. Never holds the correct option.
    pub hidden_options: BTreeSet<usize>,
}

impl Lifelines {
    fn reset_question(&mut self) {
        self.second_chance_armed = false;
        self.second_chance_blocked = None;
        self.hidden_options.clear();
    }
}

/// Read-only copy of a session published to observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionView {
    pub session_id: u64,
    pub generation: u64,
    pub phase: Phase,
    pub question: Option<Question>,
    pub current_index: usize,
    pub total_questions: usize,
    pub selected_option: Option<usize>,
    pub answer_revealed: bool,
    pub time_remaining: u32,
    pub question_time: u32,
    pub score: u32,
    pub correct_count: u32,
    pub incorrect_count: u32,
    pub streak: u32,
    pub max_streak: u32,
    pub mode: QuizMode,
    pub lifelines: Lifelines,
}

impl SessionView {
    pub fn is_last_question(&self) -> bool {
        self.current_index + 1 >= self.total_questions
    }

    pub fn can_answer(&self, option: usize) -> bool {
        self.phase == Phase::Pending
            && option < OPTION_COUNT
            && !self.lifelines.hidden_options.contains(&option)
            && self.lifelines.second_chance_blocked != Some(option)
    }

    pub fn can_use_fifty_fifty(&self) -> bool {
        self.phase == Phase::Pending && !self.lifelines.fifty_fifty_used
    }

    pub fn can_swap_question(&self) -> bool {
        self.phase == Phase::Pending && !self.lifelines.swap_question_used
    }

    pub fn can_use_second_chance(&self) -> bool {
        self.phase == Phase::Pending
            && !self.lifelines.second_chance_used
            && !self.lifelines.second_chance_armed
            && self.lifelines.second_chance_blocked.is_none()
    }

    /// Timed out questions are revealed without a recorded choice.
    pub fn timed_out(&self) -> bool {
        self.answer_revealed && self.selected_option.is_none()
    }

    pub fn final_stats(&self) -> FinalStats {
        FinalStats::new(
            self.score,
            self.correct_count,
            self.incorrect_count,
            self.total_questions as u32,
            self.max_streak,
            self.mode,
        )
    }
}

#[derive(Debug, Clone)]
pub struct QuizSession {
    pool: Arc<[Question]>,
    questions: Vec<Question>,
    current_index: usize,
    selected_option: Option<usize>,
    answer_revealed: bool,
    time_remaining: u32,
    score: u32,
    correct_count: u32,
    incorrect_count: u32,
    streak: u32,
    max_streak: u32,
    mode: QuizMode,
    lifelines: Lifelines,
    started: bool,
    finished: bool,
    selection_locked: bool,
    /// Bumped on every question transition; timers stamped with an older
    /// value are stale.
    generation: u64,
    session_id: u64,
    question_time: u32,
    rng: StdRng,
}

impl Default for QuizSession {
    fn default() -> Self {
        Self::new(QUESTION_TIME)
    }
}

impl QuizSession {
    pub fn new(question_time: u32) -> Self {
        Self::with_rng(question_time, StdRng::from_entropy())
    }

    pub fn with_rng(question_time: u32, rng: StdRng) -> Self {
        Self {
            pool: Arc::from(Vec::new()),
            questions: Vec::new(),
            current_index: 0,
            selected_option: None,
            answer_revealed: false,
            time_remaining: question_time,
            score: 0,
            correct_count: 0,
            incorrect_count: 0,
            streak: 0,
            max_streak: 0,
            mode: QuizMode::default(),
            lifelines: Lifelines::default(),
            started: false,
            finished: false,
            selection_locked: false,
            generation: 0,
            session_id: 0,
            question_time,
            rng,
        }
    }

    pub fn phase(&self) -> Phase {
        match (self.started, self.finished, self.answer_revealed) {
            (_, true, _) => Phase::Finished,
            (false, false, _) => Phase::Idle,
            (true, false, false) => Phase::Pending,
            (true, false, true) => Phase::Revealed,
        }
    }

    fn is_active(&self) -> bool {
        self.started && !self.finished
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current_index)
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn selected_option(&self) -> Option<usize> {
        self.selected_option
    }

    pub fn answer_revealed(&self) -> bool {
        self.answer_revealed
    }

    pub fn time_remaining(&self) -> u32 {
        self.time_remaining
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    pub fn incorrect_count(&self) -> u32 {
        self.incorrect_count
    }

    pub fn streak(&self) -> u32 {
        self.streak
    }

    pub fn max_streak(&self) -> u32 {
        self.max_streak
    }

    pub fn mode(&self) -> QuizMode {
        self.mode
    }

    pub fn lifelines(&self) -> &Lifelines {
        &self.lifelines
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn session_id(&self) -> u64 {
        self.session_id
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            session_id: self.session_id,
            generation: self.generation,
            phase: self.phase(),
            question: self.current_question().cloned(),
            current_index: self.current_index,
            total_questions: self.questions.len(),
            selected_option: self.selected_option,
            answer_revealed: self.answer_revealed,
            time_remaining: self.time_remaining,
            question_time: self.question_time,
            score: self.score,
            correct_count: self.correct_count,
            incorrect_count: self.incorrect_count,
            streak: self.streak,
            max_streak: self.max_streak,
            mode: self.mode,
            lifelines: self.lifelines.clone(),
        }
    }

    pub fn final_stats(&self) -> FinalStats {
        FinalStats::new(
            self.score,
            self.correct_count,
            self.incorrect_count,
            self.questions.len() as u32,
            self.max_streak,
            self.mode,
        )
    }

    fn reset_question(&mut self) {
        self.selected_option = None;
        self.answer_revealed = false;
        self.time_remaining = self.question_time;
        self.selection_locked = false;
        self.lifelines.reset_question();
        self.generation += 1;
    }

    /// Begins a fresh session, discarding whatever was running before.
    #[must_use]
    pub fn start(&mut self, mode: QuizMode, pool: Arc<[Question]>) -> Vec<Effect> {
        let questions = selector::select(&pool, mode.question_count(), &mut self.rng);

        self.session_id += 1;
        self.pool = pool;
        self.questions = questions;
        self.current_index = 0;
        self.score = 0;
        self.correct_count = 0;
        self.incorrect_count = 0;
        self.streak = 0;
        self.max_streak = 0;
        self.mode = mode;
        self.lifelines = Lifelines::default();
        self.finished = false;
        self.reset_question();

        if self.questions.is_empty() {
            warn!(mode = mode.as_str(), "No questions available, session not started");
            self.started = false;
            return vec![Effect::StopClock, Effect::CancelAutoAdvance];
        }

        self.started = true;
        info!(
            session = self.session_id,
            mode = mode.as_str(),
            questions = self.questions.len(),
            "Session started"
        );
        vec![
            Effect::CancelAutoAdvance,
            Effect::StartClock {
                generation: self.generation,
            },
        ]
    }

    #[must_use]
    pub fn select_answer(&mut self, option: usize) -> Vec<Effect> {
        if !self.is_active()
            || self.selection_locked
            || self.answer_revealed
            || self.selected_option.is_some()
            || option >= OPTION_COUNT
            || self.lifelines.hidden_options.contains(&option)
            || self.lifelines.second_chance_blocked == Some(option)
        {
            return Vec::new();
        }
        let Some(question) = self.questions.get(self.current_index) else {
            return Vec::new();
        };
        let is_correct = question.is_correct(option);

        if self.lifelines.second_chance_armed
            && self.lifelines.second_chance_blocked.is_none()
            && !is_correct
        {
            debug!(option, "Second chance absorbed a wrong answer");
            self.lifelines.second_chance_blocked = Some(option);
            return Vec::new();
        }

        self.selection_locked = true;
        self.selected_option = Some(option);
        self.answer_revealed = true;
        if is_correct {
            self.score = self.score.saturating_add(scoring::points(self.time_remaining));
            self.correct_count += 1;
            self.streak += 1;
            self.max_streak = self.max_streak.max(self.streak);
        } else {
            self.incorrect_count += 1;
            self.streak = 0;
        }
        self.lifelines.second_chance_armed = false;
        self.lifelines.second_chance_blocked = None;

        debug!(
            index = self.current_index,
            option,
            correct = is_correct,
            score = self.score,
            "Answer revealed"
        );
        vec![
            Effect::StopClock,
            Effect::ScheduleAutoAdvance {
                generation: self.generation,
            },
        ]
    }

    /// One second of the countdown for the question stamped `generation`.
    #[must_use]
    pub fn tick(&mut self, generation: u64) -> Vec<Effect> {
        if generation != self.generation || !self.is_active() || self.answer_revealed {
            return Vec::new();
        }
        if self.time_remaining > 1 {
            self.time_remaining -= 1;
            return Vec::new();
        }

        self.time_remaining = 0;
        self.answer_revealed = true;
        self.incorrect_count += 1;
        self.streak = 0;
        self.lifelines.second_chance_armed = false;
        self.lifelines.second_chance_blocked = None;

        debug!(index = self.current_index, "Question timed out");
        vec![Effect::StopClock]
    }

    #[must_use]
    pub fn auto_advance(&mut self, generation: u64) -> Vec<Effect> {
        if generation != self.generation {
            return Vec::new();
        }
        self.next()
    }

    #[must_use]
    pub fn next(&mut self) -> Vec<Effect> {
        if !self.is_active() || !self.answer_revealed {
            return Vec::new();
        }

        if self.current_index + 1 >= self.questions.len() {
            self.finished = true;
            self.selection_locked = false;
            self.generation += 1;
            let stats = self.final_stats();
            info!(
                session = self.session_id,
                score = stats.score,
                correct = stats.correct_count,
                total = stats.total_questions,
                "Session finished"
            );
            return vec![
                Effect::StopClock,
                Effect::CancelAutoAdvance,
                Effect::Finished(stats),
            ];
        }

        self.current_index += 1;
        self.reset_question();
        vec![
            Effect::CancelAutoAdvance,
            Effect::StartClock {
                generation: self.generation,
            },
        ]
    }

    #[must_use]
    pub fn use_fifty_fifty(&mut self) -> Vec<Effect> {
        if !self.is_active() || self.lifelines.fifty_fifty_used || self.answer_revealed {
            return Vec::new();
        }
        let Some(correct) = self.current_question().map(Question::correct_option) else {
            return Vec::new();
        };

        let wrong: Vec<usize> = (0..OPTION_COUNT).filter(|&i| i != correct).collect();
        let keep = wrong[self.rng.gen_range(0..wrong.len())];
        let hidden: BTreeSet<usize> = wrong.into_iter().filter(|&i| i != keep).collect();

        if self.selected_option.is_some_and(|option| hidden.contains(&option)) {
            self.selected_option = None;
        }
        if self
            .lifelines
            .second_chance_blocked
            .is_some_and(|option| hidden.contains(&option))
        {
            self.lifelines.second_chance_blocked = None;
        }

        debug!(?hidden, "Fifty-fifty used");
        self.lifelines.fifty_fifty_used = true;
        self.lifelines.hidden_options = hidden;
        Vec::new()
    }

    #[must_use]
    pub fn use_swap_question(&mut self) -> Vec<Effect> {
        if !self.is_active() || self.lifelines.swap_question_used || self.answer_revealed {
            return Vec::new();
        }
        let Some(current) = self.current_question() else {
            return Vec::new();
        };
        let (current_id, difficulty) = (current.id(), current.difficulty());

        let in_session: HashSet<u32> = self.questions.iter().map(Question::id).collect();
        let pool = Arc::clone(&self.pool);
        let mut candidates: Vec<&Question> = pool
            .iter()
            .filter(|q| q.difficulty() == difficulty && !in_session.contains(&q.id()))
            .collect();
        if candidates.is_empty() {
            candidates = pool
                .iter()
                .filter(|q| !in_session.contains(&q.id()))
                .collect();
        }
        if candidates.is_empty() {
            candidates = pool.iter().filter(|q| q.id() != current_id).collect();
        }
        let Some(replacement) = candidates.choose(&mut self.rng).map(|q| (*q).clone()) else {
            debug!("No question to swap in");
            return Vec::new();
        };

        debug!(from = current_id, to = replacement.id(), "Question swapped");
        self.questions[self.current_index] = replacement;
        self.lifelines.swap_question_used = true;
        self.reset_question();
        vec![Effect::StartClock {
            generation: self.generation,
        }]
    }

    #[must_use]
    pub fn use_second_chance(&mut self) -> Vec<Effect> {
        if !self.is_active()
            || self.lifelines.second_chance_used
            || self.lifelines.second_chance_armed
            || self.answer_revealed
            || self.lifelines.second_chance_blocked.is_some()
        {
            return Vec::new();
        }

        debug!("Second chance armed");
        self.lifelines.second_chance_used = true;
        self.lifelines.second_chance_armed = true;
        Vec::new()
    }

    /// Back to the pre-start screen. The last question set is kept until the
    /// next `start` replaces it.
    #[must_use]
    pub fn restart(&mut self) -> Vec<Effect> {
        self.started = false;
        self.finished = false;
        self.selection_locked = false;
        self.generation += 1;
        vec![Effect::StopClock, Effect::CancelAutoAdvance]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::quiz::{
        fixtures::{pool, question},
        Difficulty,
    };

    fn seeded() -> QuizSession {
        QuizSession::with_rng(QUESTION_TIME, StdRng::seed_from_u64(42))
    }

    fn started(per_difficulty: u32, mode: QuizMode) -> QuizSession {
        let mut session = seeded();
        let _ = session.start(mode, Arc::from(pool(per_difficulty)));
        session
    }

    fn correct(session: &QuizSession) -> usize {
        session.current_question().unwrap().correct_option()
    }

    fn wrong(session: &QuizSession) -> usize {
        (correct(session) + 1) % OPTION_COUNT
    }

    fn other_wrong(session: &QuizSession) -> usize {
        (correct(session) + 2) % OPTION_COUNT
    }

    fn expire(session: &mut QuizSession) -> Vec<Effect> {
        let generation = session.generation();
        let mut effects = Vec::new();
        for _ in 0..QUESTION_TIME {
            effects = session.tick(generation);
        }
        effects
    }

    #[test]
    fn start_builds_a_fresh_short_session() {
        let mut session = seeded();
        let effects = session.start(QuizMode::Short, Arc::from(pool(30)));

        assert_eq!(session.questions().len(), 25);
        assert_eq!(session.current_index(), 0);
        assert_eq!(session.score(), 0);
        assert_eq!(session.phase(), Phase::Pending);
        assert_eq!(
            effects,
            vec![
                Effect::CancelAutoAdvance,
                Effect::StartClock {
                    generation: session.generation()
                }
            ]
        );
    }

    #[test]
    fn start_with_an_empty_pool_stays_idle() {
        let mut session = seeded();
        let _ = session.start(QuizMode::Short, Arc::from(Vec::new()));
        assert_eq!(session.phase(), Phase::Idle);
        assert!(session.select_answer(0).is_empty());
    }

    #[test]
    fn start_discards_the_previous_session() {
        let mut session = started(30, QuizMode::Short);
        let _ = session.use_fifty_fifty();
        let _ = session.select_answer(correct(&session));
        let first = session.session_id();

        let _ = session.start(QuizMode::Long, Arc::from(pool(30)));

        assert_eq!(session.session_id(), first + 1);
        assert_eq!(session.questions().len(), 50);
        assert_eq!(session.score(), 0);
        assert_eq!(session.lifelines(), &Lifelines::default());
        assert!(!session.answer_revealed());
    }

    #[test]
    fn correct_answer_scores_by_time_left() {
        let mut session = started(30, QuizMode::Short);
        let generation = session.generation();
        for _ in 0..2 {
            let _ = session.tick(generation);
        }
        assert_eq!(session.time_remaining(), 8);

        let effects = session.select_answer(correct(&session));

        assert_eq!(session.score(), 140);
        assert_eq!(session.correct_count(), 1);
        assert_eq!(session.streak(), 1);
        assert_eq!(session.max_streak(), 1);
        assert_eq!(session.phase(), Phase::Revealed);
        assert_eq!(
            effects,
            vec![
                Effect::StopClock,
                Effect::ScheduleAutoAdvance { generation }
            ]
        );
    }

    #[test]
    fn wrong_answer_resets_streak_but_keeps_max() {
        let mut session = started(30, QuizMode::Short);
        let _ = session.select_answer(correct(&session));
        let _ = session.next();
        let _ = session.select_answer(correct(&session));
        let _ = session.next();
        let score = session.score();

        let _ = session.select_answer(wrong(&session));

        assert_eq!(session.streak(), 0);
        assert_eq!(session.max_streak(), 2);
        assert_eq!(session.incorrect_count(), 1);
        assert_eq!(session.score(), score);
    }

    #[test]
    fn second_selection_is_ignored() {
        let mut session = started(30, QuizMode::Short);
        let _ = session.select_answer(correct(&session));
        let before = session.view();

        assert!(session.select_answer(correct(&session)).is_empty());
        assert!(session.select_answer(wrong(&session)).is_empty());
        assert_eq!(session.view(), before);
    }

    #[test]
    fn out_of_range_option_is_ignored() {
        let mut session = started(30, QuizMode::Short);
        let before = session.view();
        assert!(session.select_answer(OPTION_COUNT).is_empty());
        assert_eq!(session.view(), before);
    }

    #[test]
    fn timeout_reveals_without_a_choice() {
        let mut session = started(30, QuizMode::Short);
        let _ = session.select_answer(correct(&session));
        let _ = session.next();

        let effects = expire(&mut session);

        assert_eq!(effects, vec![Effect::StopClock]);
        assert!(session.answer_revealed());
        assert_eq!(session.selected_option(), None);
        assert_eq!(session.incorrect_count(), 1);
        assert_eq!(session.streak(), 0);
        assert_eq!(session.time_remaining(), 0);
        assert!(session.view().timed_out());
    }

    #[test]
    fn ticks_stop_counting_once_revealed() {
        let mut session = started(30, QuizMode::Short);
        let generation = session.generation();
        let _ = expire(&mut session);
        let before = session.view();

        assert!(session.tick(generation).is_empty());
        assert_eq!(session.view(), before);
    }

    #[test]
    fn stale_ticks_are_ignored() {
        let mut session = started(30, QuizMode::Short);
        let stale = session.generation();
        let _ = session.select_answer(correct(&session));
        let _ = session.next();

        assert!(session.tick(stale).is_empty());
        assert_eq!(session.time_remaining(), QUESTION_TIME);
    }

    #[test]
    fn timeout_disarms_second_chance() {
        let mut session = started(30, QuizMode::Short);
        let _ = session.use_second_chance();
        let _ = session.select_answer(wrong(&session));

        let _ = expire(&mut session);

        let lifelines = session.lifelines();
        assert!(lifelines.second_chance_used);
        assert!(!lifelines.second_chance_armed);
        assert_eq!(lifelines.second_chance_blocked, None);
    }

    #[test]
    fn next_requires_a_reveal() {
        let mut session = started(30, QuizMode::Short);
        assert!(session.next().is_empty());
        assert_eq!(session.current_index(), 0);
    }

    #[test]
    fn next_twice_only_advances_once() {
        let mut session = started(30, QuizMode::Short);
        let _ = session.select_answer(correct(&session));

        let effects = session.next();
        let after_first = session.view();
        let second = session.next();

        assert_eq!(session.current_index(), 1);
        assert_eq!(
            effects,
            vec![
                Effect::CancelAutoAdvance,
                Effect::StartClock {
                    generation: session.generation()
                }
            ]
        );
        assert!(second.is_empty());
        assert_eq!(session.view(), after_first);
        assert_eq!(session.time_remaining(), QUESTION_TIME);
        assert_eq!(session.selected_option(), None);
    }

    #[test]
    fn auto_advance_loses_to_manual_next() {
        let mut session = started(30, QuizMode::Short);
        let _ = session.select_answer(correct(&session));
        let stamped = session.generation();
        let _ = session.next();

        assert!(session.auto_advance(stamped).is_empty());
        assert_eq!(session.current_index(), 1);
    }

    #[test]
    fn auto_advance_moves_on_when_it_fires_first() {
        let mut session = started(30, QuizMode::Short);
        let _ = session.select_answer(correct(&session));
        let stamped = session.generation();

        let effects = session.auto_advance(stamped);

        assert_eq!(session.current_index(), 1);
        assert!(effects.contains(&Effect::CancelAutoAdvance));
        assert!(session.next().is_empty());
    }

    #[test]
    fn last_next_finishes_once() {
        let mut session = started(30, QuizMode::Short);
        let mut finished = Vec::new();
        for _ in 0..25 {
            let _ = session.select_answer(correct(&session));
            finished.extend(
                session
                    .next()
                    .into_iter()
                    .filter(|effect| matches!(effect, Effect::Finished(_))),
            );
        }

        assert_eq!(session.phase(), Phase::Finished);
        assert_eq!(finished.len(), 1);
        let Effect::Finished(stats) = &finished[0] else {
            unreachable!()
        };
        assert_eq!(stats.correct_count, 25);
        assert_eq!(stats.total_questions, 25);
        assert_eq!(stats.percentage, 100);
        assert_eq!(stats.max_streak, 25);
        assert_eq!(stats.score, 25 * 150);
        assert!(session.next().is_empty());
        assert!(session.select_answer(0).is_empty());
    }

    #[test]
    fn fifty_fifty_keeps_the_correct_option() {
        for seed in 0..50 {
            let mut session = QuizSession::with_rng(QUESTION_TIME, StdRng::seed_from_u64(seed));
            let _ = session.start(QuizMode::Short, Arc::from(pool(30)));
            let _ = session.use_fifty_fifty();

            let hidden = &session.lifelines().hidden_options;
            assert_eq!(hidden.len(), 2);
            assert!(!hidden.contains(&correct(&session)));
        }
    }

    #[test]
    fn fifty_fifty_twice_is_a_noop() {
        let mut session = started(30, QuizMode::Short);
        let _ = session.use_fifty_fifty();
        let before = session.view();

        assert!(session.use_fifty_fifty().is_empty());
        assert_eq!(session.view(), before);
    }

    #[test]
    fn hidden_options_cannot_be_selected() {
        let mut session = started(30, QuizMode::Short);
        let _ = session.use_fifty_fifty();
        let hidden = *session.lifelines().hidden_options.iter().next().unwrap();

        assert!(session.select_answer(hidden).is_empty());
        assert!(!session.answer_revealed());
    }

    #[test]
    fn fifty_fifty_clears_a_hidden_block() {
        // Retry seeds until the blocked option lands in the hidden pair.
        for seed in 0..64 {
            let mut session = QuizSession::with_rng(QUESTION_TIME, StdRng::seed_from_u64(seed));
            let _ = session.start(QuizMode::Short, Arc::from(pool(30)));
            let _ = session.use_second_chance();
            let blocked = wrong(&session);
            let _ = session.select_answer(blocked);
            let _ = session.use_fifty_fifty();

            let lifelines = session.lifelines();
            if lifelines.hidden_options.contains(&blocked) {
                assert_eq!(lifelines.second_chance_blocked, None);
                return;
            }
            assert_eq!(lifelines.second_chance_blocked, Some(blocked));
        }
        panic!("no seed hid the blocked option");
    }

    #[test]
    fn second_chance_absorbs_one_wrong_guess() {
        let mut session = started(30, QuizMode::Short);
        let _ = session.use_second_chance();
        let first = wrong(&session);

        let effects = session.select_answer(first);

        assert!(effects.is_empty());
        assert_eq!(session.lifelines().second_chance_blocked, Some(first));
        assert!(!session.answer_revealed());

        assert!(session.select_answer(first).is_empty());
        assert_eq!(session.lifelines().second_chance_blocked, Some(first));

        let _ = session.select_answer(correct(&session));
        assert!(session.answer_revealed());
        assert_eq!(session.score(), 150);
        assert_eq!(session.lifelines().second_chance_blocked, None);
        assert!(!session.lifelines().second_chance_armed);
    }

    #[test]
    fn second_wrong_guess_after_second_chance_finalizes() {
        let mut session = started(30, QuizMode::Short);
        let _ = session.use_second_chance();
        let _ = session.select_answer(wrong(&session));

        let effects = session.select_answer(other_wrong(&session));

        assert!(effects.contains(&Effect::StopClock));
        assert_eq!(session.incorrect_count(), 1);
        assert_eq!(session.lifelines().second_chance_blocked, None);
    }

    #[test]
    fn second_chance_is_used_up_by_a_correct_answer() {
        let mut session = started(30, QuizMode::Short);
        let _ = session.use_second_chance();
        let _ = session.select_answer(correct(&session));

        assert!(session.lifelines().second_chance_used);
        assert!(!session.lifelines().second_chance_armed);
        let _ = session.next();
        let before = session.view();
        assert!(session.use_second_chance().is_empty());
        assert_eq!(session.view(), before);
    }

    #[test]
    fn second_chance_cannot_be_rearmed_on_the_same_question() {
        let mut session = started(30, QuizMode::Short);
        let _ = session.use_second_chance();
        let before = session.view();
        assert!(session.use_second_chance().is_empty());
        assert_eq!(session.view(), before);
    }

    #[test]
    fn swap_replaces_with_same_difficulty() {
        let mut session = started(30, QuizMode::Short);
        let current = session.current_question().unwrap().clone();
        let generation = session.generation();
        let _ = session.tick(generation);

        let effects = session.use_swap_question();

        let replacement = session.current_question().unwrap();
        assert_ne!(replacement.id(), current.id());
        assert_eq!(replacement.difficulty(), current.difficulty());
        assert_eq!(
            session
                .questions()
                .iter()
                .filter(|q| q.id() == replacement.id())
                .count(),
            1
        );
        assert_eq!(session.current_index(), 0);
        assert_eq!(session.time_remaining(), QUESTION_TIME);
        assert!(session.lifelines().swap_question_used);
        assert_eq!(
            effects,
            vec![Effect::StartClock {
                generation: session.generation()
            }]
        );
        assert!(session.tick(generation).is_empty());
    }

    #[test]
    fn swap_keeps_score_and_other_lifelines() {
        let mut session = started(30, QuizMode::Short);
        let _ = session.select_answer(correct(&session));
        let _ = session.next();
        let _ = session.use_fifty_fifty();
        let score = session.score();

        let _ = session.use_swap_question();

        assert_eq!(session.score(), score);
        assert!(session.lifelines().fifty_fifty_used);
        assert!(session.lifelines().hidden_options.is_empty());
        assert!(session.use_swap_question().is_empty());
    }

    #[test]
    fn swap_falls_back_to_any_unused_question() {
        let mut questions: Vec<Question> =
            (1..=3).map(|id| question(id, Difficulty::Easy, 0)).collect();
        questions.push(question(4, Difficulty::Hard, 2));
        let mut session = seeded();
        let _ = session.start(QuizMode::Short, Arc::from(questions));
        // The whole pool is in the session, so the swap can only reuse one.
        let current = session.current_question().unwrap().id();

        let _ = session.use_swap_question();

        assert!(session.lifelines().swap_question_used);
        assert_ne!(session.current_question().unwrap().id(), current);
    }

    #[test]
    fn swap_with_a_single_question_pool_is_a_noop() {
        let mut session = seeded();
        let _ = session.start(QuizMode::Short, Arc::from(vec![question(1, Difficulty::Easy, 0)]));
        let before = session.view();

        assert!(session.use_swap_question().is_empty());
        assert_eq!(session.view(), before);
    }

    #[test]
    fn lifelines_are_locked_after_reveal() {
        let mut session = started(30, QuizMode::Short);
        let _ = session.select_answer(wrong(&session));
        let before = session.view();

        assert!(session.use_fifty_fifty().is_empty());
        assert!(session.use_swap_question().is_empty());
        assert!(session.use_second_chance().is_empty());
        assert_eq!(session.view(), before);
    }

    #[test]
    fn restart_returns_to_idle_and_keeps_questions() {
        let mut session = started(30, QuizMode::Short);
        let stale = session.generation();

        let effects = session.restart();

        assert_eq!(effects, vec![Effect::StopClock, Effect::CancelAutoAdvance]);
        assert_eq!(session.phase(), Phase::Idle);
        assert_eq!(session.questions().len(), 25);
        assert!(session.tick(stale).is_empty());
        assert!(session.select_answer(0).is_empty());
    }

    #[test]
    fn percentage_rounds_half_up() {
        assert_eq!(percentage(0, 0), 0);
        assert_eq!(percentage(1, 8), 13);
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(25, 25), 100);
    }
}
