use std::{sync::Arc, time::Duration};

use teloxide::{
    dispatching::dialogue::GetChatId,
    payloads::{EditMessageTextSetters, SendMessageSetters},
    prelude::Requester,
    types::{CallbackQuery, Chat, ChatId, Message, MessageId, ReplyMarkup},
    Bot,
};
use tokio::{sync::watch, time};
use tracing::{debug, error, info, instrument, warn};

use crate::{
    database::Player,
    engine::{Lifelines, Phase, QuizMode, SessionHandle, SessionReport, SessionView},
    keyboard::{action_keyboard, mode_keyboard, question_keyboard, CallbackAction},
    render::{question_text, report_text, result_card},
    reporter::ReportOutcome,
    state::TrainerState,
    trainer::Trainer,
    HandlerResult, UserDialogue,
};

/// How long the result card waits for the rank before giving up.
const REPORT_TIMEOUT: Duration = Duration::from_secs(10);

pub(crate) fn player_of(chat: &Chat) -> Player {
    let name = chat
        .username()
        .or_else(|| chat.first_name())
        .unwrap_or("player");
    Player {
        id: chat.id.0,
        name: name.to_owned(),
    }
}

#[instrument(level = "info", skip(bot, dialogue, msg, trainer), fields(chat = msg.chat.id.0))]
pub(crate) async fn choose_mode(
    bot: Bot,
    dialogue: UserDialogue,
    msg: Message,
    trainer: Arc<Trainer>,
) -> HandlerResult {
    let mode = match msg.text() {
        Some("25 questions") | Some("25") => QuizMode::Short,
        Some("50 questions") | Some("50") => QuizMode::Long,
        _ => {
            bot.send_message(msg.chat.id, "Please, choose 25 or 50 questions.")
                .reply_markup(mode_keyboard())
                .await?;
            return Ok(());
        }
    };

    let pool = trainer.pool_for(msg.chat.id);
    if pool.is_empty() {
        warn!("No questions available");
        bot.send_message(msg.chat.id, "Sorry, there are no questions available.")
            .reply_markup(action_keyboard())
            .await?;
        dialogue.update(TrainerState::Start).await?;
        return Ok(());
    }

    let handle = trainer.open_session(msg.chat.id, player_of(&msg.chat)).await;
    info!(mode = mode.as_str(), pool = pool.len(), "Starting quiz");
    bot.send_message(msg.chat.id, "Let's begin!")
        .reply_markup(ReplyMarkup::kb_remove())
        .await?;
    dialogue.update(TrainerState::Playing { mode }).await?;

    tokio::spawn(present(
        bot,
        msg.chat.id,
        handle.clone(),
        dialogue,
        Arc::clone(&trainer),
    ));
    handle.start(mode, pool).await;
    Ok(())
}

pub(crate) async fn playing(bot: Bot, msg: Message, mode: QuizMode) -> HandlerResult {
    bot.send_message(
        msg.chat.id,
        format!(
            "You are in a {}-question quiz. Use the buttons under the question or /cancel to stop.",
            mode.question_count()
        ),
    )
    .await?;
    Ok(())
}

#[instrument(level = "debug", skip(bot, q, trainer), fields(data = ?q.data))]
pub(crate) async fn take_action(bot: Bot, q: CallbackQuery, trainer: Arc<Trainer>) -> HandlerResult {
    bot.answer_callback_query(&q.id).await?;

    let Some(chat) = q.chat_id() else {
        return Ok(());
    };
    let Some(handle) = trainer.session(chat) else {
        debug!("Button pressed without a running quiz");
        return Ok(());
    };

    match q.data.as_deref().and_then(CallbackAction::parse) {
        Some(CallbackAction::Answer(option)) => handle.select_answer(option).await,
        Some(CallbackAction::FiftyFifty) => handle.use_fifty_fifty().await,
        Some(CallbackAction::Swap) => handle.use_swap_question().await,
        Some(CallbackAction::SecondChance) => handle.use_second_chance().await,
        Some(CallbackAction::Next) => handle.next().await,
        None => {
            warn!("Unknown callback data");
            return Ok(());
        }
    };
    Ok(())
}

pub(crate) async fn stale_button(bot: Bot, q: CallbackQuery) -> HandlerResult {
    bot.answer_callback_query(&q.id).await?;
    Ok(())
}

/// Everything that changes what a question message looks like.
/// The countdown is left out so ticks do not cause edits.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Rendered {
    session_id: u64,
    current_index: usize,
    question_id: Option<u32>,
    phase: Phase,
    selected_option: Option<usize>,
    score: u32,
    lifelines: Lifelines,
}

impl Rendered {
    fn of(view: &SessionView) -> Self {
        Self {
            session_id: view.session_id,
            current_index: view.current_index,
            question_id: view.question.as_ref().map(|question| question.id()),
            phase: view.phase,
            selected_option: view.selected_option,
            score: view.score,
            lifelines: view.lifelines.clone(),
        }
    }
}

/// Follows a session and keeps the chat in sync with it until the session
/// finishes or its driver stops. A finished session is released from the
/// trainer.
pub(crate) async fn present(
    bot: Bot,
    chat: ChatId,
    handle: SessionHandle,
    dialogue: UserDialogue,
    trainer: Arc<Trainer>,
) {
    if let Err(e) = follow(&bot, chat, &handle, &dialogue, &trainer).await {
        error!(chat = chat.0, error = %e, "Presenter stopped");
    }
}

async fn follow(
    bot: &Bot,
    chat: ChatId,
    handle: &SessionHandle,
    dialogue: &UserDialogue,
    trainer: &Trainer,
) -> HandlerResult {
    let mut views = handle.subscribe();
    let mut reports = handle.reports();
    let mut message: Option<(usize, MessageId)> = None;
    let mut last: Option<Rendered> = None;

    loop {
        let view = views.borrow_and_update().clone();
        match view.phase {
            Phase::Idle => {}
            Phase::Pending | Phase::Revealed => {
                let rendered = Rendered::of(&view);
                if last.as_ref() != Some(&rendered) {
                    message = Some(show_question(bot, chat, &view, message).await?);
                    last = Some(rendered);
                }
            }
            Phase::Finished => {
                // The report is already underway and outlives the driver.
                trainer.release_session(chat, handle).await;
                if let Some((_, id)) = message {
                    // Leave the last question on screen without its buttons.
                    let _ = bot.edit_message_reply_markup(chat, id).await;
                }
                bot.send_message(chat, result_card(&view.final_stats()))
                    .await?;

                let outcome = wait_for_report(&mut reports, view.session_id).await;
                bot.send_message(chat, report_text(outcome))
                    .reply_markup(action_keyboard())
                    .await?;
                dialogue.update(TrainerState::Start).await?;
                return Ok(());
            }
        }

        if views.changed().await.is_err() {
            debug!(chat = chat.0, "Session closed");
            return Ok(());
        }
    }
}

/// Edits the message of the current question, or sends a new one when the
/// session moved on to the next question.
async fn show_question(
    bot: &Bot,
    chat: ChatId,
    view: &SessionView,
    message: Option<(usize, MessageId)>,
) -> Result<(usize, MessageId), teloxide::RequestError> {
    let text = question_text(view);
    let markup = question_keyboard(view);

    match message {
        Some((index, id)) if index == view.current_index => {
            if let Err(e) = bot
                .edit_message_text(chat, id, text)
                .reply_markup(markup)
                .await
            {
                warn!(error = %e, "Failed to update the question");
            }
            Ok((index, id))
        }
        previous => {
            if let Some((_, id)) = previous {
                let _ = bot.edit_message_reply_markup(chat, id).await;
            }
            let sent = bot.send_message(chat, text).reply_markup(markup).await?;
            Ok((view.current_index, sent.id))
        }
    }
}

async fn wait_for_report(
    reports: &mut watch::Receiver<Option<SessionReport>>,
    session_id: u64,
) -> Option<ReportOutcome> {
    let reported = reports.wait_for(|report| {
        report
            .as_ref()
            .is_some_and(|report| report.session_id == session_id)
    });
    match time::timeout(REPORT_TIMEOUT, reported).await {
        Ok(Ok(report)) => report.as_ref().map(|report| report.outcome),
        _ => None,
    }
}
