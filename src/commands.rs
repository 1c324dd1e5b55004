use std::sync::Arc;

use teloxide::{
    payloads::SendMessageSetters,
    prelude::Requester,
    types::{ChatId, Message},
    utils::command::BotCommands,
    Bot,
};
use tracing::{info, instrument, warn};

use crate::{
    database::MAX_LISTED_RESULTS,
    keyboard::action_keyboard,
    render::{history_text, leaderboard_text},
    state::TrainerState,
    trainer::Trainer,
    HandlerResult, UserDialogue,
};

#[derive(Debug, Clone, BotCommands)]
#[command(rename_rule = "lowercase")]
pub enum Command {
    #[command(description = "display help.")]
    Help,
    #[command(description = "start the bot")]
    Start,
    #[command(description = "stop the current quiz or import")]
    Cancel,
    #[command(description = "show the best results")]
    Leaderboard,
    #[command(description = "show your finished games")]
    History,
    #[command(description = "switch the question language, e.g. /language en")]
    Language(String),
}

pub(crate) async fn help(bot: Bot, msg: Message) -> HandlerResult {
    bot.send_message(msg.chat.id, Command::descriptions().to_string())
        .await?;
    Ok(())
}

#[instrument(level = "info", skip(bot, dialogue, msg, trainer), fields(chat = msg.chat.id.0))]
pub(crate) async fn cancel(
    bot: Bot,
    dialogue: UserDialogue,
    msg: Message,
    trainer: Arc<Trainer>,
) -> HandlerResult {
    if trainer.close_session(msg.chat.id).await {
        info!("Quiz cancelled");
    }
    bot.send_message(msg.chat.id, "Cancelling dialogue")
        .reply_markup(action_keyboard())
        .await?;
    dialogue.update(TrainerState::Start).await?;
    Ok(())
}

pub(crate) async fn start(
    bot: Bot,
    msg: Message,
    dialogue: UserDialogue,
    trainer: Arc<Trainer>,
) -> HandlerResult {
    trainer.close_session(msg.chat.id).await;
    bot.send_message(msg.chat.id, "Please choose what to do:")
        .reply_markup(action_keyboard())
        .await?;
    dialogue.update(TrainerState::Start).await?;
    Ok(())
}

pub(crate) async fn show_leaderboard(bot: &Bot, chat: ChatId, trainer: &Trainer) -> HandlerResult {
    let text = match trainer.reporter().leaderboard(MAX_LISTED_RESULTS).await {
        Ok(results) => leaderboard_text(&results),
        Err(e) => {
            warn!(error = %e, "Failed to load the leaderboard");
            "The leaderboard is not available right now.".to_owned()
        }
    };
    bot.send_message(chat, text).await?;
    Ok(())
}

pub(crate) async fn show_history(bot: &Bot, chat: ChatId, trainer: &Trainer) -> HandlerResult {
    let text = match trainer.reporter().history(chat.0, MAX_LISTED_RESULTS).await {
        Ok(results) => history_text(&results),
        Err(e) => {
            warn!(error = %e, "Failed to load the history");
            "Your history is not available right now.".to_owned()
        }
    };
    bot.send_message(chat, text).await?;
    Ok(())
}

pub(crate) async fn leaderboard(bot: Bot, msg: Message, trainer: Arc<Trainer>) -> HandlerResult {
    show_leaderboard(&bot, msg.chat.id, &trainer).await
}

pub(crate) async fn history(bot: Bot, msg: Message, trainer: Arc<Trainer>) -> HandlerResult {
    show_history(&bot, msg.chat.id, &trainer).await
}

#[instrument(level = "info", skip(bot, msg, trainer), fields(chat = msg.chat.id.0))]
pub(crate) async fn language(
    bot: Bot,
    msg: Message,
    trainer: Arc<Trainer>,
    tag: String,
) -> HandlerResult {
    let tag = tag.trim().to_lowercase();
    let text = if tag.is_empty() {
        format!(
            "Questions are in '{}'. Available: {}",
            trainer.language(msg.chat.id),
            trainer.bank().languages().join(", ")
        )
    } else if trainer.set_language(msg.chat.id, &tag) {
        info!("Language switched");
        format!("Questions will be in '{}' from the next quiz on.", tag)
    } else {
        format!(
            "There are no questions in '{}'. Available: {}",
            tag,
            trainer.bank().languages().join(", ")
        )
    };

    bot.send_message(msg.chat.id, text).await?;
    Ok(())
}
